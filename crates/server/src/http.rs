//! HTTP endpoints
//!
//! REST API for the collections agent. Both call routes answer with the
//! synthesized reply audio; structured JSON bodies are reserved for errors
//! and the health check.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use loanmate_agent::AgentTurn;
use loanmate_core::AudioClip;

use crate::state::AppState;
use crate::ServerError;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let cors_layer = {
        let settings = state.get_settings();
        build_cors_layer(&settings.server.cors_origins, settings.server.cors_enabled)
    };

    Router::new()
        .route("/api/call/start", post(start_call))
        .route("/api/call/turn", post(call_turn))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

/// Build the CORS layer from configured origins
///
/// With enforcement off the layer is permissive (development only). With
/// enforcement on and no valid origin configured, only localhost is allowed.
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS enforcement is disabled - allowing all origins");
        return CorsLayer::permissive();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!(origin, "Invalid CORS origin");
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        tracing::warn!("No valid CORS origins configured, defaulting to localhost:3000");
        return CorsLayer::new()
            .allow_origin("http://localhost:3000".parse::<HeaderValue>().unwrap())
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any);
    }

    tracing::info!(origins = parsed_origins.len(), "CORS configured");
    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

/// Start-call request
#[derive(Debug, Deserialize)]
struct StartCallRequest {
    /// Name supplied by the dialer; empty or absent starts unidentified
    #[serde(default)]
    customer_name: Option<String>,
}

/// Start a new call and speak the greeting
async fn start_call(
    State(state): State<AppState>,
    Json(request): Json<StartCallRequest>,
) -> Result<impl IntoResponse, ServerError> {
    let turn = state
        .agent
        .start_call(request.customer_name.as_deref())
        .await?;
    Ok(audio_response(turn))
}

/// Process one customer audio turn and speak the reply
async fn call_turn(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ServerError> {
    if body.is_empty() {
        tracing::warn!("turn request carried no audio");
        return Err(ServerError::NoAudio);
    }

    let mime_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream");

    let audio = AudioClip::new(body.to_vec(), mime_type);
    let turn = state.agent.process_turn(audio).await?;
    Ok(audio_response(turn))
}

fn audio_response(turn: AgentTurn) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, turn.audio.mime_type)],
        turn.audio.bytes,
    )
}

/// Health check
async fn health_check() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Arc;
    use tower::ServiceExt;

    use loanmate_agent::{AgentConfig, CollectionsAgent};
    use loanmate_config::Settings;
    use loanmate_core::CustomerRecord;
    use loanmate_directory::CustomerDirectory;
    use loanmate_llm::{DialogueEngine, MockDialogueBackend};
    use loanmate_pipeline::{
        DeepgramConfig, DeepgramSynthesizer, DeepgramTranscriber, SpeechAdapter,
    };

    fn test_state() -> AppState {
        let directory = CustomerDirectory::from_records([CustomerRecord::new(
            "John Doe", 700, 500.0, 10_000.0,
        )]);
        let engine = DialogueEngine::new(Arc::new(MockDialogueBackend));
        let speech_config = DeepgramConfig {
            api_key: "test-key".to_string(),
            ..DeepgramConfig::default()
        };
        let transcriber = Arc::new(DeepgramTranscriber::new(speech_config.clone()).unwrap());
        let speech = SpeechAdapter::new(Arc::new(
            DeepgramSynthesizer::new(speech_config).unwrap(),
        ));
        let agent = CollectionsAgent::new(
            directory,
            engine,
            transcriber,
            speech,
            AgentConfig::default(),
        );
        AppState::new(Settings::default(), Arc::new(agent))
    }

    #[test]
    fn test_router_creation() {
        let _ = create_router(test_state());
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = create_router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_empty_turn_body_is_rejected() {
        let app = create_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/call/turn")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_cors_layer_permissive_when_disabled() {
        let _ = build_cors_layer(&[], false);
    }

    #[test]
    fn test_cors_layer_with_origins() {
        let origins = vec!["https://example.com".to_string(), "not a url\n".to_string()];
        let _ = build_cors_layer(&origins, true);
    }

    #[test]
    fn test_start_call_request_tolerates_missing_name() {
        let request: StartCallRequest = serde_json::from_str("{}").unwrap();
        assert!(request.customer_name.is_none());
    }
}

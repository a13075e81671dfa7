//! LoanMate server entry point

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use loanmate_agent::{AgentConfig, CollectionsAgent};
use loanmate_config::{load_settings, Settings};
use loanmate_directory::CustomerDirectory;
use loanmate_llm::{
    DialogueBackend, DialogueEngine, GeminiBackend, GeminiConfig, MockDialogueBackend,
};
use loanmate_pipeline::{DeepgramConfig, DeepgramSynthesizer, DeepgramTranscriber, SpeechAdapter};
use loanmate_server::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Priority: env vars > config/{env}.yaml > config/default.yaml > defaults
    let env = std::env::var("LOANMATE_ENV").ok();
    let settings = match load_settings(env.as_deref()) {
        Ok(settings) => {
            // Tracing not yet initialized, use eprintln for early logging
            eprintln!(
                "Loaded configuration (env: {})",
                env.as_deref().unwrap_or("default")
            );
            settings
        }
        Err(e) => {
            eprintln!("Warning: Failed to load config: {e}. Using defaults.");
            Settings::default()
        }
    };

    init_tracing(&settings);

    tracing::info!("Starting LoanMate server v{}", env!("CARGO_PKG_VERSION"));

    let directory = CustomerDirectory::load(&settings.directory.data_file);
    let engine = DialogueEngine::new(select_dialogue_backend(&settings));

    let speech_config = DeepgramConfig {
        endpoint: settings.speech.endpoint.clone(),
        api_key: settings.speech.api_key.clone().unwrap_or_default(),
        stt_model: settings.speech.stt_model.clone(),
        tts_model: settings.speech.tts_model.clone(),
        language: settings.speech.language.clone(),
        timeout: Duration::from_secs(settings.speech.timeout_secs),
    };
    // The service cannot listen or speak without a speech provider, so a
    // missing key is fatal here rather than a degraded mode.
    let transcriber = match DeepgramTranscriber::new(speech_config.clone()) {
        Ok(transcriber) => Arc::new(transcriber),
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize transcription; set speech.api_key");
            std::process::exit(1);
        }
    };
    let synthesizer = match DeepgramSynthesizer::new(speech_config) {
        Ok(synthesizer) => Arc::new(synthesizer),
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize synthesis; set speech.api_key");
            std::process::exit(1);
        }
    };
    let speech = SpeechAdapter::new(synthesizer);

    let agent = Arc::new(CollectionsAgent::new(
        directory,
        engine,
        transcriber,
        speech,
        AgentConfig {
            max_history_turns: settings.agent.max_history_turns,
        },
    ));

    let port = settings.server.port;
    let state = AppState::new(settings, agent);
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Pick the dialogue backend once at startup
///
/// The live backend needs both the enable flag and an API key; anything
/// else runs on deterministic mock replies so the pipeline stays usable.
fn select_dialogue_backend(settings: &Settings) -> Arc<dyn DialogueBackend> {
    if !settings.llm.enabled {
        tracing::info!("LLM disabled by configuration; using mock dialogue backend");
        return Arc::new(MockDialogueBackend);
    }

    let Some(api_key) = settings.llm.api_key.clone().filter(|k| !k.is_empty()) else {
        tracing::warn!("LLM API key not configured; using mock dialogue backend");
        return Arc::new(MockDialogueBackend);
    };

    let config = GeminiConfig {
        endpoint: settings.llm.endpoint.clone(),
        api_key,
        model: settings.llm.model.clone(),
        temperature: settings.llm.temperature,
        timeout: Duration::from_secs(settings.llm.timeout_secs),
    };
    match GeminiBackend::new(config) {
        Ok(backend) => {
            tracing::info!(model = %settings.llm.model, "Live dialogue backend configured");
            Arc::new(backend)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to create live backend; using mock");
            Arc::new(MockDialogueBackend)
        }
    }
}

/// Initialize tracing with env-filter and optional JSON output
fn init_tracing(settings: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &settings.observability.log_level;
        format!("loanmate={level},tower_http=info").into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if settings.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    subscriber.with(fmt_layer).init();
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

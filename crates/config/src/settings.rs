//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::ConfigError;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerSettings,

    /// Customer directory configuration
    #[serde(default)]
    pub directory: DirectorySettings,

    /// Language model configuration
    #[serde(default)]
    pub llm: LlmSettings,

    /// Speech provider (STT/TTS) configuration
    #[serde(default)]
    pub speech: SpeechSettings,

    /// Call session configuration
    #[serde(default)]
    pub agent: AgentSettings,

    /// Logging configuration
    #[serde(default)]
    pub observability: ObservabilitySettings,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// Enforce the configured CORS origin list
    #[serde(default)]
    pub cors_enabled: bool,
    /// Allowed CORS origins when enforcement is on
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: default_port(),
            cors_enabled: false,
            cors_origins: Vec::new(),
        }
    }
}

/// Customer directory settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectorySettings {
    /// Path to the collections dataset
    #[serde(default = "default_data_file")]
    pub data_file: String,
}

fn default_data_file() -> String {
    "cleaned_data.csv".to_string()
}

impl Default for DirectorySettings {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
        }
    }
}

/// Language model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Use the live backend; false forces the deterministic mock
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// API endpoint base URL
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,
    /// API key; absent also forces the mock backend
    #[serde(default)]
    pub api_key: Option<String>,
    /// Model name
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_llm_endpoint() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_llm_model() -> String {
    "gemini-1.5-flash-latest".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            endpoint: default_llm_endpoint(),
            api_key: None,
            model: default_llm_model(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Speech provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechSettings {
    /// Provider endpoint base URL
    #[serde(default = "default_speech_endpoint")]
    pub endpoint: String,
    /// Provider API key; the service cannot speak without one
    #[serde(default)]
    pub api_key: Option<String>,
    /// Transcription model
    #[serde(default = "default_stt_model")]
    pub stt_model: String,
    /// Synthesis voice model
    #[serde(default = "default_tts_model")]
    pub tts_model: String,
    /// Transcription language tag
    #[serde(default = "default_language")]
    pub language: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_speech_endpoint() -> String {
    "https://api.deepgram.com".to_string()
}

fn default_stt_model() -> String {
    "nova-2".to_string()
}

fn default_tts_model() -> String {
    "aura-asteria-en".to_string()
}

fn default_language() -> String {
    "en-US".to_string()
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            endpoint: default_speech_endpoint(),
            api_key: None,
            stt_model: default_stt_model(),
            tts_model: default_tts_model(),
            language: default_language(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Call session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Conversation history bound, in turn-pairs
    #[serde(default = "default_max_history_turns")]
    pub max_history_turns: usize,
}

fn default_max_history_turns() -> usize {
    10
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_history_turns: default_max_history_turns(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilitySettings {
    /// Log level filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit JSON-formatted log lines
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilitySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

impl Settings {
    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port must be non-zero".to_string(),
            });
        }

        if self.agent.max_history_turns == 0 {
            return Err(ConfigError::InvalidValue {
                field: "agent.max_history_turns".to_string(),
                message: "History bound must be at least one turn-pair".to_string(),
            });
        }

        if self.llm.timeout_secs == 0 || self.speech.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeout_secs".to_string(),
                message: "Adapter timeouts must be non-zero".to_string(),
            });
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "llm.temperature".to_string(),
                message: format!("Must be between 0.0 and 2.0, got {}", self.llm.temperature),
            });
        }

        Ok(())
    }
}

/// Load settings from config files and environment
///
/// Priority: env vars > `config/{env}.yaml` > `config/default.yaml` >
/// built-in defaults. Missing files are skipped, not errors.
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from("config", env)
}

/// Load settings from an explicit config directory (used by tests)
pub fn load_settings_from(config_dir: &str, env: Option<&str>) -> Result<Settings, ConfigError> {
    let dir = Path::new(config_dir);

    let mut builder = Config::builder()
        .add_source(File::from(dir.join("default.yaml")).required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::from(dir.join(format!("{env_name}.yaml"))).required(false));
    }

    let config = builder
        .add_source(Environment::with_prefix("LOANMATE").separator("__"))
        .build()?;

    let settings: Settings = config.try_deserialize()?;
    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8000);
        assert_eq!(settings.agent.max_history_turns, 10);
        assert!(settings.llm.enabled);
        assert!(settings.llm.api_key.is_none());
        settings.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_zero_history() {
        let mut settings = Settings::default();
        settings.agent.max_history_turns = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_temperature() {
        let mut settings = Settings::default();
        settings.llm.temperature = 3.5;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_from_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("default.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "server:\n  port: 9100\nagent:\n  max_history_turns: 4\n"
        )
        .unwrap();

        let settings = load_settings_from(dir.path().to_str().unwrap(), None).unwrap();
        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.agent.max_history_turns, 4);
        // Untouched sections keep defaults
        assert_eq!(settings.speech.stt_model, "nova-2");
    }

    #[test]
    fn test_missing_files_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings_from(dir.path().to_str().unwrap(), Some("prod")).unwrap();
        assert_eq!(settings.server.port, 8000);
    }
}

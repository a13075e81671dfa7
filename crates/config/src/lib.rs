//! Configuration management for the LoanMate collections agent
//!
//! Settings are layered: built-in defaults, then `config/default.yaml`,
//! then `config/{env}.yaml`, then `LOANMATE__*` environment variables.

mod settings;

pub use settings::{
    load_settings, AgentSettings, DirectorySettings, LlmSettings, ObservabilitySettings,
    ServerSettings, Settings, SpeechSettings,
};

use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

use thiserror::Error;

/// Main error type for the supervisor
#[derive(Error, Debug)]
pub enum LinkwatchError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Watched connection errors
    #[error("Connection error: {0}")]
    Connection(String),

    // Recovery sequencing errors
    #[error("Recovery step '{step}' failed: {reason}")]
    RecoveryStep { step: &'static str, reason: String },

    // Operator notification errors
    #[error("Notification error: {0}")]
    Notification(String),

    // Persistence errors
    #[error("Persistence error: {0}")]
    Persistence(String),

    // State errors
    #[error("Invalid state: {0}")]
    InvalidState(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for LinkwatchError
pub type Result<T> = std::result::Result<T, LinkwatchError>;

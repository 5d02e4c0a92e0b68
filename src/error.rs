use thiserror::Error;

/// Application-wide result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// I/O errors from the terminal or log/config files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Terminal initialization or rendering errors.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Transport-level HTTP failures talking to the backend.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response bodies that are not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The backend answered but reported a failure.
    #[error("Backend error: {0}")]
    Backend(String),

    /// Invalid configuration or logging setup.
    #[error("Config error: {0}")]
    Config(String),
}

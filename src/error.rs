use thiserror::Error;

/// Main error type for the predictor
#[derive(Error, Debug)]
pub enum TippError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to fetch {url}: HTTP {status}")]
    FetchStatus { status: u16, url: String },

    // Authentication errors
    #[error("Authentication error: {0}")]
    Auth(String),

    // Page structure errors
    #[error("Extraction error: {0}")]
    Extraction(String),

    // Prompt template errors
    #[error("Template error: {0}")]
    Template(String),

    // Language model errors
    #[error("LLM error: {0}")]
    Llm(String),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for TippError
pub type Result<T> = std::result::Result<T, TippError>;

impl TippError {
    /// Shorthand for page-structure failures.
    pub fn extraction(msg: impl Into<String>) -> Self {
        TippError::Extraction(msg.into())
    }
}

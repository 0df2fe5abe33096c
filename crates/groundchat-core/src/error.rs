use thiserror::Error;

/// Whether a failure should stop startup or only the request that hit it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Upstream,
}

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Missing API key. Set GEMINI_API_KEY or GOOGLE_API_KEY.")]
    MissingApiKey,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Gemini API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl ChatError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ChatError::MissingApiKey | ChatError::Config(_) => ErrorKind::Configuration,
            ChatError::Http(_)
            | ChatError::Json(_)
            | ChatError::Api { .. }
            | ChatError::MalformedResponse(_) => ErrorKind::Upstream,
        }
    }

    pub fn is_configuration(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;

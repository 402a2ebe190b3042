use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcureError {
    /// The backend could not be reached or the connection dropped
    #[error("Transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-success status
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ProcureError {
    /// Message suitable for showing to the user as-is
    pub fn user_message(&self) -> String {
        match self {
            ProcureError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ProcureError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProcureError::Decode(err.to_string())
        } else {
            ProcureError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ProcureError {
    fn from(err: serde_json::Error) -> Self {
        ProcureError::Decode(err.to_string())
    }
}

impl From<std::io::Error> for ProcureError {
    fn from(err: std::io::Error) -> Self {
        ProcureError::Storage(err.to_string())
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for ProcureError {
    fn from(err: sqlx::Error) -> Self {
        ProcureError::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ProcureError>;

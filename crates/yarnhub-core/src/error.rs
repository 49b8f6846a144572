use thiserror::Error;

#[derive(Debug, Error)]
pub enum YarnhubError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl YarnhubError {
    /// Short error code string, stable across releases.
    pub fn code(&self) -> &'static str {
        match self {
            YarnhubError::Config(_) => "CONFIG_ERROR",
            YarnhubError::Validation(_) => "VALIDATION_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, YarnhubError>;

//! Error types for the dayplan client.

use thiserror::Error;

/// Errors that can occur in dayplan operations.
///
/// `Network` and `Validation` are user-facing: the stores turn them into the
/// dismissible error notice. `DataIntegrity` never reaches the user; it is
/// logged and the offending item is skipped.
#[derive(Error, Debug)]
pub enum DayplanError {
    #[error("{0}")]
    Network(String),

    #[error("{0}")]
    Validation(String),

    #[error("Data integrity: {0}")]
    DataIntegrity(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DayplanError {
    /// Message shown in the error banner.
    pub fn notice_message(&self) -> String {
        self.to_string()
    }

    /// Whether this error should be surfaced to the user.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, DayplanError::DataIntegrity(_))
    }
}

/// Result type alias for dayplan operations.
pub type DayplanResult<T> = Result<T, DayplanError>;

//! Calibration loading error types.

use thiserror::Error;

/// Result type for calibration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Calibration loading error types.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Malformed JSON document.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A table does not have the expected shape.
    #[error("{table}.{axis}: {detail}")]
    ShapeError {
        table: &'static str,
        axis: &'static str,
        detail: String,
    },

    /// Core library error.
    #[error("core error: {0}")]
    CoreError(#[from] tpcparam_core::Error),
}

impl From<Error> for tpcparam_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::CoreError(inner) => inner,
            other => tpcparam_core::Error::Calibration(other.to_string()),
        }
    }
}

use crate::domain::call::CallMethod;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PaymentError>;

/// Errors raised locally, before or around a gateway round trip.
///
/// A gateway error response is not a `PaymentError`: it is recorded on the
/// orchestrator and reported as a failed operation.
#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Missing {0}")]
    MissingField(&'static str),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Operation already performed on this transaction")]
    OperationAlreadyPerformed,
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Malformed {method} response: {reason}")]
    MalformedResponse { method: CallMethod, reason: String },
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

use tessa_ocr::{InputError, OcrError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PoolError {
    /// The engine rejected the request. Only this request is affected.
    #[error("engine error: {0}")]
    Engine(#[from] OcrError),
    #[error("pool closed")]
    Closed,
    #[error("invalid request: {0}")]
    Configuration(#[from] InputError),
    #[error("pool ceiling must be at least 1")]
    InvalidCeiling,
    #[error("cancelled")]
    Cancelled,
    #[error("worker task failed: {0}")]
    Join(String),
}

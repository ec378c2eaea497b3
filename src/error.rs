use crate::domain::order::OrderId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrderError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Order not found: {0}")]
    NotFound(OrderId),
    #[error("Payment backend error: {0}")]
    BackendError(String),
    #[error("Payment initiation failed for order {order_id}: {reason}")]
    InitiationFailed { order_id: OrderId, reason: String },
    #[error("Store error: {0}")]
    StoreError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl OrderError {
    /// Whether the failure came from an external payment backend, so the caller may retry
    /// the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::BackendError(_) | Self::InitiationFailed { .. })
    }
}

impl From<reqwest::Error> for OrderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::BackendError("payment backend timed out".to_string())
        } else if e.is_decode() {
            Self::BackendError("payment backend returned an unexpected payload".to_string())
        } else {
            Self::BackendError(e.to_string())
        }
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for OrderError {
    fn from(e: rocksdb::Error) -> Self {
        Self::StoreError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, OrderError>;

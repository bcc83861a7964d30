use thiserror::Error;

pub type TrackerResult<T> = Result<T, TrackerError>;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Record store error: {0}")]
    Store(#[from] StoreError),

    #[error("Statistics provider error: {0}")]
    Provider(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Failures at the record-store boundary. A store failure isolates to the
/// campaign being written; it never aborts the rest of a tick.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Campaign {0} not found")]
    NotFound(uuid::Uuid),

    #[error("Store request failed: {0}")]
    Request(String),

    #[error("Store returned malformed data: {0}")]
    Malformed(String),
}

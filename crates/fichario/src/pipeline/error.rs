use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Acquisition failed: {0}")]
    Acquire(#[from] crate::error::AcquireError),

    #[error("Storage failed: {0}")]
    Storage(#[from] crate::error::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Failed to serialize extraction result: {0}")]
    Serialize(#[from] serde_json::Error),
}

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FicharioError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Acquisition error: {0}")]
    Acquire(#[from] AcquireError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] crate::pipeline::PipelineError),

    #[error("Preset not found: {0}")]
    PresetNotFound(i64),

    #[error("Invalid preset: {0}")]
    InvalidPreset(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Invalid extraction pattern for field '{field}': {reason}")]
    InvalidPattern { field: String, reason: String },
}

/// Errors from the text acquisition stage. All variants are fatal for the
/// current processing attempt; the document transitions to `failed`.
#[derive(Error, Debug)]
pub enum AcquireError {
    #[error("No text could be extracted from the document")]
    NoTextExtracted,

    /// OCR dependencies are missing or the engine failed to initialize.
    /// This is a deployment problem, not a property of the document.
    #[error("OCR unavailable, missing: {}", missing.join(", "))]
    OcrUnavailable { missing: Vec<String> },

    #[error("Failed to render page {page}: {reason}")]
    Render { page: u32, reason: String },

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("Processing exceeded the time budget of {budget_secs}s")]
    TimedOut { budget_secs: u64 },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File already exists: {0}")]
    FileExists(PathBuf),
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("File '{filename}' is not a PDF")]
    NotPdf { filename: String },

    #[error("File '{filename}' exceeds the size limit of {max_bytes} bytes")]
    TooLarge { filename: String, max_bytes: u64 },

    #[error("Too many files in one batch: {count} (max {max})")]
    TooMany { count: usize, max: usize },
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Worker channel closed unexpectedly")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, FicharioError>;

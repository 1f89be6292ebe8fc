pub mod acquire;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod logging;
pub mod pipeline;
pub mod search;
pub mod service;
pub mod storage;
pub mod worker;

pub use acquire::{Acquired, TextAcquirer};
pub use config::{load_config, Config, OcrConfig};
pub use error::{
    AcquireError, ConfigError, FicharioError, Result, StorageError, UploadError, WorkerError,
};
pub use extract::{DocumentFields, Field, FieldExtractor};
pub use pipeline::{Pipeline, PipelineError, ProcessOutcome, SkipReason};
pub use search::{normalize_for_match, split_terms, Preset, SearchDoc};
pub use service::{DocumentService, SearchHit, UploadFile};

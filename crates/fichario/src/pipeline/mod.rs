pub mod error;
pub mod events;
pub mod runner;

pub use error::PipelineError;
pub use events::ProcessingEvent;
pub use runner::{Pipeline, ProcessOutcome, SkipReason};

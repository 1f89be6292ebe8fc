//! Structured events recorded on a document's processing log.

use serde::{Deserialize, Serialize};

/// One entry in a document's ordered processing log. The log spans
/// processing attempts; each attempt appends to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProcessingEvent {
    UploadDocuments { at: String },
    ProcessDocumentStart { at: String, force_ocr: bool },
    OcrFallback { at: String },
    ExtractOk { at: String, field: String },
    ExtractMissing { at: String, field: String },
    ProcessDocumentDone { at: String, ocr_used: bool },
    ProcessFailed { at: String, message: String },
}

/// Deserializes a stored log column; unreadable history is dropped rather
/// than blocking a new attempt.
pub fn parse_log(json: &str) -> Vec<ProcessingEvent> {
    serde_json::from_str(json).unwrap_or_default()
}

pub fn serialize_log(events: &[ProcessingEvent]) -> Result<String, serde_json::Error> {
    serde_json::to_string(events)
}

//! The processing orchestrator.
//!
//! Drives acquisition, extraction and normalization for one document and
//! owns the status machine: `uploaded → processing → {processed, failed}`,
//! with reprocessing allowed from both terminal states.

use std::time::Duration;

use tracing::info_span;

use crate::acquire::{Acquired, TextAcquirer};
use crate::config::Config;
use crate::db::{document_repo, ClaimOutcome, Database, DocumentRow, ProcessedUpdate};
use crate::error::AcquireError;
use crate::extract::{Field, FieldExtractor};
use crate::search;
use crate::storage::FileStorage;

use super::error::PipelineError;
use super::events::{parse_log, serialize_log, ProcessingEvent};

pub struct Pipeline {
    acquirer: TextAcquirer,
    extractor: FieldExtractor,
    db: Database,
    storage: FileStorage,
    time_budget: Duration,
}

#[derive(Debug)]
pub enum ProcessOutcome {
    Processed {
        ocr_used: bool,
        fields_found: usize,
        fields_missing: usize,
    },
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyProcessing,
}

impl Pipeline {
    pub fn new(
        config: &Config,
        db: Database,
        storage: FileStorage,
    ) -> Result<Self, crate::error::ConfigError> {
        Ok(Self {
            acquirer: TextAcquirer::new(config.ocr.clone()),
            extractor: FieldExtractor::new()?,
            db,
            storage,
            time_budget: Duration::from_secs(config.processing.time_budget_secs),
        })
    }

    /// Processes one document end to end.
    ///
    /// A document already in `processing` is skipped, never worked twice.
    /// On failure the document lands in `failed` with the error message
    /// recorded; derived fields from an earlier successful run are kept.
    pub fn process(
        &self,
        document_id: &str,
        force_ocr: bool,
    ) -> Result<ProcessOutcome, PipelineError> {
        let _span = info_span!("pipeline", document_id = %document_id).entered();

        let row = match document_repo::claim(&self.db, document_id, &now())? {
            ClaimOutcome::Claimed(row) => row,
            ClaimOutcome::AlreadyProcessing => {
                tracing::info!(document_id, "skipped, already processing");
                return Ok(ProcessOutcome::Skipped(SkipReason::AlreadyProcessing));
            }
            ClaimOutcome::NotFound => {
                return Err(PipelineError::DocumentNotFound(document_id.to_string()));
            }
        };

        let mut log = parse_log(&row.processing_log);
        log.push(ProcessingEvent::ProcessDocumentStart {
            at: now(),
            force_ocr,
        });
        tracing::info!(event = "process_document_start", document_id, force_ocr);

        match self.run_attempt(&row, force_ocr, &mut log) {
            Ok(outcome) => {
                tracing::info!(event = "process_document_done", document_id);
                Ok(outcome)
            }
            Err(e) => {
                log.push(ProcessingEvent::ProcessFailed {
                    at: now(),
                    message: e.to_string(),
                });
                let log_json = serialize_log(&log).unwrap_or_else(|_| "[]".to_string());
                if let Err(db_err) = document_repo::mark_failed(
                    &self.db,
                    document_id,
                    &e.to_string(),
                    &log_json,
                    &now(),
                ) {
                    tracing::error!(document_id, "failed to record failure: {}", db_err);
                }

                // Missing OCR dependencies are an operator problem, not a
                // property of the document.
                if matches!(e, PipelineError::Acquire(AcquireError::OcrUnavailable { .. })) {
                    tracing::error!(document_id, "processing failed: {}", e);
                } else {
                    tracing::warn!(document_id, "processing failed: {}", e);
                }
                Err(e)
            }
        }
    }

    fn run_attempt(
        &self,
        row: &DocumentRow,
        force_ocr: bool,
        log: &mut Vec<ProcessingEvent>,
    ) -> Result<ProcessOutcome, PipelineError> {
        let bytes = {
            let _step = info_span!("read_original").entered();
            self.storage.read(&row.stored_path)?
        };

        let acquired = {
            let _step = info_span!("acquire_text").entered();
            self.acquire_with_budget(bytes, force_ocr)?
        };
        if acquired.ocr_used {
            log.push(ProcessingEvent::OcrFallback { at: now() });
            tracing::info!(event = "ocr_fallback", document_id = %row.id);
        }

        let fields = {
            let _step = info_span!("extract_fields").entered();
            self.extractor.extract(&acquired.text)
        };

        let mut fields_found = 0;
        let mut fields_missing = 0;
        for field in Field::ALL {
            if fields.is_set(field) {
                fields_found += 1;
                log.push(ProcessingEvent::ExtractOk {
                    at: now(),
                    field: field.name().to_string(),
                });
                tracing::info!(event = "extract_ok", document_id = %row.id, field = field.name());
            } else {
                fields_missing += 1;
                log.push(ProcessingEvent::ExtractMissing {
                    at: now(),
                    field: field.name().to_string(),
                });
                tracing::info!(event = "extract_missing", document_id = %row.id, field = field.name());
            }
        }

        let search_text = search::search_text(&acquired.text, &fields);
        let extracted_json = serde_json::to_string(&fields)?;

        log.push(ProcessingEvent::ProcessDocumentDone {
            at: now(),
            ocr_used: acquired.ocr_used,
        });

        let update = ProcessedUpdate {
            raw_text: acquired.text,
            extracted_json,
            search_text,
            ocr_used: acquired.ocr_used,
            age_years: fields.age_years,
            experience_years: fields.experience_years,
            contact_phone: fields.contact_phone.clone(),
            processing_log: serialize_log(log)?,
            now: now(),
        };
        document_repo::commit_processed(&self.db, &row.id, &update)?;

        Ok(ProcessOutcome::Processed {
            ocr_used: update.ocr_used,
            fields_found,
            fields_missing,
        })
    }

    /// Runs acquisition bounded by the configured time budget. A stuck OCR
    /// call times out instead of leaving the document in `processing`; the
    /// late result of a timed-out helper thread is simply dropped.
    fn acquire_with_budget(
        &self,
        bytes: Vec<u8>,
        force_ocr: bool,
    ) -> Result<Acquired, AcquireError> {
        if self.time_budget.is_zero() {
            return self.acquirer.acquire(&bytes, force_ocr);
        }

        let (tx, rx) = crossbeam_channel::bounded(1);
        let acquirer = self.acquirer.clone();
        std::thread::spawn(move || {
            let _ = tx.send(acquirer.acquire(&bytes, force_ocr));
        });

        match rx.recv_timeout(self.time_budget) {
            Ok(result) => result,
            Err(_) => Err(AcquireError::TimedOut {
                budget_secs: self.time_budget.as_secs(),
            }),
        }
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

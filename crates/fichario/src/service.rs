//! The surface exposed to outer layers (HTTP handlers, CLIs, schedulers):
//! upload, process, search and preset management. Everything here is thin
//! wiring over the pipeline, repositories and storage.

use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::db::{self, document_repo, preset_repo, Database, DocumentRow, DocumentStatus};
use crate::error::{FicharioError, Result, UploadError};
use crate::pipeline::{events, Pipeline, ProcessOutcome, ProcessingEvent};
use crate::search::{self, preset, Preset};
use crate::storage::FileStorage;
use crate::worker::{ProcessTask, WorkerPool};

/// One file in an upload batch.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// A search result: the matching document and a snippet of its normalized
/// text around the earliest term match.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub document_id: String,
    pub snippet: String,
}

const SEARCH_SNIPPET_LEN: usize = 120;

pub struct DocumentService {
    config: Config,
    db: Database,
    storage: FileStorage,
    pipeline: Arc<Pipeline>,
}

impl DocumentService {
    /// Opens (or creates) the database and storage tree from config.
    pub fn new(config: Config) -> Result<Self> {
        let db = Database::open(Path::new(&config.database_path))?;
        Self::with_database(config, db)
    }

    /// Builds a service over an existing database handle.
    pub fn with_database(config: Config, db: Database) -> Result<Self> {
        let storage = FileStorage::new(&config.storage_directory);
        let pipeline = Arc::new(Pipeline::new(&config, db.clone(), storage.clone())?);
        Ok(Self {
            config,
            db,
            storage,
            pipeline,
        })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Starts a background worker pool over this service's pipeline.
    pub fn start_workers(&self) -> WorkerPool {
        WorkerPool::new(Arc::clone(&self.pipeline), self.config.worker_count)
    }

    /// Validates and stores a batch of PDFs, inserting one `uploaded`
    /// document row per file. The whole batch is validated before anything
    /// is stored, so an invalid file rejects the batch without side effects.
    pub fn upload(&self, files: &[UploadFile]) -> Result<Vec<String>> {
        if files.len() > self.config.upload.max_batch {
            return Err(UploadError::TooMany {
                count: files.len(),
                max: self.config.upload.max_batch,
            }
            .into());
        }

        for file in files {
            validate_upload(file, self.config.upload.max_file_bytes)?;
        }

        let mut ids = Vec::with_capacity(files.len());
        for file in files {
            let stored_path = self.storage.store(&file.filename, &file.bytes)?;
            let now = chrono::Utc::now().to_rfc3339();
            let log = events::serialize_log(&[ProcessingEvent::UploadDocuments {
                at: now.clone(),
            }])
            .map_err(db::DatabaseError::Json)?;

            let row = DocumentRow {
                id: uuid::Uuid::new_v4().to_string(),
                filename: file.filename.clone(),
                stored_path,
                status: DocumentStatus::Uploaded.as_str().to_string(),
                raw_text: None,
                extracted_json: None,
                search_text: None,
                ocr_used: false,
                age_years: None,
                experience_years: None,
                contact_phone: None,
                processing_log: log,
                error: None,
                created_at: now.clone(),
                updated_at: now,
                processed_at: None,
            };
            document_repo::insert(&self.db, &row)?;
            ids.push(row.id);
        }

        tracing::info!(event = "upload_documents", count = ids.len());
        Ok(ids)
    }

    /// Processes a document inline.
    pub fn process(&self, document_id: &str, force_ocr: bool) -> Result<ProcessOutcome> {
        Ok(self.pipeline.process(document_id, force_ocr)?)
    }

    /// Enqueues a document for background processing.
    pub fn enqueue(&self, pool: &WorkerPool, document_id: &str, force_ocr: bool) -> Result<()> {
        let task = if force_ocr {
            ProcessTask::with_force_ocr(document_id)
        } else {
            ProcessTask::new(document_id)
        };
        pool.enqueue(task)?;
        Ok(())
    }

    pub fn get_document(&self, document_id: &str) -> Result<Option<DocumentRow>> {
        Ok(document_repo::find_by_id(&self.db, document_id)?)
    }

    /// Searches processed documents. Free-text phrase terms (`;`-separated,
    /// AND semantics) intersect with an optional preset's terms and ranges.
    pub fn search(
        &self,
        query: &str,
        owner: &str,
        preset_id: Option<i64>,
    ) -> Result<Vec<SearchHit>> {
        let terms = search::split_terms(query);

        let active_preset = match preset_id {
            Some(id) => {
                let loaded = preset_repo::find_by_id(&self.db, id)?
                    .filter(|p| p.owner == owner)
                    .ok_or(FicharioError::PresetNotFound(id))?;
                Some(loaded)
            }
            None => None,
        };

        let corpus = document_repo::search_corpus(&self.db)?;

        let hits: Vec<SearchHit> = corpus
            .iter()
            .filter(|doc| preset::matches_terms(doc, &terms))
            .filter(|doc| active_preset.as_ref().map_or(true, |p| p.matches(doc)))
            .map(|doc| {
                let snippet_terms: Vec<String> = if terms.is_empty() {
                    active_preset
                        .as_ref()
                        .map(|p| p.terms.iter().map(|t| search::normalize_for_match(t)).collect())
                        .unwrap_or_default()
                } else {
                    terms.clone()
                };
                SearchHit {
                    document_id: doc.id.clone(),
                    snippet: search::build_snippet(
                        &doc.search_text,
                        &snippet_terms,
                        SEARCH_SNIPPET_LEN,
                    ),
                }
            })
            .collect();

        tracing::info!(
            event = "documents_search",
            owner,
            query,
            preset = preset_id.unwrap_or(0),
            results = hits.len()
        );
        Ok(hits)
    }

    pub fn list_presets(&self, owner: &str) -> Result<Vec<Preset>> {
        Ok(preset_repo::list_by_owner(&self.db, owner)?)
    }

    /// Validates and saves a preset definition, returning its id.
    pub fn save_preset(&self, preset: Preset) -> Result<i64> {
        if preset.name.trim().is_empty() {
            return Err(FicharioError::InvalidPreset("name must not be empty".to_string()));
        }
        if preset.owner.trim().is_empty() {
            return Err(FicharioError::InvalidPreset("owner must not be empty".to_string()));
        }
        if let (Some(min), Some(max)) = (preset.age_min, preset.age_max) {
            if min > max {
                return Err(FicharioError::InvalidPreset(format!(
                    "age range [{}, {}] is inverted",
                    min, max
                )));
            }
        }
        if let (Some(min), Some(max)) = (preset.experience_min, preset.experience_max) {
            if min > max {
                return Err(FicharioError::InvalidPreset(format!(
                    "experience range [{}, {}] is inverted",
                    min, max
                )));
            }
        }

        Ok(preset_repo::insert(&self.db, &preset)?)
    }
}

fn validate_upload(file: &UploadFile, max_bytes: u64) -> std::result::Result<(), UploadError> {
    if file.bytes.len() as u64 > max_bytes {
        return Err(UploadError::TooLarge {
            filename: file.filename.clone(),
            max_bytes,
        });
    }

    let is_pdf_name = mime_guess::from_path(&file.filename)
        .first()
        .map(|m| m == mime_guess::mime::APPLICATION_PDF)
        .unwrap_or(false);
    let is_pdf_magic = file.bytes.starts_with(b"%PDF-");

    if !is_pdf_name || !is_pdf_magic {
        return Err(UploadError::NotPdf {
            filename: file.filename.clone(),
        });
    }

    Ok(())
}

//! Document repository: CRUD and the processing status transitions.
//!
//! The status machine is enforced here: `claim` is the only way into
//! `processing`, and `commit_processed` / `mark_failed` are the only ways
//! out. The commit writes every derived field in a single UPDATE so a
//! partially processed document can never be observed.

use rusqlite::{params, Row};

use crate::search::SearchDoc;

use super::{Database, DatabaseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentStatus {
    Uploaded,
    Processing,
    Processed,
    Failed,
}

impl DocumentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentStatus::Uploaded => "uploaded",
            DocumentStatus::Processing => "processing",
            DocumentStatus::Processed => "processed",
            DocumentStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "uploaded" => Some(DocumentStatus::Uploaded),
            "processing" => Some(DocumentStatus::Processing),
            "processed" => Some(DocumentStatus::Processed),
            "failed" => Some(DocumentStatus::Failed),
            _ => None,
        }
    }
}

/// A raw document row from the database.
#[derive(Debug, Clone)]
pub struct DocumentRow {
    pub id: String,
    pub filename: String,
    pub stored_path: String,
    pub status: String,
    pub raw_text: Option<String>,
    pub extracted_json: Option<String>,
    pub search_text: Option<String>,
    pub ocr_used: bool,
    pub age_years: Option<u32>,
    pub experience_years: Option<u32>,
    pub contact_phone: Option<String>,
    pub processing_log: String,
    pub error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub processed_at: Option<String>,
}

impl DocumentRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            filename: row.get("filename")?,
            stored_path: row.get("stored_path")?,
            status: row.get("status")?,
            raw_text: row.get("raw_text")?,
            extracted_json: row.get("extracted_json")?,
            search_text: row.get("search_text")?,
            ocr_used: row.get("ocr_used")?,
            age_years: row.get("age_years")?,
            experience_years: row.get("experience_years")?,
            contact_phone: row.get("contact_phone")?,
            processing_log: row.get("processing_log")?,
            error: row.get("error")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
            processed_at: row.get("processed_at")?,
        })
    }
}

/// Outcome of attempting to claim a document for processing.
#[derive(Debug)]
pub enum ClaimOutcome {
    Claimed(DocumentRow),
    AlreadyProcessing,
    NotFound,
}

/// Derived fields committed together when processing succeeds.
#[derive(Debug, Clone)]
pub struct ProcessedUpdate {
    pub raw_text: String,
    pub extracted_json: String,
    pub search_text: String,
    pub ocr_used: bool,
    pub age_years: Option<u32>,
    pub experience_years: Option<u32>,
    pub contact_phone: Option<String>,
    pub processing_log: String,
    pub now: String,
}

/// Inserts a freshly uploaded document row.
pub fn insert(db: &Database, doc: &DocumentRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO documents (id, filename, stored_path, status, raw_text, extracted_json,
             search_text, ocr_used, age_years, experience_years, contact_phone, processing_log,
             error, created_at, updated_at, processed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                doc.id,
                doc.filename,
                doc.stored_path,
                doc.status,
                doc.raw_text,
                doc.extracted_json,
                doc.search_text,
                doc.ocr_used,
                doc.age_years,
                doc.experience_years,
                doc.contact_phone,
                doc.processing_log,
                doc.error,
                doc.created_at,
                doc.updated_at,
                doc.processed_at,
            ],
        )?;
        Ok(())
    })
}

/// Finds a document by its ID.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<DocumentRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM documents WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], DocumentRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Atomically transitions a document into `processing`.
///
/// Reprocessing is allowed from any status except `processing` itself, so
/// two workers can never hold the same document. The claim deliberately
/// leaves `raw_text`/`extracted_json`/`search_text` untouched: a failed
/// attempt must not destroy the previous committed result.
pub fn claim(db: &Database, id: &str, now: &str) -> Result<ClaimOutcome, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE documents SET status = 'processing', error = NULL, updated_at = ?2
             WHERE id = ?1 AND status != 'processing'",
            params![id, now],
        )?;

        if changed == 0 {
            let exists: bool = conn.query_row(
                "SELECT COUNT(*) FROM documents WHERE id = ?1",
                params![id],
                |r| r.get::<_, u32>(0).map(|c| c > 0),
            )?;
            return Ok(if exists {
                ClaimOutcome::AlreadyProcessing
            } else {
                ClaimOutcome::NotFound
            });
        }

        let mut stmt = conn.prepare("SELECT * FROM documents WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], DocumentRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(ClaimOutcome::Claimed(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(ClaimOutcome::NotFound),
        }
    })
}

/// Marks a processing attempt as failed. Only status, error, log and
/// timestamps change; previously committed derived fields survive.
pub fn mark_failed(
    db: &Database,
    id: &str,
    error: &str,
    processing_log: &str,
    now: &str,
) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE documents SET status = 'failed', error = ?2, processing_log = ?3,
             processed_at = ?4, updated_at = ?4
             WHERE id = ?1",
            params![id, error, processing_log, now],
        )?;
        Ok(())
    })
}

/// Commits a successful processing result. All derived fields and the
/// status flip land in one UPDATE: either everything is written or nothing.
pub fn commit_processed(
    db: &Database,
    id: &str,
    update: &ProcessedUpdate,
) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE documents SET status = 'processed', raw_text = ?2, extracted_json = ?3,
             search_text = ?4, ocr_used = ?5, age_years = ?6, experience_years = ?7,
             contact_phone = ?8, processing_log = ?9, error = NULL,
             processed_at = ?10, updated_at = ?10
             WHERE id = ?1",
            params![
                id,
                update.raw_text,
                update.extracted_json,
                update.search_text,
                update.ocr_used,
                update.age_years,
                update.experience_years,
                update.contact_phone,
                update.processing_log,
                update.now,
            ],
        )?;
        Ok(())
    })
}

/// Loads the searchable snapshot of every processed document.
pub fn search_corpus(db: &Database) -> Result<Vec<SearchDoc>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id, search_text, age_years, experience_years FROM documents
             WHERE status = 'processed' AND search_text IS NOT NULL
             ORDER BY created_at, id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(SearchDoc {
                id: row.get(0)?,
                search_text: row.get(1)?,
                age_years: row.get(2)?,
                experience_years: row.get(3)?,
            })
        })?;

        let mut corpus = Vec::new();
        for row in rows {
            corpus.push(row?);
        }
        Ok(corpus)
    })
}

//! Test harness for isolated test execution.
//!
//! `TestHarness` provides a complete isolated environment: a temp directory
//! holding storage tree and database, a configured `DocumentService`, and
//! helpers to build and upload minimal in-memory PDFs.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use fichario::config::{Config, OcrConfig, ProcessingConfig, UploadConfig};
use fichario::{DocumentService, UploadFile};

pub struct TestHarness {
    temp_dir: TempDir,
    pub config: Config,
    pub service: DocumentService,
}

impl TestHarness {
    pub fn new() -> Self {
        fichario::logging::init_logging("warn");

        let temp_dir = TempDir::new().expect("Failed to create temp directory");

        let config = Config {
            storage_directory: temp_dir
                .path()
                .join("files")
                .to_string_lossy()
                .into_owned(),
            database_path: temp_dir
                .path()
                .join("fichario.db")
                .to_string_lossy()
                .into_owned(),
            worker_count: 1,
            // Short fixture texts should pass the native path.
            ocr: OcrConfig {
                min_text_chars: 10,
                ..OcrConfig::default()
            },
            processing: ProcessingConfig {
                time_budget_secs: 30,
            },
            upload: UploadConfig::default(),
        };

        let service = DocumentService::new(config.clone()).expect("Failed to build service");

        Self {
            temp_dir,
            config,
            service,
        }
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Uploads a single-page PDF with the given embedded text, returning the
    /// new document id.
    pub fn upload_pdf(&self, filename: &str, text: &str) -> String {
        let ids = self
            .service
            .upload(&[UploadFile {
                filename: filename.to_string(),
                bytes: pdf_with_text(text),
            }])
            .expect("upload failed");
        ids.into_iter().next().expect("one document id")
    }

    /// Uploads a PDF whose page has no content stream at all.
    pub fn upload_blank_pdf(&self, filename: &str) -> String {
        let ids = self
            .service
            .upload(&[UploadFile {
                filename: filename.to_string(),
                bytes: pdf_without_text(),
            }])
            .expect("upload failed");
        ids.into_iter().next().expect("one document id")
    }

    /// Absolute path of a document's stored original.
    pub fn stored_file_path(&self, document_id: &str) -> PathBuf {
        let row = self
            .service
            .get_document(document_id)
            .expect("get_document failed")
            .expect("document exists");
        Path::new(&self.config.storage_directory).join(row.stored_path)
    }
}

/// Builds a minimal single-page PDF with embedded text a native extractor
/// can read.
pub fn pdf_with_text(text: &str) -> Vec<u8> {
    use lopdf::{dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.new_object_id();
    let resources_id = doc.new_object_id();
    let content_id = doc.new_object_id();
    let page_id = doc.new_object_id();

    doc.objects.insert(
        font_id,
        Object::Dictionary(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        }),
    );
    doc.objects.insert(
        resources_id,
        Object::Dictionary(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        }),
    );

    let escaped = text
        .replace('\\', r"\\")
        .replace('(', r"\(")
        .replace(')', r"\)");
    let content = format!("BT /F1 12 Tf 50 700 Td ({}) Tj ET", escaped);
    doc.objects.insert(
        content_id,
        Object::Stream(Stream::new(dictionary! {}, content.into_bytes())),
    );

    doc.objects.insert(
        page_id,
        Object::Dictionary(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => resources_id,
            "Contents" => content_id,
        }),
    );
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("PDF serialization");
    bytes
}

/// Builds a single-page PDF with no text content.
pub fn pdf_without_text() -> Vec<u8> {
    use lopdf::{dictionary, Document, Object};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let page_id = doc.new_object_id();

    doc.objects.insert(
        page_id,
        Object::Dictionary(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("PDF serialization");
    bytes
}

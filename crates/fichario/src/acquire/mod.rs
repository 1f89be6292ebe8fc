//! Text acquisition: native PDF extraction with OCR fallback.
//!
//! This stage turns PDF bytes into plain text and reports whether OCR was
//! used. It never touches document state; the orchestrator owns status
//! transitions and logging.

pub mod ocr;
pub mod pdf;

pub use ocr::OcrEngine;

use crate::config::OcrConfig;
use crate::error::AcquireError;

/// Result of text acquisition for one document.
#[derive(Debug, Clone)]
pub struct Acquired {
    pub text: String,
    pub ocr_used: bool,
}

#[derive(Clone)]
pub struct TextAcquirer {
    ocr: OcrEngine,
    cfg: OcrConfig,
}

impl TextAcquirer {
    pub fn new(cfg: OcrConfig) -> Self {
        let ocr = OcrEngine::new(&cfg.languages, cfg.dpi);
        Self { ocr, cfg }
    }

    /// Extracts text from a PDF byte stream.
    ///
    /// Tries native extraction first; renders and OCRs every page when the
    /// native text is insufficient, the PDF is unparseable, or `force_ocr`
    /// is set. Fails with [`AcquireError::NoTextExtracted`] when neither
    /// path yields non-empty text.
    pub fn acquire(&self, pdf_bytes: &[u8], force_ocr: bool) -> Result<Acquired, AcquireError> {
        let _span = tracing::info_span!("acquire").entered();

        match lopdf::Document::load_mem(pdf_bytes) {
            Ok(doc) => {
                let native = pdf::native_text(&doc);
                if !force_ocr && !needs_ocr(&native, &self.cfg) {
                    return Ok(Acquired {
                        text: native,
                        ocr_used: false,
                    });
                }

                let page_count = doc.get_pages().len();
                let text = self.ocr_pages(pdf_bytes, page_count)?;
                finish(text, true)
            }
            Err(e) => {
                // lopdf can't parse this PDF (e.g. broken xref table).
                // Rendering via poppler handles more variants.
                tracing::warn!("lopdf failed to parse PDF: {}. Falling back to OCR.", e);
                let page_count = pdf::page_count(pdf_bytes)?;
                let text = self.ocr_pages(pdf_bytes, page_count)?;
                finish(text, true)
            }
        }
    }

    fn ocr_pages(&self, pdf_bytes: &[u8], page_count: usize) -> Result<String, AcquireError> {
        let _span = tracing::info_span!("acquire.ocr_pages", pages = page_count).entered();

        let mut all_text = String::new();

        for page_num in 1..=page_count {
            let image = match pdf::render_page(pdf_bytes, page_num as u32, self.ocr.dpi()) {
                Ok(image) => image,
                Err(e @ AcquireError::OcrUnavailable { .. }) => return Err(e),
                Err(e) => {
                    tracing::warn!(page = page_num, "page render failed: {}", e);
                    continue;
                }
            };

            match self.ocr.ocr_image(&image) {
                Ok(page_text) => {
                    all_text.push_str(&page_text);
                    all_text.push('\n');
                }
                Err(e @ AcquireError::OcrUnavailable { .. }) => return Err(e),
                Err(e) => {
                    tracing::warn!(page = page_num, "page OCR failed: {}", e);
                }
            }
        }

        Ok(all_text)
    }
}

/// Marker lopdf emits for CID fonts it cannot decode.
const IDENTITY_H_PATTERN: &str = "?Identity-H Unimplemented?";

/// Minimum length before the alphanumeric-ratio check applies; shorter text
/// is judged by the length threshold alone.
const RATIO_CHECK_FLOOR: usize = 50;

/// Whether native text is insufficient and the OCR fallback should run.
fn needs_ocr(text: &str, cfg: &OcrConfig) -> bool {
    let trimmed = text.trim();

    if trimmed.chars().count() < cfg.min_text_chars {
        return true;
    }

    // Only font-decode error markers left after cleanup counts as nothing.
    let cleaned = trimmed
        .replace(IDENTITY_H_PATTERN, "")
        .replace(['\n', ' '], "");
    if cleaned.is_empty() {
        return true;
    }

    let total_chars = trimmed.chars().count();
    let alphanumeric_chars = trimmed.chars().filter(|c| c.is_alphanumeric()).count();

    total_chars > RATIO_CHECK_FLOOR
        && alphanumeric_chars * 100 < total_chars * cfg.min_alphanumeric_percent
}

fn finish(text: String, ocr_used: bool) -> Result<Acquired, AcquireError> {
    if text.trim().is_empty() {
        return Err(AcquireError::NoTextExtracted);
    }
    Ok(Acquired { text, ocr_used })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> OcrConfig {
        OcrConfig::default()
    }

    #[test]
    fn test_needs_ocr_empty_and_short_text() {
        assert!(needs_ocr("", &cfg()));
        assert!(needs_ocr("   \n\t ", &cfg()));
        assert!(needs_ocr("curto", &cfg()));
    }

    #[test]
    fn test_needs_ocr_sufficient_text() {
        let text = "Vencimento: 10/05/2024 Valor: R$ 150,00 Cedente: Empresa";
        assert!(!needs_ocr(text, &cfg()));
    }

    #[test]
    fn test_needs_ocr_threshold_is_configurable() {
        let text = "Vencimento: 10/05/2024";
        assert!(!needs_ocr(
            text,
            &OcrConfig {
                min_text_chars: 10,
                ..OcrConfig::default()
            }
        ));
        assert!(needs_ocr(
            text,
            &OcrConfig {
                min_text_chars: 100,
                ..OcrConfig::default()
            }
        ));
    }

    #[test]
    fn test_needs_ocr_identity_h_markers_only() {
        let text = "?Identity-H Unimplemented? ?Identity-H Unimplemented? ?Identity-H Unimplemented?";
        assert!(needs_ocr(text, &cfg()));
    }

    #[test]
    fn test_needs_ocr_garbled_text() {
        let garbled = "!@#$%^&*(){}[]|\\:\";<>?,./~`!@#$%^&*(){}[]|\\:\";<>?,./~`!!";
        assert!(garbled.chars().count() > RATIO_CHECK_FLOOR);
        assert!(needs_ocr(garbled, &cfg()));
    }

    #[test]
    fn test_needs_ocr_accepts_unicode_text() {
        let text = "Relatório de gerência com conteúdo suficiente para análise";
        assert!(!needs_ocr(text, &cfg()));
    }

    #[test]
    fn test_acquire_native_path_skips_ocr() {
        let mut doc = pdf_fixture("Vencimento: 10/05/2024 Valor: R$ 150,00 Cedente: Empresa XYZ");
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();

        let acquirer = TextAcquirer::new(OcrConfig {
            min_text_chars: 10,
            ..OcrConfig::default()
        });
        let acquired = acquirer.acquire(&bytes, false).unwrap();

        assert!(!acquired.ocr_used);
        assert!(acquired.text.contains("Vencimento"));
    }

    fn pdf_fixture(text: &str) -> lopdf::Document {
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

        let escaped = text.replace('\\', r"\\").replace('(', r"\(").replace(')', r"\)");
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

        doc
    }
}

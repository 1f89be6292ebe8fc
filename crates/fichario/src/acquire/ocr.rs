//! Tesseract-backed OCR engine.

use std::io::Cursor;
use std::sync::Arc;

use crate::error::AcquireError;

#[derive(Clone)]
pub struct OcrEngine {
    inner: Arc<OcrEngineInner>,
}

struct OcrEngineInner {
    languages: String,
    dpi: u32,
}

impl OcrEngine {
    pub fn new(languages: &[String], dpi: u32) -> Self {
        let lang_str = if languages.is_empty() {
            "eng".to_string()
        } else {
            languages.join("+")
        };

        Self {
            inner: Arc::new(OcrEngineInner {
                languages: lang_str,
                dpi,
            }),
        }
    }

    pub fn dpi(&self) -> u32 {
        self.inner.dpi
    }

    pub fn languages(&self) -> &str {
        &self.inner.languages
    }

    /// Runs OCR over a rendered page image.
    pub fn ocr_image(&self, image_data: &[u8]) -> Result<String, AcquireError> {
        let _span = tracing::info_span!("acquire.ocr").entered();

        // Normalize whatever the renderer produced into PNG for Tesseract.
        let img = image::load_from_memory(image_data)
            .map_err(|e| AcquireError::OcrFailed(format!("Failed to load image: {}", e)))?;

        let mut png_data = Vec::new();
        let mut cursor = Cursor::new(&mut png_data);
        img.write_to(&mut cursor, image::ImageFormat::Png)
            .map_err(|e| AcquireError::OcrFailed(format!("Failed to convert image: {}", e)))?;

        // Init failure means the tesseract runtime or language data is not
        // installed; that is a deployment problem, not a document problem.
        let mut lt = leptess::LepTess::new(None, &self.inner.languages).map_err(|e| {
            AcquireError::OcrUnavailable {
                missing: vec![format!(
                    "tesseract ({}): {}",
                    self.inner.languages, e
                )],
            }
        })?;

        lt.set_image_from_mem(&png_data)
            .map_err(|e| AcquireError::OcrFailed(format!("Failed to set image for OCR: {}", e)))?;

        lt.get_utf8_text()
            .map_err(|e| AcquireError::OcrFailed(format!("OCR failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_languages_joined() {
        let engine = OcrEngine::new(&["por".to_string(), "eng".to_string()], 300);
        assert_eq!(engine.languages(), "por+eng");
        assert_eq!(engine.dpi(), 300);
    }

    #[test]
    fn test_empty_languages_default_to_eng() {
        let engine = OcrEngine::new(&[], 300);
        assert_eq!(engine.languages(), "eng");
    }

    #[test]
    fn test_invalid_image_data_error() {
        let engine = OcrEngine::new(&["eng".to_string()], 300);
        let result = engine.ocr_image(b"not valid image data");

        match result {
            Err(AcquireError::OcrFailed(msg)) => {
                assert!(msg.contains("Failed to load image"));
            }
            other => panic!("Expected OcrFailed, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_engine_clone_shares_settings() {
        let engine = OcrEngine::new(&["por".to_string()], 150);
        let cloned = engine.clone();
        assert_eq!(cloned.dpi(), 150);
        assert_eq!(cloned.languages(), "por");
    }
}

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root directory for stored original files.
    pub storage_directory: String,
    /// Path to the SQLite database file.
    pub database_path: String,
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub processing: ProcessingConfig,
    #[serde(default)]
    pub upload: UploadConfig,
}

fn default_worker_count() -> usize {
    num_cpus::get()
}

/// OCR settings passed explicitly into the acquisition stage so tests can
/// vary them per call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    #[serde(default = "default_dpi")]
    pub dpi: u32,
    /// Native text shorter than this (after trimming) triggers the OCR
    /// fallback.
    #[serde(default = "default_min_text_chars")]
    pub min_text_chars: usize,
    /// Native text whose alphanumeric ratio falls below this percentage is
    /// considered garbled and triggers the OCR fallback.
    #[serde(default = "default_min_alphanumeric_percent")]
    pub min_alphanumeric_percent: usize,
}

fn default_languages() -> Vec<String> {
    vec!["por".to_string(), "eng".to_string()]
}

fn default_dpi() -> u32 {
    300
}

fn default_min_text_chars() -> usize {
    32
}

fn default_min_alphanumeric_percent() -> usize {
    10
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            languages: default_languages(),
            dpi: default_dpi(),
            min_text_chars: default_min_text_chars(),
            min_alphanumeric_percent: default_min_alphanumeric_percent(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Per-document time budget for text acquisition, in seconds.
    /// 0 disables the budget.
    #[serde(default = "default_time_budget_secs")]
    pub time_budget_secs: u64,
}

fn default_time_budget_secs() -> u64 {
    120
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            time_budget_secs: default_time_budget_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
    #[serde(default = "default_max_batch")]
    pub max_batch: usize,
}

fn default_max_file_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_max_batch() -> usize {
    25
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: default_max_file_bytes(),
            max_batch: default_max_batch(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ocr_config_defaults() {
        let cfg = OcrConfig::default();
        assert_eq!(cfg.languages, vec!["por".to_string(), "eng".to_string()]);
        assert_eq!(cfg.dpi, 300);
        assert_eq!(cfg.min_text_chars, 32);
        assert_eq!(cfg.min_alphanumeric_percent, 10);
    }

    #[test]
    fn test_config_deserializes_with_section_defaults() {
        let json = r#"{
            "storage_directory": "/var/lib/fichario/files",
            "database_path": "/var/lib/fichario/fichario.db"
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.ocr.dpi, 300);
        assert_eq!(config.upload.max_batch, 25);
        assert_eq!(config.processing.time_budget_secs, 120);
        assert!(config.worker_count > 0);
    }

    #[test]
    fn test_partial_ocr_section_keeps_other_defaults() {
        let json = r#"{
            "storage_directory": "files",
            "database_path": "db.sqlite",
            "ocr": { "dpi": 150 }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.ocr.dpi, 150);
        assert_eq!(config.ocr.min_text_chars, 32);
    }
}

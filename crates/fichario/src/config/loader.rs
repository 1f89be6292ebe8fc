use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.storage_directory.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "storage_directory must not be empty".to_string(),
        });
    }

    if config.database_path.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "database_path must not be empty".to_string(),
        });
    }

    if config.worker_count == 0 {
        return Err(ConfigError::Validation {
            message: "worker_count must be at least 1".to_string(),
        });
    }

    if config.ocr.languages.is_empty() {
        return Err(ConfigError::Validation {
            message: "ocr.languages must contain at least one language".to_string(),
        });
    }

    if config.ocr.dpi == 0 {
        return Err(ConfigError::Validation {
            message: "ocr.dpi must be greater than 0".to_string(),
        });
    }

    if config.ocr.min_alphanumeric_percent > 100 {
        return Err(ConfigError::Validation {
            message: "ocr.min_alphanumeric_percent must be at most 100".to_string(),
        });
    }

    if config.upload.max_batch == 0 {
        return Err(ConfigError::Validation {
            message: "upload.max_batch must be at least 1".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_config(extra: &str) -> String {
        format!(
            r#"{{
                "storage_directory": "files",
                "database_path": "fichario.db"{}
            }}"#,
            extra
        )
    }

    #[test]
    fn test_load_minimal_config() {
        let config = load_config_from_str(&minimal_config("")).unwrap();
        assert_eq!(config.storage_directory, "files");
        assert_eq!(config.database_path, "fichario.db");
    }

    #[test]
    fn test_invalid_json_rejected() {
        let result = load_config_from_str("{not json");
        assert!(matches!(result, Err(ConfigError::ParseJson(_))));
    }

    #[test]
    fn test_zero_dpi_rejected() {
        let result = load_config_from_str(&minimal_config(r#", "ocr": { "dpi": 0 }"#));
        match result {
            Err(ConfigError::Validation { message }) => {
                assert!(message.contains("dpi"));
            }
            other => panic!("Expected validation error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_zero_workers_rejected() {
        let result = load_config_from_str(&minimal_config(r#", "worker_count": 0"#));
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_empty_languages_rejected() {
        let result = load_config_from_str(&minimal_config(r#", "ocr": { "languages": [] }"#));
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, minimal_config("")).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.database_path, "fichario.db");
    }

    #[test]
    fn test_missing_file_error() {
        let result = load_config("/nonexistent/config.json");
        assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
    }
}

//! Original-file storage.
//!
//! Uploaded PDFs are written once under a date-sharded tree and never
//! mutated afterwards; documents reference them by relative path.

use std::path::{Path, PathBuf};

use chrono::{Datelike, Utc};

use crate::error::StorageError;

#[derive(Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stores original file bytes, returning the relative path to keep on
    /// the document. Name collisions get a numeric suffix; creation uses
    /// `create_new` so two concurrent uploads can never share a file.
    pub fn store(&self, filename: &str, content: &[u8]) -> Result<String, StorageError> {
        let now = Utc::now();
        let relative_dir = PathBuf::from("documents")
            .join(format!("{:04}", now.year()))
            .join(format!("{:02}", now.month()))
            .join(format!("{:02}", now.day()));

        let dir_path = self.root.join(&relative_dir);
        std::fs::create_dir_all(&dir_path).map_err(|e| StorageError::CreateDirectory {
            path: dir_path.clone(),
            source: e,
        })?;

        let safe_name = sanitize_filename(filename);
        let (base, ext) = match safe_name.rfind('.') {
            Some(dot) => (&safe_name[..dot], &safe_name[dot..]),
            None => (safe_name.as_str(), ""),
        };

        for counter in 1..=1000 {
            let try_name = if counter == 1 {
                safe_name.clone()
            } else {
                format!("{}_{}{}", base, counter, ext)
            };
            let try_path = dir_path.join(&try_name);

            match std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&try_path)
            {
                Ok(mut file) => {
                    use std::io::Write;
                    file.write_all(content).map_err(|e| StorageError::WriteFile {
                        path: try_path.clone(),
                        source: e,
                    })?;
                    return Ok(relative_dir.join(try_name).to_string_lossy().into_owned());
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(StorageError::WriteFile {
                        path: try_path,
                        source: e,
                    })
                }
            }
        }

        Err(StorageError::FileExists(dir_path.join(safe_name)))
    }

    /// Reads original bytes back by the relative path stored on a document.
    pub fn read(&self, stored_path: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.root.join(stored_path);
        std::fs::read(&path).map_err(|e| StorageError::ReadFile { path, source: e })
    }
}

fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_matches(['_', '.']);
    if trimmed.is_empty() {
        "document.pdf".to_string()
    } else {
        trimmed.to_string()
    }
}

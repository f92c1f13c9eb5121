//! Per-model persisted result collections.
//!
//! One JSON file per model at `<root>/<provider>/<model>.json`, each an
//! array of `ResultRecord` sorted by question id. All writes go through
//! `merge::merge_on_write`, so saving is a read-modify-write merge rather
//! than a blind overwrite.

pub mod merge;

use crate::errors::StoreError;
use crate::model::{provider_of, ResultRecord};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ResultStore {
    root: PathBuf,
}

/// File-name-safe rendition of one path segment of a model id.
fn sanitize(segment: &str) -> String {
    segment
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '_' | '-' => c,
            _ => '-',
        })
        .collect()
}

impl ResultStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// On-disk location of a model's collection. The provider prefix of
    /// the model id becomes the subdirectory, `unknown` when absent.
    pub fn path_for(&self, model_id: &str) -> PathBuf {
        let provider = provider_of(model_id);
        let rest = model_id
            .split_once('/')
            .map(|(_, rest)| rest)
            .unwrap_or(model_id);
        self.root
            .join(sanitize(provider))
            .join(format!("{}.json", sanitize(rest)))
    }

    /// Load a model's prior results. A missing file is an empty collection.
    pub fn load(&self, model_id: &str) -> Result<Vec<ResultRecord>, StoreError> {
        let path = self.path_for(model_id);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StoreError::Read {
                    path: path.display().to_string(),
                    source: e,
                })
            }
        };
        serde_json::from_str(&raw).map_err(|e| StoreError::Parse {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Persist a model's collection by merging it into whatever is already
    /// on disk. An empty update against a non-empty file is skipped
    /// outright, leaving the bytes untouched.
    pub fn save(&self, model_id: &str, records: &[ResultRecord]) -> Result<(), StoreError> {
        let existing = self.load(model_id)?;
        if records.is_empty() && !existing.is_empty() {
            tracing::warn!(
                model = %model_id,
                existing = existing.len(),
                "skipping empty update against populated store"
            );
            return Ok(());
        }

        let merged = merge::merge_on_write(existing, records.to_vec());
        let path = self.path_for(model_id);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        let mut json = serde_json::to_string_pretty(&merged).map_err(|e| StoreError::Parse {
            path: path.display().to_string(),
            source: e,
        })?;
        json.push('\n');
        std::fs::write(&path, json).map_err(|e| StoreError::Write {
            path: path.display().to_string(),
            source: e,
        })?;
        tracing::debug!(model = %model_id, records = merged.len(), path = %path.display(), "saved results");
        Ok(())
    }

    /// Load every per-model collection under the store root. Only
    /// provider subdirectories are scanned, so the aggregate file at the
    /// root is never picked up.
    pub fn load_all(&self) -> Result<Vec<Vec<ResultRecord>>, StoreError> {
        let mut collections = Vec::new();
        let mut files = Vec::new();

        let providers = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(collections),
            Err(e) => {
                return Err(StoreError::Read {
                    path: self.root.display().to_string(),
                    source: e,
                })
            }
        };

        for provider in providers {
            let provider = provider.map_err(|e| StoreError::Read {
                path: self.root.display().to_string(),
                source: e,
            })?;
            let dir = provider.path();
            if !dir.is_dir() {
                continue;
            }
            let entries = std::fs::read_dir(&dir).map_err(|e| StoreError::Read {
                path: dir.display().to_string(),
                source: e,
            })?;
            for entry in entries {
                let entry = entry.map_err(|e| StoreError::Read {
                    path: dir.display().to_string(),
                    source: e,
                })?;
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) == Some("json") {
                    files.push(path);
                }
            }
        }

        // Deterministic aggregate input regardless of directory order.
        files.sort();
        for path in files {
            let raw = std::fs::read_to_string(&path).map_err(|e| StoreError::Read {
                path: path.display().to_string(),
                source: e,
            })?;
            let records: Vec<ResultRecord> =
                serde_json::from_str(&raw).map_err(|e| StoreError::Parse {
                    path: path.display().to_string(),
                    source: e,
                })?;
            collections.push(records);
        }
        Ok(collections)
    }
}

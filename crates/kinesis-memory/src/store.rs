//! Template persistence contract and its two stores.
//!
//! The core never cares where templates live.  It reads through
//! [`TemplateSource`] (load → list of entries, one per stored template) and
//! writes through [`TemplateSink`] (save one template).  Each loaded entry is
//! its own `Result`, so a single corrupt template never hides the rest.
//!
//! | Store | Backing |
//! |---|---|
//! | [`DirectoryStore`] | one `*.json` file per template in a directory |
//! | [`MemoryStore`] | JSON documents held in a `Vec` (tests, embedding) |

use std::fs;
use std::path::{Path, PathBuf};

use kinesis_types::KinesisError;
use thiserror::Error;
use tracing::debug;

use crate::database::{Template, TemplateRecord};

// ─────────────────────────────────────────────────────────────────────────────
// Contract
// ─────────────────────────────────────────────────────────────────────────────

/// One stored template as read from a source, before validation.
#[derive(Debug)]
pub struct SourceEntry {
    /// Human-readable location of the template (file name, key, …).
    pub origin: String,
    pub record: Result<TemplateRecord, KinesisError>,
}

/// Somewhere templates can be loaded from.
pub trait TemplateSource: Send + Sync {
    /// Short description used in logs.
    fn name(&self) -> String;

    /// Read every stored template.
    ///
    /// # Errors
    ///
    /// [`KinesisError::ResourceUnavailable`] when the source as a whole
    /// cannot be reached.  Per-template problems go into the entries.
    fn load(&self) -> Result<Vec<SourceEntry>, KinesisError>;
}

/// Somewhere templates can be saved to.
pub trait TemplateSink {
    fn save(&mut self, template: &Template) -> Result<(), KinesisError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Store errors
// ─────────────────────────────────────────────────────────────────────────────

/// Low-level failures inside a store, mapped onto [`KinesisError`] at the
/// contract boundary.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed template document: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl From<StoreError> for KinesisError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Io { .. } => KinesisError::ResourceUnavailable(err.to_string()),
            StoreError::Json(_) => KinesisError::InvalidInput(err.to_string()),
        }
    }
}

fn parse_record(raw: &str) -> Result<TemplateRecord, StoreError> {
    Ok(serde_json::from_str(raw)?)
}

// ─────────────────────────────────────────────────────────────────────────────
// DirectoryStore
// ─────────────────────────────────────────────────────────────────────────────

/// Directory of JSON template files.
///
/// Files are read in lexical name order so load order (and therefore the
/// recognizer's tie-break order) is stable across runs.  Non-`.json` files
/// are ignored.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn template_files(&self) -> Result<Vec<PathBuf>, StoreError> {
        let dir = fs::read_dir(&self.root).map_err(|e| StoreError::io(&self.root, e))?;
        let mut files = Vec::new();
        for entry in dir {
            let path = entry.map_err(|e| StoreError::io(&self.root, e))?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn read_record(path: &Path) -> Result<TemplateRecord, StoreError> {
        let raw = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
        parse_record(&raw)
    }
}

impl TemplateSource for DirectoryStore {
    fn name(&self) -> String {
        format!("dir:{}", self.root.display())
    }

    fn load(&self) -> Result<Vec<SourceEntry>, KinesisError> {
        let files = self.template_files()?;
        debug!(root = %self.root.display(), files = files.len(), "scanning template directory");
        Ok(files
            .into_iter()
            .map(|path| SourceEntry {
                origin: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string()),
                record: Self::read_record(&path).map_err(KinesisError::from),
            })
            .collect())
    }
}

impl TemplateSink for DirectoryStore {
    fn save(&mut self, template: &Template) -> Result<(), KinesisError> {
        fs::create_dir_all(&self.root).map_err(|e| StoreError::io(&self.root, e))?;
        let path = self
            .root
            .join(format!("{}-{}.json", template.label(), template.id()));
        let raw = serde_json::to_string_pretty(&template.to_record()).map_err(StoreError::from)?;
        fs::write(&path, raw).map_err(|e| StoreError::io(&path, e))?;
        debug!(path = %path.display(), "template saved");
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MemoryStore
// ─────────────────────────────────────────────────────────────────────────────

/// JSON documents kept in memory, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: Vec<(String, String)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a raw JSON document under `origin`.  The document is only parsed
    /// on [`TemplateSource::load`].
    pub fn insert_document(&mut self, origin: impl Into<String>, json: impl Into<String>) {
        self.documents.push((origin.into(), json.into()));
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl TemplateSource for MemoryStore {
    fn name(&self) -> String {
        format!("memory:{}", self.documents.len())
    }

    fn load(&self) -> Result<Vec<SourceEntry>, KinesisError> {
        Ok(self
            .documents
            .iter()
            .map(|(origin, raw)| SourceEntry {
                origin: origin.clone(),
                record: parse_record(raw).map_err(KinesisError::from),
            })
            .collect())
    }
}

impl TemplateSink for MemoryStore {
    fn save(&mut self, template: &Template) -> Result<(), KinesisError> {
        let raw = serde_json::to_string(&template.to_record()).map_err(StoreError::from)?;
        self.documents.push((template.id().to_string(), raw));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::TemplateDatabase;
    use kinesis_types::{GestureLabel, Joint, JointWeights, Pose, Sequence, Vec3};

    fn template(label: GestureLabel) -> Template {
        let frames: Sequence = (0..3)
            .map(|i| {
                Pose::new()
                    .with(Joint::HipCenter, Vec3::new(0.0, 0.9, 2.0))
                    .with(Joint::HandRight, Vec3::new(0.3, 0.9 + i as f32 * 0.2, 2.0))
            })
            .collect();
        Template::new(label, frames, JointWeights::only(&[Joint::HandRight])).unwrap()
    }

    #[test]
    fn directory_roundtrip() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let mut store = DirectoryStore::new(dir.path().join("templates"));
        store.save(&template(GestureLabel::BicepCurl)).unwrap();
        store.save(&template(GestureLabel::ShoulderPress)).unwrap();

        let entries = store.load().unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.record.is_ok()));
        // Lexical order: bicep_curl-… before shoulder_press-…
        assert!(entries[0].origin.starts_with("bicep_curl-"));
    }

    #[test]
    fn directory_with_three_valid_and_one_corrupt() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let mut store = DirectoryStore::new(dir.path());
        for label in [GestureLabel::Squat, GestureLabel::BicepCurl, GestureLabel::Lunge] {
            store.save(&template(label)).unwrap();
        }
        fs::write(dir.path().join("corrupt.json"), "{\"label\": \"squat\", \"frames\": [").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut db = TemplateDatabase::new();
        let report = db.load_from(&store).unwrap();
        assert_eq!(report.loaded, 3);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failures[0].origin, "corrupt.json");
        assert!(matches!(report.failures[0].reason, KinesisError::InvalidInput(_)));
    }

    #[test]
    fn missing_directory_is_resource_unavailable() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let store = DirectoryStore::new(dir.path().join("does-not-exist"));
        assert!(matches!(
            store.load(),
            Err(KinesisError::ResourceUnavailable(_))
        ));

        let mut db = TemplateDatabase::new();
        assert!(db.load_from(&store).is_err());
        assert!(db.is_empty());
    }

    #[test]
    fn memory_store_keeps_insertion_order() {
        let mut store = MemoryStore::new();
        store.save(&template(GestureLabel::Squat)).unwrap();
        store.save(&template(GestureLabel::Lunge)).unwrap();
        assert_eq!(store.len(), 2);

        let labels: Vec<GestureLabel> = store
            .load()
            .unwrap()
            .into_iter()
            .map(|e| e.record.unwrap().label)
            .collect();
        assert_eq!(labels, vec![GestureLabel::Squat, GestureLabel::Lunge]);
    }

    #[test]
    fn saved_document_is_readable_json() {
        let mut store = MemoryStore::new();
        store.save(&template(GestureLabel::Squat)).unwrap();
        let raw = &store.documents[0].1;
        let value: serde_json::Value = serde_json::from_str(raw).unwrap();
        assert_eq!(value["label"], "squat");
        assert_eq!(value["weights"]["HandRight"], 1.0);
        assert_eq!(value["frames"].as_array().unwrap().len(), 3);
    }
}

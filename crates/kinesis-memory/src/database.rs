//! Template Database.
//!
//! In-memory collection of labelled reference gestures.  Templates are kept
//! in insertion order, which is also the tie-break order used by the
//! recognizer, and each one carries a [`Uuid`] so two templates with the
//! same content remain distinct instances.
//!
//! # Example
//!
//! ```rust
//! use kinesis_memory::database::TemplateDatabase;
//! use kinesis_types::{GestureLabel, Joint, JointWeights, Pose, Sequence, Vec3};
//!
//! let mut db = TemplateDatabase::new();
//! let frames = Sequence::from(vec![Pose::new().with(Joint::HipCenter, Vec3::ZERO)]);
//! let id = db.add(GestureLabel::Squat, frames, JointWeights::uniform(1.0)).unwrap();
//!
//! assert_eq!(db.get(id).unwrap().label(), GestureLabel::Squat);
//! assert_eq!(db.remove_label(GestureLabel::Squat).unwrap(), 1);
//! assert!(db.is_empty());
//! ```

use kinesis_types::{GestureLabel, JointWeights, KinesisError, Sequence};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::store::{TemplateSink, TemplateSource};

// ─────────────────────────────────────────────────────────────────────────────
// Template
// ─────────────────────────────────────────────────────────────────────────────

/// A validated reference gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    id: Uuid,
    label: GestureLabel,
    sequence: Sequence,
    weights: JointWeights,
}

impl Template {
    /// Validate and build a template with a fresh id.
    ///
    /// # Errors
    ///
    /// [`KinesisError::InvalidInput`] when the label is
    /// [`GestureLabel::Unknown`], the sequence is empty, or the weights are
    /// unusable.
    pub fn new(
        label: GestureLabel,
        sequence: Sequence,
        weights: JointWeights,
    ) -> Result<Self, KinesisError> {
        if !label.is_known() {
            return Err(KinesisError::InvalidInput(
                "templates cannot be labelled 'unknown'".to_string(),
            ));
        }
        sequence.ensure_non_empty("template")?;
        weights.validate()?;
        Ok(Self {
            id: Uuid::new_v4(),
            label,
            sequence,
            weights,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn label(&self) -> GestureLabel {
        self.label
    }

    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    pub fn weights(&self) -> &JointWeights {
        &self.weights
    }

    /// The persisted form of this template.
    pub fn to_record(&self) -> TemplateRecord {
        TemplateRecord {
            label: self.label,
            weights: self.weights.clone(),
            frames: self.sequence.clone(),
        }
    }
}

/// On-disk / on-wire form of a template.  Identity is not persisted; a
/// fresh id is assigned each time a record is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateRecord {
    pub label: GestureLabel,
    pub weights: JointWeights,
    pub frames: Sequence,
}

impl TryFrom<TemplateRecord> for Template {
    type Error = KinesisError;

    fn try_from(record: TemplateRecord) -> Result<Self, Self::Error> {
        Template::new(record.label, record.frames, record.weights)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LoadReport
// ─────────────────────────────────────────────────────────────────────────────

/// One template that could not be loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadFailure {
    /// Where the template came from (file name, document key, …).
    pub origin: String,
    pub reason: KinesisError,
}

/// Outcome of a bulk load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: usize,
    pub failures: Vec<LoadFailure>,
}

// ─────────────────────────────────────────────────────────────────────────────
// TemplateDatabase
// ─────────────────────────────────────────────────────────────────────────────

/// Ordered collection of [`Template`]s.
#[derive(Debug, Clone, Default)]
pub struct TemplateDatabase {
    templates: Vec<Template>,
}

impl TemplateDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an already-validated template and return its id.
    pub fn insert(&mut self, template: Template) -> Uuid {
        let id = template.id();
        debug!(%id, label = %template.label(), frames = template.sequence().len(), "template stored");
        self.templates.push(template);
        id
    }

    /// Validate and store a new template.  No content-based deduplication is
    /// performed: adding the same frames twice yields two templates.
    pub fn add(
        &mut self,
        label: GestureLabel,
        sequence: Sequence,
        weights: JointWeights,
    ) -> Result<Uuid, KinesisError> {
        Ok(self.insert(Template::new(label, sequence, weights)?))
    }

    /// Remove every template labelled `label`, returning how many were
    /// removed.
    ///
    /// # Errors
    ///
    /// [`KinesisError::NotFound`] when no template carries `label`.
    pub fn remove_label(&mut self, label: GestureLabel) -> Result<usize, KinesisError> {
        let before = self.templates.len();
        self.templates.retain(|t| t.label() != label);
        let removed = before - self.templates.len();
        if removed == 0 {
            return Err(KinesisError::NotFound(format!("no templates labelled '{label}'")));
        }
        info!(%label, removed, "templates removed");
        Ok(removed)
    }

    /// Remove a single template by id.
    ///
    /// # Errors
    ///
    /// [`KinesisError::NotFound`] when `id` is unknown.
    pub fn remove(&mut self, id: Uuid) -> Result<Template, KinesisError> {
        let pos = self
            .templates
            .iter()
            .position(|t| t.id() == id)
            .ok_or_else(|| KinesisError::NotFound(format!("template {id}")))?;
        Ok(self.templates.remove(pos))
    }

    pub fn get(&self, id: Uuid) -> Option<&Template> {
        self.templates.iter().find(|t| t.id() == id)
    }

    /// Templates in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Template> {
        self.templates.iter()
    }

    pub fn with_label(&self, label: GestureLabel) -> impl Iterator<Item = &Template> {
        self.templates.iter().filter(move |t| t.label() == label)
    }

    /// Distinct labels in first-seen order.
    pub fn labels(&self) -> Vec<GestureLabel> {
        let mut out: Vec<GestureLabel> = Vec::new();
        for t in &self.templates {
            if !out.contains(&t.label()) {
                out.push(t.label());
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn clear(&mut self) {
        self.templates.clear();
    }

    /// Move every template of `other` to the end of `self`, keeping order.
    pub fn append(&mut self, other: TemplateDatabase) {
        self.templates.extend(other.templates);
    }

    /// Bulk-load every template `source` provides.
    ///
    /// A corrupt or invalid entry is skipped and recorded in the report; only
    /// an unreachable source fails the whole call.
    ///
    /// # Errors
    ///
    /// [`KinesisError::ResourceUnavailable`] (or whatever the source reports)
    /// when the source itself cannot be read.
    pub fn load_from(&mut self, source: &dyn TemplateSource) -> Result<LoadReport, KinesisError> {
        let entries = source.load()?;
        let mut report = LoadReport::default();

        for entry in entries {
            match entry.record.and_then(Template::try_from) {
                Ok(template) => {
                    self.insert(template);
                    report.loaded += 1;
                }
                Err(reason) => {
                    warn!(origin = %entry.origin, error = %reason, "skipping template");
                    report.skipped += 1;
                    report.failures.push(LoadFailure {
                        origin: entry.origin,
                        reason,
                    });
                }
            }
        }

        info!(
            source = %source.name(),
            loaded = report.loaded,
            skipped = report.skipped,
            "templates loaded"
        );
        Ok(report)
    }

    /// Save every template to `sink`, returning how many were written.
    pub fn export_to(&self, sink: &mut dyn TemplateSink) -> Result<usize, KinesisError> {
        for template in &self.templates {
            sink.save(template)?;
        }
        Ok(self.templates.len())
    }
}

impl<'a> IntoIterator for &'a TemplateDatabase {
    type Item = &'a Template;
    type IntoIter = std::slice::Iter<'a, Template>;

    fn into_iter(self) -> Self::IntoIter {
        self.templates.iter()
    }
}

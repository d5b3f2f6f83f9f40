//! [`GestureRecognizer`] – nearest-template gesture matching.
//!
//! For every stored template the recognizer normalises both the captured
//! input and the template against the reference joint, aligns them with
//! DTW using the template's joint weights, and reports the template with
//! the smallest alignment cost.  Ties go to the template loaded first.
//!
//! # Concurrency
//!
//! The database sits behind a `RwLock<Arc<TemplateDatabase>>`.  A match
//! clones the `Arc` and works on that snapshot without holding the lock, so
//! adding, removing or loading templates never waits for a running match and
//! never changes what that match sees.  Writers copy the database on write
//! when a snapshot is still alive.
//!
//! # Example
//!
//! ```rust
//! use kinesis_runtime::recognizer::GestureRecognizer;
//! use kinesis_types::{GestureLabel, Joint, JointWeights, Pose, Sequence, Vec3};
//!
//! let pose = |y: f32| Pose::new()
//!     .with(Joint::HipCenter, Vec3::ZERO)
//!     .with(Joint::HandRight, Vec3::new(0.3, y, 0.0));
//! let curl = Sequence::from(vec![pose(0.0), pose(0.3), pose(0.6)]);
//!
//! let recognizer = GestureRecognizer::default();
//! recognizer
//!     .add_template(GestureLabel::BicepCurl, curl.clone(), JointWeights::only(&[Joint::HandRight]))
//!     .unwrap();
//!
//! let result = recognizer.match_sequence(&curl).unwrap();
//! assert_eq!(result.label, GestureLabel::BicepCurl);
//! assert_eq!(result.distance, 0.0);
//! ```

use std::sync::{Arc, PoisonError, RwLock};

use chrono::Utc;
use kinesis_memory::{LoadReport, Template, TemplateDatabase, TemplateSink, TemplateSource};
use kinesis_perception::{DEFAULT_REFERENCE_JOINT, normalize_sequence, sequence_distance};
use kinesis_types::{GestureLabel, Joint, JointWeights, KinesisError, MatchResult, Sequence};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ─────────────────────────────────────────────────────────────────────────────
// GestureRecognizer
// ─────────────────────────────────────────────────────────────────────────────

/// Template store plus matching entry point.  Share it behind an [`Arc`].
#[derive(Debug)]
pub struct GestureRecognizer {
    database: RwLock<Arc<TemplateDatabase>>,
    reference: Joint,
}

impl Default for GestureRecognizer {
    fn default() -> Self {
        Self::new(DEFAULT_REFERENCE_JOINT)
    }
}

impl GestureRecognizer {
    /// Empty recognizer that normalises against `reference`.
    pub fn new(reference: Joint) -> Self {
        Self::with_database(TemplateDatabase::new(), reference)
    }

    pub fn with_database(database: TemplateDatabase, reference: Joint) -> Self {
        Self {
            database: RwLock::new(Arc::new(database)),
            reference,
        }
    }

    pub fn reference_joint(&self) -> Joint {
        self.reference
    }

    /// A consistent, immutable view of the current templates.
    pub fn snapshot(&self) -> Arc<TemplateDatabase> {
        let guard = self.database.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    fn modify<R>(&self, f: impl FnOnce(&mut TemplateDatabase) -> R) -> R {
        let mut guard = self.database.write().unwrap_or_else(PoisonError::into_inner);
        f(Arc::make_mut(&mut guard))
    }

    // -------------------------------------------------------------------------
    // Template management
    // -------------------------------------------------------------------------

    /// Validate and store a template.  Identical content added twice yields
    /// two distinct templates.
    pub fn add_template(
        &self,
        label: GestureLabel,
        sequence: Sequence,
        weights: JointWeights,
    ) -> Result<Uuid, KinesisError> {
        let template = Template::new(label, sequence, weights)?;
        Ok(self.modify(|db| db.insert(template)))
    }

    /// Remove every template labelled `label`.
    ///
    /// # Errors
    ///
    /// [`KinesisError::NotFound`] when no template carries the label.
    pub fn remove_template(&self, label: GestureLabel) -> Result<usize, KinesisError> {
        self.modify(|db| db.remove_label(label))
    }

    /// Remove a single template by id.
    pub fn remove_template_by_id(&self, id: Uuid) -> Result<(), KinesisError> {
        self.modify(|db| db.remove(id)).map(|_| ())
    }

    /// Bulk-load templates from `source`, appending them after the existing
    /// ones.  Source I/O happens before the write lock is taken.
    pub fn load_templates(&self, source: &dyn TemplateSource) -> Result<LoadReport, KinesisError> {
        let mut staged = TemplateDatabase::new();
        let report = staged.load_from(source)?;
        self.modify(|db| db.append(staged));
        Ok(report)
    }

    /// Save every current template to `sink`.
    pub fn export_templates(&self, sink: &mut dyn TemplateSink) -> Result<usize, KinesisError> {
        self.snapshot().export_to(sink)
    }

    pub fn template_count(&self) -> usize {
        self.snapshot().len()
    }

    pub fn labels(&self) -> Vec<GestureLabel> {
        self.snapshot().labels()
    }

    // -------------------------------------------------------------------------
    // Matching
    // -------------------------------------------------------------------------

    /// Find the template closest to `input`.
    ///
    /// This is `O(templates × m × n)`; call it off the frame-delivery thread.
    ///
    /// # Errors
    ///
    /// [`KinesisError::InvalidInput`] when no templates are loaded, the
    /// input is empty or lacks the reference joint, or no template could be
    /// compared with it.
    pub fn match_sequence(&self, input: &Sequence) -> Result<MatchResult, KinesisError> {
        recognize(&self.snapshot(), input, self.reference)
    }
}

/// Core matching loop over a fixed database snapshot.
#[instrument(skip_all, fields(frames = input.len(), templates = database.len()))]
pub fn recognize(
    database: &TemplateDatabase,
    input: &Sequence,
    reference: Joint,
) -> Result<MatchResult, KinesisError> {
    if database.is_empty() {
        return Err(KinesisError::InvalidInput("no templates loaded".to_string()));
    }
    input.ensure_non_empty("input")?;
    let normalized = normalize_sequence(input, reference)?;

    let mut best: Option<(&Template, f32)> = None;
    let mut compared = 0usize;

    for template in database {
        let distance = normalize_sequence(template.sequence(), reference)
            .and_then(|t| sequence_distance(&normalized, &t, template.weights()));
        let distance = match distance {
            Ok(d) if d.is_finite() => d,
            Ok(d) => {
                warn!(id = %template.id(), distance = d, "non-finite distance; template skipped");
                continue;
            }
            Err(e) => {
                warn!(id = %template.id(), label = %template.label(), error = %e, "template skipped");
                continue;
            }
        };
        compared += 1;
        debug!(label = %template.label(), distance, "template compared");

        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((template, distance));
        }
    }

    let (template, distance) = best.ok_or_else(|| {
        KinesisError::InvalidInput("no template could be compared with the input".to_string())
    })?;

    info!(label = %template.label(), distance, compared, "gesture matched");
    Ok(MatchResult {
        template_id: template.id(),
        label: template.label(),
        distance,
        templates_compared: compared,
        completed_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinesis_memory::MemoryStore;
    use kinesis_types::{Pose, Vec3};

    /// A pose standing at `origin` with the right hand `lift` above the hip.
    fn pose_at(origin: Vec3, lift: f32) -> Pose {
        Pose::new()
            .with(Joint::HipCenter, origin)
            .with(Joint::HandRight, origin + Vec3::new(0.3, lift, 0.0))
            .with(Joint::HandLeft, origin + Vec3::new(-0.3, 0.0, 0.0))
    }

    fn motion(lifts: &[f32]) -> Sequence {
        lifts.iter().map(|&l| pose_at(Vec3::ZERO, l)).collect()
    }

    fn uniform() -> JointWeights {
        JointWeights::only(&[Joint::HipCenter, Joint::HandRight, Joint::HandLeft])
    }

    #[test]
    fn empty_database_is_invalid_input() {
        let r = GestureRecognizer::default();
        let err = r.match_sequence(&motion(&[0.0])).unwrap_err();
        assert_eq!(err, KinesisError::InvalidInput("no templates loaded".to_string()));
    }

    #[test]
    fn empty_input_is_rejected() {
        let r = GestureRecognizer::default();
        r.add_template(GestureLabel::Squat, motion(&[0.0]), uniform()).unwrap();
        assert!(matches!(
            r.match_sequence(&Sequence::new()),
            Err(KinesisError::InvalidInput(_))
        ));
    }

    #[test]
    fn identical_input_matches_with_zero_distance() {
        let r = GestureRecognizer::default();
        let squat = motion(&[0.0, 0.4]);
        r.add_template(GestureLabel::Squat, squat.clone(), uniform()).unwrap();

        let result = r.match_sequence(&squat).unwrap();
        assert_eq!(result.label, GestureLabel::Squat);
        assert!(result.distance.abs() < 1e-6);
        assert_eq!(result.templates_compared, 1);
    }

    #[test]
    fn match_is_translation_invariant() {
        let r = GestureRecognizer::default();
        r.add_template(GestureLabel::BicepCurl, motion(&[0.0, 0.2, 0.4]), uniform())
            .unwrap();

        let shifted: Sequence = [0.0, 0.2, 0.4]
            .iter()
            .map(|&l| pose_at(Vec3::new(1.5, -0.2, 3.0), l))
            .collect();
        let result = r.match_sequence(&shifted).unwrap();
        assert!(result.distance.abs() < 1e-5);
    }

    #[test]
    fn closest_template_wins() {
        let r = GestureRecognizer::default();
        r.add_template(GestureLabel::Squat, motion(&[1.0, 1.0]), uniform()).unwrap();
        let curl = r
            .add_template(GestureLabel::BicepCurl, motion(&[0.5, 0.5, 0.6, 0.5, 0.5]), uniform())
            .unwrap();

        let result = r.match_sequence(&motion(&[0.0, 0.1, 0.0])).unwrap();
        assert_eq!(result.label, GestureLabel::BicepCurl);
        assert_eq!(result.template_id, curl);
        assert_eq!(result.templates_compared, 2);
    }

    #[test]
    fn exact_tie_goes_to_first_loaded() {
        let r = GestureRecognizer::default();
        let first = r
            .add_template(GestureLabel::ShoulderPress, motion(&[0.5]), uniform())
            .unwrap();
        r.add_template(GestureLabel::LateralRaise, motion(&[0.5]), uniform())
            .unwrap();

        let result = r.match_sequence(&motion(&[0.1, 0.2])).unwrap();
        assert_eq!(result.template_id, first);
        assert_eq!(result.label, GestureLabel::ShoulderPress);
    }

    #[test]
    fn returns_computed_distance_not_zero() {
        let r = GestureRecognizer::default();
        r.add_template(GestureLabel::Squat, motion(&[0.0]), JointWeights::only(&[Joint::HandRight]))
            .unwrap();
        let result = r.match_sequence(&motion(&[0.5])).unwrap();
        assert!((result.distance - 0.5).abs() < 1e-6);
    }

    #[test]
    fn input_without_reference_joint_is_invalid() {
        let r = GestureRecognizer::default();
        r.add_template(GestureLabel::Squat, motion(&[0.0]), uniform()).unwrap();
        let input = Sequence::from(vec![Pose::new().with(Joint::HandRight, Vec3::ZERO)]);
        assert!(matches!(
            r.match_sequence(&input),
            Err(KinesisError::InvalidInput(_))
        ));
    }

    #[test]
    fn incomparable_templates_are_skipped() {
        let r = GestureRecognizer::default();
        r.add_template(GestureLabel::Lunge, motion(&[0.0]), JointWeights::only(&[Joint::KneeLeft]))
            .unwrap();
        r.add_template(GestureLabel::Squat, motion(&[0.0]), uniform()).unwrap();

        let result = r.match_sequence(&motion(&[0.0])).unwrap();
        assert_eq!(result.label, GestureLabel::Squat);
        assert_eq!(result.templates_compared, 1);
    }

    #[test]
    fn nothing_comparable_is_invalid_input() {
        let r = GestureRecognizer::default();
        r.add_template(GestureLabel::Lunge, motion(&[0.0]), JointWeights::only(&[Joint::KneeLeft]))
            .unwrap();
        assert!(matches!(
            r.match_sequence(&motion(&[0.0])),
            Err(KinesisError::InvalidInput(_))
        ));
    }

    #[test]
    fn remove_template_reports_not_found_consistently() {
        let r = GestureRecognizer::default();
        r.add_template(GestureLabel::Squat, motion(&[0.0]), uniform()).unwrap();
        assert_eq!(r.remove_template(GestureLabel::Squat).unwrap(), 1);
        assert!(matches!(
            r.remove_template(GestureLabel::Squat),
            Err(KinesisError::NotFound(_))
        ));
        assert!(r.remove_template_by_id(Uuid::new_v4()).is_err());
    }

    #[test]
    fn snapshot_is_unaffected_by_later_writes() {
        let r = GestureRecognizer::default();
        r.add_template(GestureLabel::Squat, motion(&[0.0]), uniform()).unwrap();
        let before = r.snapshot();
        r.add_template(GestureLabel::Lunge, motion(&[0.0]), uniform()).unwrap();
        r.remove_template(GestureLabel::Squat).unwrap();

        assert_eq!(before.len(), 1);
        assert_eq!(before.labels(), vec![GestureLabel::Squat]);
        assert_eq!(r.labels(), vec![GestureLabel::Lunge]);
    }

    #[test]
    fn load_appends_after_existing_templates() {
        let seed = GestureRecognizer::default();
        seed.add_template(GestureLabel::Lunge, motion(&[0.0]), uniform()).unwrap();
        let mut store = MemoryStore::new();
        seed.export_templates(&mut store).unwrap();
        store.insert_document("junk", "[]");

        let r = GestureRecognizer::default();
        r.add_template(GestureLabel::Squat, motion(&[0.0]), uniform()).unwrap();
        let report = r.load_templates(&store).unwrap();

        assert_eq!((report.loaded, report.skipped), (1, 1));
        assert_eq!(r.labels(), vec![GestureLabel::Squat, GestureLabel::Lunge]);
    }
}

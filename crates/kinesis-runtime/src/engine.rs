//! [`MotionEngine`] – the surface the sensor adapter and UI talk to.
//!
//! The engine owns the per-frame state (motion assessor and capture session)
//! and shares the [`GestureRecognizer`] with background match tasks.  Every
//! frame goes through [`MotionEngine::submit_frame`] on the sensor thread and
//! costs `O(joints)`.  Completing a capture schedules one match on Tokio's
//! blocking pool; at most one match is in flight at a time.
//!
//! # Event flow
//!
//! | Trigger | Topic | Payload |
//! |---|---|---|
//! | every frame | [`Topic::Kinematics`] | [`EventPayload::Kinematics`] |
//! | match finished | [`Topic::Recognition`] | [`EventPayload::MatchCompleted`] / [`EventPayload::MatchFailed`] |
//! | capture abandoned | [`Topic::SystemAlerts`] | [`EventPayload::CaptureAborted`] |
//!
//! # Example
//!
//! ```rust,no_run
//! use kinesis_runtime::engine::{EngineConfig, MotionEngine};
//!
//! # async fn run() -> Result<(), kinesis_types::KinesisError> {
//! let mut engine = MotionEngine::new(EngineConfig::default())?;
//! let mut results = engine.subscribe_results();
//! engine.begin_capture()?;
//! // engine.submit_frame(&pose, timestamp) for each sensor frame …
//! engine.end_capture()?;
//! if let Some(event) = results.next().await {
//!     println!("{:?}", event.payload);
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use kinesis_memory::{LoadReport, TemplateSink, TemplateSource};
use kinesis_middleware::{EventBus, Topic, TopicReceiver};
use kinesis_perception::{DEFAULT_HISTORY_LEN, DEFAULT_REFERENCE_JOINT, MotionAssessor};
use kinesis_types::{
    EventPayload, GestureLabel, Joint, JointWeights, KinesisError, MatchResult, MeasurementUnit,
    Metric, Pose, Sequence, StatusSnapshot,
};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::recognizer::GestureRecognizer;
use crate::session::{CaptureSession, CaptureState, DEFAULT_MAX_CAPTURE_FRAMES};
use crate::single_flight::SingleFlight;

/// `source` field stamped on every event the engine publishes.
pub const SOURCE: &str = "kinesis-runtime::engine";

/// Handle to a scheduled match.  Awaiting it is optional; the outcome is
/// also published on [`Topic::Recognition`].
pub type MatchHandle = JoinHandle<Result<MatchResult, KinesisError>>;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration bundle for [`MotionEngine`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Joint every pose is translated against before matching.
    pub reference_joint: Joint,
    /// Positions kept per joint by the motion assessor.
    pub history_len: usize,
    /// Capture buffer bound; older frames are evicted beyond it.
    pub max_capture_frames: usize,
    /// Per-topic event bus capacity.
    pub event_capacity: usize,
    /// Measurement units active at startup.
    pub measurement_units: Vec<MeasurementUnit>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reference_joint: DEFAULT_REFERENCE_JOINT,
            history_len: DEFAULT_HISTORY_LEN,
            max_capture_frames: DEFAULT_MAX_CAPTURE_FRAMES,
            event_capacity: kinesis_middleware::DEFAULT_CAPACITY,
            measurement_units: vec![
                MeasurementUnit::new([Joint::HandRight, Joint::HandLeft], Metric::Speed),
                MeasurementUnit::new([Joint::HipCenter], Metric::Position),
            ],
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MotionEngine
// ─────────────────────────────────────────────────────────────────────────────

/// Frame intake, capture control and match scheduling in one place.
///
/// Methods that touch per-frame state take `&mut self` and are meant to be
/// called from the single thread delivering sensor frames.
pub struct MotionEngine {
    assessor: MotionAssessor,
    session: CaptureSession,
    recognizer: Arc<GestureRecognizer>,
    flight: SingleFlight,
    bus: EventBus,
    runtime: Handle,
}

impl MotionEngine {
    /// Build an engine bound to the current Tokio runtime.
    ///
    /// # Errors
    ///
    /// [`KinesisError::ResourceUnavailable`] when called outside a runtime.
    pub fn new(config: EngineConfig) -> Result<Self, KinesisError> {
        let runtime = Handle::try_current()
            .map_err(|e| KinesisError::ResourceUnavailable(format!("no tokio runtime: {e}")))?;
        Ok(Self::with_handle(config, runtime))
    }

    /// Build an engine that schedules matches on `runtime`.
    pub fn with_handle(config: EngineConfig, runtime: Handle) -> Self {
        let mut assessor = MotionAssessor::new(config.history_len);
        assessor.set_measurement_units(config.measurement_units);
        info!(
            reference = %config.reference_joint,
            history_len = config.history_len,
            max_capture_frames = config.max_capture_frames,
            "motion engine initialised"
        );
        Self {
            assessor,
            session: CaptureSession::new(config.max_capture_frames),
            recognizer: Arc::new(GestureRecognizer::new(config.reference_joint)),
            flight: SingleFlight::new("match"),
            bus: EventBus::new(config.event_capacity),
            runtime,
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Clone of the event bus for additional subscribers.
    pub fn bus(&self) -> EventBus {
        self.bus.clone()
    }

    pub fn recognizer(&self) -> Arc<GestureRecognizer> {
        Arc::clone(&self.recognizer)
    }

    pub fn capture_state(&self) -> CaptureState {
        self.session.state()
    }

    /// `true` while a match task holds the flight slot.
    pub fn is_matching(&self) -> bool {
        self.flight.is_busy()
    }

    /// Filtered view of the current joint state without a new frame.
    pub fn snapshot(&self) -> StatusSnapshot {
        self.assessor.snapshot()
    }

    /// Receiver for match outcomes.
    pub fn subscribe_results(&self) -> TopicReceiver {
        self.bus.subscribe_to(Topic::Recognition)
    }

    pub fn subscribe(&self, topic: Topic) -> TopicReceiver {
        self.bus.subscribe_to(topic)
    }

    // -------------------------------------------------------------------------
    // Frame intake
    // -------------------------------------------------------------------------

    /// Fold one sensor frame into the assessor, buffer it when a capture is
    /// running, and publish the resulting snapshot.
    pub fn submit_frame(&mut self, pose: &Pose, timestamp: f64) -> StatusSnapshot {
        let snapshot = self.assessor.update(pose, timestamp);
        self.session.record(pose);
        self.bus
            .emit(SOURCE, EventPayload::Kinematics(snapshot.clone()));
        snapshot
    }

    /// Replace the measurement units used to filter snapshots.
    pub fn set_measurement_units(&mut self, units: Vec<MeasurementUnit>) {
        self.assessor.set_measurement_units(units);
    }

    // -------------------------------------------------------------------------
    // Capture control
    // -------------------------------------------------------------------------

    pub fn begin_capture(&mut self) -> Result<(), KinesisError> {
        self.session.begin()
    }

    /// Finish the capture, schedule a match on it and return the captured
    /// sequence.
    ///
    /// A match that cannot be scheduled because another one is running is
    /// reported on [`Topic::Recognition`] as [`EventPayload::MatchFailed`];
    /// the capture itself still succeeds.
    ///
    /// # Errors
    ///
    /// [`KinesisError::InvalidInput`] when no capture is running or the
    /// capture holds no frames.  The latter also publishes
    /// [`EventPayload::CaptureAborted`].
    pub fn end_capture(&mut self) -> Result<Sequence, KinesisError> {
        self.complete_capture().map(|(sequence, _)| sequence)
    }

    /// Like [`end_capture`](Self::end_capture), but also hands back the
    /// handle of the match scheduled for this capture, or `None` when the
    /// match was rejected.  Awaiting the handle yields this capture's result
    /// and no other.
    pub fn complete_capture(
        &mut self,
    ) -> Result<(Sequence, Option<MatchHandle>), KinesisError> {
        let was_capturing = self.session.is_capturing();
        let sequence = match self.session.end() {
            Ok(sequence) => sequence,
            Err(err) => {
                if was_capturing {
                    self.publish_abort(0, &err.to_string());
                }
                return Err(err);
            }
        };

        match self.request_match(sequence.clone()) {
            Ok(handle) => Ok((sequence, Some(handle))),
            Err(err) => {
                warn!(%err, "captured gesture not matched");
                self.bus.emit(SOURCE, EventPayload::MatchFailed(err));
                Ok((sequence, None))
            }
        }
    }

    /// Discard the running capture without matching.  Returns the number of
    /// frames dropped.
    pub fn abort_capture(&mut self) -> usize {
        self.abort_with_reason("capture aborted")
    }

    /// The sensor went away: abandon any capture and forget joint history so
    /// the first frame after reconnection does not produce a speed spike.
    pub fn sensor_disconnected(&mut self) {
        warn!("sensor disconnected");
        self.abort_with_reason("sensor disconnected");
        self.assessor.reset();
    }

    fn abort_with_reason(&mut self, reason: &str) -> usize {
        if !self.session.is_capturing() {
            return 0;
        }
        let dropped = self.session.abort();
        self.publish_abort(dropped, reason);
        dropped
    }

    fn publish_abort(&self, frames_discarded: usize, reason: &str) {
        self.bus.emit(
            SOURCE,
            EventPayload::CaptureAborted {
                frames_discarded,
                reason: reason.to_string(),
            },
        );
    }

    // -------------------------------------------------------------------------
    // Matching
    // -------------------------------------------------------------------------

    /// Schedule a match of `sequence` on the blocking pool.
    ///
    /// # Errors
    ///
    /// [`KinesisError::ConcurrentOperationRejected`] while another match is
    /// in flight.
    pub fn request_match(&self, sequence: Sequence) -> Result<MatchHandle, KinesisError> {
        let permit = self.flight.try_acquire()?;
        let recognizer = Arc::clone(&self.recognizer);
        let bus = self.bus.clone();
        info!(frames = sequence.len(), "match scheduled");

        Ok(self.runtime.spawn_blocking(move || {
            let outcome = recognizer.match_sequence(&sequence);
            drop(permit);
            match &outcome {
                Ok(result) => {
                    info!(label = %result.label, distance = result.distance, "match completed");
                    bus.emit(SOURCE, EventPayload::MatchCompleted(result.clone()));
                }
                Err(err) => {
                    warn!(%err, "match failed");
                    bus.emit(SOURCE, EventPayload::MatchFailed(err.clone()));
                }
            }
            outcome
        }))
    }

    // -------------------------------------------------------------------------
    // Templates
    // -------------------------------------------------------------------------

    pub fn load_templates(&self, source: &dyn TemplateSource) -> Result<LoadReport, KinesisError> {
        self.recognizer.load_templates(source)
    }

    pub fn add_template(
        &self,
        label: GestureLabel,
        sequence: Sequence,
        weights: JointWeights,
    ) -> Result<Uuid, KinesisError> {
        self.recognizer.add_template(label, sequence, weights)
    }

    pub fn remove_template(&self, label: GestureLabel) -> Result<usize, KinesisError> {
        self.recognizer.remove_template(label)
    }

    pub fn export_templates(&self, sink: &mut dyn TemplateSink) -> Result<usize, KinesisError> {
        self.recognizer.export_templates(sink)
    }
}

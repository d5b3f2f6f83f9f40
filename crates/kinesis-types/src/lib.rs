//! `kinesis-types` – shared vocabulary for the kinesis motion engine.
//!
//! Skeleton frames, gesture labels, kinematic snapshots, bus events and the
//! common [`KinesisError`] all live here so every other crate speaks the same
//! types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod error;
pub mod gesture;
pub mod joint;
pub mod pose;
pub mod status;

pub use error::KinesisError;
pub use gesture::{GestureLabel, MatchResult};
pub use joint::{Joint, JointSample, TrackingState, Vec3};
pub use pose::{JointWeights, Pose, Sequence};
pub use status::{JointReading, MeasurementUnit, Metric, StatusSnapshot};

/// Unified event wrapper for the engine's event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// e.g., "kinesis-runtime::engine"
    pub source: String,
    pub payload: EventPayload,
}

impl Event {
    /// Wrap `payload` with a fresh id and the current time.
    pub fn new(source: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: source.into(),
            payload,
        }
    }
}

/// Variants of data that can be routed over the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    /// Per-frame joint status, filtered by the active measurement units.
    Kinematics(StatusSnapshot),
    /// A scheduled match finished successfully.
    MatchCompleted(MatchResult),
    /// A scheduled match could not produce a result.
    MatchFailed(KinesisError),
    /// A capture was abandoned and its frames discarded.
    CaptureAborted {
        frames_discarded: usize,
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gesture_label_roundtrip() {
        let label = GestureLabel::ShoulderPress;
        let json = serde_json::to_string(&label).unwrap();
        assert_eq!(json, "\"shoulder_press\"");
        let back: GestureLabel = serde_json::from_str(&json).unwrap();
        assert_eq!(label, back);
    }

    #[test]
    fn gesture_label_parses_from_display() {
        for label in GestureLabel::KNOWN {
            let parsed: GestureLabel = label.to_string().parse().unwrap();
            assert_eq!(parsed, label);
        }
        assert!("jumping_jack".parse::<GestureLabel>().is_err());
        assert!(!GestureLabel::Unknown.is_known());
    }

    #[test]
    fn match_completed_event_roundtrip() {
        let event = Event::new(
            "kinesis-runtime::engine",
            EventPayload::MatchCompleted(MatchResult {
                template_id: Uuid::new_v4(),
                label: GestureLabel::Squat,
                distance: 0.25,
                templates_compared: 3,
                completed_at: Utc::now(),
            }),
        );
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(event.id, back.id);
        match back.payload {
            EventPayload::MatchCompleted(r) => {
                assert_eq!(r.label, GestureLabel::Squat);
                assert!((r.distance - 0.25).abs() < f32::EPSILON);
            }
            _ => panic!("unexpected variant"),
        }
    }

    #[test]
    fn kinematics_event_roundtrip() {
        let snapshot = StatusSnapshot {
            timestamp: 1.5,
            readings: vec![JointReading {
                joint: Joint::HandRight,
                position: None,
                velocity: None,
                speed: Some(0.8),
            }],
        };
        let json = serde_json::to_string(&EventPayload::Kinematics(snapshot.clone())).unwrap();
        assert!(!json.contains("position"));
        let back: EventPayload = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, EventPayload::Kinematics(s) if s == snapshot));
    }

    #[test]
    fn kinesis_error_display() {
        let err = KinesisError::NotFound("squat".to_string());
        assert!(err.to_string().contains("Not found"));

        let err2 = KinesisError::ConcurrentOperationRejected("match in flight".to_string());
        assert!(err2.to_string().contains("match in flight"));
    }
}

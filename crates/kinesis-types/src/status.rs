use serde::{Deserialize, Serialize};

use crate::joint::{Joint, Vec3};

/// Kinematic quantity a consumer wants surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Position,
    Velocity,
    Speed,
}

/// A (joint subset, metric) selection supplied by the UI layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementUnit {
    pub joints: Vec<Joint>,
    pub metric: Metric,
}

impl MeasurementUnit {
    pub fn new(joints: impl Into<Vec<Joint>>, metric: Metric) -> Self {
        Self {
            joints: joints.into(),
            metric,
        }
    }
}

/// The surfaced state of one joint.  Only the metrics selected by the active
/// measurement units are filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointReading {
    pub joint: Joint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
}

/// Read-only view of the motion assessor after a frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Sensor timestamp of the frame that produced this snapshot (seconds).
    pub timestamp: f64,
    /// Readings ordered by joint index.
    pub readings: Vec<JointReading>,
}

impl StatusSnapshot {
    pub fn reading(&self, joint: Joint) -> Option<&JointReading> {
        self.readings.iter().find(|r| r.joint == joint)
    }
}

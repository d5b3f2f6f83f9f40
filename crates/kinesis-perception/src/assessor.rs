//! Motion Assessor.
//!
//! Keeps a rolling kinematic record for every joint the sensor reports and
//! derives instantaneous velocity and speed from consecutive samples:
//!
//! ```text
//! v = (p_now − p_prev) / (t_now − t_prev)
//! speed = ‖v‖
//! ```
//!
//! Each joint keeps at most `history_len` recent positions in a ring buffer;
//! older samples are evicted so long sessions use constant memory.
//!
//! The assessor is cheap (`O(joint count)` per frame) and is meant to run
//! synchronously inside the sensor's frame callback.
//!
//! # Example
//!
//! ```rust
//! use kinesis_perception::assessor::MotionAssessor;
//! use kinesis_types::{Joint, MeasurementUnit, Metric, Pose, Vec3};
//!
//! let mut assessor = MotionAssessor::new(30);
//! assessor.set_measurement_units(vec![MeasurementUnit::new([Joint::HandRight], Metric::Speed)]);
//!
//! assessor.update(&Pose::new().with(Joint::HandRight, Vec3::ZERO), 0.0);
//! let snap = assessor.update(&Pose::new().with(Joint::HandRight, Vec3::new(0.1, 0.0, 0.0)), 0.1);
//!
//! let speed = snap.reading(Joint::HandRight).unwrap().speed.unwrap();
//! assert!((speed - 1.0).abs() < 1e-4);
//! ```

use std::collections::VecDeque;

use kinesis_types::{Joint, JointReading, MeasurementUnit, Metric, Pose, StatusSnapshot, Vec3};
use tracing::debug;

/// Default ring-buffer length per joint: one second of history at 30 Hz.
pub const DEFAULT_HISTORY_LEN: usize = 30;

// ────────────────────────────────────────────────────────────────────────────
// JointStatus
// ────────────────────────────────────────────────────────────────────────────

/// Rolling kinematic record for a single joint.
#[derive(Debug, Clone, PartialEq)]
pub struct JointStatus {
    /// Most recent positions, oldest first.  Never empty.
    history: VecDeque<Vec3>,
    velocity: Vec3,
    speed: f32,
    /// Sensor timestamp of the newest sample (seconds).
    last_update: f64,
}

impl JointStatus {
    fn new(position: Vec3, timestamp: f64, capacity: usize) -> Self {
        let mut history = VecDeque::with_capacity(capacity);
        history.push_back(position);
        Self {
            history,
            velocity: Vec3::ZERO,
            speed: 0.0,
            last_update: timestamp,
        }
    }

    /// Latest position.
    pub fn position(&self) -> Vec3 {
        self.history.back().copied().unwrap_or(Vec3::ZERO)
    }

    /// Retained positions, oldest first.
    pub fn history(&self) -> impl ExactSizeIterator<Item = &Vec3> {
        self.history.iter()
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn last_update(&self) -> f64 {
        self.last_update
    }
}

// ────────────────────────────────────────────────────────────────────────────
// MotionAssessor
// ────────────────────────────────────────────────────────────────────────────

/// Per-joint kinematic tracker with a measurement-unit filter on its output.
#[derive(Debug)]
pub struct MotionAssessor {
    statuses: [Option<JointStatus>; Joint::COUNT],
    history_len: usize,
    units: Vec<MeasurementUnit>,
    last_timestamp: f64,
}

impl MotionAssessor {
    /// Create an assessor that keeps `history_len` positions per joint
    /// (minimum 1).
    pub fn new(history_len: usize) -> Self {
        Self {
            statuses: Default::default(),
            history_len: history_len.max(1),
            units: Vec::new(),
            last_timestamp: 0.0,
        }
    }

    pub fn history_len(&self) -> usize {
        self.history_len
    }

    /// Replace the active measurement units.
    pub fn set_measurement_units(&mut self, units: Vec<MeasurementUnit>) {
        debug!(count = units.len(), "measurement units replaced");
        self.units = units;
    }

    pub fn measurement_units(&self) -> &[MeasurementUnit] {
        &self.units
    }

    /// Current record for `joint`, if it has ever been observed.
    pub fn status(&self, joint: Joint) -> Option<&JointStatus> {
        self.statuses[joint.index()].as_ref()
    }

    /// Fold one frame into the per-joint records and return the filtered
    /// snapshot.
    ///
    /// Joints absent from `pose` keep their previous record.  A sample whose
    /// timestamp does not advance past the joint's last update is ignored so
    /// duplicated or reordered frames cannot produce infinite speeds.  A
    /// non-finite timestamp drops the whole frame.
    pub fn update(&mut self, pose: &Pose, timestamp: f64) -> StatusSnapshot {
        if !timestamp.is_finite() {
            debug!(timestamp, "non-finite timestamp; frame ignored");
            return self.snapshot();
        }
        for (joint, position) in pose.iter() {
            let slot = &mut self.statuses[joint.index()];
            let Some(status) = slot.as_mut() else {
                *slot = Some(JointStatus::new(position, timestamp, self.history_len));
                continue;
            };

            let dt = timestamp - status.last_update;
            if dt.is_nan() || dt <= 0.0 {
                debug!(%joint, dt, "non-increasing timestamp; sample ignored");
                continue;
            }
            let delta = position - status.position();
            status.velocity = delta.scale((1.0 / dt) as f32);
            status.speed = status.velocity.length();
            status.last_update = timestamp;
            status.history.push_back(position);
            while status.history.len() > self.history_len {
                status.history.pop_front();
            }
        }
        self.last_timestamp = self.last_timestamp.max(timestamp);
        self.snapshot()
    }

    /// Read-only view of the current state, restricted to the joints and
    /// metrics selected by the active measurement units.  With no active
    /// units the snapshot is empty.
    pub fn snapshot(&self) -> StatusSnapshot {
        let mut selected = [[false; 3]; Joint::COUNT];
        for unit in &self.units {
            let slot = match unit.metric {
                Metric::Position => 0,
                Metric::Velocity => 1,
                Metric::Speed => 2,
            };
            for joint in &unit.joints {
                selected[joint.index()][slot] = true;
            }
        }

        let readings = Joint::ALL
            .iter()
            .filter_map(|&joint| {
                let [position, velocity, speed] = selected[joint.index()];
                if !(position || velocity || speed) {
                    return None;
                }
                let status = self.status(joint)?;
                Some(JointReading {
                    joint,
                    position: position.then(|| status.position()),
                    velocity: velocity.then(|| status.velocity()),
                    speed: speed.then(|| status.speed()),
                })
            })
            .collect();

        StatusSnapshot {
            timestamp: self.last_timestamp,
            readings,
        }
    }

    /// Forget every joint record.  Measurement units are kept.
    pub fn reset(&mut self) {
        self.statuses = Default::default();
        self.last_timestamp = 0.0;
    }
}

impl Default for MotionAssessor {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LEN)
    }
}

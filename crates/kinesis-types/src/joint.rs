//! Skeletal joint vocabulary.
//!
//! The sensor reports a fixed set of twenty joints per tracked body.  Every
//! joint has a stable dense index in `0..Joint::COUNT`, which lets per-joint
//! tables ([`Pose`][crate::Pose], [`JointWeights`][crate::JointWeights]) be
//! plain arrays instead of hash maps.

use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Joint
// ────────────────────────────────────────────────────────────────────────────

/// Identifier of a single skeletal joint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Joint {
    HipCenter,
    Spine,
    ShoulderCenter,
    Head,
    ShoulderLeft,
    ElbowLeft,
    WristLeft,
    HandLeft,
    ShoulderRight,
    ElbowRight,
    WristRight,
    HandRight,
    HipLeft,
    KneeLeft,
    AnkleLeft,
    FootLeft,
    HipRight,
    KneeRight,
    AnkleRight,
    FootRight,
}

impl Joint {
    /// Number of joints in a full skeleton.
    pub const COUNT: usize = 20;

    /// Every joint, in index order.
    pub const ALL: [Joint; Joint::COUNT] = [
        Joint::HipCenter,
        Joint::Spine,
        Joint::ShoulderCenter,
        Joint::Head,
        Joint::ShoulderLeft,
        Joint::ElbowLeft,
        Joint::WristLeft,
        Joint::HandLeft,
        Joint::ShoulderRight,
        Joint::ElbowRight,
        Joint::WristRight,
        Joint::HandRight,
        Joint::HipLeft,
        Joint::KneeLeft,
        Joint::AnkleLeft,
        Joint::FootLeft,
        Joint::HipRight,
        Joint::KneeRight,
        Joint::AnkleRight,
        Joint::FootRight,
    ];

    /// Dense index of this joint, in `0..Joint::COUNT`.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Inverse of [`Joint::index`].
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Vec3
// ────────────────────────────────────────────────────────────────────────────

/// A position or displacement in sensor space (metres).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Multiply every component by `k`.
    pub fn scale(self, k: f32) -> Self {
        Self::new(self.x * k, self.y * k, self.z * k)
    }

    /// Euclidean norm.
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Euclidean distance between two points.
    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Samples
// ────────────────────────────────────────────────────────────────────────────

/// Confidence the sensor attaches to a joint position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrackingState {
    /// Directly observed.
    #[default]
    Tracked,
    /// Estimated from neighbouring joints.
    Inferred,
    /// No usable position; treated as absent.
    NotTracked,
}

/// One joint's position in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointSample {
    pub position: Vec3,
    #[serde(default)]
    pub tracking: TrackingState,
}

impl JointSample {
    pub fn tracked(position: Vec3) -> Self {
        Self {
            position,
            tracking: TrackingState::Tracked,
        }
    }

    /// `true` unless the sensor flagged the joint as not tracked.
    pub fn is_usable(&self) -> bool {
        self.tracking != TrackingState::NotTracked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_roundtrips_for_every_joint() {
        for (i, joint) in Joint::ALL.iter().enumerate() {
            assert_eq!(joint.index(), i);
            assert_eq!(Joint::from_index(i), Some(*joint));
        }
        assert_eq!(Joint::from_index(Joint::COUNT), None);
    }

    #[test]
    fn vec3_distance_is_euclidean() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 6.0, 3.0);
        assert!((a.distance(b) - 5.0).abs() < 1e-6);
        assert!((b.distance(a) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn vec3_operators() {
        let a = Vec3::new(1.0, 1.0, 1.0);
        let b = Vec3::new(0.5, -1.0, 2.0);
        assert_eq!(a + b, Vec3::new(1.5, 0.0, 3.0));
        assert_eq!(a - b, Vec3::new(0.5, 2.0, -1.0));
        assert_eq!(b.scale(2.0), Vec3::new(1.0, -2.0, 4.0));
    }

    #[test]
    fn not_tracked_sample_is_unusable() {
        let mut s = JointSample::tracked(Vec3::ZERO);
        assert!(s.is_usable());
        s.tracking = TrackingState::Inferred;
        assert!(s.is_usable());
        s.tracking = TrackingState::NotTracked;
        assert!(!s.is_usable());
    }
}

//! Frame-level containers: [`Pose`], [`Sequence`] and [`JointWeights`].
//!
//! All three are dense tables indexed by [`Joint::index`].  On the wire they
//! are JSON objects keyed by joint name so recorded files stay readable and
//! joints that were never observed are simply omitted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::KinesisError;
use crate::joint::{Joint, JointSample, Vec3};

// ────────────────────────────────────────────────────────────────────────────
// Pose
// ────────────────────────────────────────────────────────────────────────────

/// One frame's set of joint samples.  Each joint appears at most once.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<Joint, JointSample>",
    into = "BTreeMap<Joint, JointSample>"
)]
pub struct Pose {
    joints: [Option<JointSample>; Joint::COUNT],
}

impl Pose {
    /// An empty pose with no joints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style helper that records a tracked `position` for `joint`.
    pub fn with(mut self, joint: Joint, position: Vec3) -> Self {
        self.set(joint, JointSample::tracked(position));
        self
    }

    /// Store `sample` for `joint`, replacing any previous sample.
    pub fn set(&mut self, joint: Joint, sample: JointSample) {
        self.joints[joint.index()] = Some(sample);
    }

    /// Remove `joint` from the pose, returning its previous sample.
    pub fn remove(&mut self, joint: Joint) -> Option<JointSample> {
        self.joints[joint.index()].take()
    }

    /// Raw sample for `joint`, including samples flagged as not tracked.
    pub fn sample(&self, joint: Joint) -> Option<&JointSample> {
        self.joints[joint.index()].as_ref()
    }

    /// Position of `joint`, or `None` when it is absent or not tracked.
    pub fn position(&self, joint: Joint) -> Option<Vec3> {
        self.sample(joint)
            .filter(|s| s.is_usable())
            .map(|s| s.position)
    }

    /// `true` when `joint` has a usable position.
    pub fn contains(&self, joint: Joint) -> bool {
        self.position(joint).is_some()
    }

    /// Iterate over every joint with a usable position, in index order.
    pub fn iter(&self) -> impl Iterator<Item = (Joint, Vec3)> + '_ {
        Joint::ALL
            .iter()
            .filter_map(|&j| self.position(j).map(|p| (j, p)))
    }

    /// Number of joints with a usable position.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return a new pose whose positions are `f(position)`.  Tracking flags
    /// are preserved; `self` is left untouched.
    pub fn map_positions(&self, mut f: impl FnMut(Vec3) -> Vec3) -> Pose {
        let mut out = Pose::new();
        for (i, slot) in self.joints.iter().enumerate() {
            if let Some(sample) = slot {
                out.joints[i] = Some(JointSample {
                    position: f(sample.position),
                    tracking: sample.tracking,
                });
            }
        }
        out
    }
}

impl FromIterator<(Joint, Vec3)> for Pose {
    fn from_iter<I: IntoIterator<Item = (Joint, Vec3)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Pose::new(), |pose, (joint, pos)| pose.with(joint, pos))
    }
}

impl From<BTreeMap<Joint, JointSample>> for Pose {
    fn from(map: BTreeMap<Joint, JointSample>) -> Self {
        let mut pose = Pose::new();
        for (joint, sample) in map {
            pose.set(joint, sample);
        }
        pose
    }
}

impl From<Pose> for BTreeMap<Joint, JointSample> {
    fn from(pose: Pose) -> Self {
        Joint::ALL
            .iter()
            .filter_map(|&j| pose.sample(j).map(|s| (j, *s)))
            .collect()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Sequence
// ────────────────────────────────────────────────────────────────────────────

/// Ordered list of poses; index is the discrete frame number.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sequence(Vec<Pose>);

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, pose: Pose) {
        self.0.push(pose);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn frames(&self) -> &[Pose] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Pose> {
        self.0.iter()
    }

    pub fn into_frames(self) -> Vec<Pose> {
        self.0
    }

    /// Fail with [`KinesisError::InvalidInput`] when the sequence has no
    /// frames.  `what` names the sequence in the error message.
    pub fn ensure_non_empty(&self, what: &str) -> Result<(), KinesisError> {
        if self.is_empty() {
            return Err(KinesisError::InvalidInput(format!("{what} sequence is empty")));
        }
        Ok(())
    }
}

impl From<Vec<Pose>> for Sequence {
    fn from(frames: Vec<Pose>) -> Self {
        Self(frames)
    }
}

impl FromIterator<Pose> for Sequence {
    fn from_iter<I: IntoIterator<Item = Pose>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Sequence {
    type Item = &'a Pose;
    type IntoIter = std::slice::Iter<'a, Pose>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// JointWeights
// ────────────────────────────────────────────────────────────────────────────

/// Per-joint importance used by the weighted pose distance.
///
/// A joint takes part in a comparison iff its weight is strictly positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<Joint, f32>", into = "BTreeMap<Joint, f32>")]
pub struct JointWeights {
    weights: [f32; Joint::COUNT],
}

impl Default for JointWeights {
    fn default() -> Self {
        Self {
            weights: [0.0; Joint::COUNT],
        }
    }
}

impl JointWeights {
    /// Every joint weighted `w`.
    pub fn uniform(w: f32) -> Self {
        Self {
            weights: [w; Joint::COUNT],
        }
    }

    /// Weight 1.0 for each joint in `joints`, zero for the rest.
    pub fn only(joints: &[Joint]) -> Self {
        joints
            .iter()
            .fold(Self::default(), |w, &j| w.with(j, 1.0))
    }

    pub fn with(mut self, joint: Joint, weight: f32) -> Self {
        self.set(joint, weight);
        self
    }

    pub fn set(&mut self, joint: Joint, weight: f32) {
        self.weights[joint.index()] = weight;
    }

    pub fn get(&self, joint: Joint) -> f32 {
        self.weights[joint.index()]
    }

    /// Sum of all weights.
    pub fn total(&self) -> f32 {
        self.weights.iter().sum()
    }

    /// Joints with a strictly positive weight, in index order.
    pub fn present(&self) -> impl Iterator<Item = (Joint, f32)> + '_ {
        Joint::ALL
            .iter()
            .map(|&j| (j, self.get(j)))
            .filter(|&(_, w)| w > 0.0)
    }

    /// Check that every weight is finite and non-negative and that at least
    /// one weight is positive.
    pub fn validate(&self) -> Result<(), KinesisError> {
        if let Some(joint) = Joint::ALL
            .iter()
            .find(|j| !self.get(**j).is_finite() || self.get(**j) < 0.0)
        {
            return Err(KinesisError::InvalidInput(format!(
                "weight for {joint} must be finite and non-negative, got {}",
                self.get(*joint)
            )));
        }
        if self.total() <= 0.0 {
            return Err(KinesisError::InvalidInput(
                "joint weights sum to zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl From<BTreeMap<Joint, f32>> for JointWeights {
    fn from(map: BTreeMap<Joint, f32>) -> Self {
        map.into_iter()
            .fold(Self::default(), |w, (joint, weight)| w.with(joint, weight))
    }
}

impl From<JointWeights> for BTreeMap<Joint, f32> {
    fn from(weights: JointWeights) -> Self {
        Joint::ALL
            .iter()
            .map(|&j| (j, weights.get(j)))
            .filter(|&(_, w)| w != 0.0)
            .collect()
    }
}

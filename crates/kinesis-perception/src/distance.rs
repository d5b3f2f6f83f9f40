//! Weighted joint distance between two poses.
//!
//! ```text
//! d(a, b) = Σ w[j] · ‖a[j] − b[j]‖ / Σ w[j]
//! ```
//!
//! summed over every joint with a positive weight.  The function is
//! symmetric in `a` and `b`.

use kinesis_types::{JointWeights, KinesisError, Pose};

/// Weighted mean Euclidean distance between `a` and `b`.
///
/// # Errors
///
/// [`KinesisError::InvalidInput`] when a weight is negative or non-finite,
/// when the weights sum to zero, or when a weighted joint is missing from
/// either pose.
pub fn weighted_pose_distance(
    a: &Pose,
    b: &Pose,
    weights: &JointWeights,
) -> Result<f32, KinesisError> {
    weights.validate()?;
    let total = weights.total();

    let mut acc = 0.0_f32;
    for (joint, w) in weights.present() {
        match (a.position(joint), b.position(joint)) {
            (Some(pa), Some(pb)) => acc += w * pa.distance(pb),
            _ => {
                return Err(KinesisError::InvalidInput(format!(
                    "weighted joint {joint} missing from a compared pose"
                )));
            }
        }
    }
    Ok(acc / total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinesis_types::{Joint, Vec3};

    #[test]
    fn identical_poses_are_zero_apart() {
        let p = Pose::new()
            .with(Joint::HandLeft, Vec3::new(0.1, 0.2, 0.3))
            .with(Joint::HandRight, Vec3::new(-0.1, 0.2, 0.3));
        let w = JointWeights::only(&[Joint::HandLeft, Joint::HandRight]);
        assert_eq!(weighted_pose_distance(&p, &p, &w).unwrap(), 0.0);
    }

    #[test]
    fn weights_bias_the_mean() {
        let a = Pose::new()
            .with(Joint::HandLeft, Vec3::ZERO)
            .with(Joint::HandRight, Vec3::ZERO);
        let b = Pose::new()
            .with(Joint::HandLeft, Vec3::new(1.0, 0.0, 0.0))
            .with(Joint::HandRight, Vec3::new(3.0, 0.0, 0.0));
        let w = JointWeights::default()
            .with(Joint::HandLeft, 3.0)
            .with(Joint::HandRight, 1.0);
        // (3·1 + 1·3) / 4 = 1.5
        let d = weighted_pose_distance(&a, &b, &w).unwrap();
        assert!((d - 1.5).abs() < 1e-6);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Pose::new().with(Joint::Head, Vec3::new(0.3, 1.0, -0.2));
        let b = Pose::new().with(Joint::Head, Vec3::new(-0.4, 0.5, 0.7));
        let w = JointWeights::only(&[Joint::Head]);
        let ab = weighted_pose_distance(&a, &b, &w).unwrap();
        let ba = weighted_pose_distance(&b, &a, &w).unwrap();
        assert_eq!(ab, ba);
    }

    #[test]
    fn unweighted_joints_may_be_missing() {
        let a = Pose::new()
            .with(Joint::Head, Vec3::ZERO)
            .with(Joint::FootLeft, Vec3::new(0.0, -1.0, 0.0));
        let b = Pose::new().with(Joint::Head, Vec3::new(0.0, 0.5, 0.0));
        let w = JointWeights::only(&[Joint::Head]);
        let d = weighted_pose_distance(&a, &b, &w).unwrap();
        assert!((d - 0.5).abs() < 1e-6);
    }

    #[test]
    fn missing_weighted_joint_is_rejected() {
        let a = Pose::new().with(Joint::Head, Vec3::ZERO);
        let b = Pose::new();
        let w = JointWeights::only(&[Joint::Head]);
        assert!(matches!(
            weighted_pose_distance(&a, &b, &w),
            Err(KinesisError::InvalidInput(_))
        ));
    }

    #[test]
    fn negative_weight_is_rejected() {
        let a = Pose::new()
            .with(Joint::Head, Vec3::ZERO)
            .with(Joint::HandRight, Vec3::ZERO);
        let b = Pose::new()
            .with(Joint::Head, Vec3::new(1.0, 0.0, 0.0))
            .with(Joint::HandRight, Vec3::ZERO);
        let w = JointWeights::default()
            .with(Joint::Head, 2.0)
            .with(Joint::HandRight, -1.0);
        assert!(matches!(
            weighted_pose_distance(&a, &b, &w),
            Err(KinesisError::InvalidInput(_))
        ));
    }

    #[test]
    fn zero_weights_are_rejected() {
        let p = Pose::new().with(Joint::Head, Vec3::ZERO);
        assert!(weighted_pose_distance(&p, &p, &JointWeights::default()).is_err());
    }
}

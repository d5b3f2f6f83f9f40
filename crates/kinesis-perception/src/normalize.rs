//! Pose normalisation.
//!
//! Raw sensor coordinates depend on where the user stands relative to the
//! sensor.  Re-expressing every joint relative to a body-fixed reference
//! joint (the hip centre by default) makes two performances of the same
//! movement comparable regardless of the user's position in the room.
//!
//! Normalisation always builds a **new** pose: buffered capture data must
//! never be rewritten in place.

use kinesis_types::{Joint, KinesisError, Pose, Sequence};

/// Reference joint used when the caller does not pick one.
pub const DEFAULT_REFERENCE_JOINT: Joint = Joint::HipCenter;

/// Return a copy of `pose` with `reference`'s position subtracted from every
/// joint.
///
/// # Errors
///
/// [`KinesisError::InvalidInput`] when `reference` is absent (or not
/// tracked) in `pose`.
///
/// # Example
///
/// ```rust
/// use kinesis_perception::normalize::normalize_pose;
/// use kinesis_types::{Joint, Pose, Vec3};
///
/// let pose = Pose::new()
///     .with(Joint::HipCenter, Vec3::new(0.2, 0.9, 2.5))
///     .with(Joint::Head, Vec3::new(0.2, 1.6, 2.5));
///
/// let normalized = normalize_pose(&pose, Joint::HipCenter).unwrap();
/// assert_eq!(normalized.position(Joint::HipCenter), Some(Vec3::ZERO));
/// ```
pub fn normalize_pose(pose: &Pose, reference: Joint) -> Result<Pose, KinesisError> {
    let origin = pose.position(reference).ok_or_else(|| {
        KinesisError::InvalidInput(format!("reference joint {reference} missing from pose"))
    })?;
    Ok(pose.map_positions(|p| p - origin))
}

/// Normalise every frame of `sequence` against `reference`.
///
/// Fails on the first frame that lacks the reference joint; the error names
/// the offending frame index.
pub fn normalize_sequence(sequence: &Sequence, reference: Joint) -> Result<Sequence, KinesisError> {
    sequence
        .iter()
        .enumerate()
        .map(|(frame, pose)| {
            normalize_pose(pose, reference).map_err(|e| match e {
                KinesisError::InvalidInput(msg) => {
                    KinesisError::InvalidInput(format!("frame {frame}: {msg}"))
                }
                other => other,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinesis_types::Vec3;

    fn sample_pose() -> Pose {
        Pose::new()
            .with(Joint::HipCenter, Vec3::new(1.0, 1.0, 2.0))
            .with(Joint::HandRight, Vec3::new(1.5, 1.2, 1.8))
            .with(Joint::Head, Vec3::new(1.0, 1.7, 2.0))
    }

    #[test]
    fn reference_joint_lands_on_origin() {
        let out = normalize_pose(&sample_pose(), Joint::HipCenter).unwrap();
        assert_eq!(out.position(Joint::HipCenter), Some(Vec3::ZERO));
    }

    #[test]
    fn other_joints_are_relative_to_reference() {
        let out = normalize_pose(&sample_pose(), Joint::HipCenter).unwrap();
        let hand = out.position(Joint::HandRight).unwrap();
        assert!((hand.x - 0.5).abs() < 1e-6);
        assert!((hand.y - 0.2).abs() < 1e-6);
        assert!((hand.z + 0.2).abs() < 1e-6);
    }

    #[test]
    fn input_pose_is_not_mutated() {
        let pose = sample_pose();
        let before = pose.clone();
        let _ = normalize_pose(&pose, Joint::HipCenter).unwrap();
        assert_eq!(pose, before);
    }

    #[test]
    fn missing_reference_is_invalid_input() {
        let pose = Pose::new().with(Joint::Head, Vec3::new(0.0, 1.0, 0.0));
        let err = normalize_pose(&pose, Joint::HipCenter).unwrap_err();
        assert!(matches!(err, KinesisError::InvalidInput(_)));
    }

    #[test]
    fn sequence_error_names_the_frame() {
        let seq = Sequence::from(vec![sample_pose(), Pose::new()]);
        let err = normalize_sequence(&seq, Joint::HipCenter).unwrap_err();
        assert!(err.to_string().contains("frame 1"));
    }

    #[test]
    fn sequence_normalisation_keeps_length() {
        let seq = Sequence::from(vec![sample_pose(), sample_pose(), sample_pose()]);
        let out = normalize_sequence(&seq, DEFAULT_REFERENCE_JOINT).unwrap();
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|p| p.position(Joint::HipCenter) == Some(Vec3::ZERO)));
    }
}

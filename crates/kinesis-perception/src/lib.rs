//! `kinesis-perception` – motion math.
//!
//! Pure, allocation-light functions that turn raw skeleton frames into
//! comparable shapes and kinematic quantities.  Nothing here blocks or
//! spawns; the runtime decides which thread each piece runs on.
//!
//! # Modules
//!
//! - [`normalize`] – [`normalize_pose`][normalize::normalize_pose]: re-express
//!   a pose relative to a reference joint (hip centre by default).
//! - [`distance`] – [`weighted_pose_distance`][distance::weighted_pose_distance]:
//!   weighted mean Euclidean distance between two poses.
//! - [`dtw`] – [`dtw_distance`][dtw::dtw_distance]: dynamic time warping with
//!   rolling rows, generic over the pointwise cost.
//! - [`assessor`] – [`MotionAssessor`][assessor::MotionAssessor]: per-joint
//!   position/velocity/speed tracker with bounded history, filtered by the
//!   active measurement units.

pub mod assessor;
pub mod distance;
pub mod dtw;
pub mod normalize;

pub use assessor::{JointStatus, MotionAssessor, DEFAULT_HISTORY_LEN};
pub use distance::weighted_pose_distance;
pub use dtw::{dtw_distance, sequence_distance};
pub use normalize::{normalize_pose, normalize_sequence, DEFAULT_REFERENCE_JOINT};

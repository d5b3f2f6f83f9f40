use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::KinesisError;

/// Closed set of exercise gestures the recognizer can report.
///
/// Stored templates never carry [`GestureLabel::Unknown`]; it is only the
/// sentinel for "nothing matched".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureLabel {
    BicepCurl,
    Squat,
    ShoulderPress,
    LateralRaise,
    Lunge,
    Unknown,
}

impl GestureLabel {
    /// Every label a template may carry.
    pub const KNOWN: [GestureLabel; 5] = [
        GestureLabel::BicepCurl,
        GestureLabel::Squat,
        GestureLabel::ShoulderPress,
        GestureLabel::LateralRaise,
        GestureLabel::Lunge,
    ];

    pub fn is_known(self) -> bool {
        self != GestureLabel::Unknown
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GestureLabel::BicepCurl => "bicep_curl",
            GestureLabel::Squat => "squat",
            GestureLabel::ShoulderPress => "shoulder_press",
            GestureLabel::LateralRaise => "lateral_raise",
            GestureLabel::Lunge => "lunge",
            GestureLabel::Unknown => "unknown",
        }
    }
}

impl fmt::Display for GestureLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GestureLabel {
    type Err = KinesisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::KNOWN
            .iter()
            .chain(std::iter::once(&GestureLabel::Unknown))
            .find(|l| l.as_str() == s)
            .copied()
            .ok_or_else(|| KinesisError::InvalidInput(format!("unknown gesture label '{s}'")))
    }
}

/// Outcome of a completed recognition pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Identity of the best-matching template.
    pub template_id: Uuid,
    pub label: GestureLabel,
    /// DTW alignment cost against that template; lower is closer.
    pub distance: f32,
    /// How many templates were actually compared.
    pub templates_compared: usize,
    pub completed_at: DateTime<Utc>,
}

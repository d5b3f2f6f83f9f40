//! Recorded sensor sessions – one JSON object per line.
//!
//! ```text
//! {"kind":"frame","timestamp":0.033,"pose":{"HipCenter":{"position":{"x":0.0,"y":0.9,"z":2.1}}}}
//! {"kind":"begin"}
//! {"kind":"end"}
//! {"kind":"disconnect"}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use std::fs;
use std::path::Path;

use kinesis_types::Pose;
use serde::{Deserialize, Serialize};

/// One line of a recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordedLine {
    Frame { timestamp: f64, pose: Pose },
    Begin,
    End,
    Disconnect,
}

/// Parse a single line.  `Ok(None)` for blank and comment lines.
pub fn parse_line(line: &str) -> Result<Option<RecordedLine>, serde_json::Error> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some)
}

/// Read a whole recording.  The first malformed line aborts with its line
/// number.
pub fn read_recording(path: &Path) -> Result<Vec<RecordedLine>, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read recording at {}: {}", path.display(), e))?;
    let mut lines = Vec::new();
    for (n, line) in raw.lines().enumerate() {
        match parse_line(line) {
            Ok(Some(entry)) => lines.push(entry),
            Ok(None) => {}
            Err(e) => return Err(format!("{}:{}: {}", path.display(), n + 1, e)),
        }
    }
    Ok(lines)
}

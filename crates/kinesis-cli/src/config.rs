//! Engine settings – reads/writes `~/.kinesis/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use kinesis_runtime::EngineConfig;
use kinesis_types::{Joint, MeasurementUnit};
use serde::{Deserialize, Serialize};

/// Persisted user configuration stored in `~/.kinesis/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory of `*.json` gesture templates.
    #[serde(default = "default_templates_dir")]
    pub templates_dir: PathBuf,

    /// Joint every pose is translated against before matching.
    #[serde(default = "default_reference_joint")]
    pub reference_joint: Joint,

    /// Positions kept per joint for kinematics.
    #[serde(default = "default_history_len")]
    pub history_len: usize,

    /// Longest capture kept, in frames.
    #[serde(default = "default_max_capture_frames")]
    pub max_capture_frames: usize,

    /// Per-topic event bus capacity.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// Joint/metric selections surfaced in kinematics snapshots.
    #[serde(default = "default_measurement_units")]
    pub measurement_units: Vec<MeasurementUnit>,
}

fn home_dir() -> PathBuf {
    PathBuf::from(
        std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

fn default_templates_dir() -> PathBuf {
    home_dir().join(".kinesis").join("templates")
}
fn default_reference_joint() -> Joint {
    EngineConfig::default().reference_joint
}
fn default_history_len() -> usize {
    EngineConfig::default().history_len
}
fn default_max_capture_frames() -> usize {
    EngineConfig::default().max_capture_frames
}
fn default_event_capacity() -> usize {
    EngineConfig::default().event_capacity
}
fn default_measurement_units() -> Vec<MeasurementUnit> {
    EngineConfig::default().measurement_units
}

impl Default for Config {
    fn default() -> Self {
        Self {
            templates_dir: default_templates_dir(),
            reference_joint: default_reference_joint(),
            history_len: default_history_len(),
            max_capture_frames: default_max_capture_frames(),
            event_capacity: default_event_capacity(),
            measurement_units: default_measurement_units(),
        }
    }
}

impl Config {
    /// The runtime settings this configuration describes.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            reference_joint: self.reference_joint,
            history_len: self.history_len,
            max_capture_frames: self.max_capture_frames,
            event_capacity: self.event_capacity,
            measurement_units: self.measurement_units.clone(),
        }
    }
}

/// Return the path to `~/.kinesis/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(&home_dir())
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &Path) -> PathBuf {
    home.join(".kinesis").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

/// Load the config from a specific path and apply env overrides.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    let mut cfg = read_from(path)?;
    if let Some(cfg) = cfg.as_mut() {
        apply_env_overrides(cfg);
    }
    Ok(cfg)
}

/// Parse the file at `path` exactly as written, without env overrides.
pub(crate) fn read_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    toml::from_str(&raw)
        .map(Some)
        .map_err(|e| format!("Failed to parse config: {}", e))
}

/// Load the config, falling back to defaults (with env overrides) when the
/// file is missing.
pub fn load_or_default() -> Result<Config, String> {
    match load()? {
        Some(cfg) => Ok(cfg),
        None => {
            let mut cfg = Config::default();
            apply_env_overrides(&mut cfg);
            Ok(cfg)
        }
    }
}

/// Apply `KINESIS_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `KINESIS_TEMPLATES_DIR` | `templates_dir` |
/// | `KINESIS_HISTORY_LEN` | `history_len` |
/// | `KINESIS_MAX_CAPTURE_FRAMES` | `max_capture_frames` |
///
/// Values that do not parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("KINESIS_TEMPLATES_DIR") {
        cfg.templates_dir = PathBuf::from(v);
    }
    if let Ok(v) = std::env::var("KINESIS_HISTORY_LEN")
        && let Ok(n) = v.parse::<usize>()
    {
        cfg.history_len = n;
    }
    if let Ok(v) = std::env::var("KINESIS_MAX_CAPTURE_FRAMES")
        && let Ok(n) = v.parse::<usize>()
    {
        cfg.max_capture_frames = n;
    }
}

/// Write a default config to `~/.kinesis/config.toml` unless one exists.
/// Returns `true` when a file was written.
pub fn init() -> Result<bool, String> {
    init_at(&config_path())
}

/// Write `Config::default()` to `path` unless a file is already there.
pub(crate) fn init_at(path: &Path) -> Result<bool, String> {
    if path.exists() {
        return Ok(false);
    }
    save_to(&Config::default(), path)?;
    Ok(true)
}

/// Save the config to a specific path.
pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))
}

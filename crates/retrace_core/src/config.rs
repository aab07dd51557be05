//! Configuration for recording, playback and the demo simulation.
//!
//! All values can be customised through a TOML file; missing keys keep their
//! defaults.
//!
//! ## Configuration Hierarchy
//!
//! 1. Default values (hardcoded in `Default` impl)
//! 2. `retrace.toml` file (overrides defaults)
//! 3. Command line flags (override individual values)
//!
//! ## Example `retrace.toml`
//!
//! ```toml
//! [recording]
//! warmup_ms = 500
//! interval_ms = 100
//! directory = "recordings"
//!
//! [replay]
//! speed = 1.0
//! fps = 60
//!
//! [demo]
//! seed = 42
//! initial_enemies = 5
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Key codes watched by default: space, P, WASD, arrows, digits 1-7 and
/// keypad 1-7.
pub const DEFAULT_WATCHED_KEYS: [u32; 24] = [
    32, 80, 87, 83, 65, 68, 38, 40, 37, 39, 49, 50, 51, 52, 53, 54, 55, 97, 98, 99, 100, 101, 102,
    103,
];

/// Capture policy of the recorder.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RecordingConfig {
    /// No keyframe is written before this much time has passed.
    pub warmup_ms: u64,
    /// Minimum spacing between consecutive keyframes.
    pub interval_ms: u64,
    /// Key codes whose presses are logged.
    pub keys: Vec<u32>,
    /// Format tag written into the header.
    pub version: String,
    /// Directory of the file store.
    pub directory: String,
    /// Write a per-entity ordinal into each snapshot when the source has one.
    pub stable_ids: bool,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            warmup_ms: 500,
            interval_ms: 100,
            keys: DEFAULT_WATCHED_KEYS.to_vec(),
            version: retrace_data::FORMAT_VERSION.to_string(),
            directory: retrace_io::DEFAULT_RECORDINGS_DIR.to_string(),
            stable_ids: false,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ReplayConfig {
    /// Playback rate multiplier.
    pub speed: f32,
    /// Reference viewport used when a log has no usable header.
    pub default_width: u32,
    pub default_height: u32,
    /// Ticks per second of headless playback.
    pub fps: u32,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            speed: 1.0,
            default_width: 800,
            default_height: 600,
            fps: 60,
        }
    }
}

/// Parameters of the bundled demo battle.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DemoConfig {
    pub seed: u64,
    pub width: u32,
    pub height: u32,
    pub initial_enemies: usize,
    pub max_enemies: usize,
    pub spawn_interval_ms: u64,
    pub decorations: usize,
    pub player_speed: f32,
    pub enemy_speed: f32,
    pub bullet_speed: f32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            width: 800,
            height: 600,
            initial_enemies: 5,
            max_enemies: 20,
            spawn_interval_ms: 1500,
            decorations: 3,
            player_speed: 200.0,
            enemy_speed: 50.0,
            bullet_speed: 400.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct AppConfig {
    pub recording: RecordingConfig,
    pub replay: ReplayConfig,
    pub demo: DemoConfig,
}

impl AppConfig {
    /// Validates configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.recording.interval_ms > 0,
            "Keyframe interval must be positive"
        );
        anyhow::ensure!(
            !self.recording.version.is_empty(),
            "Format version must not be empty"
        );
        anyhow::ensure!(
            !self.recording.directory.is_empty(),
            "Recording directory must not be empty"
        );

        anyhow::ensure!(
            self.replay.speed.is_finite() && self.replay.speed > 0.0,
            "Replay speed must be a positive number"
        );
        anyhow::ensure!(
            self.replay.default_width > 0 && self.replay.default_height > 0,
            "Default viewport must be non-empty"
        );
        anyhow::ensure!(self.replay.fps > 0, "Replay FPS must be positive");
        anyhow::ensure!(self.replay.fps <= 240, "Replay FPS too high (max 240)");

        anyhow::ensure!(
            self.demo.width > 0 && self.demo.height > 0,
            "Demo arena must be non-empty"
        );
        anyhow::ensure!(
            self.demo.initial_enemies <= self.demo.max_enemies,
            "Initial enemies exceed the enemy cap"
        );
        anyhow::ensure!(
            self.demo.player_speed >= 0.0
                && self.demo.enemy_speed >= 0.0
                && self.demo.bullet_speed > 0.0,
            "Demo speeds must be non-negative"
        );
        Ok(())
    }

    /// Parses and validates a TOML document.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `path`, falling back to defaults when it is missing or invalid.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) => match Self::from_toml(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Invalid config, using defaults");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }
}

//! Configuration loading and typed config structures for the presenter.
//!
//! The canonical configuration lives in `ftm-config.yaml` in the working
//! directory. Every field has a default, so an absent file, an empty file
//! and a partial file are all valid. Timing values are plain milliseconds
//! so a test configuration can zero them out for an instant, fully
//! deterministic presentation.

use std::path::Path;
use std::time::Duration;

use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level presenter configuration.
///
/// Mirrors the structure of `ftm-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PresenterConfig {
    /// Reveal, gathering and playback delays.
    #[serde(default)]
    pub timing: TimingConfig,

    /// Cosmetic status lines rotated while the agents "investigate".
    #[serde(default)]
    pub status_messages: StatusMessages,

    /// Where publications and investigations come from.
    #[serde(default)]
    pub source: SourceConfig,

    /// Audio output settings.
    #[serde(default)]
    pub audio: AudioConfig,

    /// Rendering bridge (HTTP + `WebSocket`) settings.
    #[serde(default)]
    pub observer: ObserverConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Seed for the randomness source. Unset means seeded from the OS.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl PresenterConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values afterwards:
    /// - `FTM_API_URL` overrides `source.api_url`
    /// - `FTM_DATA_DIR` overrides `source.data_dir`
    /// - `FTM_AUDIO_DIR` overrides `audio.base_dir`
    /// - `PORT` overrides `observer.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string without env overrides.
    ///
    /// An empty document yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("FTM_API_URL") {
            self.source.api_url = val;
        }
        if let Ok(val) = std::env::var("FTM_DATA_DIR") {
            self.source.data_dir = val;
        }
        if let Ok(val) = std::env::var("FTM_AUDIO_DIR") {
            self.audio.base_dir = val;
        }
        if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse().ok()) {
            self.observer.port = port;
        }
    }

    /// Every delay set to zero. Useful for headless replays and tests.
    pub fn instant() -> Self {
        Self {
            timing: TimingConfig::instant(),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

/// All presentation delays, in milliseconds.
///
/// Randomized delays are drawn uniformly from `[min, max)`. When `max`
/// is not greater than `min` the delay is exactly `min`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TimingConfig {
    /// Lower bound of a turn's think time.
    #[serde(default = "default_think_min_ms")]
    pub think_min_ms: u64,

    /// Upper bound of a turn's think time.
    #[serde(default = "default_think_max_ms")]
    pub think_max_ms: u64,

    /// Fixed pause between a reveal and the next turn's thinking.
    #[serde(default = "default_turn_gap_ms")]
    pub turn_gap_ms: u64,

    /// Fixed pause between clips during full-sequence playback.
    #[serde(default = "default_clip_gap_ms")]
    pub clip_gap_ms: u64,

    /// Interval of the rotating status message.
    #[serde(default = "default_status_rotation_ms")]
    pub status_rotation_ms: u64,

    /// Lower bound of the simulated delay before a pre-baked demo plays.
    #[serde(default = "default_demo_delay_min_ms")]
    pub demo_delay_min_ms: u64,

    /// Upper bound of the simulated delay before a pre-baked demo plays.
    #[serde(default = "default_demo_delay_max_ms")]
    pub demo_delay_max_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            think_min_ms: default_think_min_ms(),
            think_max_ms: default_think_max_ms(),
            turn_gap_ms: default_turn_gap_ms(),
            clip_gap_ms: default_clip_gap_ms(),
            status_rotation_ms: default_status_rotation_ms(),
            demo_delay_min_ms: default_demo_delay_min_ms(),
            demo_delay_max_ms: default_demo_delay_max_ms(),
        }
    }
}

impl TimingConfig {
    /// Every delay zero.
    pub const fn instant() -> Self {
        Self {
            think_min_ms: 0,
            think_max_ms: 0,
            turn_gap_ms: 0,
            clip_gap_ms: 0,
            status_rotation_ms: 0,
            demo_delay_min_ms: 0,
            demo_delay_max_ms: 0,
        }
    }

    /// Draw a think time for one turn.
    pub fn think_time(&self, rng: &mut StdRng) -> Duration {
        draw(rng, self.think_min_ms, self.think_max_ms)
    }

    /// Draw the simulated investigation delay for a pre-baked demo.
    pub fn demo_delay(&self, rng: &mut StdRng) -> Duration {
        draw(rng, self.demo_delay_min_ms, self.demo_delay_max_ms)
    }

    /// Pause between turns.
    pub const fn turn_gap(&self) -> Duration {
        Duration::from_millis(self.turn_gap_ms)
    }

    /// Pause between clips.
    pub const fn clip_gap(&self) -> Duration {
        Duration::from_millis(self.clip_gap_ms)
    }

    /// Status message rotation interval.
    pub const fn status_rotation(&self) -> Duration {
        Duration::from_millis(self.status_rotation_ms)
    }
}

fn draw(rng: &mut StdRng, min_ms: u64, max_ms: u64) -> Duration {
    if max_ms <= min_ms {
        return Duration::from_millis(min_ms);
    }
    Duration::from_millis(rng.random_range(min_ms..max_ms))
}

// ---------------------------------------------------------------------------
// Status messages
// ---------------------------------------------------------------------------

/// The rotating "investigating" message set.
///
/// Picks are uniform and independent: the same message may come up twice
/// in a row.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct StatusMessages(Vec<String>);

impl StatusMessages {
    /// Build a message set. An empty list falls back to the defaults.
    pub fn new(messages: Vec<String>) -> Self {
        if messages.is_empty() {
            Self::default()
        } else {
            Self(messages)
        }
    }

    /// Pick one message.
    pub fn pick(&self, rng: &mut StdRng) -> String {
        self.0
            .choose(rng)
            .cloned()
            .unwrap_or_else(|| DEFAULT_STATUS_MESSAGES[0].to_owned())
    }

    /// All messages in the set.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl Default for StatusMessages {
    fn default() -> Self {
        Self(
            DEFAULT_STATUS_MESSAGES
                .iter()
                .map(|m| (*m).to_owned())
                .collect(),
        )
    }
}

/// Default rotating status lines.
pub const DEFAULT_STATUS_MESSAGES: [&str; 8] = [
    "Searching ownership records...",
    "Following the money trail...",
    "Cross-referencing sources...",
    "Pulling corporate filings...",
    "Checking recent acquisitions...",
    "Analyzing conflicts of interest...",
    "Reviewing editorial changes...",
    "Verifying with web sources...",
];

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// Which implementation backs the publication and investigation source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMode {
    /// Talk to the investigation API over HTTP.
    #[default]
    Http,
    /// Read the catalog and demos from a local data directory.
    Files,
}

/// Source configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceConfig {
    /// Backing implementation.
    #[serde(default)]
    pub mode: SourceMode,

    /// Base URL of the investigation API.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Directory holding `publications.json` and `demo/`.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Per-request timeout.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            mode: SourceMode::default(),
            api_url: default_api_url(),
            data_dir: default_data_dir(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Which audio backend plays narration clips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioBackendKind {
    /// The default output device via `rodio`.
    #[default]
    Device,
    /// No sound; each clip "ends" after a fixed duration.
    Silent,
}

/// Audio configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AudioConfig {
    /// Backend selection.
    #[serde(default)]
    pub backend: AudioBackendKind,

    /// Directory clip paths are resolved against.
    #[serde(default = "default_audio_base_dir")]
    pub base_dir: String,

    /// Output volume, clamped to `0.0..=1.0`.
    #[serde(default = "default_volume")]
    pub volume: f32,

    /// How long a clip "plays" on the silent backend.
    #[serde(default = "default_silent_clip_ms")]
    pub silent_clip_ms: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            backend: AudioBackendKind::default(),
            base_dir: default_audio_base_dir(),
            volume: default_volume(),
            silent_clip_ms: default_silent_clip_ms(),
        }
    }
}

/// Rendering bridge configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObserverConfig {
    /// Whether to serve the HTTP + `WebSocket` bridge.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Bind address.
    #[serde(default = "default_observer_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_observer_port")]
    pub port: u16,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_observer_host(),
            port: default_observer_port(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_think_min_ms() -> u64 {
    1_500
}

const fn default_think_max_ms() -> u64 {
    3_000
}

const fn default_turn_gap_ms() -> u64 {
    800
}

const fn default_clip_gap_ms() -> u64 {
    600
}

const fn default_status_rotation_ms() -> u64 {
    1_800
}

const fn default_demo_delay_min_ms() -> u64 {
    3_000
}

const fn default_demo_delay_max_ms() -> u64 {
    5_000
}

fn default_api_url() -> String {
    "http://localhost:8000".to_owned()
}

fn default_data_dir() -> String {
    "data".to_owned()
}

const fn default_request_timeout_ms() -> u64 {
    300_000
}

fn default_audio_base_dir() -> String {
    ".".to_owned()
}

const fn default_volume() -> f32 {
    1.0
}

const fn default_silent_clip_ms() -> u64 {
    2_000
}

const fn default_true() -> bool {
    true
}

fn default_observer_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_observer_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = PresenterConfig::parse("").unwrap();
        assert_eq!(config, PresenterConfig::default());
        assert_eq!(config.timing.think_min_ms, 1_500);
        assert_eq!(config.timing.think_max_ms, 3_000);
        assert_eq!(config.timing.turn_gap_ms, 800);
        assert_eq!(config.timing.clip_gap_ms, 600);
        assert_eq!(config.timing.status_rotation_ms, 1_800);
        assert_eq!(config.status_messages.as_slice().len(), 8);
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let yaml = r"
timing:
  think_min_ms: 0
  think_max_ms: 0
source:
  mode: files
  data_dir: fixtures
audio:
  backend: silent
seed: 7
";
        let config = PresenterConfig::parse(yaml).unwrap();
        assert_eq!(config.timing.think_min_ms, 0);
        assert_eq!(config.timing.turn_gap_ms, 800);
        assert_eq!(config.source.mode, SourceMode::Files);
        assert_eq!(config.source.data_dir, "fixtures");
        assert_eq!(config.source.api_url, "http://localhost:8000");
        assert_eq!(config.audio.backend, AudioBackendKind::Silent);
        assert_eq!(config.seed, Some(7));
        assert!(config.observer.enabled);
    }

    #[test]
    fn custom_status_messages() {
        let yaml = "status_messages:\n  - Reading filings...\n  - Calling sources...\n";
        let config = PresenterConfig::parse(yaml).unwrap();
        assert_eq!(config.status_messages.as_slice().len(), 2);
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let result = PresenterConfig::parse("timing: [not, a, map");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = PresenterConfig::from_file(Path::new("/nonexistent/ftm-config.yaml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn think_time_stays_in_range() {
        let timing = TimingConfig::default();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let ms = timing.think_time(&mut rng).as_millis();
            assert!((1_500..3_000).contains(&ms), "think time {ms} out of range");
        }
    }

    #[test]
    fn demo_delay_stays_in_range() {
        let timing = TimingConfig::default();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..500 {
            let ms = timing.demo_delay(&mut rng).as_millis();
            assert!((3_000..5_000).contains(&ms), "demo delay {ms} out of range");
        }
    }

    #[test]
    fn degenerate_range_is_exact() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(draw(&mut rng, 0, 0), Duration::ZERO);
        assert_eq!(draw(&mut rng, 250, 250), Duration::from_millis(250));
        assert_eq!(draw(&mut rng, 900, 100), Duration::from_millis(900));
    }

    #[test]
    fn empty_message_set_falls_back_to_defaults() {
        let messages = StatusMessages::new(Vec::new());
        assert_eq!(messages, StatusMessages::default());
        let mut rng = StdRng::seed_from_u64(9);
        let picked = messages.pick(&mut rng);
        assert!(DEFAULT_STATUS_MESSAGES.contains(&picked.as_str()));
    }
}

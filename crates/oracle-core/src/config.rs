//! Configuration loading and typed config structures for Oracle Earth.
//!
//! The canonical configuration lives in `oracle-config.yaml` at the
//! project root. Every field has a default matching the dashboard's
//! original behaviour, so an empty file (or no file at all) yields a
//! working setup.

use std::path::Path;
use std::time::Duration;

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

    /// The configuration parsed but describes an impossible setup.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
///
/// Mirrors the structure of `oracle-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OracleConfig {
    /// Time cursor bounds and playback timing.
    #[serde(default)]
    pub timeline: TimelineConfig,

    /// Crisis feed generation settings.
    #[serde(default)]
    pub feed: FeedConfig,

    /// Scenario simulator settings.
    #[serde(default)]
    pub simulator: SimulatorConfig,

    /// Dashboard API server binding.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl OracleConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values for the server binding:
    /// - `ORACLE_HOST` overrides `server.host`
    /// - `ORACLE_PORT` overrides `server.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, apply environment
    /// overrides and validate the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.server.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde defaults cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.timeline;
        if t.min_year > t.max_year {
            return Err(invalid(format!(
                "timeline.min_year ({}) is after timeline.max_year ({})",
                t.min_year, t.max_year
            )));
        }
        if t.present_year < t.min_year || t.present_year > t.max_year {
            return Err(invalid(format!(
                "timeline.present_year ({}) is outside {}..={}",
                t.present_year, t.min_year, t.max_year
            )));
        }
        if t.tick_interval_ms == 0 {
            return Err(invalid("timeline.tick_interval_ms must be at least 1".to_owned()));
        }

        let f = &self.feed;
        if f.capacity == 0 {
            return Err(invalid("feed.capacity must be at least 1".to_owned()));
        }
        if f.tick_interval_ms == 0 {
            return Err(invalid("feed.tick_interval_ms must be at least 1".to_owned()));
        }
        if !(0.0..=1.0).contains(&f.spawn_probability) {
            return Err(invalid(format!(
                "feed.spawn_probability ({}) must be within 0.0..=1.0",
                f.spawn_probability
            )));
        }

        Ok(())
    }
}

fn invalid(reason: String) -> ConfigError {
    ConfigError::Invalid { reason }
}

/// Time cursor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TimelineConfig {
    /// Earliest selectable year.
    #[serde(default = "default_min_year")]
    pub min_year: i32,

    /// Latest selectable year.
    #[serde(default = "default_max_year")]
    pub max_year: i32,

    /// The year labelled "Live".
    #[serde(default = "default_present_year")]
    pub present_year: i32,

    /// Real-time milliseconds between playback ticks.
    #[serde(default = "default_timeline_tick_ms")]
    pub tick_interval_ms: u64,
}

impl TimelineConfig {
    /// Playback period as a [`Duration`].
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            min_year: default_min_year(),
            max_year: default_max_year(),
            present_year: default_present_year(),
            tick_interval_ms: default_timeline_tick_ms(),
        }
    }
}

/// Crisis feed configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeedConfig {
    /// Maximum number of events kept in the feed.
    #[serde(default = "default_feed_capacity")]
    pub capacity: usize,

    /// Real-time milliseconds between generation ticks.
    #[serde(default = "default_feed_tick_ms")]
    pub tick_interval_ms: u64,

    /// Probability that a generation tick produces an event.
    #[serde(default = "default_spawn_probability")]
    pub spawn_probability: f64,

    /// Events generated up front when the feed is mounted.
    #[serde(default = "default_initial_events")]
    pub initial_events: usize,

    /// Whether generation starts immediately.
    #[serde(default = "default_true")]
    pub live_on_start: bool,

    /// Random seed for reproducible feeds. Entropy-seeded when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl FeedConfig {
    /// Generation period as a [`Duration`].
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            capacity: default_feed_capacity(),
            tick_interval_ms: default_feed_tick_ms(),
            spawn_probability: default_spawn_probability(),
            initial_events: default_initial_events(),
            live_on_start: true,
            seed: None,
        }
    }
}

/// Scenario simulator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulatorConfig {
    /// Artificial "AI is thinking" delay before a report is returned.
    /// Zero disables it.
    #[serde(default = "default_presentation_delay_ms")]
    pub presentation_delay_ms: u64,
}

impl SimulatorConfig {
    /// Presentation delay as a [`Duration`].
    pub const fn presentation_delay(&self) -> Duration {
        Duration::from_millis(self.presentation_delay_ms)
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            presentation_delay_ms: default_presentation_delay_ms(),
        }
    }
}

/// Dashboard API server binding.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    /// Override the binding with `ORACLE_HOST` / `ORACLE_PORT` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `ORACLE_PORT` is not a port number.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("ORACLE_HOST") {
            self.host = val;
        }
        if let Ok(val) = std::env::var("ORACLE_PORT") {
            self.port = val
                .parse()
                .map_err(|e| invalid(format!("invalid ORACLE_PORT {val:?}: {e}")))?;
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_min_year() -> i32 {
    1990
}

const fn default_max_year() -> i32 {
    2050
}

const fn default_present_year() -> i32 {
    2024
}

const fn default_timeline_tick_ms() -> u64 {
    200
}

const fn default_feed_capacity() -> usize {
    10
}

const fn default_feed_tick_ms() -> u64 {
    5000
}

const fn default_spawn_probability() -> f64 {
    0.3
}

const fn default_initial_events() -> usize {
    5
}

const fn default_presentation_delay_ms() -> u64 {
    2000
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_dashboard() {
        let config = OracleConfig::default();
        assert_eq!(config.timeline.min_year, 1990);
        assert_eq!(config.timeline.max_year, 2050);
        assert_eq!(config.timeline.present_year, 2024);
        assert_eq!(config.timeline.tick_interval(), Duration::from_millis(200));
        assert_eq!(config.feed.capacity, 10);
        assert_eq!(config.feed.tick_interval(), Duration::from_millis(5000));
        assert_eq!(config.feed.initial_events, 5);
        assert_eq!(config.simulator.presentation_delay(), Duration::from_secs(2));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_partial_yaml_fills_defaults() {
        let yaml = r"
timeline:
  present_year: 2025
feed:
  spawn_probability: 0.5
  seed: 7
simulator:
  presentation_delay_ms: 0
logging:
  format: json
";
        let config = OracleConfig::parse(yaml);
        assert!(config.is_ok());
        let config = config.unwrap_or_default();
        assert_eq!(config.timeline.present_year, 2025);
        assert_eq!(config.timeline.min_year, 1990);
        assert_eq!(config.feed.seed, Some(7));
        assert_eq!(config.feed.capacity, 10);
        assert_eq!(config.simulator.presentation_delay_ms, 0);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn empty_yaml_is_default() {
        let config = OracleConfig::parse("{}");
        assert!(config.is_ok());
    }

    #[test]
    fn inverted_year_range_is_rejected() {
        let yaml = r"
timeline:
  min_year: 2050
  max_year: 1990
";
        let result = OracleConfig::parse(yaml);
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn present_year_outside_range_is_rejected() {
        let yaml = r"
timeline:
  present_year: 2100
";
        assert!(OracleConfig::parse(yaml).is_err());
    }

    #[test]
    fn probability_above_one_is_rejected() {
        let yaml = r"
feed:
  spawn_probability: 1.5
";
        assert!(OracleConfig::parse(yaml).is_err());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let yaml = r"
feed:
  capacity: 0
";
        assert!(OracleConfig::parse(yaml).is_err());
    }

    #[test]
    fn malformed_yaml_is_a_yaml_error() {
        let result = OracleConfig::parse("timeline: [unclosed");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }
}

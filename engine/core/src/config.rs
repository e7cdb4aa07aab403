//! TOML Configuration File Support
//!
//! Tunables for the care tracker and the evolution protocol, loaded from
//! `~/.config/pet-engine/engine.toml`.
//!
//! # Configuration Priority
//!
//! Values are resolved with the following priority (highest first):
//! 1. Environment variables (`PET_ENGINE_*`)
//! 2. TOML configuration file
//! 3. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [care]
//! snapshot_interval_secs = 300
//! tracking_window_secs = 3600
//! perfect_min_stat = 80.0
//!
//! [evolution]
//! imminent_xp_threshold = 10
//! golden_perfect_days = 7
//! just_evolved_secs = 5
//! ```

use std::path::PathBuf;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// Resolved Configuration
// =============================================================================

/// Care tracking tunables
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CareConfig {
    /// Minimum spacing between accepted stat snapshots (seconds)
    pub snapshot_interval_secs: u64,
    /// Cap on the in-memory care event log
    pub max_events: usize,
    /// Cap on the snapshot log (288 = 24h of 5-minute samples)
    pub max_snapshots: usize,
    /// How many of the newest events are written on export
    pub export_event_limit: usize,
    /// Rolling window used for care style classification (seconds)
    pub tracking_window_secs: u64,
    /// Any stat below this marks a snapshot as neglected
    pub low_stat_threshold: f64,
    /// All stats below this marks a snapshot as critical
    pub neglect_threshold: f64,
    /// All stats at or above this marks a snapshot as perfect
    pub perfect_min_stat: f64,
}

impl Default for CareConfig {
    fn default() -> Self {
        Self {
            snapshot_interval_secs: 300,
            max_events: 1000,
            max_snapshots: 288,
            export_event_limit: 500,
            tracking_window_secs: 3600,
            low_stat_threshold: 30.0,
            neglect_threshold: 15.0,
            perfect_min_stat: 80.0,
        }
    }
}

impl CareConfig {
    /// Snapshot spacing as a chrono duration
    #[must_use]
    pub fn snapshot_interval(&self) -> Duration {
        Duration::seconds(i64::try_from(self.snapshot_interval_secs).unwrap_or(i64::MAX))
    }

    /// Care style window as a chrono duration
    #[must_use]
    pub fn tracking_window(&self) -> Duration {
        Duration::seconds(i64::try_from(self.tracking_window_secs).unwrap_or(i64::MAX))
    }

    /// Care style window in hours
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn tracking_window_hours(&self) -> f64 {
        self.tracking_window_secs as f64 / 3600.0
    }
}

/// Evolution protocol tunables
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Remaining XP at or below which an upcoming stage change is "imminent"
    pub imminent_xp_threshold: u64,
    /// Consecutive perfect days required for the Golden form
    pub golden_perfect_days: u32,
    /// Stat floor that counts as perfect for the Golden form
    pub golden_min_stat: f64,
    /// Minimum level before any special form is considered
    pub special_min_level: u32,
    /// How long the "just evolved" status lingers (seconds)
    pub just_evolved_secs: u64,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            imminent_xp_threshold: 10,
            golden_perfect_days: 7,
            golden_min_stat: 80.0,
            special_min_level: 5,
            just_evolved_secs: 5,
        }
    }
}

impl EvolutionConfig {
    /// Celebration window as a chrono duration
    #[must_use]
    pub fn just_evolved_window(&self) -> Duration {
        Duration::seconds(i64::try_from(self.just_evolved_secs).unwrap_or(i64::MAX))
    }
}

/// Complete engine configuration
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Care tracking section
    pub care: CareConfig,
    /// Evolution section
    pub evolution: EvolutionConfig,
    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,
    /// Source of configuration values
    source: ConfigSource,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            care: CareConfig::default(),
            evolution: EvolutionConfig::default(),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl EngineConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Check that the values make sense together
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let care = &self.care;
        if care.max_events == 0 || care.max_snapshots == 0 {
            return Err(ConfigError::ValidationError(
                "max_events and max_snapshots must be positive".to_string(),
            ));
        }
        if care.tracking_window_secs == 0 {
            return Err(ConfigError::ValidationError(
                "tracking_window_secs must be positive".to_string(),
            ));
        }
        for (name, value) in [
            ("low_stat_threshold", care.low_stat_threshold),
            ("neglect_threshold", care.neglect_threshold),
            ("perfect_min_stat", care.perfect_min_stat),
            ("golden_min_stat", self.evolution.golden_min_stat),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be within 0..=100, got {value}"
                )));
            }
        }
        if care.neglect_threshold > care.low_stat_threshold {
            return Err(ConfigError::ValidationError(format!(
                "neglect_threshold ({}) must not exceed low_stat_threshold ({})",
                care.neglect_threshold, care.low_stat_threshold
            )));
        }
        Ok(())
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Care section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CareToml {
    /// Snapshot spacing in seconds
    pub snapshot_interval_secs: Option<u64>,
    /// Event log cap
    pub max_events: Option<usize>,
    /// Snapshot log cap
    pub max_snapshots: Option<usize>,
    /// Events written on export
    pub export_event_limit: Option<usize>,
    /// Care style window in seconds
    pub tracking_window_secs: Option<u64>,
    /// Neglect threshold for any single stat
    pub low_stat_threshold: Option<f64>,
    /// Critical threshold for all stats
    pub neglect_threshold: Option<f64>,
    /// Perfect-care floor
    pub perfect_min_stat: Option<f64>,
}

/// Evolution section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionToml {
    /// Imminent margin in XP
    pub imminent_xp_threshold: Option<u64>,
    /// Golden streak length in days
    pub golden_perfect_days: Option<u32>,
    /// Golden stat floor
    pub golden_min_stat: Option<f64>,
    /// Minimum level for special forms
    pub special_min_level: Option<u32>,
    /// Celebration window in seconds
    pub just_evolved_secs: Option<u64>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineToml {
    /// Care tracking section
    pub care: CareToml,
    /// Evolution section
    pub evolution: EvolutionToml,
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/pet-engine/engine.toml` or
/// `~/.config/pet-engine/engine.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("pet-engine").join("engine.toml"))
}

/// Load configuration from the default path plus environment overrides
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or if
/// the resolved values fail validation. A missing file is not an error.
pub fn load_config() -> Result<EngineConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Config file to read: the explicit path if given, else the default one
#[must_use]
pub fn resolve_config_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit.or_else(default_config_path)
}

/// Load configuration from a user-supplied path, falling back to the default
/// path when none is given
///
/// A missing default file is expected; a missing explicit file is logged at
/// `warn` before falling back to defaults.
///
/// # Errors
///
/// Same as [`load_config_from_path`].
pub fn load_config_with_override(explicit: Option<PathBuf>) -> Result<EngineConfig, ConfigError> {
    if let Some(path) = explicit.as_ref().filter(|p| !p.exists()) {
        tracing::warn!(
            path = %path.display(),
            "Config file does not exist, using defaults"
        );
    }
    load_config_from_path(resolve_config_path(explicit))
}

/// Load configuration from a specific path plus environment overrides
///
/// # Errors
///
/// Returns an error if the specified file cannot be read or parsed, or if
/// the resolved values fail validation.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<EngineConfig, ConfigError> {
    let mut config = EngineConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: EngineToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config);
    config.validate()?;

    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut EngineConfig, toml: &EngineToml) {
    let care = &mut config.care;
    if let Some(v) = toml.care.snapshot_interval_secs {
        care.snapshot_interval_secs = v;
    }
    if let Some(v) = toml.care.max_events {
        care.max_events = v;
    }
    if let Some(v) = toml.care.max_snapshots {
        care.max_snapshots = v;
    }
    if let Some(v) = toml.care.export_event_limit {
        care.export_event_limit = v;
    }
    if let Some(v) = toml.care.tracking_window_secs {
        care.tracking_window_secs = v;
    }
    if let Some(v) = toml.care.low_stat_threshold {
        care.low_stat_threshold = v;
    }
    if let Some(v) = toml.care.neglect_threshold {
        care.neglect_threshold = v;
    }
    if let Some(v) = toml.care.perfect_min_stat {
        care.perfect_min_stat = v;
    }

    let evolution = &mut config.evolution;
    if let Some(v) = toml.evolution.imminent_xp_threshold {
        evolution.imminent_xp_threshold = v;
    }
    if let Some(v) = toml.evolution.golden_perfect_days {
        evolution.golden_perfect_days = v;
    }
    if let Some(v) = toml.evolution.golden_min_stat {
        evolution.golden_min_stat = v;
    }
    if let Some(v) = toml.evolution.special_min_level {
        evolution.special_min_level = v;
    }
    if let Some(v) = toml.evolution.just_evolved_secs {
        evolution.just_evolved_secs = v;
    }
}

/// Apply environment variable overrides to the config
fn apply_env_config(config: &mut EngineConfig) {
    if let Some(v) = env_parse::<u64>("PET_ENGINE_SNAPSHOT_INTERVAL") {
        config.care.snapshot_interval_secs = v;
        config.source = ConfigSource::Env;
    }
    if let Some(v) = env_parse::<u64>("PET_ENGINE_CARE_WINDOW") {
        config.care.tracking_window_secs = v;
        config.source = ConfigSource::Env;
    }
    if let Some(v) = env_parse::<f64>("PET_ENGINE_PERFECT_MIN_STAT") {
        config.care.perfect_min_stat = v;
        config.source = ConfigSource::Env;
    }
    if let Some(v) = env_parse::<u64>("PET_ENGINE_IMMINENT_XP") {
        config.evolution.imminent_xp_threshold = v;
        config.source = ConfigSource::Env;
    }
    if let Some(v) = env_parse::<u32>("PET_ENGINE_GOLDEN_DAYS") {
        config.evolution.golden_perfect_days = v;
        config.source = ConfigSource::Env;
    }
    if let Some(v) = env_parse::<u64>("PET_ENGINE_JUST_EVOLVED_SECS") {
        config.evolution.just_evolved_secs = v;
        config.source = ConfigSource::Env;
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok()?.trim().parse().ok()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_toml(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();

        assert_eq!(config.care.snapshot_interval_secs, 300);
        assert_eq!(config.care.max_events, 1000);
        assert_eq!(config.care.max_snapshots, 288);
        assert_eq!(config.care.export_event_limit, 500);
        assert_eq!(config.care.tracking_window_secs, 3600);
        assert_eq!(config.evolution.imminent_xp_threshold, 10);
        assert_eq!(config.evolution.golden_perfect_days, 7);
        assert_eq!(config.evolution.just_evolved_secs, 5);
        assert_eq!(config.source(), ConfigSource::Default);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_config_path() {
        if let Some(p) = default_config_path() {
            assert!(p.to_string_lossy().contains("pet-engine"));
            assert!(p.to_string_lossy().ends_with("engine.toml"));
        }
    }

    #[test]
    fn test_parse_partial_toml() {
        let file = write_toml(
            r#"
[care]
tracking_window_secs = 7200
perfect_min_stat = 75.0

[evolution]
golden_perfect_days = 3
"#,
        );

        let config = load_config_from_path(Some(file.path().to_path_buf())).unwrap();

        assert_eq!(config.care.tracking_window_secs, 7200);
        assert!((config.care.tracking_window_hours() - 2.0).abs() < f64::EPSILON);
        assert_eq!(config.evolution.golden_perfect_days, 3);
        // untouched values keep their defaults
        assert_eq!(config.care.max_snapshots, 288);
        assert_eq!(config.evolution.special_min_level, 5);
        assert_eq!(
            config.config_file_path.as_deref(),
            Some(file.path())
        );
    }

    #[test]
    fn test_missing_file_graceful() {
        let path = PathBuf::from("/nonexistent/path/engine.toml");
        let config = load_config_from_path(Some(path)).unwrap();

        assert!(config.config_file_path.is_none());
        assert!(
            config.source() == ConfigSource::Default || config.source() == ConfigSource::Env,
            "Expected Default or Env source, got: {:?}",
            config.source()
        );
    }

    #[test]
    fn test_resolve_prefers_explicit_path() {
        let explicit = PathBuf::from("/etc/pet-engine/custom.toml");
        assert_eq!(resolve_config_path(Some(explicit.clone())), Some(explicit));
    }

    #[test]
    fn test_resolve_falls_back_to_default_path() {
        assert_eq!(resolve_config_path(None), default_config_path());
    }

    #[test]
    fn test_override_loads_explicit_file() {
        let file = write_toml("[evolution]\nimminent_xp_threshold = 25\n");

        let config = load_config_with_override(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.evolution.imminent_xp_threshold, 25);
        assert_eq!(config.config_file_path.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_override_missing_explicit_file_uses_defaults() {
        let path = PathBuf::from("/nonexistent/path/custom.toml");
        let config = load_config_with_override(Some(path)).unwrap();

        assert!(config.config_file_path.is_none());
        assert_ne!(config.source(), ConfigSource::File);
    }

    #[test]
    fn test_malformed_toml_error() {
        let file = write_toml("[care\nmax_events = \"lots\"\n");

        let result = load_config_from_path(Some(file.path().to_path_buf()));
        assert!(matches!(result.unwrap_err(), ConfigError::ParseError(_)));
    }

    #[test]
    fn test_validation_rejects_inverted_thresholds() {
        let file = write_toml(
            r#"
[care]
low_stat_threshold = 10.0
neglect_threshold = 20.0
"#,
        );

        let result = load_config_from_path(Some(file.path().to_path_buf()));
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn test_validation_rejects_zero_caps() {
        let mut config = EngineConfig::default();
        config.care.max_events = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_out_of_range_stat() {
        let mut config = EngineConfig::default();
        config.evolution.golden_min_stat = 120.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("golden_min_stat"));
    }

    #[test]
    fn test_config_source_display() {
        assert_eq!(ConfigSource::Env.to_string(), "environment");
        assert_eq!(ConfigSource::File.to_string(), "config file");
        assert_eq!(ConfigSource::Default.to_string(), "default");
    }
}

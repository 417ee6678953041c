use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use mnp_replay_parser::ClassifierRules;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_POSTS_DIR: &str = "data/posts";
pub const DEFAULT_ARCHIVE_DIR: &str = "mnp-data-archive";
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::Los_Angeles;

/// Minimum delay observed in practice between a phase transition and the next phase starting.
pub const PHASE_START_OFFSET_MS: i64 = 60 * 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unknown timezone '{0}'")]
    UnknownTimezone(String),
    #[error("offset {name} must not be negative, got {value}")]
    NegativeOffset { name: &'static str, value: i64 },
}

/// Offsets added to an anchor timestamp before measuring a phase duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseOffsets {
    /// Between the previous acknowledgment (lineup or score confirmation) and picking.
    pub picking_start_ms: i64,
    /// Between a round's picking submission and responding.
    pub responding_start_ms: i64,
    /// Between a round's responding submission and a game starting.
    pub game_start_ms: i64,
}

impl Default for PhaseOffsets {
    fn default() -> Self {
        Self {
            picking_start_ms: PHASE_START_OFFSET_MS,
            responding_start_ms: PHASE_START_OFFSET_MS,
            game_start_ms: PHASE_START_OFFSET_MS,
        }
    }
}

/// Everything the pipeline needs, passed explicitly to [`crate::pipeline::run`].
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub posts_dir: PathBuf,
    pub archive_dir: PathBuf,
    pub timezone: Tz,
    pub rules: ClassifierRules,
    pub offsets: PhaseOffsets,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new(DEFAULT_POSTS_DIR, DEFAULT_ARCHIVE_DIR)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    timezone: Option<String>,
    scrimmage_week: Option<String>,
    ignored_seasons: Option<Vec<String>>,
    offsets: Option<OffsetsFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct OffsetsFile {
    picking_start_ms: Option<i64>,
    responding_start_ms: Option<i64>,
    game_start_ms: Option<i64>,
}

impl PipelineConfig {
    pub fn new(posts_dir: impl Into<PathBuf>, archive_dir: impl Into<PathBuf>) -> Self {
        Self {
            posts_dir: posts_dir.into(),
            archive_dir: archive_dir.into(),
            timezone: DEFAULT_TIMEZONE,
            rules: ClassifierRules::default(),
            offsets: PhaseOffsets::default(),
        }
    }

    /// Applies the overrides in a TOML config file on top of the current values.
    pub fn with_overrides_file(self, path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.with_overrides(&content)?)
    }

    pub fn with_overrides(mut self, content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;

        if let Some(name) = file.timezone {
            self.timezone = name
                .parse::<Tz>()
                .map_err(|_| ConfigError::UnknownTimezone(name.clone()))?;
        }
        if let Some(week) = file.scrimmage_week {
            self.rules.scrimmage_week = week;
        }
        if let Some(seasons) = file.ignored_seasons {
            self.rules.ignored_seasons = seasons.into_iter().collect();
        }
        if let Some(offsets) = file.offsets {
            if let Some(ms) = offsets.picking_start_ms {
                self.offsets.picking_start_ms = non_negative("picking_start_ms", ms)?;
            }
            if let Some(ms) = offsets.responding_start_ms {
                self.offsets.responding_start_ms = non_negative("responding_start_ms", ms)?;
            }
            if let Some(ms) = offsets.game_start_ms {
                self.offsets.game_start_ms = non_negative("game_start_ms", ms)?;
            }
        }

        Ok(self)
    }
}

fn non_negative(name: &'static str, value: i64) -> Result<i64, ConfigError> {
    if value < 0 {
        Err(ConfigError::NegativeOffset { name, value })
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_league_conventions() {
        let config = PipelineConfig::default();
        assert_eq!(config.posts_dir, PathBuf::from("data/posts"));
        assert_eq!(config.archive_dir, PathBuf::from("mnp-data-archive"));
        assert_eq!(config.timezone, chrono_tz::America::Los_Angeles);
        assert_eq!(config.rules.scrimmage_week, "S");
        assert!(config.rules.ignored_seasons.contains("13"));
        assert_eq!(config.offsets.picking_start_ms, 60_000);
        assert_eq!(config.offsets.responding_start_ms, 60_000);
        assert_eq!(config.offsets.game_start_ms, 60_000);
    }

    #[test]
    fn toml_overrides_replace_only_named_values() {
        let config = PipelineConfig::default()
            .with_overrides(
                r#"
                    timezone = "America/New_York"
                    ignored_seasons = ["11", "12"]

                    [offsets]
                    game_start_ms = 30000
                "#,
            )
            .expect("valid overrides");
        assert_eq!(config.timezone, chrono_tz::America::New_York);
        assert_eq!(config.rules.scrimmage_week, "S");
        assert_eq!(config.rules.ignored_seasons.len(), 2);
        assert!(!config.rules.ignored_seasons.contains("13"));
        assert_eq!(config.offsets.game_start_ms, 30_000);
        assert_eq!(config.offsets.picking_start_ms, 60_000);
    }

    #[test]
    fn invalid_overrides_are_rejected() {
        let err = PipelineConfig::default()
            .with_overrides(r#"timezone = "Mars/Olympus""#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownTimezone(ref name) if name == "Mars/Olympus"));

        let err = PipelineConfig::default()
            .with_overrides("[offsets]\npicking_start_ms = -5")
            .unwrap_err();
        assert!(matches!(err, ConfigError::NegativeOffset { value: -5, .. }));

        let err = PipelineConfig::default()
            .with_overrides("posts_dir = \"elsewhere\"")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn overrides_file_errors_surface_as_pipeline_errors() {
        let dir = tempfile::tempdir().expect("tempdir");

        let missing = dir.path().join("missing.toml");
        let err = PipelineConfig::default()
            .with_overrides_file(&missing)
            .unwrap_err();
        assert!(matches!(
            err,
            crate::PipelineError::Config(ConfigError::Read { ref path, .. }) if *path == missing
        ));

        let path = dir.path().join("replay.toml");
        std::fs::write(&path, "scrimmage_week = \"X\"\n").expect("write config");
        let config = PipelineConfig::default()
            .with_overrides_file(&path)
            .expect("valid config file");
        assert_eq!(config.rules.scrimmage_week, "X");

        std::fs::write(&path, "timezone = \"Nowhere/City\"\n").expect("write config");
        let err = PipelineConfig::default()
            .with_overrides_file(&path)
            .unwrap_err();
        assert!(matches!(
            err,
            crate::PipelineError::Config(ConfigError::UnknownTimezone(_))
        ));
    }
}

//! Runtime configuration for layout, scheduling fallbacks and logging.
//!
//! # Responsibility
//! - Hold tunable constants with production defaults.
//! - Load overrides from JSON and validate them before use.
//!
//! # Invariants
//! - Every field has a default; an empty JSON object is a valid config.
//! - A config that fails `validate()` is never handed to projections.

use crate::logging::{default_log_level, normalize_level};
use crate::model::snapshot::CostLegend;
use crate::projection::date::parse_plan_date;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const DEFAULT_LOG_BASENAME: &str = "plantree";

/// Geometry used by the diagram layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutMetrics {
    pub node_width: f64,
    pub node_height: f64,
    /// Horizontal gap between sibling subtrees.
    pub h_gap: f64,
    /// Vertical gap between a parent and its children.
    pub v_gap: f64,
    pub margin: f64,
    pub min_canvas_width: f64,
    pub min_canvas_height: f64,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            node_width: 260.0,
            node_height: 88.0,
            h_gap: 40.0,
            v_gap: 80.0,
            margin: 24.0,
            min_canvas_width: 1920.0,
            min_canvas_height: 1080.0,
        }
    }
}

/// Fallback schedule for unscheduled leaves in the timeline widget feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleDefaults {
    /// `dd-mm-yyyy` or `yyyy-mm-dd`.
    pub start_date: String,
    pub duration_days: u32,
}

impl Default for ScheduleDefaults {
    fn default() -> Self {
        Self {
            start_date: "24-08-2025".to_string(),
            duration_days: 5,
        }
    }
}

/// Log level and destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Absolute directory for rolling log files. `None` disables file logs.
    pub log_dir: Option<PathBuf>,
    pub file_basename: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            log_dir: None,
            file_basename: DEFAULT_LOG_BASENAME.to_string(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    pub layout: LayoutMetrics,
    pub schedule: ScheduleDefaults,
    pub logging: LoggingConfig,
    pub legend: CostLegend,
}

/// Errors from loading or validating configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Json(String),
    InvalidValue { field: &'static str, message: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Json(message) => write!(f, "invalid config JSON: {message}"),
            Self::InvalidValue { field, message } => {
                write!(f, "invalid config value `{field}`: {message}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl PlanConfig {
    /// Reads, parses and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let payload = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&payload)
    }

    /// Parses and validates a JSON config payload.
    pub fn from_json_str(payload: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(payload).map_err(|err| ConfigError::Json(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let layout = &self.layout;
        require_positive("layout.node_width", layout.node_width)?;
        require_positive("layout.node_height", layout.node_height)?;
        require_non_negative("layout.h_gap", layout.h_gap)?;
        require_non_negative("layout.v_gap", layout.v_gap)?;
        require_non_negative("layout.margin", layout.margin)?;
        require_non_negative("layout.min_canvas_width", layout.min_canvas_width)?;
        require_non_negative("layout.min_canvas_height", layout.min_canvas_height)?;

        if parse_plan_date(&self.schedule.start_date).is_none() {
            return Err(ConfigError::InvalidValue {
                field: "schedule.start_date",
                message: format!("`{}` is not a date", self.schedule.start_date),
            });
        }

        normalize_level(&self.logging.level).map_err(|message| ConfigError::InvalidValue {
            field: "logging.level",
            message,
        })?;
        if let Some(dir) = &self.logging.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::InvalidValue {
                    field: "logging.log_dir",
                    message: format!("must be absolute, got `{}`", dir.display()),
                });
            }
        }
        if self.logging.file_basename.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "logging.file_basename",
                message: "must not be blank".to_string(),
            });
        }
        Ok(())
    }
}

fn require_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        return Ok(());
    }
    Err(ConfigError::InvalidValue {
        field,
        message: format!("must be > 0, got {value}"),
    })
}

fn require_non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        return Ok(());
    }
    Err(ConfigError::InvalidValue {
        field,
        message: format!("must be >= 0, got {value}"),
    })
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, PlanConfig};

    #[test]
    fn empty_object_yields_defaults() {
        let config = PlanConfig::from_json_str("{}").unwrap();
        assert_eq!(config, PlanConfig::default());
        assert_eq!(config.layout.node_width, 260.0);
        assert_eq!(config.schedule.duration_days, 5);
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config = PlanConfig::from_json_str(r#"{"layout": {"h_gap": 12}}"#).unwrap();
        assert_eq!(config.layout.h_gap, 12.0);
        assert_eq!(config.layout.v_gap, 80.0);
    }

    #[test]
    fn rejects_non_positive_node_size() {
        let err = PlanConfig::from_json_str(r#"{"layout": {"node_width": 0}}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "layout.node_width",
                ..
            }
        ));
    }

    #[test]
    fn rejects_unknown_log_level_and_bad_fallback_date() {
        let err = PlanConfig::from_json_str(r#"{"logging": {"level": "loud"}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "logging.level", .. }));

        let err =
            PlanConfig::from_json_str(r#"{"schedule": {"start_date": "later"}}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "schedule.start_date",
                ..
            }
        ));
    }

    #[test]
    fn rejects_relative_log_dir() {
        let err =
            PlanConfig::from_json_str(r#"{"logging": {"log_dir": "logs/dev"}}"#).unwrap_err();
        assert!(err.to_string().contains("absolute"));
    }
}

//! The knobs of an analysis, read once per invocation.
//!
//! A config can be stored as [ron], for example:
//!
//! ```text
//! (
//!     weighted_average: true,
//!     num_trials: 16,
//!     weights: (time: 1.0, score: 1.0),
//!     expected_runs: Some(3),
//!     run_order: Sorted,
//!     strict: false,
//! )
//! ```

use crate::run_metrics::Weights;

use serde::{Deserialize, Serialize};
use std::{
    borrow::Cow,
    fmt,
    fs::File,
    io::{Read, Write},
    path::Path,
};

/// How the runs inside a trial directory are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RunOrder {
    /// By file name, so the result is the same on every platform
    #[default]
    Sorted,
    /// Whatever order the directory listing yields
    Listing,
}

/// The scalar that stands in for "performance" in the figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerformanceMetric {
    /// Raw survival time of each run
    TimeAlive,
    /// Survival time combined with score rate, see [Weights]
    WeightedScore,
}

impl PerformanceMetric {
    /// Label for the performance axis of a chart.
    pub fn axis_label(&self) -> &'static str {
        match self {
            PerformanceMetric::TimeAlive => "Time [s]",
            PerformanceMetric::WeightedScore => "Performance weighted average",
        }
    }
}

/// Configuration for one aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Use the weighted score (true) or survival time only (false) as the
    /// performance metric
    pub weighted_average: bool,
    /// Trials are read from directories `1..=num_trials`
    pub num_trials: u32,
    /// Weights for the weighted score
    pub weights: Weights,
    /// How many runs every trial should have, `None` to skip the check
    pub expected_runs: Option<usize>,
    /// Ordering of runs within a trial
    pub run_order: RunOrder,
    /// Turn structural problems (empty trials, wrong run counts) into errors
    pub strict: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            weighted_average: false,
            num_trials: 16,
            weights: Weights::default(),
            expected_runs: Some(3),
            run_order: RunOrder::default(),
            strict: false,
        }
    }
}

/// Returned when reading or writing an [AnalysisConfig] fails.
#[derive(Debug)]
pub enum ConfigError {
    /// Returned when io fails when reading or writing files.
    IoError(std::io::Error),

    /// Returned when serialization fails.
    RonError(ron::Error),

    /// Returned when deserialization fails.
    RonSpannedError(ron::de::SpannedError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match self {
            ConfigError::IoError(error) => Cow::from(format!("io error: {}", error)),
            ConfigError::RonError(error) => Cow::from(format!("ron error: {}", error)),
            ConfigError::RonSpannedError(error) => {
                Cow::from(format!("ron spanning error: {}", error))
            }
        };

        write!(f, "{}", msg)
    }
}

impl std::error::Error for ConfigError {}

impl AnalysisConfig {
    /// The performance metric selected by `weighted_average`.
    pub fn metric(&self) -> PerformanceMetric {
        if self.weighted_average {
            PerformanceMetric::WeightedScore
        } else {
            PerformanceMetric::TimeAlive
        }
    }

    /// Read a config from the path provided.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut handle = File::open(path).map_err(ConfigError::IoError)?;
        Self::from_file(&mut handle)
    }

    /// Read a config from the [Read]able object provided. Missing fields
    /// take their default values.
    pub fn from_file(file: &mut impl Read) -> Result<Self, ConfigError> {
        let mut text = String::new();
        file.read_to_string(&mut text)
            .map_err(ConfigError::IoError)?;
        ron::from_str(&text).map_err(ConfigError::RonSpannedError)
    }

    /// Write the config out to the path provided.
    pub fn to_path(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let mut handle = File::create(path).map_err(ConfigError::IoError)?;
        self.to_file(&mut handle)
    }

    /// Write the config out to the [Write]able object provided.
    pub fn to_file(&self, file: &mut impl Write) -> Result<(), ConfigError> {
        let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(ConfigError::RonError)?;
        file.write_all(text.as_bytes())
            .map_err(ConfigError::IoError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn defaults_match_the_experiment() {
        let cfg = AnalysisConfig::default();
        assert!(!cfg.weighted_average);
        assert_eq!(cfg.num_trials, 16);
        assert_eq!(cfg.weights, Weights::default());
        assert_eq!(cfg.expected_runs, Some(3));
        assert_eq!(cfg.metric(), PerformanceMetric::TimeAlive);
    }

    #[test]
    fn write_and_read_path() {
        let tempfile = tempfile::NamedTempFile::new().unwrap();
        let cfg = AnalysisConfig {
            weighted_average: true,
            num_trials: 2,
            weights: Weights {
                time: 0.5,
                score: 2.0,
            },
            expected_runs: None,
            run_order: RunOrder::Listing,
            strict: true,
        };

        cfg.to_path(tempfile.path()).unwrap();
        let read_cfg = AnalysisConfig::from_path(tempfile.path()).unwrap();
        assert_eq!(cfg, read_cfg);
        assert_eq!(read_cfg.metric(), PerformanceMetric::WeightedScore);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let mut buf = Cursor::new("(num_trials: 4)");
        let cfg = AnalysisConfig::from_file(&mut buf).unwrap();
        assert_eq!(cfg.num_trials, 4);
        assert_eq!(cfg.expected_runs, Some(3));
        assert_eq!(cfg.run_order, RunOrder::Sorted);
    }

    #[test]
    fn garbage_config_is_an_error() {
        let mut buf = Cursor::new("(num_trials: \"many\")");
        assert!(matches!(
            AnalysisConfig::from_file(&mut buf),
            Err(ConfigError::RonSpannedError(_))
        ));
    }
}

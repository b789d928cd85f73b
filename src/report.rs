//! Plain text and [ron] outputs of an analysis.
//!
//! [render_summary] is what the `summary` subcommand prints. [Export] bundles
//! the configuration, every run and all figure data into one ron document,
//! so the numbers can be plotted by some other tool.

use crate::aggregator::{Condition, ConditionSeries, Study};
use crate::config::AnalysisConfig;
use crate::figures::FigureSet;
use crate::stats::{mean, BoxStats};

use serde::Serialize;
use std::{
    borrow::Cow,
    fmt::{self, Write as _},
    fs::File,
    io::Write,
    path::Path,
};

fn stats_row(out: &mut String, name: &str, values: &[f64]) -> fmt::Result {
    match BoxStats::from_samples(values) {
        Some(s) => writeln!(
            out,
            "  {:<20} n={:<4} min={:<8.2} q1={:<8.2} median={:<8.2} q3={:<8.2} max={:<8.2} mean={:.2}",
            name, s.count, s.min, s.q1, s.median, s.q3, s.max, s.mean
        ),
        None => writeln!(out, "  {:<20} n=0", name),
    }
}

fn condition_block(out: &mut String, series: &ConditionSeries, config: &AnalysisConfig) -> fmt::Result {
    let trials = series.by_trial(config.metric());
    writeln!(
        out,
        "{}: {} runs in {} trials",
        series.condition(),
        series.runs().len(),
        trials.len()
    )?;
    stats_row(out, "time alive", &series.time_alive())?;
    stats_row(out, "weighted score", &series.weighted_score())?;
    stats_row(out, "max velocity", &series.max_velocity())?;
    stats_row(out, "distance travelled", &series.distance_travelled())?;

    write!(out, "  mean per trial     ")?;
    for group in &trials {
        match mean(&group.values) {
            Some(m) => write!(out, " {}:{:.2}", group.trial, m)?,
            None => write!(out, " {}:-", group.trial)?,
        }
    }
    writeln!(out)
}

/// Render the text summary of a study.
pub fn render_summary(study: &Study, config: &AnalysisConfig) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(out, "Performance metric: {}", config.metric().axis_label())?;
    writeln!(
        out,
        "Weights: time={} score={}",
        config.weights.time, config.weights.score
    )?;
    writeln!(out)?;

    for condition in Condition::ALL {
        condition_block(&mut out, study.series(condition), config)?;
        writeln!(out)?;
    }

    let issues = study.issues();
    if issues.is_empty() {
        writeln!(out, "No structural issues.")?;
    } else {
        writeln!(out, "Structural issues:")?;
        for issue in issues {
            writeln!(out, "  {}", issue)?;
        }
    }

    Ok(out)
}

/// Returned when an [Export] cannot be written.
#[derive(Debug)]
pub enum ExportError {
    /// Returned when io fails when writing the file.
    IoError(std::io::Error),

    /// Returned when serialization fails.
    RonError(ron::Error),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match self {
            ExportError::IoError(error) => Cow::from(format!("io error: {}", error)),
            ExportError::RonError(error) => Cow::from(format!("ron error: {}", error)),
        };

        write!(f, "{}", msg)
    }
}

impl std::error::Error for ExportError {}

/// Everything computed in one invocation, ready to be serialized.
#[derive(Debug, Serialize)]
pub struct Export<'a> {
    /// The configuration the study was read with
    pub config: &'a AnalysisConfig,
    /// Both conditions with every run
    pub study: &'a Study,
    /// Data for the five figures
    pub figures: &'a FigureSet,
}

impl Export<'_> {
    /// Write the export out to the path provided.
    pub fn to_path(&self, path: impl AsRef<Path>) -> Result<(), ExportError> {
        let mut handle = File::create(path).map_err(ExportError::IoError)?;
        self.to_file(&mut handle)
    }

    /// Write the export out to the [Write]able object provided.
    pub fn to_file(&self, file: &mut impl Write) -> Result<(), ExportError> {
        let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(ExportError::RonError)?;
        file.write_all(text.as_bytes())
            .map_err(ExportError::IoError)
    }
}

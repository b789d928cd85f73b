//! Walks the trial directories of an experiment and collects the metrics of
//! every run, grouped by condition.
//!
//! The expected layout is
//!
//! ```text
//! <root>/with_haptics/<trial>/<run files>
//! <root>/without_haptics/<trial>/<run files>
//! ```
//!
//! where `<trial>` goes from `1` to `num_trials`. Every regular file directly
//! inside a trial directory is one run.

use crate::config::{AnalysisConfig, PerformanceMetric, RunOrder};
use crate::run_metrics::{parse_run, RunError, RunMetrics};
use crate::TrialId;

use log::{debug, info, warn};
use serde::Serialize;
use std::{
    fmt,
    fs::{self, File},
    io::BufReader,
    path::{Path, PathBuf},
};

/// One arm of the experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Condition {
    /// Players had force feedback from the haptic device
    WithHaptics,
    /// Players had no force feedback
    WithoutHaptics,
}

impl Condition {
    /// Both conditions, in the order the figures show them.
    pub const ALL: [Condition; 2] = [Condition::WithoutHaptics, Condition::WithHaptics];

    /// Name of the condition's directory under the experiment root.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Condition::WithHaptics => "with_haptics",
            Condition::WithoutHaptics => "without_haptics",
        }
    }

    /// Human readable name.
    pub fn label(&self) -> &'static str {
        match self {
            Condition::WithHaptics => "With haptics",
            Condition::WithoutHaptics => "Without haptics",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Something about the directory layout that makes the charts misleading,
/// but does not stop us from reading the runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StructuralIssue {
    /// A trial directory had no run files in it
    EmptyTrial {
        /// Which condition
        condition: Condition,
        /// Which trial
        trial: TrialId,
    },
    /// A trial had a different number of runs than configured
    RunCount {
        /// Which condition
        condition: Condition,
        /// Which trial
        trial: TrialId,
        /// Configured number of runs
        expected: usize,
        /// Number of run files found
        found: usize,
    },
}

impl fmt::Display for StructuralIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructuralIssue::EmptyTrial { condition, trial } => {
                write!(f, "{} trial {} has no runs", condition, trial)
            }
            StructuralIssue::RunCount {
                condition,
                trial,
                expected,
                found,
            } => write!(
                f,
                "{} trial {} has {} runs, expected {}",
                condition, trial, found, expected
            ),
        }
    }
}

/// Anything that stops an aggregation. None of these leave partial results
/// behind.
#[derive(Debug)]
pub enum AggregateError {
    /// A directory could not be listed or a file could not be opened
    Io {
        /// The path we were working on
        path: PathBuf,
        /// What the OS said
        error: std::io::Error,
    },
    /// A run log was malformed
    Run(RunError),
    /// The layout broke expectations and the config asked to be strict
    Structure(Vec<StructuralIssue>),
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AggregateError::Io { path, error } => {
                write!(f, "{}: io error: {}", path.display(), error)
            }
            AggregateError::Run(error) => write!(f, "{}", error),
            AggregateError::Structure(issues) => {
                write!(f, "unexpected trial layout:")?;
                for issue in issues {
                    write!(f, "\n  {}", issue)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for AggregateError {}

impl From<RunError> for AggregateError {
    fn from(value: RunError) -> Self {
        Self::Run(value)
    }
}

/// Every run of one condition, in trial-then-run order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionSeries {
    condition: Condition,
    runs: Vec<RunMetrics>,
    issues: Vec<StructuralIssue>,
}

/// The performance values of the runs of one trial.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialGroup {
    /// Trial id
    pub trial: TrialId,
    /// One value per run, in run order
    pub values: Vec<f64>,
}

impl ConditionSeries {
    /// A series built from runs that were already parsed.
    pub fn new(condition: Condition, runs: Vec<RunMetrics>) -> Self {
        ConditionSeries {
            condition,
            runs,
            issues: Vec::new(),
        }
    }

    /// Which arm of the experiment this is.
    pub fn condition(&self) -> Condition {
        self.condition
    }

    /// The runs, in the order they were read.
    pub fn runs(&self) -> &[RunMetrics] {
        &self.runs
    }

    /// Problems with the trial layout found while reading.
    pub fn issues(&self) -> &[StructuralIssue] {
        &self.issues
    }

    /// All `TIME_ALIVE` values.
    pub fn time_alive(&self) -> Vec<f64> {
        self.runs.iter().flat_map(|r| r.time_alive.iter().copied()).collect()
    }

    /// One weighted score per run.
    pub fn weighted_score(&self) -> Vec<f64> {
        self.runs.iter().map(|r| r.weighted_score).collect()
    }

    /// All `MAX_VELOCITY` values. Runs without one contribute nothing.
    pub fn max_velocity(&self) -> Vec<f64> {
        self.runs.iter().flat_map(|r| r.max_velocity.iter().copied()).collect()
    }

    /// All `DISTANCE_TRAVELLED` values. Runs without one contribute nothing.
    pub fn distance_travelled(&self) -> Vec<f64> {
        self.runs
            .iter()
            .flat_map(|r| r.distance_travelled.iter().copied())
            .collect()
    }

    /// The sequence selected as "performance". This only picks one of the
    /// sequences above, nothing is recomputed.
    pub fn performance(&self, metric: PerformanceMetric) -> Vec<f64> {
        match metric {
            PerformanceMetric::TimeAlive => self.time_alive(),
            PerformanceMetric::WeightedScore => self.weighted_score(),
        }
    }

    /// Performance of a single run. A run with several `TIME_ALIVE` records
    /// is represented by the first one.
    pub fn run_performance(run: &RunMetrics, metric: PerformanceMetric) -> Option<f64> {
        match metric {
            PerformanceMetric::TimeAlive => run.time_alive.first().copied(),
            PerformanceMetric::WeightedScore => Some(run.weighted_score),
        }
    }

    /// Performance grouped by the trial each run came from, trials in
    /// ascending order.
    pub fn by_trial(&self, metric: PerformanceMetric) -> Vec<TrialGroup> {
        let mut groups: Vec<TrialGroup> = Vec::new();
        for run in &self.runs {
            let values = match metric {
                PerformanceMetric::TimeAlive => run.time_alive.clone(),
                PerformanceMetric::WeightedScore => vec![run.weighted_score],
            };
            match groups.iter_mut().find(|g| g.trial == run.trial) {
                Some(group) => group.values.extend(values),
                None => groups.push(TrialGroup {
                    trial: run.trial,
                    values,
                }),
            }
        }
        groups.sort_by_key(|g| g.trial);
        groups
    }

    /// Performance grouped by position within a trial: group `i` holds the
    /// `i`th run of every trial. Runs are matched by their trial id, so a
    /// trial with fewer runs simply has no entry in the later groups.
    pub fn by_repetition(&self, metric: PerformanceMetric) -> Vec<Vec<f64>> {
        let mut reps: Vec<Vec<f64>> = Vec::new();
        let mut position = 0;
        let mut last_trial = None;
        for run in &self.runs {
            if last_trial != Some(run.trial) {
                position = 0;
                last_trial = Some(run.trial);
            }
            if let Some(value) = Self::run_performance(run, metric) {
                if reps.len() <= position {
                    reps.resize_with(position + 1, Vec::new);
                }
                reps[position].push(value);
            }
            position += 1;
        }
        reps
    }
}

/// Both conditions of an experiment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Study {
    /// Runs recorded with force feedback
    pub with: ConditionSeries,
    /// Runs recorded without force feedback
    pub without: ConditionSeries,
}

impl Study {
    /// The series for `condition`.
    pub fn series(&self, condition: Condition) -> &ConditionSeries {
        match condition {
            Condition::WithHaptics => &self.with,
            Condition::WithoutHaptics => &self.without,
        }
    }

    /// Structural issues of both conditions.
    pub fn issues(&self) -> Vec<StructuralIssue> {
        self.without
            .issues()
            .iter()
            .chain(self.with.issues())
            .cloned()
            .collect()
    }
}

/// Lists the run files of one trial directory in the configured order.
fn list_runs(dir: &Path, order: RunOrder) -> Result<Vec<PathBuf>, AggregateError> {
    let io_err = |error| AggregateError::Io {
        path: dir.to_path_buf(),
        error,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        } else {
            debug!("skipping {}, not a file", path.display());
        }
    }

    if order == RunOrder::Sorted {
        files.sort();
    }
    Ok(files)
}

/// Read every run of `condition` under `root`.
pub fn aggregate_condition(
    root: impl AsRef<Path>,
    condition: Condition,
    config: &AnalysisConfig,
) -> Result<ConditionSeries, AggregateError> {
    let cond_dir = root.as_ref().join(condition.dir_name());
    if !cond_dir.is_dir() {
        return Err(AggregateError::Io {
            path: cond_dir,
            error: std::io::Error::new(std::io::ErrorKind::NotFound, "no such directory"),
        });
    }

    let mut runs = Vec::new();
    let mut issues = Vec::new();

    for trial in 1..=config.num_trials {
        let trial_dir = cond_dir.join(trial.to_string());
        let files = list_runs(&trial_dir, config.run_order)?;

        if files.is_empty() {
            issues.push(StructuralIssue::EmptyTrial { condition, trial });
        } else if let Some(expected) = config.expected_runs {
            if files.len() != expected {
                issues.push(StructuralIssue::RunCount {
                    condition,
                    trial,
                    expected,
                    found: files.len(),
                });
            }
        }

        for path in files {
            let file = File::open(&path).map_err(|error| AggregateError::Io {
                path: path.clone(),
                error,
            })?;
            runs.push(parse_run(BufReader::new(file), trial, &path, config.weights)?);
        }
    }

    for issue in &issues {
        warn!("{}", issue);
    }
    if config.strict && !issues.is_empty() {
        return Err(AggregateError::Structure(issues));
    }

    info!(
        "{}: read {} runs from {} trials",
        condition,
        runs.len(),
        config.num_trials
    );

    Ok(ConditionSeries {
        condition,
        runs,
        issues,
    })
}

/// Read both conditions under `root`.
pub fn aggregate(root: impl AsRef<Path>, config: &AnalysisConfig) -> Result<Study, AggregateError> {
    let root = root.as_ref();
    Ok(Study {
        with: aggregate_condition(root, Condition::WithHaptics, config)?,
        without: aggregate_condition(root, Condition::WithoutHaptics, config)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{create_dir_all, write};
    use tempfile::TempDir;

    fn write_run(root: &Path, condition: Condition, trial: TrialId, name: &str, text: &str) {
        let dir = root.join(condition.dir_name()).join(trial.to_string());
        create_dir_all(&dir).unwrap();
        write(dir.join(name), text).unwrap();
    }

    fn config(num_trials: u32) -> AnalysisConfig {
        AnalysisConfig {
            num_trials,
            expected_runs: Some(1),
            ..AnalysisConfig::default()
        }
    }

    fn two_trial_study() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_run(root, Condition::WithHaptics, 1, "run.log", "TIME_ALIVE,x,5.0\nSCORE,x,10\n");
        write_run(root, Condition::WithHaptics, 2, "run.log", "TIME_ALIVE,x,8.0\nSCORE,x,16\n");
        write_run(root, Condition::WithoutHaptics, 1, "run.log", "TIME_ALIVE,x,3.0\nSCORE,x,3\n");
        write_run(root, Condition::WithoutHaptics, 2, "run.log", "TIME_ALIVE,x,4.0\nSCORE,x,8\n");
        dir
    }

    #[test]
    fn end_to_end_two_trials() {
        let dir = two_trial_study();
        let study = aggregate(dir.path(), &config(2)).unwrap();

        assert_eq!(study.with.time_alive(), vec![5.0, 8.0]);
        assert_eq!(study.with.weighted_score(), vec![7.0, 10.0]);
        assert_eq!(study.without.time_alive(), vec![3.0, 4.0]);
        assert_eq!(study.without.weighted_score(), vec![4.0, 6.0]);
        assert!(study.issues().is_empty());
    }

    #[test]
    fn performance_is_a_selection() {
        let dir = two_trial_study();
        let study = aggregate(dir.path(), &config(2)).unwrap();

        assert_eq!(
            study.with.performance(PerformanceMetric::TimeAlive),
            study.with.time_alive()
        );
        assert_eq!(
            study.with.performance(PerformanceMetric::WeightedScore),
            study.with.weighted_score()
        );
    }

    #[test]
    fn runs_are_sorted_within_a_trial() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_run(root, Condition::WithHaptics, 1, "c.log", "TIME_ALIVE,x,3.0");
        write_run(root, Condition::WithHaptics, 1, "a.log", "TIME_ALIVE,x,1.0");
        write_run(root, Condition::WithHaptics, 1, "b.log", "TIME_ALIVE,x,2.0");
        create_dir_all(root.join("with_haptics/1/nested")).unwrap();

        let cfg = AnalysisConfig {
            num_trials: 1,
            ..AnalysisConfig::default()
        };
        let series = aggregate_condition(root, Condition::WithHaptics, &cfg).unwrap();
        assert_eq!(series.time_alive(), vec![1.0, 2.0, 3.0]);
        assert!(series.issues().is_empty());
    }

    #[test]
    fn unequal_metric_lengths() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_run(root, Condition::WithHaptics, 1, "a.log", "TIME_ALIVE,x,2.0\nMAX_VELOCITY,x,1.234");
        write_run(root, Condition::WithHaptics, 1, "b.log", "MAX_VELOCITY,3,2.567");

        let cfg = AnalysisConfig {
            num_trials: 1,
            expected_runs: Some(2),
            ..AnalysisConfig::default()
        };
        let series = aggregate_condition(root, Condition::WithHaptics, &cfg).unwrap();
        assert_eq!(series.time_alive(), vec![2.0]);
        assert_eq!(series.weighted_score(), vec![2.0, 0.0]);
        assert_eq!(series.max_velocity(), vec![1.23, 2.57]);
        assert!(series.distance_travelled().is_empty());
    }

    #[test]
    fn missing_condition_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = aggregate_condition(dir.path(), Condition::WithoutHaptics, &config(1)).unwrap_err();
        assert!(matches!(err, AggregateError::Io { .. }));
        assert!(err.to_string().contains("without_haptics"));
    }

    #[test]
    fn missing_trial_directory() {
        let dir = two_trial_study();
        assert!(matches!(
            aggregate(dir.path(), &config(3)),
            Err(AggregateError::Io { .. })
        ));
    }

    #[test]
    fn bad_run_aborts_everything() {
        let dir = two_trial_study();
        write_run(dir.path(), Condition::WithHaptics, 2, "run.log", "SCORE,x,16\nTIME_ALIVE,x,8.0\n");

        let err = aggregate(dir.path(), &config(2)).unwrap_err();
        match err {
            AggregateError::Run(run_err) => {
                assert!(matches!(run_err.kind, crate::run_metrics::RunErrorKind::MissingTimeAlive));
                assert_eq!(run_err.line, 1);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn structural_issues_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_run(root, Condition::WithHaptics, 1, "a.log", "TIME_ALIVE,x,1.0");
        write_run(root, Condition::WithHaptics, 1, "b.log", "TIME_ALIVE,x,2.0");
        create_dir_all(root.join("with_haptics/2")).unwrap();

        let cfg = AnalysisConfig {
            num_trials: 2,
            expected_runs: Some(3),
            ..AnalysisConfig::default()
        };
        let series = aggregate_condition(root, Condition::WithHaptics, &cfg).unwrap();
        assert_eq!(
            series.issues(),
            &[
                StructuralIssue::RunCount {
                    condition: Condition::WithHaptics,
                    trial: 1,
                    expected: 3,
                    found: 2,
                },
                StructuralIssue::EmptyTrial {
                    condition: Condition::WithHaptics,
                    trial: 2,
                },
            ]
        );

        let strict = AnalysisConfig { strict: true, ..cfg };
        assert!(matches!(
            aggregate_condition(root, Condition::WithHaptics, &strict),
            Err(AggregateError::Structure(issues)) if issues.len() == 2
        ));
    }

    fn run(trial: TrialId, time: f64) -> RunMetrics {
        RunMetrics {
            trial,
            path: PathBuf::from("run.log"),
            time_alive: vec![time],
            score: vec![],
            max_velocity: vec![],
            distance_travelled: vec![],
            weighted_score: time,
        }
    }

    #[test]
    fn grouping_follows_trial_ids_not_stride() {
        // trial 1 has three runs, trial 2 only two
        let series = ConditionSeries::new(
            Condition::WithHaptics,
            vec![run(1, 1.0), run(1, 2.0), run(1, 3.0), run(2, 4.0), run(2, 5.0)],
        );

        let groups = series.by_trial(PerformanceMetric::TimeAlive);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].values, vec![1.0, 2.0, 3.0]);
        assert_eq!(groups[1].values, vec![4.0, 5.0]);

        let reps = series.by_repetition(PerformanceMetric::TimeAlive);
        assert_eq!(reps, vec![vec![1.0, 4.0], vec![2.0, 5.0], vec![3.0]]);

        // a short first trial must not shift the second trial's runs over
        // by one, as indexing the flat sequence with stride 3 would
        let shifted = ConditionSeries::new(
            Condition::WithHaptics,
            vec![run(1, 1.0), run(1, 2.0), run(2, 4.0), run(2, 5.0), run(2, 6.0)],
        );
        assert_eq!(
            shifted.by_repetition(PerformanceMetric::TimeAlive),
            vec![vec![1.0, 4.0], vec![2.0, 5.0], vec![6.0]]
        );
    }
}

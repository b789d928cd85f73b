//! Folding the records of a single run log into [RunMetrics].
//!
//! A `SCORE` is only meaningful as a rate, points per second survived, so it
//! needs a `TIME_ALIVE` earlier in the same file. [RunParser] tracks this with
//! a small state machine and rejects a score that arrives too early.

use crate::record::{round2, LogRecord, RecordError};
use crate::TrialId;

use log::debug;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    io::BufRead,
    path::{Path, PathBuf},
};

/// Weights used to combine survival time and score rate into the weighted
/// score of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    /// Multiplies each `TIME_ALIVE` value
    pub time: f64,
    /// Multiplies each score-per-second value
    pub score: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Weights {
            time: 1.0,
            score: 1.0,
        }
    }
}

/// Everything we extract from one run log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunMetrics {
    /// The trial directory this run was found in
    pub trial: TrialId,
    /// Where the log was read from
    pub path: PathBuf,
    /// Every `TIME_ALIVE` in the file, rounded to two decimals
    pub time_alive: Vec<f64>,
    /// Every `SCORE` in the file
    pub score: Vec<i64>,
    /// Every `MAX_VELOCITY` in the file, rounded to two decimals
    pub max_velocity: Vec<f64>,
    /// Every `DISTANCE_TRAVELLED` in the file, rounded to two decimals
    pub distance_travelled: Vec<f64>,
    /// `w_t * time + w_s * score / time`, summed over every record in the
    /// file. Zero when the file had none.
    pub weighted_score: f64,
}

/// What went wrong while reading a run.
#[derive(Debug)]
pub enum RunErrorKind {
    /// Reading the file failed
    Io(std::io::Error),
    /// A tagged line had a value we could not parse
    InvalidRecord(RecordError),
    /// A `SCORE` came before any `TIME_ALIVE` in the same file
    MissingTimeAlive,
    /// A `SCORE` came after a `TIME_ALIVE` of zero, so it has no rate
    ZeroTimeAlive,
}

impl fmt::Display for RunErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RunErrorKind::Io(error) => write!(f, "io error: {}", error),
            RunErrorKind::InvalidRecord(error) => write!(f, "{}", error),
            RunErrorKind::MissingTimeAlive => {
                write!(f, "SCORE record before any TIME_ALIVE record")
            }
            RunErrorKind::ZeroTimeAlive => {
                write!(f, "SCORE record after a TIME_ALIVE of zero seconds")
            }
        }
    }
}

/// A [RunErrorKind] together with the file and 1-based line it happened on.
#[derive(Debug)]
pub struct RunError {
    /// The run log being read
    pub path: PathBuf,
    /// 1-based line number
    pub line: usize,
    /// What happened
    pub kind: RunErrorKind,
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}: {}", self.path.display(), self.line, self.kind)
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            RunErrorKind::Io(error) => Some(error),
            RunErrorKind::InvalidRecord(error) => Some(error),
            _ => None,
        }
    }
}

/// Whether a score can be turned into a rate yet.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ScoreState {
    AwaitingTime,
    HaveTime(f64),
}

/// Accumulates [LogRecord]s from one file. Make a new one per file.
#[derive(Debug)]
pub struct RunParser {
    weights: Weights,
    state: ScoreState,
    metrics: RunMetrics,
}

impl RunParser {
    /// A parser for a run belonging to `trial`, read from `path`.
    pub fn new(trial: TrialId, path: impl Into<PathBuf>, weights: Weights) -> Self {
        RunParser {
            weights,
            state: ScoreState::AwaitingTime,
            metrics: RunMetrics {
                trial,
                path: path.into(),
                time_alive: Vec::new(),
                score: Vec::new(),
                max_velocity: Vec::new(),
                distance_travelled: Vec::new(),
                weighted_score: 0.0,
            },
        }
    }

    /// Fold one record into the run.
    pub fn feed(&mut self, record: LogRecord) -> Result<(), RunErrorKind> {
        let m = &mut self.metrics;
        match record {
            LogRecord::TimeAlive(t) => {
                let t = round2(t);
                m.time_alive.push(t);
                m.weighted_score += self.weights.time * t;
                self.state = ScoreState::HaveTime(t);
            }
            LogRecord::Score(score) => {
                let t = match self.state {
                    ScoreState::AwaitingTime => return Err(RunErrorKind::MissingTimeAlive),
                    ScoreState::HaveTime(t) if t == 0.0 => {
                        return Err(RunErrorKind::ZeroTimeAlive)
                    }
                    ScoreState::HaveTime(t) => t,
                };
                m.score.push(score);
                m.weighted_score += self.weights.score * (score as f64 / t);
            }
            LogRecord::MaxVelocity(v) => m.max_velocity.push(round2(v)),
            LogRecord::DistanceTravelled(d) => m.distance_travelled.push(round2(d)),
            LogRecord::Unrecognized => {}
        }
        Ok(())
    }

    /// Consume the parser, producing the finished metrics.
    pub fn finish(self) -> RunMetrics {
        self.metrics
    }
}

/// Read a whole run log line by line.
pub fn parse_run(
    reader: impl BufRead,
    trial: TrialId,
    path: &Path,
    weights: Weights,
) -> Result<RunMetrics, RunError> {
    let mut parser = RunParser::new(trial, path, weights);

    for (idx, line) in reader.lines().enumerate() {
        let fail = |kind| RunError {
            path: path.to_path_buf(),
            line: idx + 1,
            kind,
        };

        let line = line.map_err(|e| fail(RunErrorKind::Io(e)))?;
        let record = line
            .parse::<LogRecord>()
            .map_err(|e| fail(RunErrorKind::InvalidRecord(e)))?;
        parser.feed(record).map_err(fail)?;
    }

    let metrics = parser.finish();
    debug!(
        "{}: time_alive={:?} weighted_score={:.2}",
        path.display(),
        metrics.time_alive,
        metrics.weighted_score
    );
    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn run(text: &str) -> Result<RunMetrics, RunError> {
        parse_run(
            Cursor::new(text.to_owned()),
            1,
            Path::new("run.log"),
            Weights::default(),
        )
    }

    #[test]
    fn weighted_score_combines_time_and_rate() {
        let m = run("TIME_ALIVE,x,10.00\nSCORE,x,50\n").unwrap();
        assert_eq!(m.time_alive, vec![10.0]);
        assert_eq!(m.score, vec![50]);
        assert!((m.weighted_score - 15.0).abs() < 1e-9);
    }

    #[test]
    fn velocity_only_run() {
        let m = run("MAX_VELOCITY,3,2.567").unwrap();
        assert_eq!(m.max_velocity, vec![2.57]);
        assert!(m.time_alive.is_empty());
        assert_eq!(m.weighted_score, 0.0);
    }

    #[test]
    fn score_before_time_is_rejected() {
        let err = run("START\nSCORE,x,10\nTIME_ALIVE,x,5.0\n").unwrap_err();
        assert!(matches!(err.kind, RunErrorKind::MissingTimeAlive));
        assert_eq!(err.line, 2);
        assert_eq!(err.path, PathBuf::from("run.log"));
    }

    #[test]
    fn score_after_zero_time_is_rejected() {
        let err = run("TIME_ALIVE,x,0.001\nSCORE,x,10\n").unwrap_err();
        assert!(matches!(err.kind, RunErrorKind::ZeroTimeAlive));
    }

    #[test]
    fn bad_value_reports_line() {
        let err = run("TIME_ALIVE,x,5.0\nDISTANCE_TRAVELLED,x,far\n").unwrap_err();
        assert!(matches!(err.kind, RunErrorKind::InvalidRecord(_)));
        assert_eq!(err.line, 2);
        assert!(err.to_string().starts_with("run.log:2:"));
    }

    #[test]
    fn repeated_pairs_accumulate() {
        let m = run("TIME_ALIVE,x,4.0\nSCORE,x,8\nTIME_ALIVE,x,10.0\nSCORE,x,5\n").unwrap();
        // 4 + 8/4 + 10 + 5/10
        assert!((m.weighted_score - 16.5).abs() < 1e-9);
        assert_eq!(m.time_alive, vec![4.0, 10.0]);
    }

    #[test]
    fn weights_are_applied() {
        let m = parse_run(
            Cursor::new("TIME_ALIVE,x,10.0\nSCORE,x,50\n"),
            1,
            Path::new("run.log"),
            Weights {
                time: 0.5,
                score: 2.0,
            },
        )
        .unwrap();
        assert!((m.weighted_score - 15.0).abs() < 1e-9);
    }

    #[test]
    fn time_is_rounded_before_the_rate() {
        let m = run("TIME_ALIVE,x,3.996\nSCORE,x,4\n").unwrap();
        assert_eq!(m.time_alive, vec![4.0]);
        assert!((m.weighted_score - 5.0).abs() < 1e-9);
    }

    #[test]
    fn near_ties_round_down() {
        let m = run("TIME_ALIVE,x,2.675\nMAX_VELOCITY,x,1.115\nDISTANCE_TRAVELLED,x,0.125\n").unwrap();
        assert_eq!(m.time_alive, vec![2.67]);
        assert_eq!(m.max_velocity, vec![1.11]);
        assert_eq!(m.distance_travelled, vec![0.12]);
        assert_eq!(m.path, PathBuf::from("run.log"));
        assert_eq!(m.trial, 1);
    }

    #[test]
    fn windows_line_endings() {
        let m = run("TIME_ALIVE,x,5.0\r\nSCORE,x,10\r\n").unwrap();
        assert!((m.weighted_score - 7.0).abs() < 1e-9);
    }

    #[test]
    fn empty_file() {
        let m = run("").unwrap();
        assert_eq!(m.weighted_score, 0.0);
        assert!(m.time_alive.is_empty());
    }
}

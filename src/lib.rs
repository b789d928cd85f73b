//! Host-side analysis for a human-robot interaction experiment in which
//! players steer a ship in an asteroids game through a 2D haptic device,
//! once with force feedback and once without. Every game session leaves a
//! small text log behind; this crate reads those logs, derives a performance
//! score per session and prepares the data for comparing the two conditions.
//!
//! The pipeline is
//!
//! - [record] parses single log lines into tagged records,
//! - [run_metrics] folds the records of one log into the metrics of a run,
//! - [aggregator] walks the trial directories of both conditions,
//! - [figures] and [stats] turn the runs into chart-ready numbers,
//! - [report] prints or exports them, and [gui] draws them in a terminal.
//!
//! [synth] writes a made-up experiment in the same layout, for trying things
//! out.

#![warn(missing_docs)]
pub mod aggregator;
pub mod args;
pub mod config;
pub mod figures;
pub mod gui;
pub mod record;
pub mod report;
pub mod run_metrics;
pub mod stats;
pub mod synth;

/// Trials are numbered directories, starting at 1.
pub type TrialId = u32;

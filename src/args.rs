// Commandline argument parser using clap for the trial analysis tools

use crate::config::{AnalysisConfig, ConfigError, RunOrder};

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Arguments of the `hri-trials` binary
#[derive(Debug, Parser, Clone)]
#[clap(version, about)]
pub struct TrialArgs {
    #[command(subcommand)]
    /// Which task to perform
    pub command: CommandTask,

    #[command(flatten)]
    #[allow(missing_docs)]
    pub analysis: AnalysisArgs,
}

/// Arguments of the `viewer` binary
#[derive(Debug, Parser, Clone)]
#[clap(version, about)]
pub struct ViewerArgs {
    #[command(flatten)]
    #[allow(missing_docs)]
    pub analysis: AnalysisArgs,
}

/// The tasks of the `hri-trials` binary
#[derive(Debug, Subcommand, Clone)]
pub enum CommandTask {
    /// Print summary statistics for both conditions
    #[command(about)]
    Summary,

    /// Write runs and figure data to a ron file
    #[command(about)]
    Export(ExportCommand),

    /// Write a synthetic trial tree, for trying things out
    #[command(about)]
    Synth(SynthCommand),
}

/// Arguments of the `export` subcommand
#[derive(Debug, Args, Clone)]
pub struct ExportCommand {
    /// Filename for the export to be written to
    #[arg(short = 'o', long = "out")]
    pub outfile: PathBuf,
}

/// Arguments of the `synth` subcommand
#[derive(Debug, Args, Clone)]
pub struct SynthCommand {
    /// Directory the trial tree is written under
    #[arg(short = 'o', long = "out")]
    pub outdir: PathBuf,

    /// Number of runs written to each trial
    #[arg(long = "runs", default_value_t = 3)]
    pub runs: usize,

    /// Seed for the random number generator
    #[arg(long = "seed", default_value_t = 0)]
    pub seed: u64,
}

/// Where the trials live and how to read them. Flags override values from
/// `--config`, which in turn override the defaults.
#[derive(Debug, Args, Clone)]
pub struct AnalysisArgs {
    /// Directory containing `with_haptics/` and `without_haptics/`
    #[arg(short = 'r', long = "root", default_value = "trials")]
    pub root: PathBuf,

    /// A ron file with an analysis config
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Number of trials per condition
    #[arg(short = 't', long = "trials")]
    pub num_trials: Option<u32>,

    /// Use the weighted score instead of time alive as performance
    #[arg(short = 'w', long = "weighted")]
    pub weighted: bool,

    /// Weight of the survival time in the weighted score
    #[arg(long = "w-time")]
    pub w_time: Option<f64>,

    /// Weight of the score rate in the weighted score
    #[arg(long = "w-score")]
    pub w_score: Option<f64>,

    /// Number of runs every trial should have, 0 to skip the check
    #[arg(long = "expected-runs")]
    pub expected_runs: Option<usize>,

    /// Keep runs in directory listing order instead of sorting by name
    #[arg(long = "listing-order")]
    pub listing_order: bool,

    /// Fail on empty trials and unexpected run counts
    #[arg(long = "strict")]
    pub strict: bool,
}

impl AnalysisArgs {
    /// Build the config for this invocation.
    pub fn resolve(&self) -> Result<AnalysisConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_path(path)?,
            None => AnalysisConfig::default(),
        };

        if let Some(num_trials) = self.num_trials {
            config.num_trials = num_trials;
        }
        if self.weighted {
            config.weighted_average = true;
        }
        if let Some(w) = self.w_time {
            config.weights.time = w;
        }
        if let Some(w) = self.w_score {
            config.weights.score = w;
        }
        if let Some(n) = self.expected_runs {
            config.expected_runs = (n > 0).then_some(n);
        }
        if self.listing_order {
            config.run_order = RunOrder::Listing;
        }
        if self.strict {
            config.strict = true;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PerformanceMetric;

    #[test]
    fn flags_override_defaults() {
        let args = TrialArgs::parse_from([
            "hri-trials",
            "--trials",
            "2",
            "--weighted",
            "--w-score",
            "0.5",
            "--expected-runs",
            "0",
            "summary",
        ]);
        let config = args.analysis.resolve().unwrap();
        assert_eq!(config.num_trials, 2);
        assert_eq!(config.metric(), PerformanceMetric::WeightedScore);
        assert_eq!(config.weights.time, 1.0);
        assert_eq!(config.weights.score, 0.5);
        assert_eq!(config.expected_runs, None);
        assert!(matches!(args.command, CommandTask::Summary));
    }

    #[test]
    fn flags_override_config_file() {
        let tempfile = tempfile::NamedTempFile::new().unwrap();
        AnalysisConfig {
            num_trials: 5,
            strict: true,
            ..AnalysisConfig::default()
        }
        .to_path(tempfile.path())
        .unwrap();

        let path = tempfile.path().to_string_lossy().into_owned();
        let args = TrialArgs::parse_from([
            "hri-trials",
            "--config",
            path.as_str(),
            "--listing-order",
            "export",
            "-o",
            "out.ron",
        ]);
        let config = args.analysis.resolve().unwrap();
        assert_eq!(config.num_trials, 5);
        assert!(config.strict);
        assert_eq!(config.run_order, RunOrder::Listing);
        match args.command {
            CommandTask::Export(cmd) => assert_eq!(cmd.outfile, PathBuf::from("out.ron")),
            other => panic!("unexpected command {:?}", other),
        }
    }
}

//! Writes made-up trial directories in the same layout the game produces,
//! which is handy for trying out the summary and the viewer without real
//! experiment data.

use crate::aggregator::Condition;
use crate::record::RecordTag;
use crate::TrialId;

use log::info;
use rand::prelude::*;
use std::{
    fs::{self, File},
    io::{self, Write},
    path::Path,
};

/// Generates synthetic run logs. Make one with [SynthStudy::builder].
#[derive(Debug, Clone)]
pub struct SynthStudy {
    num_trials: u32,
    runs_per_trial: usize,
    seed: u64,
}

/// Builder for a [SynthStudy].
#[derive(Debug, Clone)]
pub struct SynthStudyBuilder {
    num_trials: u32,
    runs_per_trial: usize,
    seed: u64,
}

impl Default for SynthStudyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SynthStudyBuilder {
    /// 16 trials of 3 runs, seeded with 0.
    fn new() -> Self {
        SynthStudyBuilder {
            num_trials: 16,
            runs_per_trial: 3,
            seed: 0,
        }
    }

    /// Sets the number of trial directories per condition.
    pub fn num_trials(self, num_trials: u32) -> Self {
        SynthStudyBuilder { num_trials, ..self }
    }

    /// Sets the number of run logs per trial.
    pub fn runs_per_trial(self, runs_per_trial: usize) -> Self {
        SynthStudyBuilder {
            runs_per_trial,
            ..self
        }
    }

    /// Sets the seed, the same seed always writes the same logs.
    pub fn seed(self, seed: u64) -> Self {
        SynthStudyBuilder { seed, ..self }
    }

    /// Finish building.
    pub fn build(self) -> SynthStudy {
        SynthStudy {
            num_trials: self.num_trials,
            runs_per_trial: self.runs_per_trial,
            seed: self.seed,
        }
    }
}

/// The numbers written into one synthetic log.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SynthRun {
    time_alive: f64,
    score: i64,
    max_velocity: f64,
    distance: f64,
}

impl SynthRun {
    /// Players survive a bit longer with every repetition, and a bit longer
    /// again with force feedback.
    fn generate(rng: &mut impl Rng, condition: Condition, repetition: usize) -> Self {
        let base = match condition {
            Condition::WithHaptics => 24.0,
            Condition::WithoutHaptics => 18.0,
        };
        let time_alive: f64 = (base + 3.0 * repetition as f64 + rng.gen_range(-6.0..6.0)).max(1.0);
        let score = (time_alive * rng.gen_range(0.5..2.0)) as i64;
        let max_velocity = rng.gen_range(2.0..6.0);
        let distance = time_alive * max_velocity * rng.gen_range(0.3..0.6);
        SynthRun {
            time_alive,
            score,
            max_velocity,
            distance,
        }
    }

    fn write_to(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "GAME_START,asteroids")?;
        writeln!(out, "{},s,{:.4}", RecordTag::TimeAlive, self.time_alive)?;
        writeln!(out, "{},n,{}", RecordTag::Score, self.score)?;
        writeln!(out, "{},px/s,{:.4}", RecordTag::MaxVelocity, self.max_velocity)?;
        writeln!(out, "{},px,{:.4}", RecordTag::DistanceTravelled, self.distance)?;
        writeln!(out, "GAME_OVER")
    }
}

impl SynthStudy {
    /// Make a [SynthStudyBuilder].
    pub fn builder() -> SynthStudyBuilder {
        SynthStudyBuilder::new()
    }

    /// Write both conditions under `root`, creating directories as needed.
    /// Returns how many run logs were written.
    pub fn write(&self, root: impl AsRef<Path>) -> io::Result<usize> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut written = 0;

        for condition in Condition::ALL {
            for trial in 1..=self.num_trials {
                let dir = trial_dir(root.as_ref(), condition, trial);
                fs::create_dir_all(&dir)?;
                for repetition in 0..self.runs_per_trial {
                    let run = SynthRun::generate(&mut rng, condition, repetition);
                    let mut file = File::create(dir.join(format!("run_{}.log", repetition + 1)))?;
                    run.write_to(&mut file)?;
                    written += 1;
                }
            }
        }

        info!("wrote {} synthetic runs to {}", written, root.as_ref().display());
        Ok(written)
    }
}

fn trial_dir(root: &Path, condition: Condition, trial: TrialId) -> std::path::PathBuf {
    root.join(condition.dir_name()).join(trial.to_string())
}

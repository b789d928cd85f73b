//! Command line front end: summarise, export, or synthesise trial logs.

use clap::Parser;
use hri_trials::{
    aggregator::aggregate,
    args::{
        CommandTask::{Export as ExportTask, Summary, Synth},
        TrialArgs,
    },
    figures::FigureSet,
    report::{render_summary, Export},
    synth::SynthStudy,
};

use log::info;
use std::{error::Error, process::ExitCode};

// Example:
// cargo run --bin hri-trials -- --root trials --trials 16 --weighted summary
// cargo run --bin hri-trials -- --trials 4 synth --out demo --runs 3 --seed 1

fn run(args: TrialArgs) -> Result<(), Box<dyn Error>> {
    let config = args.analysis.resolve()?;

    match args.command {
        Summary => {
            let study = aggregate(&args.analysis.root, &config)?;
            print!("{}", render_summary(&study, &config)?);
        }

        ExportTask(cmd) => {
            let study = aggregate(&args.analysis.root, &config)?;
            let figures = FigureSet::build(&study, config.metric());
            Export {
                config: &config,
                study: &study,
                figures: &figures,
            }
            .to_path(&cmd.outfile)?;
            info!("wrote {}", cmd.outfile.display());
        }

        Synth(cmd) => {
            let written = SynthStudy::builder()
                .num_trials(config.num_trials)
                .runs_per_trial(cmd.runs)
                .seed(cmd.seed)
                .build()
                .write(&cmd.outdir)?;
            println!("wrote {} runs under {}", written, cmd.outdir.display());
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = TrialArgs::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

//! Reads a study and cycles through its figures in the terminal.

use clap::Parser;
use hri_trials::{aggregator::aggregate, args::ViewerArgs, figures::FigureSet, gui::view_figures};

use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = ViewerArgs::parse();

    let config = args.analysis.resolve()?;
    let study = aggregate(&args.analysis.root, &config)?;
    let figures = FigureSet::build(&study, config.metric());

    view_figures(&figures)?;
    Ok(())
}

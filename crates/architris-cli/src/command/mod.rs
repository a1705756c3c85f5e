use clap::{Parser, Subcommand};

use self::{levels::LevelsArg, progress::ProgressArg, run::RunArg};

mod levels;
mod progress;
mod run;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// List levels with their lock state and best times
    Levels(#[clap(flatten)] LevelsArg),
    /// Replay an input script against a level
    Run(#[clap(flatten)] RunArg),
    /// Show or reset stored progress
    Progress(#[clap(flatten)] ProgressArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode.unwrap_or(Mode::Levels(LevelsArg::default())) {
        Mode::Levels(arg) => levels::run(&arg)?,
        Mode::Run(arg) => run::run(&arg)?,
        Mode::Progress(arg) => progress::run(&arg)?,
    }
    Ok(())
}

use std::path::PathBuf;

use clap::Subcommand;

use crate::{
    progress_store::{DEFAULT_PROGRESS_PATH, FileProgressStore},
    util::Output,
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ProgressArg {
    #[command(subcommand)]
    action: ProgressAction,
    /// Progress store JSON file
    #[arg(long, global = true, default_value = DEFAULT_PROGRESS_PATH)]
    progress: PathBuf,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum ProgressAction {
    /// Print the stored values as JSON
    Show,
    /// Forget all unlocks and best times
    Reset,
}

pub(crate) fn run(arg: &ProgressArg) -> anyhow::Result<()> {
    let ProgressArg { action, progress } = arg;

    match action {
        ProgressAction::Show => {
            let store = FileProgressStore::load(progress)?;
            eprintln!("Progress from {}", progress.display());
            Output::save_json(&store, None)?;
        }
        ProgressAction::Reset => {
            FileProgressStore::default().save(progress)?;
            eprintln!("Progress reset: {}", progress.display());
        }
    }
    Ok(())
}

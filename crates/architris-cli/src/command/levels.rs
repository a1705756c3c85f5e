use std::path::PathBuf;

use architris_engine::{LevelCatalog, ProgressRepository};

use crate::{
    level_pack,
    progress_store::{DEFAULT_PROGRESS_PATH, FileProgressStore},
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct LevelsArg {
    /// Level catalog JSON file (defaults to the built-in pack)
    #[arg(long)]
    levels: Option<PathBuf>,
    /// Progress store JSON file
    #[arg(long, default_value = DEFAULT_PROGRESS_PATH)]
    progress: PathBuf,
}

impl Default for LevelsArg {
    fn default() -> Self {
        Self {
            levels: None,
            progress: PathBuf::from(DEFAULT_PROGRESS_PATH),
        }
    }
}

pub(crate) fn run(arg: &LevelsArg) -> anyhow::Result<()> {
    let LevelsArg { levels, progress } = arg;

    let catalog = level_pack::load(levels.as_deref())?;
    let progress = FileProgressStore::load(progress)?;

    for line in level_lines(&catalog, &progress) {
        println!("{line}");
    }
    Ok(())
}

/// Level select entries: hidden levels are left out, locked ones are marked.
fn level_lines<R>(catalog: &LevelCatalog, progress: &R) -> Vec<String>
where
    R: ProgressRepository,
{
    let unlocked = progress.unlocked_levels();
    (0..catalog.len())
        .filter(|&index| catalog.is_listed(index, unlocked))
        .filter_map(|index| {
            let label = catalog.label(index)?;
            let status = if !catalog.is_unlocked(index, unlocked) {
                "locked".to_owned()
            } else if let Some(best) = progress.best_time(index) {
                format!("best {:.2}s", best.as_secs_f64())
            } else {
                "open".to_owned()
            };
            let current = if index == progress.current_level() {
                " *"
            } else {
                ""
            };
            Some(format!("{index:>3}  {label}  [{status}]{current}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use architris_engine::MemoryProgress;

    use super::*;

    #[test]
    fn test_fresh_progress_lists_campaign_only() {
        let catalog = level_pack::builtin().unwrap();
        let lines = level_lines(&catalog, &MemoryProgress::default());
        assert_eq!(lines.len(), LevelCatalog::CAMPAIGN_LEN);
        assert_eq!(lines[0], "  0  Level 1: A Square of Squares  [open] *");
        assert!(lines[1].ends_with("[locked]"));
    }

    #[test]
    fn test_cleared_campaign_reveals_challenges() {
        let catalog = level_pack::builtin().unwrap();
        let mut progress = MemoryProgress::default();
        progress.set_unlocked_levels(LevelCatalog::CAMPAIGN_LEN);
        progress.set_best_time(0, Duration::from_millis(12_340));

        let lines = level_lines(&catalog, &progress);
        assert_eq!(lines.len(), catalog.len());
        assert!(lines[0].contains("[best 12.34s]"));
        assert!(lines[16].contains("Challenge Level 1: "));
        assert!(lines[16].ends_with("[open]"));
        assert!(lines[17].ends_with("[locked]"));
    }
}

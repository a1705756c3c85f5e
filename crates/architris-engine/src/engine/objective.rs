use std::time::Duration;

use serde::Serialize;

use crate::{Board, LevelCatalog, LevelDefinition, ProgressRepository, TileGrid, UnknownLevelError};

/// Standing of the board against the level objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::IsVariant)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Some required cells are still open.
    InProgress,
    /// Every required cell is filled, but too many buffers are used. Play goes on.
    OverBudget,
    Complete,
    /// A required cell was swallowed by the ceiling.
    Failed,
}

impl Verdict {
    /// Whether the attempt is over.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Verdict::Complete | Verdict::Failed)
    }
}

/// Objective counters for one evaluation of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ObjectiveReport {
    pub required_filled: usize,
    pub required_total: usize,
    pub buffers_used: usize,
    pub buffers_allowed: usize,
    pub verdict: Verdict,
}

impl ObjectiveReport {
    /// Buffer usage line, e.g. `3/6 buffers used.`
    #[must_use]
    pub fn buffer_status(&self) -> String {
        format!(
            "{}/{} buffers used.",
            self.buffers_used, self.buffers_allowed
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Stage {
    level: usize,
    tutorial: Option<usize>,
}

/// Level sequencing and scoring.
///
/// Knows which level (or tutorial) is being played, loads it onto a [`Board`], scores
/// the board against it and records results in a [`ProgressRepository`].
#[derive(Debug, Clone)]
pub struct ObjectiveEngine<R> {
    catalog: LevelCatalog,
    progress: R,
    stage: Stage,
}

impl<R> ObjectiveEngine<R>
where
    R: ProgressRepository,
{
    /// Picks up at the level stored in `progress`.
    ///
    /// Nothing is loaded until [`Self::restart_level`] or [`Self::start_level`].
    #[must_use]
    pub fn new(catalog: LevelCatalog, progress: R) -> Self {
        let level = progress.current_level().min(catalog.len() - 1);
        let stage = Stage {
            level,
            tutorial: catalog.tutorial_for(level),
        };
        Self {
            catalog,
            progress,
            stage,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &LevelCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn progress(&self) -> &R {
        &self.progress
    }

    pub fn progress_mut(&mut self) -> &mut R {
        &mut self.progress
    }

    pub fn into_progress(self) -> R {
        self.progress
    }

    #[must_use]
    pub fn current_level(&self) -> usize {
        self.stage.level
    }

    #[must_use]
    pub fn is_tutorial(&self) -> bool {
        self.stage.tutorial.is_some()
    }

    #[must_use]
    pub fn definition(&self) -> &LevelDefinition {
        &self.catalog[self.stage.level]
    }

    /// Title of the running tutorial, or of the level.
    #[must_use]
    pub fn title(&self) -> &str {
        self.stage
            .tutorial
            .and_then(|t| self.catalog.tutorial(t))
            .map_or_else(|| self.definition().title(), |t| t.title.as_str())
    }

    /// Tip of the running level. Tutorials have none.
    #[must_use]
    pub fn tip(&self) -> Option<&str> {
        if self.is_tutorial() {
            return None;
        }
        self.definition().tip()
    }

    /// Starts `index`, running its tutorial first if it has one.
    pub fn start_level(&mut self, board: &mut Board, index: usize) -> Result<(), UnknownLevelError> {
        if index >= self.catalog.len() {
            return Err(UnknownLevelError {
                index,
                len: self.catalog.len(),
            });
        }
        self.enter(
            board,
            Stage {
                level: index,
                tutorial: self.catalog.tutorial_for(index),
            },
        );
        Ok(())
    }

    /// Starts the current level or tutorial over.
    pub fn restart_level(&mut self, board: &mut Board) {
        self.enter(board, self.stage);
    }

    /// Moves on to the next stage.
    ///
    /// After a tutorial that is the level it introduces; otherwise the next level,
    /// including its tutorial. Returns `false` when there is no next level.
    pub fn advance_level(&mut self, board: &mut Board) -> bool {
        let next = if self.stage.tutorial.is_some() {
            Stage {
                level: self.stage.level,
                tutorial: None,
            }
        } else {
            let level = self.stage.level + 1;
            if level >= self.catalog.len() {
                return false;
            }
            Stage {
                level,
                tutorial: self.catalog.tutorial_for(level),
            }
        };
        self.enter(board, next);
        true
    }

    fn enter(&mut self, board: &mut Board, stage: Stage) {
        self.stage = stage;
        board.load_level(&self.catalog[stage.level]);
        if let Some(tutorial) = stage.tutorial.and_then(|t| self.catalog.tutorial(t)) {
            board.apply_tutorial(tutorial);
        }
        self.progress.set_current_level(stage.level);
    }

    #[must_use]
    pub fn evaluate(&self, grid: &TileGrid) -> ObjectiveReport {
        self.definition().evaluate(grid)
    }

    /// Records a won main level: unlocks the next one and keeps the best time.
    ///
    /// Tutorials record nothing.
    pub fn record_completion(&mut self, elapsed: Duration) {
        if self.is_tutorial() {
            return;
        }
        let level = self.stage.level;
        if self.progress.unlocked_levels() <= level {
            self.progress.set_unlocked_levels(level + 1);
        }
        if self
            .progress
            .best_time(level)
            .is_none_or(|best| elapsed < best)
        {
            self.progress.set_best_time(level, elapsed);
        }
    }
}

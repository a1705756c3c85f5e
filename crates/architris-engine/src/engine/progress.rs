use std::{collections::BTreeMap, time::Duration};

/// Where player progress lives between runs.
///
/// The engine reads and writes through this trait and never persists anything
/// itself; saving is up to the implementor.
pub trait ProgressRepository {
    /// Level to resume at.
    fn current_level(&self) -> usize;
    fn set_current_level(&mut self, level: usize);

    /// Highest playable level index.
    fn unlocked_levels(&self) -> usize;
    fn set_unlocked_levels(&mut self, levels: usize);

    fn best_time(&self, level: usize) -> Option<Duration>;
    fn set_best_time(&mut self, level: usize, time: Duration);
}

impl<R> ProgressRepository for &mut R
where
    R: ProgressRepository + ?Sized,
{
    fn current_level(&self) -> usize {
        (**self).current_level()
    }

    fn set_current_level(&mut self, level: usize) {
        (**self).set_current_level(level);
    }

    fn unlocked_levels(&self) -> usize {
        (**self).unlocked_levels()
    }

    fn set_unlocked_levels(&mut self, levels: usize) {
        (**self).set_unlocked_levels(levels);
    }

    fn best_time(&self, level: usize) -> Option<Duration> {
        (**self).best_time(level)
    }

    fn set_best_time(&mut self, level: usize, time: Duration) {
        (**self).set_best_time(level, time);
    }
}

/// In-memory progress, lost when dropped.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemoryProgress {
    current_level: usize,
    unlocked_levels: usize,
    best_times: BTreeMap<usize, Duration>,
}

impl ProgressRepository for MemoryProgress {
    fn current_level(&self) -> usize {
        self.current_level
    }

    fn set_current_level(&mut self, level: usize) {
        self.current_level = level;
    }

    fn unlocked_levels(&self) -> usize {
        self.unlocked_levels
    }

    fn set_unlocked_levels(&mut self, levels: usize) {
        self.unlocked_levels = levels;
    }

    fn best_time(&self, level: usize) -> Option<Duration> {
        self.best_times.get(&level).copied()
    }

    fn set_best_time(&mut self, level: usize, time: Duration) {
        self.best_times.insert(level, time);
    }
}

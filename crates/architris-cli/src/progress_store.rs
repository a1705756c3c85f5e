use std::{
    collections::BTreeMap,
    path::Path,
    time::Duration,
};

use architris_engine::ProgressRepository;
use serde::{Deserialize, Serialize};

use crate::util::{self, Output};

pub const DEFAULT_PROGRESS_PATH: &str = "data/progress.json";

const CURRENT_LEVEL: &str = "current_level";
const UNLOCKED_LEVELS: &str = "unlocked_levels";
const BEST_TIME_PREFIX: &str = "best_time_ms.";

/// Player progress kept as a flat JSON object of integer values.
///
/// ```json
/// { "current_level": 3, "unlocked_levels": 3, "best_time_ms.0": 41250 }
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileProgressStore {
    values: BTreeMap<String, u64>,
}

impl FileProgressStore {
    /// Reads the store, starting empty when the file does not exist yet.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        util::read_json_file("progress", path)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        Output::open(path.to_path_buf())?.write_json(self)
    }

    fn get_usize(&self, key: &str) -> usize {
        self.values
            .get(key)
            .and_then(|&value| usize::try_from(value).ok())
            .unwrap_or(0)
    }

    fn set_usize(&mut self, key: &str, value: usize) {
        self.values
            .insert(key.to_owned(), u64::try_from(value).unwrap_or(u64::MAX));
    }

    fn best_time_key(level: usize) -> String {
        format!("{BEST_TIME_PREFIX}{level}")
    }
}

impl ProgressRepository for FileProgressStore {
    fn current_level(&self) -> usize {
        self.get_usize(CURRENT_LEVEL)
    }

    fn set_current_level(&mut self, level: usize) {
        self.set_usize(CURRENT_LEVEL, level);
    }

    fn unlocked_levels(&self) -> usize {
        self.get_usize(UNLOCKED_LEVELS)
    }

    fn set_unlocked_levels(&mut self, levels: usize) {
        self.set_usize(UNLOCKED_LEVELS, levels);
    }

    fn best_time(&self, level: usize) -> Option<Duration> {
        self.values
            .get(&Self::best_time_key(level))
            .copied()
            .map(Duration::from_millis)
    }

    fn set_best_time(&mut self, level: usize, time: Duration) {
        let millis = u64::try_from(time.as_millis()).unwrap_or(u64::MAX);
        self.values.insert(Self::best_time_key(level), millis);
    }
}

use std::ops::Index;

use serde::Deserialize;

use super::{LevelDefinition, LevelError, LevelSpec, TutorialLevel};
use crate::CellPos;

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum CatalogError {
    #[display("level catalog is empty")]
    Empty,
    #[display("level {index}: {source}")]
    Level { index: usize, source: LevelError },
    #[display("tutorial is bound to level {level}, which does not exist")]
    MissingTutorialLevel { level: usize },
    #[display("level {level} has more than one tutorial")]
    DuplicateTutorial { level: usize },
    #[display("tutorial for level {level} presets cell {cell} outside the grid")]
    PresetOutOfGrid { level: usize, cell: CellPos },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogSpec {
    levels: Vec<LevelSpec>,
    #[serde(default)]
    tutorials: Vec<TutorialLevel>,
}

impl TryFrom<CatalogSpec> for LevelCatalog {
    type Error = CatalogError;

    fn try_from(spec: CatalogSpec) -> Result<Self, Self::Error> {
        let levels = spec
            .levels
            .into_iter()
            .enumerate()
            .map(|(index, level)| {
                LevelDefinition::try_from(level).map_err(|source| CatalogError::Level { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(levels, spec.tutorials)
    }
}

/// The ordered set of playable levels and their tutorials.
///
/// The first [`LevelCatalog::CAMPAIGN_LEN`] levels form the main campaign; any
/// further levels are challenges that show up once the campaign is cleared.
///
/// Loaded from JSON of the form `{ "levels": [...], "tutorials": [...] }`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "CatalogSpec")]
pub struct LevelCatalog {
    levels: Vec<LevelDefinition>,
    tutorials: Vec<TutorialLevel>,
}

impl LevelCatalog {
    /// Number of main-campaign levels.
    pub const CAMPAIGN_LEN: usize = 16;

    pub fn new(
        levels: Vec<LevelDefinition>,
        tutorials: Vec<TutorialLevel>,
    ) -> Result<Self, CatalogError> {
        if levels.is_empty() {
            return Err(CatalogError::Empty);
        }
        for (i, tutorial) in tutorials.iter().enumerate() {
            let level = tutorial.level;
            if level >= levels.len() {
                return Err(CatalogError::MissingTutorialLevel { level });
            }
            if tutorials[..i].iter().any(|t| t.level == level) {
                return Err(CatalogError::DuplicateTutorial { level });
            }
            if let Some(cell) = tutorial.stray_preset() {
                return Err(CatalogError::PresetOutOfGrid { level, cell });
            }
        }
        Ok(Self { levels, tutorials })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    #[must_use]
    pub fn level(&self, index: usize) -> Option<&LevelDefinition> {
        self.levels.get(index)
    }

    pub fn levels(&self) -> impl ExactSizeIterator<Item = &LevelDefinition> + '_ {
        self.levels.iter()
    }

    #[must_use]
    pub fn tutorial(&self, index: usize) -> Option<&TutorialLevel> {
        self.tutorials.get(index)
    }

    /// Index of the tutorial bound to `level`, if any.
    #[must_use]
    pub fn tutorial_for(&self, level: usize) -> Option<usize> {
        self.tutorials.iter().position(|t| t.level == level)
    }

    #[must_use]
    pub fn is_challenge(index: usize) -> bool {
        index >= Self::CAMPAIGN_LEN
    }

    /// Whether `index` can be played with the given unlocked-level mark.
    #[must_use]
    pub fn is_unlocked(&self, index: usize, unlocked_levels: usize) -> bool {
        index < self.len() && index <= unlocked_levels
    }

    /// Whether level select lists `index` at all. Challenges stay hidden until the
    /// campaign is cleared.
    #[must_use]
    pub fn is_listed(&self, index: usize, unlocked_levels: usize) -> bool {
        index < self.len() && (!Self::is_challenge(index) || unlocked_levels >= Self::CAMPAIGN_LEN)
    }

    /// Display name such as `Level 3: The Floating Box` or `Challenge Level 1: ...`.
    ///
    /// # Example
    ///
    /// ```
    /// use architris_engine::LevelCatalog;
    ///
    /// let catalog: LevelCatalog = serde_json::from_str(
    ///     r#"{ "levels": [{
    ///         "title": "First",
    ///         "required": [[0, 0]],
    ///         "buffer": { "border": 1 },
    ///         "allowed_buffers": 0,
    ///         "line_clears_per_step": 2,
    ///         "speed_gain_per_clear": 0.0
    ///     }] }"#,
    /// )
    /// .unwrap();
    /// assert_eq!(catalog.label(0).as_deref(), Some("Level 1: First"));
    /// assert_eq!(catalog.label(1), None);
    /// ```
    #[must_use]
    pub fn label(&self, index: usize) -> Option<String> {
        let title = self.level(index)?.title();
        Some(if Self::is_challenge(index) {
            format!(
                "Challenge Level {}: {title}",
                index - Self::CAMPAIGN_LEN + 1
            )
        } else {
            format!("Level {}: {title}", index + 1)
        })
    }
}

impl Index<usize> for LevelCatalog {
    type Output = LevelDefinition;

    fn index(&self, index: usize) -> &Self::Output {
        &self.levels[index]
    }
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{CellPos, PieceKind, TileGrid, TileState};

/// A scripted warm-up played before the main level it is bound to.
///
/// It reuses the bound level's objective, but starts from preset cells and a fixed
/// opening sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TutorialLevel {
    /// Index of the main level this tutorial introduces.
    pub level: usize,
    pub title: String,
    /// Filled cells painted at the start, grouped by the kind shown on them.
    #[serde(default)]
    pub presets: BTreeMap<PieceKind, Vec<CellPos>>,
    /// The first entry replaces the first piece; the rest overwrite the preview slots.
    #[serde(default)]
    pub initial_queue: Vec<PieceKind>,
}

impl TutorialLevel {
    pub(crate) fn paint_presets(&self, grid: &mut TileGrid) {
        for (&kind, cells) in &self.presets {
            for &cell in cells {
                grid.set(cell, TileState::Filled, Some(kind));
            }
        }
    }

    /// First preset cell that lies outside the grid.
    pub(crate) fn stray_preset(&self) -> Option<CellPos> {
        self.presets
            .values()
            .flatten()
            .copied()
            .find(|&cell| !TileGrid::contains(cell))
    }
}

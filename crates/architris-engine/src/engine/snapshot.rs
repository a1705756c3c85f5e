use std::time::Duration;

use serde::Serialize;

use crate::{CellPos, ObjectiveReport, PieceKind, TileGrid};

use super::session::SessionState;

/// A read-only picture of a session, for front ends and reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub title: String,
    pub tip: Option<String>,
    /// Level select name of the current level.
    pub label: String,
    pub level: usize,
    pub tutorial: bool,
    pub state: SessionState,
    pub grid: TileGrid,
    /// Cells of the falling piece, including any above the grid.
    pub active: Vec<CellPos>,
    pub active_kind: PieceKind,
    pub ghost: Vec<CellPos>,
    pub upcoming: Vec<PieceKind>,
    pub held: Option<PieceKind>,
    pub hold_used: bool,
    pub report: ObjectiveReport,
    pub cleared_lines: u32,
    pub ceiling_row: i8,
    pub fall_speed: f32,
    pub lines_until_ceiling_step: u32,
    pub elapsed: Duration,
}

impl Snapshot {
    #[must_use]
    pub fn buffer_status(&self) -> String {
        self.report.buffer_status()
    }

    #[must_use]
    pub fn ceiling_status(&self) -> String {
        format!(
            "Top line falls after {} line clears",
            self.lines_until_ceiling_step
        )
    }
}

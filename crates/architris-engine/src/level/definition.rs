use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::{CellPos, ObjectiveReport, ObjectiveRole, TileGrid, TileState, Verdict};

/// Speed and ceiling schedule of a level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelRules {
    /// Lowest blocked row when the level starts. `20` means no ceiling.
    pub start_ceiling_row: i8,
    /// Rows per second at the start of the level.
    pub start_speed: f32,
    /// The ceiling descends one row every this many line clears.
    pub line_clears_per_step: NonZeroU32,
    /// Added to the fall speed on every line clear.
    pub speed_gain_per_clear: f32,
}

impl Default for LevelRules {
    /// Open board, one row per second, a ceiling that never descends.
    fn default() -> Self {
        Self {
            start_ceiling_row: TileGrid::ROWS,
            start_speed: 1.0,
            line_clears_per_step: NonZeroU32::MAX,
            speed_gain_per_clear: 0.0,
        }
    }
}

/// How a level's buffer cells are produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferSpec {
    /// A square border of this thickness around every required cell.
    Border(u8),
    /// An explicit list.
    Cells(Vec<CellPos>),
}

/// Serialized form of a level, validated into a [`LevelDefinition`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LevelSpec {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tip: Option<String>,
    pub required: Vec<CellPos>,
    pub buffer: BufferSpec,
    pub allowed_buffers: usize,
    pub line_clears_per_step: u32,
    pub speed_gain_per_clear: f32,
    #[serde(default = "default_start_speed")]
    pub start_speed: f32,
    #[serde(default = "default_start_ceiling_row")]
    pub start_ceiling_row: i8,
}

fn default_start_speed() -> f32 {
    1.0
}

fn default_start_ceiling_row() -> i8 {
    TileGrid::ROWS
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum LevelError {
    #[display("level has no required cells")]
    NoRequiredCells,
    #[display("required cell {_0} is listed twice")]
    DuplicateRequiredCell(#[error(not(source))] CellPos),
    #[display("cell {_0} is outside the 10x20 grid")]
    CellOutOfGrid(#[error(not(source))] CellPos),
    #[display("required cell {_0} is under the starting ceiling")]
    RequiredUnderCeiling(#[error(not(source))] CellPos),
    #[display("line_clears_per_step must be at least 1")]
    ZeroCeilingCadence,
    #[display("start speed must be positive, got {_0}")]
    NonPositiveStartSpeed(#[error(not(source))] f32),
    #[display("speed gain per clear must be finite and not negative, got {_0}")]
    InvalidSpeedGain(#[error(not(source))] f32),
    #[display("start ceiling row must be within 1..=20, got {_0}")]
    CeilingOutOfRange(#[error(not(source))] i8),
}

/// A validated, immutable level.
///
/// Buffer cells are resolved once at construction:
///
/// 1. explicit buffer cells, in list order, skipping duplicates and required cells;
/// 2. for [`BufferSpec::Border`], every required cell in list order contributes the
///    square around it, columns left to right and rows bottom-up within a column.
///    Cells that are already required or buffer are skipped.
///
/// # Example
///
/// ```
/// use architris_engine::{CellPos, LevelDefinition};
///
/// let level: LevelDefinition = serde_json::from_str(
///     r#"{
///         "title": "Corner",
///         "required": [[0, 0]],
///         "buffer": { "border": 1 },
///         "allowed_buffers": 1,
///         "line_clears_per_step": 2,
///         "speed_gain_per_clear": 0.1
///     }"#,
/// )
/// .unwrap();
/// assert_eq!(
///     level.buffer_cells(),
///     &[CellPos::new(0, 1), CellPos::new(1, 0), CellPos::new(1, 1)]
/// );
/// assert_eq!(level.rules().start_speed, 1.0);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "LevelSpec")]
pub struct LevelDefinition {
    title: String,
    tip: Option<String>,
    required: Vec<CellPos>,
    buffers: Vec<CellPos>,
    allowed_buffers: usize,
    rules: LevelRules,
}

impl TryFrom<LevelSpec> for LevelDefinition {
    type Error = LevelError;

    fn try_from(spec: LevelSpec) -> Result<Self, Self::Error> {
        let LevelSpec {
            title,
            tip,
            required,
            buffer,
            allowed_buffers,
            line_clears_per_step,
            speed_gain_per_clear,
            start_speed,
            start_ceiling_row,
        } = spec;

        let line_clears_per_step =
            NonZeroU32::new(line_clears_per_step).ok_or(LevelError::ZeroCeilingCadence)?;
        if start_speed.is_nan() || start_speed <= 0.0 {
            return Err(LevelError::NonPositiveStartSpeed(start_speed));
        }
        if !speed_gain_per_clear.is_finite() || speed_gain_per_clear < 0.0 {
            return Err(LevelError::InvalidSpeedGain(speed_gain_per_clear));
        }
        if !(1..=TileGrid::ROWS).contains(&start_ceiling_row) {
            return Err(LevelError::CeilingOutOfRange(start_ceiling_row));
        }
        if required.is_empty() {
            return Err(LevelError::NoRequiredCells);
        }
        for (i, &cell) in required.iter().enumerate() {
            if !TileGrid::contains(cell) {
                return Err(LevelError::CellOutOfGrid(cell));
            }
            if cell.row >= start_ceiling_row {
                return Err(LevelError::RequiredUnderCeiling(cell));
            }
            if required[..i].contains(&cell) {
                return Err(LevelError::DuplicateRequiredCell(cell));
            }
        }

        let buffers = match buffer {
            BufferSpec::Cells(cells) => explicit_buffers(&required, cells)?,
            BufferSpec::Border(thickness) => border_buffers(&required, thickness),
        };

        Ok(Self {
            title,
            tip,
            required,
            buffers,
            allowed_buffers,
            rules: LevelRules {
                start_ceiling_row,
                start_speed,
                line_clears_per_step,
                speed_gain_per_clear,
            },
        })
    }
}

fn explicit_buffers(
    required: &[CellPos],
    cells: Vec<CellPos>,
) -> Result<Vec<CellPos>, LevelError> {
    let mut buffers = Vec::with_capacity(cells.len());
    for cell in cells {
        if !TileGrid::contains(cell) {
            return Err(LevelError::CellOutOfGrid(cell));
        }
        if !required.contains(&cell) && !buffers.contains(&cell) {
            buffers.push(cell);
        }
    }
    Ok(buffers)
}

fn border_buffers(required: &[CellPos], thickness: u8) -> Vec<CellPos> {
    // Anything past the grid size covers the whole grid
    let t = i8::try_from(thickness.min(20)).unwrap_or(20);
    let mut buffers = Vec::new();
    for &center in required {
        let cols = (center.col - t).max(0)..=(center.col + t).min(TileGrid::COLUMNS - 1);
        for col in cols {
            let rows = (center.row - t).max(0)..=(center.row + t).min(TileGrid::ROWS - 1);
            for row in rows {
                let cell = CellPos::new(col, row);
                if !required.contains(&cell) && !buffers.contains(&cell) {
                    buffers.push(cell);
                }
            }
        }
    }
    buffers
}

impl LevelDefinition {
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn tip(&self) -> Option<&str> {
        self.tip.as_deref()
    }

    #[must_use]
    pub fn required_cells(&self) -> &[CellPos] {
        &self.required
    }

    /// Resolved buffer cells, in generation order.
    #[must_use]
    pub fn buffer_cells(&self) -> &[CellPos] {
        &self.buffers
    }

    #[must_use]
    pub fn allowed_buffers(&self) -> usize {
        self.allowed_buffers
    }

    #[must_use]
    pub fn rules(&self) -> LevelRules {
        self.rules
    }

    /// Writes buffer and required roles onto `grid`.
    pub(crate) fn apply_roles(&self, grid: &mut TileGrid) {
        for &cell in &self.buffers {
            grid.set_role(cell, ObjectiveRole::Buffer);
        }
        for &cell in &self.required {
            grid.set_role(cell, ObjectiveRole::Required);
        }
    }

    /// Scores `grid` against this level's objective.
    #[must_use]
    pub fn evaluate(&self, grid: &TileGrid) -> ObjectiveReport {
        let mut required_filled = 0;
        let mut required_blocked = false;
        for &cell in &self.required {
            match grid.get(cell).map(|tile| tile.state()) {
                Some(TileState::Filled) => required_filled += 1,
                Some(TileState::Blocked) => required_blocked = true,
                _ => {}
            }
        }
        let buffers_used = self
            .buffers
            .iter()
            .filter(|&&cell| grid.get(cell).is_some_and(|tile| tile.state().is_filled()))
            .count();

        let verdict = if required_blocked {
            Verdict::Failed
        } else if required_filled < self.required.len() {
            Verdict::InProgress
        } else if buffers_used > self.allowed_buffers {
            Verdict::OverBudget
        } else {
            Verdict::Complete
        };

        ObjectiveReport {
            required_filled,
            required_total: self.required.len(),
            buffers_used,
            buffers_allowed: self.allowed_buffers,
            verdict,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PieceKind;

    fn spec(required: &[(i8, i8)], buffer: BufferSpec, allowed: usize) -> LevelSpec {
        LevelSpec {
            title: "Test".to_owned(),
            tip: None,
            required: required.iter().copied().map(CellPos::from).collect(),
            buffer,
            allowed_buffers: allowed,
            line_clears_per_step: 2,
            speed_gain_per_clear: 0.1,
            start_speed: 1.0,
            start_ceiling_row: 20,
        }
    }

    fn cells(pairs: &[(i8, i8)]) -> Vec<CellPos> {
        pairs.iter().copied().map(CellPos::from).collect()
    }

    fn fill(grid: &mut TileGrid, pairs: &[(i8, i8)]) {
        for &pos in pairs {
            grid.set(pos.into(), TileState::Filled, Some(PieceKind::O));
        }
    }

    mod buffer_generation {
        use super::*;

        #[test]
        fn test_border_order_is_columns_then_rows() {
            let level =
                LevelDefinition::try_from(spec(&[(5, 5), (6, 5)], BufferSpec::Border(1), 0))
                    .unwrap();
            assert_eq!(
                level.buffer_cells(),
                cells(&[
                    (4, 4),
                    (4, 5),
                    (4, 6),
                    (5, 4),
                    (5, 6),
                    (6, 4),
                    (6, 6),
                    (7, 4),
                    (7, 5),
                    (7, 6),
                ])
            );
        }

        #[test]
        fn test_border_is_clipped_at_grid_edges() {
            let level =
                LevelDefinition::try_from(spec(&[(9, 19)], BufferSpec::Border(2), 0)).unwrap();
            assert_eq!(
                level.buffer_cells(),
                cells(&[(7, 17), (7, 18), (7, 19), (8, 17), (8, 18), (8, 19), (9, 17), (9, 18)])
            );
        }

        #[test]
        fn test_explicit_buffers_drop_duplicates_and_required() {
            let explicit = BufferSpec::Cells(cells(&[(1, 0), (0, 0), (1, 0), (2, 0)]));
            let level = LevelDefinition::try_from(spec(&[(0, 0)], explicit, 1)).unwrap();
            assert_eq!(level.buffer_cells(), cells(&[(1, 0), (2, 0)]));
        }

        #[test]
        fn test_apply_roles() {
            let level =
                LevelDefinition::try_from(spec(&[(0, 0)], BufferSpec::Border(1), 1)).unwrap();
            let mut grid = TileGrid::new();
            level.apply_roles(&mut grid);
            let role = |col, row| grid.get(CellPos::new(col, row)).unwrap().role();
            assert_eq!(role(0, 0), ObjectiveRole::Required);
            assert_eq!(role(1, 1), ObjectiveRole::Buffer);
            assert_eq!(role(2, 0), ObjectiveRole::Regular);
        }
    }

    mod validation {
        use super::*;

        #[test]
        fn test_rejects_bad_levels() {
            let base = spec(&[(0, 0)], BufferSpec::Border(1), 0);

            let no_required = LevelSpec {
                required: Vec::new(),
                ..base.clone()
            };
            assert_eq!(
                LevelDefinition::try_from(no_required),
                Err(LevelError::NoRequiredCells)
            );

            let off_grid = LevelSpec {
                required: cells(&[(10, 0)]),
                ..base.clone()
            };
            assert_eq!(
                LevelDefinition::try_from(off_grid),
                Err(LevelError::CellOutOfGrid(CellPos::new(10, 0)))
            );

            let duplicate = LevelSpec {
                required: cells(&[(1, 1), (1, 1)]),
                ..base.clone()
            };
            assert_eq!(
                LevelDefinition::try_from(duplicate),
                Err(LevelError::DuplicateRequiredCell(CellPos::new(1, 1)))
            );

            let zero_cadence = LevelSpec {
                line_clears_per_step: 0,
                ..base.clone()
            };
            assert_eq!(
                LevelDefinition::try_from(zero_cadence),
                Err(LevelError::ZeroCeilingCadence)
            );

            let stopped = LevelSpec {
                start_speed: 0.0,
                ..base.clone()
            };
            assert_eq!(
                LevelDefinition::try_from(stopped),
                Err(LevelError::NonPositiveStartSpeed(0.0))
            );

            let no_room = LevelSpec {
                start_ceiling_row: 0,
                ..base.clone()
            };
            assert_eq!(
                LevelDefinition::try_from(no_room),
                Err(LevelError::CeilingOutOfRange(0))
            );

            let buried = LevelSpec {
                required: cells(&[(3, 15)]),
                start_ceiling_row: 15,
                ..base
            };
            assert_eq!(
                LevelDefinition::try_from(buried),
                Err(LevelError::RequiredUnderCeiling(CellPos::new(3, 15)))
            );
        }

        #[test]
        fn test_rejects_bad_speed_gain() {
            let base = spec(&[(0, 0)], BufferSpec::Border(1), 0);

            let slowing = LevelSpec {
                speed_gain_per_clear: -1.0,
                ..base.clone()
            };
            assert_eq!(
                LevelDefinition::try_from(slowing),
                Err(LevelError::InvalidSpeedGain(-1.0))
            );

            let nan = LevelSpec {
                speed_gain_per_clear: f32::NAN,
                ..base.clone()
            };
            assert!(matches!(
                LevelDefinition::try_from(nan),
                Err(LevelError::InvalidSpeedGain(gain)) if gain.is_nan()
            ));

            let infinite = LevelSpec {
                speed_gain_per_clear: f32::INFINITY,
                ..base.clone()
            };
            assert!(LevelDefinition::try_from(infinite).is_err());

            let steady = LevelSpec {
                speed_gain_per_clear: 0.0,
                ..base
            };
            assert!(LevelDefinition::try_from(steady).is_ok());
        }

        #[test]
        fn test_json_defaults_and_unknown_fields() {
            let json = r#"{
                "title": "T",
                "tip": "Go left.",
                "required": [[4, 0]],
                "buffer": { "cells": [[5, 0]] },
                "allowed_buffers": 1,
                "line_clears_per_step": 3,
                "speed_gain_per_clear": 0.2
            }"#;
            let level: LevelDefinition = serde_json::from_str(json).unwrap();
            assert_eq!(level.tip(), Some("Go left."));
            assert_eq!(level.rules().start_ceiling_row, 20);
            assert_eq!(level.rules().line_clears_per_step.get(), 3);

            let unknown = json.replace("\"tip\"", "\"hint\"");
            assert!(serde_json::from_str::<LevelDefinition>(&unknown).is_err());

            let zero = json.replace("\"line_clears_per_step\": 3", "\"line_clears_per_step\": 0");
            let err = serde_json::from_str::<LevelDefinition>(&zero).unwrap_err();
            assert!(err.to_string().contains("line_clears_per_step"));
        }
    }

    mod evaluation {
        use super::*;

        fn level() -> LevelDefinition {
            let buffers = BufferSpec::Cells(cells(&[(2, 0), (3, 0)]));
            LevelDefinition::try_from(spec(&[(0, 0), (1, 0)], buffers, 1)).unwrap()
        }

        #[test]
        fn test_in_progress_until_all_required_filled() {
            let level = level();
            let mut grid = TileGrid::new();
            fill(&mut grid, &[(0, 0)]);
            let report = level.evaluate(&grid);
            assert_eq!(report.verdict, Verdict::InProgress);
            assert_eq!((report.required_filled, report.required_total), (1, 2));
        }

        #[test]
        fn test_allowance_boundary() {
            let level = level();
            let mut grid = TileGrid::new();
            fill(&mut grid, &[(0, 0), (1, 0), (2, 0)]);
            let report = level.evaluate(&grid);
            assert_eq!(report.verdict, Verdict::Complete);
            assert_eq!(report.buffer_status(), "1/1 buffers used.");

            fill(&mut grid, &[(3, 0)]);
            let report = level.evaluate(&grid);
            assert_eq!(report.verdict, Verdict::OverBudget);
            assert_eq!(report.buffer_status(), "2/1 buffers used.");
        }

        #[test]
        fn test_active_cells_do_not_count() {
            let level = level();
            let mut grid = TileGrid::new();
            grid.set(CellPos::new(0, 0), TileState::Active, Some(PieceKind::T));
            grid.set(CellPos::new(2, 0), TileState::Active, Some(PieceKind::T));
            let report = level.evaluate(&grid);
            assert_eq!(report.required_filled, 0);
            assert_eq!(report.buffers_used, 0);
        }

        #[test]
        fn test_blocked_required_cell_fails() {
            let level = level();
            let mut grid = TileGrid::new();
            fill(&mut grid, &[(1, 0), (2, 0)]);
            grid.block_row(0);
            assert_eq!(level.evaluate(&grid).verdict, Verdict::Failed);
        }
    }
}

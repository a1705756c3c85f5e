use rand::Rng as _;
use serde::Serialize;

use crate::{
    BagSeed, HoldUsedError, LevelDefinition, LevelRules, ObjectiveReport, Piece, PieceKind,
    PieceQueue, TileGrid, TutorialLevel,
};

use super::piece_controller::{LockOutcome, PieceController};

/// Per-attempt counters that change as lines clear.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelProgress {
    cleared_lines: u32,
    ceiling_row: i8,
    fall_speed: f32,
}

impl LevelProgress {
    fn new(rules: &LevelRules) -> Self {
        Self {
            cleared_lines: 0,
            ceiling_row: rules.start_ceiling_row,
            fall_speed: rules.start_speed,
        }
    }

    #[must_use]
    pub fn cleared_lines(&self) -> u32 {
        self.cleared_lines
    }

    /// Lowest blocked row. Rows from here up to the top are part of the ceiling.
    #[must_use]
    pub fn ceiling_row(&self) -> i8 {
        self.ceiling_row
    }

    /// Rows per second.
    #[must_use]
    pub fn fall_speed(&self) -> f32 {
        self.fall_speed
    }

    /// Line clears left before the ceiling drops another row.
    #[must_use]
    pub fn lines_until_ceiling_step(&self, rules: &LevelRules) -> u32 {
        let step = rules.line_clears_per_step.get();
        step - self.cleared_lines % step
    }
}

/// What happened after a piece was placed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settlement {
    pub lines_cleared: usize,
    pub report: ObjectiveReport,
}

/// The playfield, the falling piece and the piece supply.
///
/// The board owns the grid exclusively. The piece controller gets the grid lent to
/// it for each operation, and line clears run to completion before any call returns.
#[derive(Debug, Clone)]
pub struct Board {
    grid: TileGrid,
    controller: PieceController,
    pieces: PieceQueue,
    rules: LevelRules,
    progress: LevelProgress,
}

impl Default for Board {
    fn default() -> Self {
        Self::new(LevelRules::default())
    }
}

impl Board {
    #[must_use]
    pub fn new(rules: LevelRules) -> Self {
        Self::with_seed(rules, rand::rng().random())
    }

    /// Like [`Self::new`], but with a fixed piece sequence.
    #[must_use]
    pub fn with_seed(rules: LevelRules, seed: BagSeed) -> Self {
        let mut this = Self {
            grid: TileGrid::new(),
            controller: PieceController::new(),
            pieces: PieceQueue::with_seed(seed),
            rules,
            progress: LevelProgress::new(&rules),
        };
        this.begin_level(rules);
        this
    }

    #[must_use]
    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    #[cfg(test)]
    pub(crate) fn grid_mut(&mut self) -> &mut TileGrid {
        &mut self.grid
    }

    #[must_use]
    pub fn piece(&self) -> Piece {
        self.controller.piece()
    }

    #[must_use]
    pub fn ghost(&self) -> Piece {
        self.controller.ghost()
    }

    #[must_use]
    pub fn held(&self) -> Option<PieceKind> {
        self.controller.held()
    }

    #[must_use]
    pub fn is_hold_used(&self) -> bool {
        self.controller.is_hold_used()
    }

    #[must_use]
    pub fn upcoming(&self) -> &[PieceKind] {
        self.pieces.upcoming()
    }

    #[must_use]
    pub fn rules(&self) -> &LevelRules {
        &self.rules
    }

    #[must_use]
    pub fn progress(&self) -> &LevelProgress {
        &self.progress
    }

    #[must_use]
    pub fn lines_until_ceiling_step(&self) -> u32 {
        self.progress.lines_until_ceiling_step(&self.rules)
    }

    /// Starts an attempt on the current grid contents.
    ///
    /// Blocks every row from the starting ceiling up, starts a fresh bag and preview,
    /// empties the hold slot and spawns the first piece.
    pub fn begin_level(&mut self, rules: LevelRules) {
        self.rules = rules;
        self.progress = LevelProgress::new(&rules);
        for row in rules.start_ceiling_row..TileGrid::ROWS {
            self.grid.block_row(row);
        }
        self.pieces.refill();
        self.controller.reset_hold();
        let first = self.take_next_piece();
        self.spawn(first);
    }

    /// Wipes the grid, marks the level's objective cells and begins the level.
    pub fn load_level(&mut self, level: &LevelDefinition) {
        self.grid.reset();
        level.apply_roles(&mut self.grid);
        self.begin_level(level.rules());
    }

    /// Paints tutorial presets and applies its opening sequence.
    pub fn apply_tutorial(&mut self, tutorial: &TutorialLevel) {
        tutorial.paint_presets(&mut self.grid);
        if let Some((&first, rest)) = tutorial.initial_queue.split_first() {
            self.controller.erase(&mut self.grid);
            self.spawn(first);
            self.pieces.override_upcoming(rest);
        } else {
            // Respawn so the ghost sees the presets
            self.controller.erase(&mut self.grid);
            self.spawn(self.controller.piece().kind());
        }
    }

    fn spawn(&mut self, kind: PieceKind) {
        self.controller.spawn(
            &mut self.grid,
            kind,
            self.progress.ceiling_row,
            self.progress.fall_speed,
        );
    }

    /// Pops the preview front and refills its tail from the bag.
    pub fn take_next_piece(&mut self) -> PieceKind {
        self.pieces.take_next()
    }

    pub fn try_move(&mut self, dx: i8, dy: i8) -> bool {
        self.controller.try_move(&mut self.grid, dx, dy)
    }

    pub fn try_rotate(&mut self, clockwise: bool) -> bool {
        self.controller.try_rotate(&mut self.grid, clockwise)
    }

    pub fn try_hold(&mut self) -> Result<(), HoldUsedError> {
        let Self {
            grid,
            controller,
            pieces,
            progress,
            ..
        } = self;
        controller.try_hold(grid, progress.ceiling_row, progress.fall_speed, || {
            pieces.take_next()
        })
    }

    pub fn begin_soft_drop(&mut self) {
        self.controller.begin_soft_drop();
    }

    pub fn end_soft_drop(&mut self) {
        self.controller.end_soft_drop(self.progress.fall_speed);
    }

    /// Runs gravity for `dt` seconds. Returns the lock outcome if the piece locked.
    pub fn tick_gravity(&mut self, dt: f32, soft_drop: bool) -> Option<LockOutcome> {
        self.controller.tick_gravity(
            &mut self.grid,
            dt,
            soft_drop,
            self.progress.fall_speed,
            self.progress.ceiling_row,
        )
    }

    pub fn hard_drop(&mut self) -> LockOutcome {
        self.controller
            .hard_drop(&mut self.grid, self.progress.ceiling_row)
    }

    /// Clears every full row below the ceiling and returns how many were cleared.
    ///
    /// A cleared row is scanned again, since the row above it has moved down.
    pub fn check_and_clear_lines(&mut self) -> usize {
        let mut cleared = 0;
        let mut row = 0;
        while row < self.progress.ceiling_row {
            if self.grid.is_row_full(row) {
                self.clear_line(row);
                cleared += 1;
            } else {
                row += 1;
            }
        }
        cleared
    }

    fn clear_line(&mut self, row: i8) {
        let mut top = TileGrid::ROWS - 1;
        for above in row + 1..TileGrid::ROWS {
            if self.grid.is_row_blocked(above) {
                top = above - 1;
                break;
            }
            self.grid.copy_row(above, above - 1);
        }
        self.grid.clear_row(top);

        self.progress.cleared_lines += 1;
        self.progress.fall_speed += self.rules.speed_gain_per_clear;
        if self.progress.cleared_lines % self.rules.line_clears_per_step == 0 {
            self.step_ceiling();
        }
    }

    fn step_ceiling(&mut self) {
        if self.progress.ceiling_row > 0 {
            self.progress.ceiling_row -= 1;
            self.grid.block_row(self.progress.ceiling_row);
        }
    }

    /// Post-lock pipeline: clears lines, scores the board and, unless the level has
    /// ended, spawns the next piece.
    pub fn settle<F>(&mut self, evaluate: F) -> Settlement
    where
        F: FnOnce(&TileGrid) -> ObjectiveReport,
    {
        let lines_cleared = self.check_and_clear_lines();
        let report = evaluate(&self.grid);
        if !report.verdict.is_terminal() {
            let next = self.take_next_piece();
            self.spawn(next);
        }
        Settlement {
            lines_cleared,
            report,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use super::*;
    use crate::{CellPos, TileState, Verdict};

    const SEED: BagSeed = BagSeed::from_bytes([7; 16]);

    fn rules(per_step: u32, gain: f32) -> LevelRules {
        LevelRules {
            line_clears_per_step: NonZeroU32::new(per_step).unwrap(),
            speed_gain_per_clear: gain,
            ..LevelRules::default()
        }
    }

    fn fill_row_except(board: &mut Board, row: i8, gaps: &[i8]) {
        for col in (0..TileGrid::COLUMNS).filter(|c| !gaps.contains(c)) {
            board
                .grid_mut()
                .set(CellPos::new(col, row), TileState::Filled, Some(PieceKind::Z));
        }
    }

    fn state(board: &Board, col: i8, row: i8) -> TileState {
        board.grid().get(CellPos::new(col, row)).unwrap().state()
    }

    /// Replaces the falling piece with `kind` at the top.
    fn force_piece(board: &mut Board, kind: PieceKind) {
        board.controller.erase(&mut board.grid);
        board.spawn(kind);
    }

    mod lifecycle {
        use super::*;

        #[test]
        fn test_begin_level_blocks_ceiling_rows() {
            let rules = LevelRules {
                start_ceiling_row: 17,
                ..LevelRules::default()
            };
            let board = Board::with_seed(rules, SEED);
            for row in 17..20 {
                assert!(board.grid().is_row_blocked(row));
            }
            assert!(!board.grid().is_row_blocked(16));
            assert_eq!(board.piece().center(), CellPos::new(5, 17));
            assert_eq!(board.upcoming().len(), 3);
        }

        #[test]
        fn test_take_next_piece_walks_the_preview() {
            let mut board = Board::with_seed(LevelRules::default(), SEED);
            let preview = board.upcoming().to_vec();
            assert_eq!(board.take_next_piece(), preview[0]);
            assert_eq!(board.take_next_piece(), preview[1]);
        }

        #[test]
        fn test_hold_takes_preview_front() {
            let mut board = Board::with_seed(LevelRules::default(), SEED);
            let current = board.piece().kind();
            let front = board.upcoming()[0];
            board.try_hold().unwrap();
            assert_eq!(board.piece().kind(), front);
            assert_eq!(board.held(), Some(current));
            assert!(board.try_hold().is_err());
        }

        #[test]
        fn test_tutorial_presets_and_queue() {
            use std::collections::BTreeMap;

            let mut board = Board::with_seed(LevelRules::default(), SEED);
            let tail = board.upcoming()[2];
            let tutorial = TutorialLevel {
                level: 0,
                title: "t".to_owned(),
                presets: BTreeMap::from([
                    (PieceKind::L, vec![CellPos::new(0, 0), CellPos::new(1, 0)]),
                    (PieceKind::S, vec![CellPos::new(9, 3)]),
                ]),
                initial_queue: vec![PieceKind::O, PieceKind::T, PieceKind::L],
            };
            board.apply_tutorial(&tutorial);

            assert_eq!(board.piece().kind(), PieceKind::O);
            assert_eq!(board.upcoming(), &[PieceKind::T, PieceKind::L, tail]);
            let tile = board.grid().get(CellPos::new(9, 3)).unwrap();
            assert!(tile.state().is_filled());
            assert_eq!(tile.kind(), Some(PieceKind::S));
            assert_eq!(board.grid().count(TileState::Filled), 3);
        }
    }

    mod line_clear {
        use super::*;

        #[test]
        fn test_i_piece_hard_drop_clears_bottom_row() {
            let mut board = Board::with_seed(rules(2, 0.1), SEED);
            fill_row_except(&mut board, 0, &[3, 4, 5, 6]);
            force_piece(&mut board, PieceKind::I);

            assert!(board.hard_drop().is_placed());
            assert_eq!(board.check_and_clear_lines(), 1);
            assert_eq!(board.grid().count(TileState::Filled), 0);
            assert_eq!(board.progress().cleared_lines(), 1);
            assert!((board.progress().fall_speed() - 1.1).abs() < 1e-6);
            assert_eq!(board.lines_until_ceiling_step(), 1);
        }

        #[test]
        fn test_rescan_clears_consecutive_rows() {
            let mut board = Board::with_seed(rules(10, 0.0), SEED);
            fill_row_except(&mut board, 0, &[]);
            fill_row_except(&mut board, 1, &[]);
            fill_row_except(&mut board, 2, &[4]);
            board.controller.erase(&mut board.grid);

            assert_eq!(board.check_and_clear_lines(), 2);
            assert_eq!(state(&board, 0, 0), TileState::Filled);
            assert_eq!(state(&board, 4, 0), TileState::Empty);
            assert_eq!(board.grid().count(TileState::Filled), 9);
        }

        #[test]
        fn test_collapse_stops_under_the_ceiling() {
            let rules = LevelRules {
                start_ceiling_row: 5,
                ..rules(10, 0.0)
            };
            let mut board = Board::with_seed(rules, SEED);
            fill_row_except(&mut board, 0, &[]);
            fill_row_except(&mut board, 4, &[0]);
            board.controller.erase(&mut board.grid);

            assert_eq!(board.check_and_clear_lines(), 1);
            // Row 4 moved to row 3 and row 4 was emptied; the ceiling stayed put
            assert_eq!(state(&board, 1, 3), TileState::Filled);
            assert_eq!(state(&board, 1, 4), TileState::Empty);
            assert!(board.grid().is_row_blocked(5));
            assert!(board.grid().is_row_blocked(19));
        }

        #[test]
        fn test_open_board_empties_top_row() {
            let mut board = Board::with_seed(rules(10, 0.0), SEED);
            fill_row_except(&mut board, 0, &[]);
            fill_row_except(&mut board, 19, &[9]);
            board.controller.erase(&mut board.grid);

            assert_eq!(board.check_and_clear_lines(), 1);
            assert_eq!(state(&board, 0, 18), TileState::Filled);
            assert_eq!(state(&board, 0, 19), TileState::Empty);
        }

        #[test]
        fn test_ceiling_steps_after_two_clears() {
            let mut board = Board::with_seed(rules(2, 0.0), SEED);
            board.controller.erase(&mut board.grid);
            fill_row_except(&mut board, 0, &[]);
            assert_eq!(board.check_and_clear_lines(), 1);
            assert!(!board.grid().is_row_blocked(19));
            assert_eq!(board.progress().ceiling_row(), 20);

            fill_row_except(&mut board, 0, &[]);
            assert_eq!(board.check_and_clear_lines(), 1);
            assert!(board.grid().is_row_blocked(19));
            assert_eq!(board.progress().ceiling_row(), 19);
            assert_eq!(board.lines_until_ceiling_step(), 2);
        }

        #[test]
        fn test_settle_spawns_unless_terminal() {
            let mut board = Board::with_seed(rules(2, 0.0), SEED);
            let front = board.upcoming()[0];
            let report = |verdict| {
                move |_: &TileGrid| ObjectiveReport {
                    required_filled: 0,
                    required_total: 1,
                    buffers_used: 0,
                    buffers_allowed: 0,
                    verdict,
                }
            };

            assert!(board.hard_drop().is_placed());
            let settlement = board.settle(report(Verdict::InProgress));
            assert_eq!(settlement.lines_cleared, 0);
            assert_eq!(board.piece().kind(), front);

            let front = board.upcoming()[0];
            assert!(board.hard_drop().is_placed());
            board.settle(report(Verdict::Complete));
            assert_eq!(board.upcoming()[0], front);
            assert_eq!(board.grid().count(TileState::Active), 0);
        }
    }

    mod overflow {
        use super::*;

        #[test]
        fn test_stack_reaching_ceiling_overflows() {
            let rules = LevelRules {
                start_ceiling_row: 4,
                ..LevelRules::default()
            };
            let mut board = Board::with_seed(rules, SEED);
            for row in 0..3 {
                fill_row_except(&mut board, row, &[0]);
            }
            force_piece(&mut board, PieceKind::O);
            let filled = board.grid().count(TileState::Filled);

            // Lands on row 3, its top half pokes into the ceiling
            assert_eq!(board.hard_drop(), LockOutcome::Overflow);
            assert_eq!(board.grid().count(TileState::Filled), filled);
        }
    }
}

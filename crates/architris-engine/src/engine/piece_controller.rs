use crate::{
    HoldUsedError,
    core::{
        piece::{Piece, PieceKind},
        tile_grid::{TileGrid, TileState},
    },
};

/// Gravity runs this many times faster while soft drop is held.
pub const SOFT_DROP_MULTIPLIER: f32 = 10.0;

/// Result of locking the falling piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum LockOutcome {
    /// The piece became part of the stack.
    Placed,
    /// A cell was still at or above the ceiling. Nothing was written.
    Overflow,
}

/// The falling piece and everything that follows it around: ghost, hold slot and
/// gravity timer.
///
/// The controller does not own the grid. Each call borrows it, paints the piece as
/// [`TileState::Active`] cells and erases them again before moving.
#[derive(Debug, Clone)]
pub struct PieceController {
    piece: Piece,
    ghost: Piece,
    held: Option<PieceKind>,
    hold_used: bool,
    gravity_timer: f32,
}

impl Default for PieceController {
    fn default() -> Self {
        Self::new()
    }
}

impl PieceController {
    /// A controller with nothing spawned yet.
    #[must_use]
    pub fn new() -> Self {
        let piece = Piece::spawn(PieceKind::Single, TileGrid::ROWS);
        Self {
            piece,
            ghost: piece,
            held: None,
            hold_used: false,
            gravity_timer: 1.0,
        }
    }

    #[must_use]
    pub fn piece(&self) -> Piece {
        self.piece
    }

    /// Where the piece would land on a hard drop.
    #[must_use]
    pub fn ghost(&self) -> Piece {
        self.ghost
    }

    #[must_use]
    pub fn held(&self) -> Option<PieceKind> {
        self.held
    }

    #[must_use]
    pub fn is_hold_used(&self) -> bool {
        self.hold_used
    }

    pub(crate) fn spawn(&mut self, grid: &mut TileGrid, kind: PieceKind, ceiling_row: i8, speed: f32) {
        self.piece = Piece::spawn(kind, ceiling_row);
        self.paint(grid);
        self.gravity_timer = speed.recip();
    }

    /// Clears the piece's active cells from `grid`.
    pub(crate) fn erase(&self, grid: &mut TileGrid) {
        for cell in self.piece.cells() {
            grid.set(cell, TileState::Empty, None);
        }
    }

    fn paint(&mut self, grid: &mut TileGrid) {
        for cell in self.piece.cells() {
            grid.set(cell, TileState::Active, Some(self.piece.kind()));
        }
        self.ghost = self.piece.dropped(grid);
    }

    fn replace(&mut self, grid: &mut TileGrid, piece: Piece) {
        self.erase(grid);
        self.piece = piece;
        self.paint(grid);
    }

    pub(crate) fn try_move(&mut self, grid: &mut TileGrid, dx: i8, dy: i8) -> bool {
        let moved = self.piece.shifted(dx, dy);
        if !moved.fits(grid) {
            return false;
        }
        self.replace(grid, moved);
        true
    }

    pub(crate) fn try_rotate(&mut self, grid: &mut TileGrid, clockwise: bool) -> bool {
        let Some(rotated) = self.piece.kicked_rotation(grid, clockwise) else {
            return false;
        };
        self.replace(grid, rotated);
        true
    }

    /// Turns the piece into filled cells.
    ///
    /// Every cell is checked against the ceiling before anything is written.
    pub(crate) fn lock(&mut self, grid: &mut TileGrid, ceiling_row: i8) -> LockOutcome {
        let cells = self.piece.cells();
        if cells.iter().any(|cell| cell.row >= ceiling_row) {
            return LockOutcome::Overflow;
        }
        for cell in cells {
            grid.set(cell, TileState::Filled, Some(self.piece.kind()));
        }
        self.hold_used = false;
        LockOutcome::Placed
    }

    pub(crate) fn hard_drop(&mut self, grid: &mut TileGrid, ceiling_row: i8) -> LockOutcome {
        while self.try_move(grid, 0, -1) {}
        self.lock(grid, ceiling_row)
    }

    /// Advances the gravity timer by `dt` seconds.
    ///
    /// When the timer runs out the piece drops a row, or locks if it cannot. Returns
    /// the lock outcome if a lock happened.
    pub(crate) fn tick_gravity(
        &mut self,
        grid: &mut TileGrid,
        dt: f32,
        soft_drop: bool,
        speed: f32,
        ceiling_row: i8,
    ) -> Option<LockOutcome> {
        let rate = if soft_drop { SOFT_DROP_MULTIPLIER } else { 1.0 };
        self.gravity_timer -= dt * rate;
        if self.gravity_timer > 0.0 {
            return None;
        }
        self.gravity_timer = speed.recip();
        if self.try_move(grid, 0, -1) {
            return None;
        }
        Some(self.lock(grid, ceiling_row))
    }

    /// Makes the next gravity tick step immediately.
    pub(crate) fn begin_soft_drop(&mut self) {
        self.gravity_timer = 0.0;
    }

    pub(crate) fn end_soft_drop(&mut self, speed: f32) {
        self.gravity_timer = speed.recip();
    }

    /// Stashes the current kind and brings out the held one, or `take_next` if the
    /// slot was empty. Allowed once per piece.
    pub(crate) fn try_hold(
        &mut self,
        grid: &mut TileGrid,
        ceiling_row: i8,
        speed: f32,
        take_next: impl FnOnce() -> PieceKind,
    ) -> Result<(), HoldUsedError> {
        if self.hold_used {
            return Err(HoldUsedError);
        }
        self.erase(grid);
        let next = self
            .held
            .replace(self.piece.kind())
            .unwrap_or_else(take_next);
        self.spawn(grid, next, ceiling_row, speed);
        self.hold_used = true;
        Ok(())
    }

    pub(crate) fn reset_hold(&mut self) {
        self.held = None;
        self.hold_used = false;
    }
}

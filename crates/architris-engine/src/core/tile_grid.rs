use serde::{Deserialize, Serialize};

use super::piece::PieceKind;

/// Number of playable columns.
pub const GRID_WIDTH: usize = 10;
/// Number of playable rows.
pub const GRID_HEIGHT: usize = 20;

/// A cell coordinate on the playfield.
///
/// The origin is the bottom-left cell; columns grow to the right and rows grow
/// upward. Coordinates are signed so that piece cells hanging past a wall or
/// above the top row can still be described while a move is validated.
///
/// Serialized as a `[col, row]` pair.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(from = "(i8, i8)", into = "(i8, i8)")]
#[display("({col}, {row})")]
pub struct CellPos {
    pub col: i8,
    pub row: i8,
}

impl CellPos {
    #[must_use]
    pub const fn new(col: i8, row: i8) -> Self {
        Self { col, row }
    }

    #[must_use]
    pub const fn offset(self, dx: i8, dy: i8) -> Self {
        Self::new(self.col + dx, self.row + dy)
    }
}

impl From<(i8, i8)> for CellPos {
    fn from((col, row): (i8, i8)) -> Self {
        Self::new(col, row)
    }
}

impl From<CellPos> for (i8, i8) {
    fn from(pos: CellPos) -> Self {
        (pos.col, pos.row)
    }
}

/// Occupancy state of a tile.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::IsVariant,
)]
#[serde(rename_all = "snake_case")]
pub enum TileState {
    #[default]
    Empty,
    /// Part of a locked piece.
    Filled,
    /// At or above the ceiling. Only the ceiling descent writes this state.
    Blocked,
    /// Occupied by the falling piece.
    Active,
}

/// Role a tile plays in the level objective.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::IsVariant,
)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveRole {
    #[default]
    Regular,
    /// May be filled up to the level's allowance.
    Buffer,
    /// Must be filled to complete the level.
    Required,
}

/// A single cell record of the [`TileGrid`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tile {
    state: TileState,
    kind: Option<PieceKind>,
    role: ObjectiveRole,
}

impl Tile {
    pub const EMPTY: Self = Self {
        state: TileState::Empty,
        kind: None,
        role: ObjectiveRole::Regular,
    };

    #[must_use]
    pub fn state(&self) -> TileState {
        self.state
    }

    /// Kind of the piece that last painted this tile.
    #[must_use]
    pub fn kind(&self) -> Option<PieceKind> {
        self.kind
    }

    #[must_use]
    pub fn role(&self) -> ObjectiveRole {
        self.role
    }

    #[must_use]
    pub fn is_mutable(&self) -> bool {
        !self.state.is_blocked()
    }
}

/// The 10×20 playfield.
///
/// Ordinary writes go through [`TileGrid::set`] and [`TileGrid::set_state`], which
/// silently ignore targets outside the grid and targets that are currently
/// [`TileState::Blocked`]. Callers can therefore paint a piece cell by cell without
/// bounds-checking each cell first.
///
/// # Example
///
/// ```
/// use architris_engine::{CellPos, PieceKind, TileGrid, TileState};
///
/// let mut grid = TileGrid::new();
/// grid.set(CellPos::new(3, 0), TileState::Filled, Some(PieceKind::T));
/// assert!(grid.get(CellPos::new(3, 0)).unwrap().state().is_filled());
///
/// // Out-of-range access is not an error
/// assert!(grid.get(CellPos::new(10, 0)).is_none());
/// grid.set(CellPos::new(-1, 0), TileState::Filled, None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TileGrid {
    rows: [[Tile; GRID_WIDTH]; GRID_HEIGHT],
}

impl Default for TileGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl TileGrid {
    /// [`GRID_WIDTH`] in cell coordinates.
    pub const COLUMNS: i8 = 10;
    /// [`GRID_HEIGHT`] in cell coordinates.
    pub const ROWS: i8 = 20;

    pub const EMPTY: Self = Self {
        rows: [[Tile::EMPTY; GRID_WIDTH]; GRID_HEIGHT],
    };

    #[must_use]
    pub fn new() -> Self {
        Self::EMPTY
    }

    fn index(pos: CellPos) -> Option<(usize, usize)> {
        let col = usize::try_from(pos.col)
            .ok()
            .filter(|&c| c < GRID_WIDTH)?;
        let row = usize::try_from(pos.row)
            .ok()
            .filter(|&r| r < GRID_HEIGHT)?;
        Some((col, row))
    }

    fn row_index(row: i8) -> Option<usize> {
        usize::try_from(row).ok().filter(|&r| r < GRID_HEIGHT)
    }

    #[must_use]
    pub fn contains(pos: CellPos) -> bool {
        Self::index(pos).is_some()
    }

    /// Returns the tile at `pos`, or `None` when `pos` is outside the playfield.
    #[must_use]
    pub fn get(&self, pos: CellPos) -> Option<Tile> {
        let (col, row) = Self::index(pos)?;
        Some(self.rows[row][col])
    }

    fn get_mut(&mut self, pos: CellPos) -> Option<&mut Tile> {
        let (col, row) = Self::index(pos)?;
        Some(&mut self.rows[row][col])
    }

    /// Writes state and piece kind of a mutable tile.
    pub fn set(&mut self, pos: CellPos, state: TileState, kind: Option<PieceKind>) {
        if let Some(tile) = self.get_mut(pos).filter(|t| t.is_mutable()) {
            tile.state = state;
            tile.kind = kind;
        }
    }

    /// Like [`Self::set`], but keeps the recorded piece kind.
    pub fn set_state(&mut self, pos: CellPos, state: TileState) {
        if let Some(tile) = self.get_mut(pos).filter(|t| t.is_mutable()) {
            tile.state = state;
        }
    }

    /// Whether a falling piece may occupy `pos`.
    ///
    /// Above the top row only the column range is checked. Inside the grid any tile
    /// that is not [`TileState::Filled`] is passable, including blocked ones.
    #[must_use]
    pub fn is_passable(&self, pos: CellPos) -> bool {
        if pos.row >= Self::ROWS {
            return (0..Self::COLUMNS).contains(&pos.col);
        }
        self.get(pos).is_some_and(|t| !t.state.is_filled())
    }

    #[must_use]
    pub fn is_row_full(&self, row: i8) -> bool {
        Self::row_index(row)
            .is_some_and(|r| self.rows[r].iter().all(|t| t.state.is_filled()))
    }

    /// Whether `row` is part of the blocked ceiling, judged by its first column.
    #[must_use]
    pub fn is_row_blocked(&self, row: i8) -> bool {
        Self::row_index(row).is_some_and(|r| self.rows[r][0].state.is_blocked())
    }

    pub fn rows(&self) -> impl DoubleEndedIterator<Item = &[Tile; GRID_WIDTH]> + '_ {
        self.rows.iter()
    }

    pub fn tiles(&self) -> impl Iterator<Item = (CellPos, Tile)> + '_ {
        (0..Self::ROWS).flat_map(move |row| {
            (0..Self::COLUMNS).filter_map(move |col| {
                let pos = CellPos::new(col, row);
                self.get(pos).map(|tile| (pos, tile))
            })
        })
    }

    #[must_use]
    pub fn count(&self, state: TileState) -> usize {
        self.rows
            .iter()
            .flatten()
            .filter(|t| t.state == state)
            .count()
    }

    /// Marks a whole row as part of the ceiling, overriding whatever it held.
    pub(crate) fn block_row(&mut self, row: i8) {
        if let Some(r) = Self::row_index(row) {
            for tile in &mut self.rows[r] {
                tile.state = TileState::Blocked;
                tile.kind = None;
            }
        }
    }

    pub(crate) fn clear_row(&mut self, row: i8) {
        for col in 0..Self::COLUMNS {
            self.set(CellPos::new(col, row), TileState::Empty, None);
        }
    }

    /// Copies state and kind of `from` into `to`. Objective roles stay in place.
    pub(crate) fn copy_row(&mut self, from: i8, to: i8) {
        let (Some(from), Some(to)) = (Self::row_index(from), Self::row_index(to)) else {
            return;
        };
        let source = self.rows[from];
        for (dst, src) in self.rows[to].iter_mut().zip(source) {
            if dst.is_mutable() {
                dst.state = src.state;
                dst.kind = src.kind;
            }
        }
    }

    pub(crate) fn set_role(&mut self, pos: CellPos, role: ObjectiveRole) {
        if let Some(tile) = self.get_mut(pos) {
            tile.role = role;
        }
    }

    /// Empties every tile, ceiling included, and forgets all objective roles.
    pub(crate) fn reset(&mut self) {
        *self = Self::EMPTY;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_row(grid: &mut TileGrid, row: i8) {
        for col in 0..TileGrid::COLUMNS {
            grid.set(CellPos::new(col, row), TileState::Filled, Some(PieceKind::I));
        }
    }

    #[test]
    fn test_get_out_of_range_is_none() {
        let grid = TileGrid::new();
        assert!(grid.get(CellPos::new(0, 0)).is_some());
        assert!(grid.get(CellPos::new(9, 19)).is_some());
        assert!(grid.get(CellPos::new(-1, 0)).is_none());
        assert!(grid.get(CellPos::new(10, 0)).is_none());
        assert!(grid.get(CellPos::new(0, -1)).is_none());
        assert!(grid.get(CellPos::new(0, 20)).is_none());
    }

    #[test]
    fn test_out_of_range_writes_are_ignored() {
        let mut grid = TileGrid::new();
        grid.set(CellPos::new(10, 3), TileState::Filled, Some(PieceKind::S));
        grid.set(CellPos::new(3, 20), TileState::Filled, Some(PieceKind::S));
        assert_eq!(grid, TileGrid::new());
    }

    #[test]
    fn test_blocked_tiles_are_immutable() {
        let mut grid = TileGrid::new();
        grid.block_row(19);
        let before = grid.clone();

        for col in 0..TileGrid::COLUMNS {
            let pos = CellPos::new(col, 19);
            grid.set(pos, TileState::Filled, Some(PieceKind::Z));
            grid.set(pos, TileState::Empty, None);
            grid.set_state(pos, TileState::Active);
        }
        grid.clear_row(19);
        grid.copy_row(0, 19);

        assert_eq!(grid, before);
        assert!(!grid.get(CellPos::new(4, 19)).unwrap().is_mutable());
    }

    #[test]
    fn test_set_state_keeps_kind() {
        let mut grid = TileGrid::new();
        let pos = CellPos::new(2, 2);
        grid.set(pos, TileState::Active, Some(PieceKind::L));
        grid.set_state(pos, TileState::Filled);
        let tile = grid.get(pos).unwrap();
        assert_eq!(tile.state(), TileState::Filled);
        assert_eq!(tile.kind(), Some(PieceKind::L));
    }

    #[test]
    fn test_passable_rules() {
        let mut grid = TileGrid::new();
        grid.set(CellPos::new(4, 0), TileState::Filled, Some(PieceKind::O));
        grid.set(CellPos::new(5, 0), TileState::Active, Some(PieceKind::O));
        grid.block_row(19);

        assert!(!grid.is_passable(CellPos::new(4, 0)));
        assert!(grid.is_passable(CellPos::new(5, 0)));
        assert!(grid.is_passable(CellPos::new(6, 0)));
        assert!(grid.is_passable(CellPos::new(6, 19)));
        // Above the grid only the walls matter
        assert!(grid.is_passable(CellPos::new(0, 22)));
        assert!(!grid.is_passable(CellPos::new(10, 22)));
        // Below the floor and past the walls
        assert!(!grid.is_passable(CellPos::new(3, -1)));
        assert!(!grid.is_passable(CellPos::new(-1, 5)));
    }

    #[test]
    fn test_row_full_and_blocked() {
        let mut grid = TileGrid::new();
        fill_row(&mut grid, 0);
        assert!(grid.is_row_full(0));
        assert!(!grid.is_row_full(1));

        grid.set(CellPos::new(9, 0), TileState::Empty, None);
        assert!(!grid.is_row_full(0));

        grid.block_row(18);
        assert!(grid.is_row_blocked(18));
        assert!(!grid.is_row_full(18));
        assert!(!grid.is_row_blocked(17));
        assert!(!grid.is_row_blocked(20));
    }

    #[test]
    fn test_copy_row_keeps_roles() {
        let mut grid = TileGrid::new();
        grid.set_role(CellPos::new(1, 0), ObjectiveRole::Required);
        grid.set(CellPos::new(1, 1), TileState::Filled, Some(PieceKind::J));
        grid.copy_row(1, 0);

        let tile = grid.get(CellPos::new(1, 0)).unwrap();
        assert_eq!(tile.state(), TileState::Filled);
        assert_eq!(tile.kind(), Some(PieceKind::J));
        assert_eq!(tile.role(), ObjectiveRole::Required);
        assert_eq!(
            grid.get(CellPos::new(1, 1)).unwrap().role(),
            ObjectiveRole::Regular
        );
    }

    #[test]
    fn test_reset_clears_ceiling_and_roles() {
        let mut grid = TileGrid::new();
        grid.block_row(19);
        grid.set_role(CellPos::new(0, 0), ObjectiveRole::Buffer);
        grid.reset();
        assert_eq!(grid, TileGrid::new());
    }

    #[test]
    fn test_tiles_iterates_bottom_up() {
        let grid = TileGrid::new();
        let positions: Vec<_> = grid.tiles().map(|(pos, _)| pos).take(11).collect();
        assert_eq!(positions[0], CellPos::new(0, 0));
        assert_eq!(positions[9], CellPos::new(9, 0));
        assert_eq!(positions[10], CellPos::new(0, 1));
        assert_eq!(grid.tiles().count(), GRID_WIDTH * GRID_HEIGHT);
    }

    #[test]
    fn test_cell_pos_serializes_as_pair() {
        let pos = CellPos::new(3, 17);
        let json = serde_json::to_string(&pos).unwrap();
        assert_eq!(json, "[3,17]");
        let back: CellPos = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pos);
        assert_eq!(pos.to_string(), "(3, 17)");
    }
}

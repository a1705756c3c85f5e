use arrayvec::ArrayVec;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::tile_grid::{CellPos, TileGrid};

/// Column every piece spawns around.
pub const SPAWN_COLUMN: i8 = 5;

/// A falling piece: kind, rotation state and pivot.
///
/// The occupied cells are derived from these three values on demand, so a piece is a
/// small `Copy` value. Movement and rotation return new pieces; nothing here touches
/// the grid except for collision queries.
///
/// # Example
///
/// ```
/// use architris_engine::{CellPos, Piece, PieceKind, TileGrid};
///
/// let grid = TileGrid::new();
/// let piece = Piece::spawn(PieceKind::T, 10);
/// let rotated = piece.kicked_rotation(&grid, true).unwrap();
/// let landed = rotated.dropped(&grid);
/// assert!(landed.cells().iter().any(|cell| cell.row == 0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    kind: PieceKind,
    rotation: Rotation,
    center: CellPos,
}

impl Piece {
    #[must_use]
    pub const fn new(kind: PieceKind, rotation: Rotation, center: CellPos) -> Self {
        Self {
            kind,
            rotation,
            center,
        }
    }

    /// Creates a piece in its spawn orientation on the ceiling row.
    #[must_use]
    pub const fn spawn(kind: PieceKind, ceiling_row: i8) -> Self {
        Self::new(
            kind,
            Rotation::SPAWN,
            CellPos::new(SPAWN_COLUMN, ceiling_row),
        )
    }

    #[must_use]
    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    #[must_use]
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    #[must_use]
    pub fn center(&self) -> CellPos {
        self.center
    }

    /// Cells covered by this piece. Four for tetrominoes, one for [`PieceKind::Single`].
    #[must_use]
    pub fn cells(&self) -> ArrayVec<CellPos, 4> {
        let CellPos { col: cx, row: cy } = self.center;
        let r = self.rotation.state();
        let mut cells = ArrayVec::new();
        match self.kind {
            PieceKind::J => push_rotated(&mut cells, self.center, r, &J_OFFSETS),
            PieceKind::S => push_rotated(&mut cells, self.center, r, &S_OFFSETS),
            PieceKind::L => push_rotated(&mut cells, self.center, r, &L_OFFSETS),
            PieceKind::Z => push_rotated(&mut cells, self.center, r, &Z_OFFSETS),
            PieceKind::T => push_rotated(&mut cells, self.center, r, &T_OFFSETS),
            // The pivot is not one of the I cells, so each state is spelled out.
            PieceKind::I => {
                for i in 0..4 {
                    let (col, row) = match r {
                        0 => (cx + i - 2, cy),
                        1 => (cx, cy - i + 1),
                        2 => (cx + i - 2, cy - 1),
                        _ => (cx - 1, cy - i + 1),
                    };
                    cells.push(CellPos::new(col, row));
                }
            }
            PieceKind::O => {
                cells.extend([(cx - 1, cy), (cx, cy), (cx - 1, cy + 1), (cx, cy + 1)].map(CellPos::from));
            }
            PieceKind::Single => cells.push(self.center),
        }
        cells
    }

    #[must_use]
    pub fn shifted(&self, dx: i8, dy: i8) -> Self {
        Self {
            center: self.center.offset(dx, dy),
            ..*self
        }
    }

    /// Turns the piece a quarter in place, without any wall kick.
    ///
    /// O and single-cell pieces come back unchanged.
    #[must_use]
    pub fn rotated(&self, clockwise: bool) -> Self {
        if !self.kind.rotates() {
            return *self;
        }
        Self {
            rotation: self.rotation.turned(clockwise),
            ..*self
        }
    }

    /// Whether every cell of the piece is passable on `grid`.
    #[must_use]
    pub fn fits(&self, grid: &TileGrid) -> bool {
        self.cells().iter().all(|&cell| grid.is_passable(cell))
    }

    /// Rotates with wall kicks.
    ///
    /// Each of the five kick offsets for the transition is tried in order and the
    /// first position that fits is returned. Returns `None` when no offset fits, or
    /// when the kind does not rotate.
    #[must_use]
    pub fn kicked_rotation(&self, grid: &TileGrid, clockwise: bool) -> Option<Self> {
        if !self.kind.rotates() {
            return None;
        }
        let rotated = self.rotated(clockwise);
        wall_kicks(self.kind, rotated.rotation, clockwise)
            .into_iter()
            .map(|(dx, dy)| rotated.shifted(dx, dy))
            .find(|piece| piece.fits(grid))
    }

    /// The position a hard drop would land on.
    #[must_use]
    pub fn dropped(&self, grid: &TileGrid) -> Self {
        let mut height = 0;
        while self.shifted(0, -(height + 1)).fits(grid) {
            height += 1;
        }
        self.shifted(0, -height)
    }
}

fn push_rotated(cells: &mut ArrayVec<CellPos, 4>, center: CellPos, rotation: u8, offsets: &[(i8, i8); 4]) {
    for &(dx, dy) in offsets {
        let (dx, dy) = rotate_offset(dx, dy, rotation);
        cells.push(center.offset(dx, dy));
    }
}

/// Applies rotation state `r` to a spawn-orientation offset.
///
/// States 2 and 3 flip both signs first, odd states then turn a quarter clockwise.
/// This yields the 0 → R → 2 → L sequence.
const fn rotate_offset(dx: i8, dy: i8, r: u8) -> (i8, i8) {
    let (dx, dy) = if r >= 2 { (-dx, -dy) } else { (dx, dy) };
    if r % 2 == 1 { (dy, -dx) } else { (dx, dy) }
}

const J_OFFSETS: [(i8, i8); 4] = [(-1, 1), (-1, 0), (0, 0), (1, 0)];
const S_OFFSETS: [(i8, i8); 4] = [(1, 1), (0, 1), (0, 0), (-1, 0)];
const L_OFFSETS: [(i8, i8); 4] = [(1, 1), (1, 0), (0, 0), (-1, 0)];
const Z_OFFSETS: [(i8, i8); 4] = [(-1, 1), (0, 1), (0, 0), (1, 0)];
const T_OFFSETS: [(i8, i8); 4] = [(-1, 0), (0, 1), (1, 0), (0, 0)];

/// Kicks shared by J, S, L, Z and T. Signs are chosen per transition.
const BASE_KICKS: [(i8, i8); 5] = [(0, 0), (-1, 0), (-1, 1), (0, -2), (-1, -2)];

const I_KICKS: [[(i8, i8); 5]; 2] = [
    [(0, 0), (-2, 0), (1, 0), (-2, -1), (1, 2)],
    [(0, 0), (-1, 0), (2, 0), (-1, 2), (2, -1)],
];

/// Ordered kick offsets for turning into `target`.
pub(crate) fn wall_kicks(kind: PieceKind, target: Rotation, clockwise: bool) -> [(i8, i8); 5] {
    let r = target.state();
    if kind == PieceKind::I {
        let (table, sign) = if clockwise {
            (&I_KICKS[usize::from((r + 1) % 2)], if r % 3 == 0 { -1 } else { 1 })
        } else {
            (&I_KICKS[usize::from(r % 2)], if r < 2 { -1 } else { 1 })
        };
        return table.map(|(dx, dy)| (dx * sign, dy * sign));
    }
    let x_sign = match (clockwise, r) {
        (true, 0 | 1) | (false, 1 | 2) => 1,
        _ => -1,
    };
    let y_sign = if r % 2 == 0 { -1 } else { 1 };
    BASE_KICKS.map(|(dx, dy)| (dx * x_sign, dy * y_sign))
}

/// Rotation state of a piece.
///
/// - `0`: spawn orientation
/// - `1`: a quarter turn clockwise ("R")
/// - `2`: half turn
/// - `3`: a quarter turn counter-clockwise ("L")
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rotation(u8);

impl Rotation {
    pub const SPAWN: Self = Self(0);

    /// Wraps `state` into `0..4`.
    #[must_use]
    pub const fn new(state: u8) -> Self {
        Self(state % 4)
    }

    #[must_use]
    pub const fn state(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn clockwise(self) -> Self {
        Self((self.0 + 1) % 4)
    }

    #[must_use]
    pub const fn counter_clockwise(self) -> Self {
        Self((self.0 + 3) % 4)
    }

    const fn turned(self, clockwise: bool) -> Self {
        if clockwise {
            self.clockwise()
        } else {
            self.counter_clockwise()
        }
    }
}

/// Kind of a piece.
///
/// The seven tetrominoes come out of the bag; [`PieceKind::Single`] is a one-cell
/// piece that only level scripts hand out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PieceKind {
    J,
    S,
    L,
    Z,
    T,
    I,
    O,
    Single,
}

impl Serialize for PieceKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_char(self.as_char())
    }
}

impl<'de> Deserialize<'de> for PieceKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => PieceKind::from_char(c)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid piece kind: {c}"))),
            _ => Err(serde::de::Error::custom(format!(
                "piece kind must be a single character, got '{s}'"
            ))),
        }
    }
}

impl PieceKind {
    /// Number of kinds in the bag.
    pub const LEN: usize = 7;

    /// The bag kinds, in bag-slot order.
    pub const BAG: [Self; Self::LEN] = [
        PieceKind::J,
        PieceKind::S,
        PieceKind::L,
        PieceKind::Z,
        PieceKind::T,
        PieceKind::I,
        PieceKind::O,
    ];

    /// Whether the kind has distinct rotation states.
    #[must_use]
    pub const fn rotates(self) -> bool {
        !matches!(self, PieceKind::O | PieceKind::Single)
    }

    /// Returns the single character representation of this piece kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use architris_engine::PieceKind;
    ///
    /// assert_eq!(PieceKind::I.as_char(), 'I');
    /// assert_eq!(PieceKind::Single.as_char(), '1');
    /// ```
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            PieceKind::J => 'J',
            PieceKind::S => 'S',
            PieceKind::L => 'L',
            PieceKind::Z => 'Z',
            PieceKind::T => 'T',
            PieceKind::I => 'I',
            PieceKind::O => 'O',
            PieceKind::Single => '1',
        }
    }

    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'J' => Some(PieceKind::J),
            'S' => Some(PieceKind::S),
            'L' => Some(PieceKind::L),
            'Z' => Some(PieceKind::Z),
            'T' => Some(PieceKind::T),
            'I' => Some(PieceKind::I),
            'O' => Some(PieceKind::O),
            '1' => Some(PieceKind::Single),
            _ => None,
        }
    }
}

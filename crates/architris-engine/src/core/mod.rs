pub use self::{piece::*, tile_grid::*};

pub(crate) mod piece;
pub(crate) mod tile_grid;

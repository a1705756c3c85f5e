//! Game engine logic and state management.
//!
//! This module puts the core data structures to work:
//!
//! - [`Board`] - The grid, the falling piece, line clears and the ceiling
//! - [`PieceController`] - Movement, rotation, gravity, hold and ghost of the falling piece
//! - [`PieceQueue`] / [`PieceBag`] - 7-bag piece supply with a three-piece preview
//! - [`ObjectiveEngine`] - Level sequencing and objective scoring
//! - [`ProgressRepository`] - Where unlocks and best times are kept
//! - [`GameSession`] - Tick-driven session that turns input into engine calls
//!
//! # Game Flow
//!
//! A level plays out as follows:
//!
//! 1. The level's required and buffer cells are marked and the ceiling rows blocked
//! 2. A piece spawns on the ceiling row and falls under gravity
//! 3. The player shifts, rotates, holds and drops it until it locks
//! 4. Full rows below the ceiling are cleared; every few clears the ceiling drops a row
//! 5. The objective is scored: the level is won once every required cell is filled
//!    within the buffer allowance, and lost if a piece locks in the ceiling or the
//!    ceiling covers a required cell
//! 6. Otherwise the next piece spawns and play goes on
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use architris_engine::{GameSession, InputFrame, Intent, LevelCatalog, MemoryProgress};
//!
//! let catalog: LevelCatalog = serde_json::from_str(
//!     r#"{ "levels": [{
//!         "title": "Floor",
//!         "required": [[0, 0], [1, 0], [2, 0], [3, 0]],
//!         "buffer": { "border": 1 },
//!         "allowed_buffers": 8,
//!         "line_clears_per_step": 2,
//!         "speed_gain_per_clear": 0.1
//!     }] }"#,
//! )
//! .unwrap();
//!
//! let mut session = GameSession::new(catalog, MemoryProgress::default());
//! let frame = Duration::from_millis(16);
//!
//! session.tick(frame, InputFrame::IDLE.press(Intent::RotateCw));
//! if let Some(event) = session.tick(frame, InputFrame::IDLE.press(Intent::HardDrop)) {
//!     println!("{event:?}");
//! }
//! println!("{}", session.snapshot().buffer_status());
//! ```

pub use self::{
    board::*, input::*, objective::*, piece_bag::*, piece_controller::*, progress::*,
    session::*, snapshot::*,
};

mod board;
mod input;
mod objective;
mod piece_bag;
mod piece_controller;
mod progress;
mod session;
mod snapshot;

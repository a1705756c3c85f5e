//! Level data: objectives, ceiling schedules, tutorials and the level catalog.
//!
//! Levels are plain data. They are deserialized from JSON and validated once, after
//! which they never change. The [`crate::ObjectiveEngine`] picks levels out of a
//! [`LevelCatalog`] and scores the board against them.

pub use self::{catalog::*, definition::*, tutorial::*};

mod catalog;
mod definition;
mod tutorial;

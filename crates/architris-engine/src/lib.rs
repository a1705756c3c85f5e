pub use self::{core::*, engine::*, level::*};

pub mod core;
pub mod engine;
pub mod level;

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("hold already used for this piece")]
pub struct HoldUsedError;

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("level {index} does not exist (catalog has {len} levels)")]
pub struct UnknownLevelError {
    pub index: usize,
    pub len: usize,
}

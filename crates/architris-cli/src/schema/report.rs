use architris_engine::{BagSeed, SessionEvent, Snapshot};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Result of replaying a script against a level
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Timestamp when the run finished (ISO 8601 format)
    pub recorded_at: DateTime<Utc>,
    /// Seed of the piece bag, to reproduce the run
    pub seed: BagSeed,
    /// Catalog index of the level
    pub level: usize,
    /// Milliseconds simulated per tick
    pub tick_ms: u64,
    /// Ticks actually simulated
    pub ticks: u64,
    /// Attempt endings in the order they happened
    pub events: Vec<SessionEvent>,
    /// Session state after the last tick
    pub final_state: Snapshot,
}

use std::path::Path;

use anyhow::Context;
use architris_engine::LevelCatalog;

use crate::util;

/// The level pack shipped with the binary.
const BUILTIN_LEVELS: &str = include_str!("../data/levels.json");

/// Reads the catalog from `path`, or falls back to the built-in pack.
pub fn load(path: Option<&Path>) -> anyhow::Result<LevelCatalog> {
    match path {
        Some(path) => util::read_json_file("level catalog", path),
        None => builtin(),
    }
}

pub fn builtin() -> anyhow::Result<LevelCatalog> {
    serde_json::from_str(BUILTIN_LEVELS).context("Failed to parse built-in level pack")
}

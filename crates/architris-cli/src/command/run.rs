use std::{iter, path::PathBuf, time::Duration};

use anyhow::bail;
use architris_engine::{
    BagSeed, GameSession, InputFrame, LevelCatalog, ProgressRepository, SessionEvent,
};
use chrono::Utc;
use rand::Rng as _;

use crate::{
    board_text, level_pack,
    progress_store::{DEFAULT_PROGRESS_PATH, FileProgressStore},
    schema::{report::RunReport, script::InputScript},
    util::{self, Output},
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct RunArg {
    /// Catalog index of the level to play
    #[arg(long)]
    level: usize,
    /// Input script JSON file (idle input when omitted)
    #[arg(long)]
    script: Option<PathBuf>,
    /// Piece bag seed as 32 hex digits (random when omitted)
    #[arg(long)]
    seed: Option<BagSeed>,
    /// Level catalog JSON file (defaults to the built-in pack)
    #[arg(long)]
    levels: Option<PathBuf>,
    /// Progress store JSON file
    #[arg(long, default_value = DEFAULT_PROGRESS_PATH)]
    progress: PathBuf,
    /// Write a JSON run report to this file
    #[arg(long)]
    report: Option<PathBuf>,
    /// Milliseconds simulated per tick
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,
    /// Stop after this many ticks; the script is padded with idle input up to here
    #[arg(long, default_value_t = 36_000)]
    max_ticks: usize,
}

pub(crate) fn run(arg: &RunArg) -> anyhow::Result<()> {
    let RunArg {
        level,
        script,
        seed,
        levels,
        progress,
        report,
        tick_ms,
        max_ticks,
    } = arg;

    let catalog = level_pack::load(levels.as_deref())?;
    let mut store = FileProgressStore::load(progress)?;
    check_unlocked(&catalog, *level, store.unlocked_levels())?;

    let script = match script {
        Some(path) => util::read_json_file("input script", path)?,
        None => InputScript::default(),
    };
    let seed = seed.unwrap_or_else(|| rand::rng().random());
    eprintln!(
        "Running level {level} with seed {seed} ({} scripted ticks)",
        script.total_ticks()
    );

    let tick = Duration::from_millis(*tick_ms);
    let (replay, snapshot) = {
        let mut session = GameSession::with_seed(catalog, &mut store, seed);
        session.start_level(*level)?;
        let replay = replay(&mut session, &script, tick, *max_ticks);
        (replay, session.snapshot())
    };

    print!("{}", board_text::render(&snapshot));
    for event in &replay.events {
        println!("{}", describe(event));
    }
    if !snapshot.state.is_won() && !snapshot.state.is_lost() {
        println!("Still playing after {} ticks", replay.ticks);
    }

    store.save(progress)?;
    eprintln!("Progress saved to {}", progress.display());

    if let Some(path) = report {
        let report = RunReport {
            recorded_at: Utc::now(),
            seed,
            level: *level,
            tick_ms: *tick_ms,
            ticks: replay.ticks,
            events: replay.events,
            final_state: snapshot,
        };
        Output::save_json(&report, Some(path.clone()))?;
        eprintln!("Report written to {}", path.display());
    }

    Ok(())
}

fn check_unlocked(catalog: &LevelCatalog, level: usize, unlocked: usize) -> anyhow::Result<()> {
    if level >= catalog.len() {
        bail!(
            "Level {level} does not exist (catalog has {} levels)",
            catalog.len()
        );
    }
    if !catalog.is_unlocked(level, unlocked) {
        bail!("Level {level} is locked (levels 0..={unlocked} are playable)");
    }
    Ok(())
}

#[derive(Debug, Default)]
struct Replay {
    ticks: u64,
    events: Vec<SessionEvent>,
}

/// Feeds the script to the session until the main level ends or `max_ticks` run out.
///
/// A won tutorial rolls straight into its level.
fn replay<R>(
    session: &mut GameSession<R>,
    script: &InputScript,
    tick: Duration,
    max_ticks: usize,
) -> Replay
where
    R: ProgressRepository,
{
    let mut replay = Replay::default();
    let frames = script.frames().chain(iter::repeat(InputFrame::IDLE));
    for frame in frames.take(max_ticks) {
        replay.ticks += 1;
        let Some(event) = session.tick(tick, frame) else {
            continue;
        };
        replay.events.push(event);
        match event {
            SessionEvent::LevelCompleted { tutorial: true, .. } => {
                session.advance_level();
            }
            SessionEvent::LevelCompleted { .. } | SessionEvent::LevelFailed { .. } => break,
        }
    }
    replay
}

fn describe(event: &SessionEvent) -> String {
    match event {
        SessionEvent::LevelCompleted {
            level,
            tutorial: true,
            ..
        } => format!("Tutorial for level {level} completed"),
        SessionEvent::LevelCompleted {
            level, elapsed, ..
        } => format!("Level {level} completed in {:.2}s", elapsed.as_secs_f64()),
        SessionEvent::LevelFailed { level, reason, .. } => {
            format!("Level {level} failed: {reason}")
        }
    }
}

#[cfg(test)]
mod tests {
    use architris_engine::{Intent, MemoryProgress};

    use super::*;
    use crate::schema::script::ScriptStep;

    const SEED: BagSeed = BagSeed::from_bytes([3; 16]);
    const TICK: Duration = Duration::from_millis(16);

    fn catalog() -> LevelCatalog {
        serde_json::from_str(
            r#"{
                "levels": [
                    {
                        "title": "Floor",
                        "required": [[0, 0], [1, 0], [2, 0], [3, 0]],
                        "buffer": { "cells": [] },
                        "allowed_buffers": 0,
                        "line_clears_per_step": 2,
                        "speed_gain_per_clear": 0.0
                    },
                    {
                        "title": "Corner",
                        "required": [[9, 0]],
                        "buffer": { "border": 1 },
                        "allowed_buffers": 3,
                        "line_clears_per_step": 2,
                        "speed_gain_per_clear": 0.0
                    }
                ],
                "tutorials": [{ "level": 0, "title": "Straight", "initial_queue": ["I"] }]
            }"#,
        )
        .unwrap()
    }

    fn tap(intent: Intent) -> ScriptStep {
        ScriptStep {
            ticks: 1,
            pressed: vec![intent],
            held: Vec::new(),
        }
    }

    #[test]
    fn test_locked_and_unknown_levels_are_refused() {
        let catalog = catalog();
        assert!(check_unlocked(&catalog, 0, 0).is_ok());
        let err = check_unlocked(&catalog, 1, 0).unwrap_err();
        assert!(err.to_string().contains("locked"));
        assert!(check_unlocked(&catalog, 1, 1).is_ok());
        let err = check_unlocked(&catalog, 2, 5).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_idle_replay_runs_to_the_limit() {
        let mut session = GameSession::with_seed(catalog(), MemoryProgress::default(), SEED);
        session.start_level(1).unwrap();
        let replay = replay(&mut session, &InputScript::default(), TICK, 10);
        assert_eq!(replay.ticks, 10);
        assert!(replay.events.is_empty());
        assert!(session.state().is_playing());
    }

    #[test]
    fn test_won_tutorial_continues_into_level() {
        let mut session = GameSession::with_seed(catalog(), MemoryProgress::default(), SEED);
        session.start_level(0).unwrap();
        let script = InputScript {
            steps: vec![
                tap(Intent::MoveLeft),
                tap(Intent::MoveLeft),
                tap(Intent::MoveLeft),
                tap(Intent::HardDrop),
            ],
        };
        let replay = replay(&mut session, &script, TICK, 10);
        assert_eq!(replay.ticks, 10);
        assert_eq!(
            replay.events,
            [SessionEvent::LevelCompleted {
                level: 0,
                tutorial: true,
                elapsed: TICK * 4,
            }]
        );
        assert!(!session.objective().is_tutorial());
        assert!(session.state().is_playing());
    }

    #[test]
    fn test_describe_events() {
        let done = SessionEvent::LevelCompleted {
            level: 2,
            tutorial: false,
            elapsed: Duration::from_millis(1500),
        };
        assert_eq!(describe(&done), "Level 2 completed in 1.50s");
    }
}

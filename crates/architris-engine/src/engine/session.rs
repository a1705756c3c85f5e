use std::time::Duration;

use rand::Rng as _;
use serde::Serialize;

use crate::{
    BagSeed, Board, HoldUsedError, LevelCatalog, LevelRules, ObjectiveEngine, ObjectiveReport,
    ProgressRepository, UnknownLevelError, Verdict,
};

use super::{
    input::{AutoShift, InputFrame, Intent},
    piece_controller::LockOutcome,
    snapshot::Snapshot,
};

/// Why an attempt was lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    #[display("a piece locked inside the ceiling")]
    Overflow,
    #[display("the ceiling covered a required cell")]
    RequiredCellBlocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::IsVariant)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Playing,
    Paused,
    Won,
    Lost(FailureReason),
}

/// Emitted by [`GameSession::tick`] when an attempt ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEvent {
    LevelCompleted {
        level: usize,
        tutorial: bool,
        elapsed: Duration,
    },
    LevelFailed {
        level: usize,
        tutorial: bool,
        reason: FailureReason,
    },
}

/// Drives one player through the catalog, tick by tick.
///
/// Each [`GameSession::tick`] applies one [`InputFrame`] in a fixed order: soft-drop
/// edges, gravity, hard drop, sideways auto-shift, clockwise rotation,
/// counter-clockwise rotation, then hold. As soon as the attempt ends the rest of the
/// frame is dropped.
#[derive(Debug, Clone)]
pub struct GameSession<R> {
    board: Board,
    objective: ObjectiveEngine<R>,
    state: SessionState,
    report: ObjectiveReport,
    auto_shift: AutoShift,
    soft_drop_held: bool,
    elapsed: Duration,
}

impl<R> GameSession<R>
where
    R: ProgressRepository,
{
    /// Opens a session at the level stored in `progress`.
    #[must_use]
    pub fn new(catalog: LevelCatalog, progress: R) -> Self {
        Self::with_seed(catalog, progress, rand::rng().random())
    }

    #[must_use]
    pub fn with_seed(catalog: LevelCatalog, progress: R, seed: BagSeed) -> Self {
        let mut objective = ObjectiveEngine::new(catalog, progress);
        let mut board = Board::with_seed(LevelRules::default(), seed);
        objective.restart_level(&mut board);
        let report = objective.evaluate(board.grid());
        Self {
            board,
            objective,
            state: SessionState::Playing,
            report,
            auto_shift: AutoShift::default(),
            soft_drop_held: false,
            elapsed: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn objective(&self) -> &ObjectiveEngine<R> {
        &self.objective
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn report(&self) -> &ObjectiveReport {
        &self.report
    }

    /// Time spent playing the current attempt, pauses excluded.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn into_progress(self) -> R {
        self.objective.into_progress()
    }

    pub fn start_level(&mut self, index: usize) -> Result<(), UnknownLevelError> {
        self.objective.start_level(&mut self.board, index)?;
        self.reset_attempt();
        Ok(())
    }

    pub fn restart(&mut self) {
        self.objective.restart_level(&mut self.board);
        self.reset_attempt();
    }

    /// Moves to the next stage. Returns `false` at the end of the catalog.
    pub fn advance_level(&mut self) -> bool {
        if !self.objective.advance_level(&mut self.board) {
            return false;
        }
        self.reset_attempt();
        true
    }

    fn reset_attempt(&mut self) {
        self.state = SessionState::Playing;
        self.report = self.objective.evaluate(self.board.grid());
        self.auto_shift.reset();
        self.soft_drop_held = false;
        self.elapsed = Duration::ZERO;
    }

    pub fn toggle_pause(&mut self) {
        self.state = match self.state {
            SessionState::Playing => SessionState::Paused,
            SessionState::Paused => SessionState::Playing,
            other => other,
        };
    }

    /// Advances the session by `elapsed` of wall time.
    pub fn tick(&mut self, elapsed: Duration, input: InputFrame) -> Option<SessionEvent> {
        if input.is_pressed(Intent::Restart) {
            self.restart();
            return None;
        }
        if input.is_pressed(Intent::Pause) {
            self.toggle_pause();
        }
        if !self.state.is_playing() {
            return None;
        }
        self.elapsed += elapsed;
        let dt = elapsed.as_secs_f32();

        let soft_drop = input.is_held(Intent::SoftDrop);
        if soft_drop && !self.soft_drop_held {
            self.board.begin_soft_drop();
        } else if !soft_drop && self.soft_drop_held {
            self.board.end_soft_drop();
        }
        self.soft_drop_held = soft_drop;

        if let Some(outcome) = self.board.tick_gravity(dt, soft_drop) {
            if let Some(event) = self.after_lock(outcome) {
                return Some(event);
            }
        }
        if input.is_pressed(Intent::HardDrop) {
            let outcome = self.board.hard_drop();
            if let Some(event) = self.after_lock(outcome) {
                return Some(event);
            }
        }

        if let Some(dx) = self.auto_shift.update(dt, input) {
            self.board.try_move(dx, 0);
        }
        if input.is_pressed(Intent::RotateCw) {
            self.board.try_rotate(true);
        }
        if input.is_pressed(Intent::RotateCcw) {
            self.board.try_rotate(false);
        }
        if input.is_pressed(Intent::Hold) {
            // A second hold on the same piece does nothing
            match self.board.try_hold() {
                Ok(()) | Err(HoldUsedError) => {}
            }
        }
        None
    }

    fn after_lock(&mut self, outcome: LockOutcome) -> Option<SessionEvent> {
        if outcome.is_overflow() {
            return Some(self.fail(FailureReason::Overflow));
        }
        let objective = &self.objective;
        let settlement = self.board.settle(|grid| objective.evaluate(grid));
        self.report = settlement.report;
        match settlement.report.verdict {
            Verdict::Complete => Some(self.win()),
            Verdict::Failed => Some(self.fail(FailureReason::RequiredCellBlocked)),
            Verdict::InProgress | Verdict::OverBudget => None,
        }
    }

    fn win(&mut self) -> SessionEvent {
        self.state = SessionState::Won;
        self.objective.record_completion(self.elapsed);
        SessionEvent::LevelCompleted {
            level: self.objective.current_level(),
            tutorial: self.objective.is_tutorial(),
            elapsed: self.elapsed,
        }
    }

    fn fail(&mut self, reason: FailureReason) -> SessionEvent {
        self.state = SessionState::Lost(reason);
        SessionEvent::LevelFailed {
            level: self.objective.current_level(),
            tutorial: self.objective.is_tutorial(),
            reason,
        }
    }

    /// Everything a front end needs to draw the current frame.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let board = &self.board;
        let piece = board.piece();
        let progress = board.progress();
        Snapshot {
            title: self.objective.title().to_owned(),
            tip: self.objective.tip().map(str::to_owned),
            label: self
                .objective
                .catalog()
                .label(self.objective.current_level())
                .unwrap_or_default(),
            level: self.objective.current_level(),
            tutorial: self.objective.is_tutorial(),
            state: self.state,
            grid: board.grid().clone(),
            active: piece.cells().to_vec(),
            active_kind: piece.kind(),
            ghost: board.ghost().cells().to_vec(),
            upcoming: board.upcoming().to_vec(),
            held: board.held(),
            hold_used: board.is_hold_used(),
            report: self.report,
            cleared_lines: progress.cleared_lines(),
            ceiling_row: progress.ceiling_row(),
            fall_speed: progress.fall_speed(),
            lines_until_ceiling_step: board.lines_until_ceiling_step(),
            elapsed: self.elapsed,
        }
    }
}

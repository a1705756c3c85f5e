use architris_engine::{InputFrame, Intent};
use serde::{Deserialize, Serialize};

/// Scripted player input, replayed one frame per tick.
///
/// ```json
/// [
///   { "ticks": 3, "pressed": ["move_left"] },
///   { "ticks": 1, "pressed": ["hard_drop"] },
///   { "ticks": 30, "held": ["soft_drop"] }
/// ]
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputScript {
    pub steps: Vec<ScriptStep>,
}

/// A run of identical ticks.
///
/// Intents in `pressed` go down on the first tick and stay down for the rest of the
/// step, so a one-tick step is a tap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptStep {
    #[serde(default = "default_ticks")]
    pub ticks: u32,
    #[serde(default)]
    pub pressed: Vec<Intent>,
    #[serde(default)]
    pub held: Vec<Intent>,
}

fn default_ticks() -> u32 {
    1
}

impl InputScript {
    pub fn frames(&self) -> impl Iterator<Item = InputFrame> + '_ {
        self.steps.iter().flat_map(ScriptStep::frames)
    }

    pub fn total_ticks(&self) -> u64 {
        self.steps.iter().map(|step| u64::from(step.ticks)).sum()
    }
}

impl ScriptStep {
    pub fn frames(&self) -> impl Iterator<Item = InputFrame> + '_ {
        let first = InputFrame::new(&self.pressed, &self.held);
        let rest = self
            .pressed
            .iter()
            .chain(&self.held)
            .fold(InputFrame::IDLE, |frame, &intent| frame.hold_down(intent));
        (0..self.ticks).map(move |tick| if tick == 0 { first } else { rest })
    }
}

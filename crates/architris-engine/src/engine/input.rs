use serde::{Deserialize, Serialize};

/// Seconds a sideways key must be held before it starts repeating.
pub const AUTO_SHIFT_DELAY: f32 = 0.5;
/// Seconds between repeated sideways moves.
pub const AUTO_SHIFT_RATE: f32 = 0.05;

/// A player action, independent of any key binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    MoveLeft,
    MoveRight,
    RotateCw,
    RotateCcw,
    SoftDrop,
    HardDrop,
    Hold,
    Restart,
    Pause,
}

impl Intent {
    const fn bit(self) -> u16 {
        1 << self as u16
    }
}

/// Input state for one tick.
///
/// `pressed` holds the intents that went down this tick, `held` the ones that are
/// down. A pressed intent also counts as held.
///
/// # Example
///
/// ```
/// use architris_engine::{InputFrame, Intent};
///
/// let frame = InputFrame::IDLE
///     .press(Intent::RotateCw)
///     .hold_down(Intent::SoftDrop);
/// assert!(frame.is_pressed(Intent::RotateCw));
/// assert!(frame.is_held(Intent::RotateCw));
/// assert!(!frame.is_pressed(Intent::SoftDrop));
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InputFrame {
    pressed: u16,
    held: u16,
}

impl InputFrame {
    pub const IDLE: Self = Self {
        pressed: 0,
        held: 0,
    };

    #[must_use]
    pub fn new(pressed: &[Intent], held: &[Intent]) -> Self {
        let frame = pressed.iter().fold(Self::IDLE, |frame, &i| frame.press(i));
        held.iter().fold(frame, |frame, &i| frame.hold_down(i))
    }

    #[must_use]
    pub const fn press(self, intent: Intent) -> Self {
        Self {
            pressed: self.pressed | intent.bit(),
            ..self
        }
    }

    #[must_use]
    pub const fn hold_down(self, intent: Intent) -> Self {
        Self {
            held: self.held | intent.bit(),
            ..self
        }
    }

    #[must_use]
    pub const fn is_pressed(self, intent: Intent) -> bool {
        self.pressed & intent.bit() != 0
    }

    #[must_use]
    pub const fn is_held(self, intent: Intent) -> bool {
        (self.pressed | self.held) & intent.bit() != 0
    }
}

/// Delayed auto-shift for sideways movement.
///
/// Left wins when both directions are down.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct AutoShift {
    timer: f32,
}

impl AutoShift {
    /// Column step to take this tick, if any.
    pub fn update(&mut self, dt: f32, input: InputFrame) -> Option<i8> {
        let (intent, dx) = if input.is_held(Intent::MoveLeft) {
            (Intent::MoveLeft, -1)
        } else if input.is_held(Intent::MoveRight) {
            (Intent::MoveRight, 1)
        } else {
            return None;
        };
        if input.is_pressed(intent) {
            self.timer = AUTO_SHIFT_DELAY;
            return Some(dx);
        }
        self.timer -= dt;
        if self.timer > 0.0 {
            return None;
        }
        self.timer = AUTO_SHIFT_RATE;
        Some(dx)
    }

    pub fn reset(&mut self) {
        self.timer = 0.0;
    }
}

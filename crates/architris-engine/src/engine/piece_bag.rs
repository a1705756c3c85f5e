use std::{fmt, num::ParseIntError, str::FromStr};

use arrayvec::ArrayVec;
use rand::{
    Rng, SeedableRng as _,
    distr::{Distribution, StandardUniform},
};
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::PieceKind;

/// Number of upcoming pieces kept in the preview queue.
pub const QUEUE_LEN: usize = 3;

/// Seed for deterministic piece generation.
///
/// A 128-bit seed for the bag's random number generator. The same seed produces the
/// same piece sequence, which makes recorded runs replayable.
///
/// Parsed from and printed as a 32-character hex string.
///
/// # Example
///
/// ```
/// use architris_engine::{BagSeed, PieceQueue};
///
/// let seed: BagSeed = "000102030405060708090a0b0c0d0e0f".parse().unwrap();
/// let a = PieceQueue::with_seed(seed);
/// let b = PieceQueue::with_seed(seed);
/// assert_eq!(a.upcoming(), b.upcoming());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BagSeed([u8; 16]);

impl BagSeed {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ParseSeedError {
    #[display("invalid hex: expected 32 characters, got {_0}")]
    Length(#[error(not(source))] usize),
    #[display("invalid hex: {_0}")]
    Digits(ParseIntError),
}

impl FromStr for BagSeed {
    type Err = ParseSeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 32 {
            return Err(ParseSeedError::Length(s.len()));
        }
        let num = u128::from_str_radix(s, 16).map_err(ParseSeedError::Digits)?;
        Ok(Self(num.to_be_bytes()))
    }
}

impl fmt::Display for BagSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", u128::from_be_bytes(self.0))
    }
}

impl Serialize for BagSeed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BagSeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        hex_str.parse().map_err(serde::de::Error::custom)
    }
}

/// Allows generating random `BagSeed` values with `rng.random()`.
impl Distribution<BagSeed> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> BagSeed {
        let mut seed = [0; 16];
        rng.fill(&mut seed);
        BagSeed(seed)
    }
}

/// A 7-bag over the tetromino kinds.
///
/// Every kind is handed out exactly once before the bag refills, so any seven
/// consecutive draws starting at a bag boundary are a permutation of
/// [`PieceKind::BAG`]. Draws pick a random slot and retry while it is used.
#[derive(Debug, Clone)]
pub struct PieceBag {
    rng: Pcg32,
    used: [bool; PieceKind::LEN],
}

impl Default for PieceBag {
    fn default() -> Self {
        Self::new()
    }
}

impl PieceBag {
    /// Creates a full bag with a random seed.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(rand::rng().random())
    }

    #[must_use]
    pub fn with_seed(seed: BagSeed) -> Self {
        Self {
            rng: Pcg32::from_seed(seed.0),
            used: [false; PieceKind::LEN],
        }
    }

    /// Draws one kind. The bag refills right after its last kind is drawn.
    pub fn draw(&mut self) -> PieceKind {
        let slot = loop {
            let slot = self.rng.random_range(0..PieceKind::LEN);
            if !self.used[slot] {
                break slot;
            }
        };
        self.used[slot] = true;
        if self.used.iter().all(|&used| used) {
            self.reset();
        }
        PieceKind::BAG[slot]
    }

    /// Makes every kind available again.
    pub fn reset(&mut self) {
        self.used = [false; PieceKind::LEN];
    }

    /// Kinds not yet drawn from the current bag.
    pub fn available(&self) -> impl Iterator<Item = PieceKind> + '_ {
        PieceKind::BAG
            .into_iter()
            .zip(self.used)
            .filter(|(_, used)| !used)
            .map(|(kind, _)| kind)
    }
}

/// The upcoming-piece preview, fed by a [`PieceBag`].
#[derive(Debug, Clone)]
pub struct PieceQueue {
    bag: PieceBag,
    upcoming: ArrayVec<PieceKind, QUEUE_LEN>,
}

impl Default for PieceQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl PieceQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(rand::rng().random())
    }

    #[must_use]
    pub fn with_seed(seed: BagSeed) -> Self {
        let mut this = Self {
            bag: PieceBag::with_seed(seed),
            upcoming: ArrayVec::new(),
        };
        this.refill();
        this
    }

    /// Starts a fresh bag and redraws every preview slot.
    pub fn refill(&mut self) {
        self.bag.reset();
        self.upcoming.clear();
        while !self.upcoming.is_full() {
            self.upcoming.push(self.bag.draw());
        }
    }

    /// Pops the front of the queue and appends a new draw at the back.
    pub fn take_next(&mut self) -> PieceKind {
        let next = self.upcoming.remove(0);
        self.upcoming.push(self.bag.draw());
        next
    }

    #[must_use]
    pub fn upcoming(&self) -> &[PieceKind] {
        &self.upcoming
    }

    /// Overwrites the first slots of the preview, front to back.
    ///
    /// Extra kinds beyond [`QUEUE_LEN`] are ignored.
    pub(crate) fn override_upcoming(&mut self, kinds: &[PieceKind]) {
        for (slot, &kind) in self.upcoming.iter_mut().zip(kinds) {
            *slot = kind;
        }
    }
}

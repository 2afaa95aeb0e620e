//! Casino game execution module.
//!
//! This module contains the resolution logic for every game played
//! against the shared balance:
//! - Crash
//! - Roulette
//! - Blackjack
//! - Slots
//! - Dice

pub mod blackjack;
pub mod crash;
pub mod dice;
pub mod roulette;
pub mod slots;

use crate::ledger::Ledger;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use thiserror::Error;
use wager_types::casino::{
    GameId, Multiplier, Outcome, ParseError, Symbol, CRASH_POINT_MIN, CRASH_POINT_SPAN,
    ROULETTE_SLOTS,
};

/// Source of uniform randomness injected into every game.
///
/// Only [RandomSource::next_bounded] is required; every game-level draw is
/// expressed in terms of it so a scripted source can pin exact outcomes.
pub trait RandomSource {
    /// Get a uniform value in range [0, max). Returns 0 when `max` is 0.
    fn next_bounded(&mut self, max: u32) -> u32;

    /// Shuffle a slice in place using Fisher-Yates.
    fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = self.next_bounded((i + 1) as u32) as usize;
            slice.swap(i, j);
        }
    }

    /// Roll a single die (1-6).
    fn roll_die(&mut self) -> u8 {
        self.next_bounded(6) as u8 + 1
    }

    /// Spin roulette wheel (0-36).
    fn spin_roulette(&mut self) -> u8 {
        self.next_bounded(ROULETTE_SLOTS as u32) as u8
    }

    /// Draw a crash point in [1.00x, 11.00x).
    fn draw_crash_point(&mut self) -> Multiplier {
        Multiplier::from_hundredths(CRASH_POINT_MIN + self.next_bounded(CRASH_POINT_SPAN))
    }

    /// Draw one slot reel symbol.
    fn draw_symbol(&mut self) -> Symbol {
        Symbol::ALL[self.next_bounded(Symbol::ALL.len() as u32) as usize]
    }
}

/// Default randomness source backed by ChaCha20.
#[derive(Clone, Debug)]
pub struct GameRng {
    inner: ChaCha20Rng,
}

impl GameRng {
    /// Create a reproducible RNG from a seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            inner: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// Create an RNG seeded from the thread-local generator.
    pub fn from_entropy() -> Self {
        Self::seeded(rand::random())
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl RandomSource for GameRng {
    fn next_bounded(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        self.inner.gen_range(0..max)
    }
}

/// Error during game execution.
///
/// Every variant is recoverable; the display text is the notification shown
/// to the player.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Stake below the minimum bet.
    #[error("Minimum bet is $10")]
    InvalidBet,
    /// Stake (or double-down stake) exceeds the balance.
    #[error("Insufficient balance")]
    InsufficientFunds,
    /// Roulette spin without any bet target.
    #[error("Please select at least one bet")]
    NoSelection,
    /// Action not legal in the current stage of the round.
    #[error("That action is not available right now")]
    InvalidAction,
    /// Action requires a round that is not running.
    #[error("No round in progress")]
    NotActive,
    /// Another game still has a round in flight.
    #[error("Finish the current {active} round first")]
    RoundInProgress { active: GameId },
    /// No engine is registered under this name.
    #[error("Unknown game: {0}")]
    UnknownGame(String),
    /// Deck is exhausted (no more cards to draw).
    #[error("The deck is exhausted")]
    DeckExhausted,
}

impl From<ParseError> for GameError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::UnknownGame(name) => GameError::UnknownGame(name),
            ParseError::InvalidSelection(_) => GameError::NoSelection,
            ParseError::InvalidMultiplier(_) | ParseError::InvalidCall(_) => GameError::InvalidBet,
        }
    }
}

/// Result of driving a round forward.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Progress {
    /// Round is still open, waiting for a tick or a player action.
    Continue,
    /// Round reached a terminal state; the outcome must be applied to the ledger.
    Settled(Outcome),
}

impl Progress {
    pub fn outcome(self) -> Option<Outcome> {
        match self {
            Progress::Continue => None,
            Progress::Settled(outcome) => Some(outcome),
        }
    }
}

/// Shared contract of every game engine.
///
/// `start` validates the stake against the ledger, debits it and either
/// resolves the round outright or leaves it open. Engines never credit the
/// ledger themselves: a settled [Outcome] is handed back to the caller.
pub trait CasinoGame {
    type Options;

    const GAME: GameId;

    fn start<R: RandomSource>(
        &mut self,
        ledger: &mut Ledger,
        bet: u64,
        options: Self::Options,
        rng: &mut R,
    ) -> Result<Progress, GameError>;

    /// Whether a round is mid-flight.
    fn is_active(&self) -> bool {
        false
    }

    /// Run one scheduled step of an open round.
    fn advance<R: RandomSource>(
        &mut self,
        _ledger: &mut Ledger,
        _rng: &mut R,
    ) -> Result<Progress, GameError> {
        Err(GameError::NotActive)
    }
}

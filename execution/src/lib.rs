//! Game resolution for the wager simulator: engines, ledger and the session
//! coordinator that ties them to one balance.

pub mod casino;
pub mod ledger;
pub mod session;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

mod state;

pub use casino::{GameError, GameRng, RandomSource};
pub use ledger::Ledger;
pub use session::{Action, Bet, BetOptions, Session};
pub use state::{MemoryStore, Store, StoreError};

//! Crash game implementation.
//!
//! A round starts at 1.00x and climbs one hundredth per tick until it reaches
//! a crash point drawn (and hidden) at round start. The player may cash out at
//! any time while the round runs, or register an auto-cashout threshold that
//! is checked before the crash on every tick.

use super::{CasinoGame, GameError, Progress, RandomSource};
use crate::ledger::Ledger;
use std::collections::VecDeque;
use tracing::debug;
use wager_types::casino::{
    GameId, Multiplier, Outcome, OutcomeDetail, CRASH_HISTORY_LIMIT, CRASH_TICK_STEP,
};

/// State of a running round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CrashRound {
    bet: u64,
    multiplier: Multiplier,
    crash_point: Multiplier,
    auto_cashout: Option<Multiplier>,
    ticks: u32,
}

impl CrashRound {
    pub fn bet(&self) -> u64 {
        self.bet
    }

    pub fn multiplier(&self) -> Multiplier {
        self.multiplier
    }

    pub fn auto_cashout(&self) -> Option<Multiplier> {
        self.auto_cashout
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// What cashing out right now would return.
    pub fn potential_win(&self) -> u64 {
        self.multiplier.payout(self.bet)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Crash {
    round: Option<CrashRound>,
    history: VecDeque<Multiplier>,
}

impl Crash {
    pub fn round(&self) -> Option<&CrashRound> {
        self.round.as_ref()
    }

    /// Final multipliers of recent rounds, newest first.
    pub fn history(&self) -> impl ExactSizeIterator<Item = &Multiplier> {
        self.history.iter()
    }

    pub fn start_round<R: RandomSource>(
        &mut self,
        ledger: &mut Ledger,
        bet: u64,
        auto_cashout: Option<Multiplier>,
        rng: &mut R,
    ) -> Result<Progress, GameError> {
        if self.round.is_some() {
            return Err(GameError::RoundInProgress {
                active: GameId::Crash,
            });
        }
        ledger.check_bet(bet)?;
        let crash_point = rng.draw_crash_point();
        ledger.open_round(bet)?;
        debug!(bet, ?auto_cashout, "crash round started");
        self.round = Some(CrashRound {
            bet,
            multiplier: Multiplier::ONE,
            crash_point,
            auto_cashout,
            ticks: 0,
        });
        Ok(Progress::Continue)
    }

    /// Advance the multiplier by one step.
    ///
    /// The auto-cashout threshold is checked before the crash point, so a
    /// threshold equal to the crash point still pays.
    pub fn tick(&mut self) -> Result<Progress, GameError> {
        let round = self.round.as_mut().ok_or(GameError::NotActive)?;
        round.multiplier = round.multiplier.step(CRASH_TICK_STEP);
        round.ticks += 1;

        let cashed_out = round
            .auto_cashout
            .is_some_and(|target| round.multiplier >= target);
        let crashed = round.multiplier >= round.crash_point;

        if cashed_out || crashed {
            return self.settle(cashed_out).map(Progress::Settled);
        }
        Ok(Progress::Continue)
    }

    pub fn cash_out(&mut self) -> Result<Outcome, GameError> {
        self.settle(true)
    }

    fn settle(&mut self, cashed_out: bool) -> Result<Outcome, GameError> {
        let round = self.round.take().ok_or(GameError::NotActive)?;
        self.history.push_front(round.multiplier);
        self.history.truncate(CRASH_HISTORY_LIMIT);

        let multiplier = if cashed_out {
            round.multiplier
        } else {
            Multiplier::ZERO
        };
        debug!(
            reached = %round.multiplier,
            crash_point = %round.crash_point,
            cashed_out,
            "crash round over"
        );
        Ok(Outcome::at_multiplier(
            round.bet,
            multiplier,
            OutcomeDetail::Crash {
                reached: round.multiplier,
                crash_point: round.crash_point,
                cashed_out,
                ticks: round.ticks,
            },
        ))
    }
}

impl CasinoGame for Crash {
    type Options = Option<Multiplier>;

    const GAME: GameId = GameId::Crash;

    fn start<R: RandomSource>(
        &mut self,
        ledger: &mut Ledger,
        bet: u64,
        options: Self::Options,
        rng: &mut R,
    ) -> Result<Progress, GameError> {
        self.start_round(ledger, bet, options, rng)
    }

    fn is_active(&self) -> bool {
        self.round.is_some()
    }

    fn advance<R: RandomSource>(
        &mut self,
        _ledger: &mut Ledger,
        _rng: &mut R,
    ) -> Result<Progress, GameError> {
        self.tick()
    }
}

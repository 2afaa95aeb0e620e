//! Two-dice game: call over, under or exactly seven.

use super::{CasinoGame, GameError, Progress, RandomSource};
use crate::ledger::Ledger;
use tracing::debug;
use wager_types::casino::{DiceCall, GameId, Multiplier, Outcome, OutcomeDetail};

#[derive(Clone, Copy, Debug, Default)]
pub struct Dice;

impl Dice {
    pub fn roll<R: RandomSource>(
        &mut self,
        ledger: &mut Ledger,
        bet: u64,
        call: DiceCall,
        rng: &mut R,
    ) -> Result<Outcome, GameError> {
        ledger.check_bet(bet)?;
        let dice = [rng.roll_die(), rng.roll_die()];
        ledger.open_round(bet)?;

        let total = dice[0] + dice[1];
        let multiplier = if call.wins(total) {
            call.multiplier()
        } else {
            Multiplier::ZERO
        };
        debug!(bet, ?dice, ?call, "dice roll");
        Ok(Outcome::at_multiplier(
            bet,
            multiplier,
            OutcomeDetail::Dice { dice, total, call },
        ))
    }
}

impl CasinoGame for Dice {
    type Options = DiceCall;

    const GAME: GameId = GameId::Dice;

    fn start<R: RandomSource>(
        &mut self,
        ledger: &mut Ledger,
        bet: u64,
        options: DiceCall,
        rng: &mut R,
    ) -> Result<Progress, GameError> {
        self.roll(ledger, bet, options, rng).map(Progress::Settled)
    }
}

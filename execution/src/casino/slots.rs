//! Three-reel slots.
//!
//! Three of a kind pays the symbol's multiplier; any pair pays a flat 2x
//! regardless of which symbol matched.

use super::{CasinoGame, GameError, Progress, RandomSource};
use crate::ledger::Ledger;
use tracing::debug;
use wager_types::casino::{GameId, Multiplier, Outcome, OutcomeDetail, Symbol};

const PAIR_MULTIPLIER: Multiplier = Multiplier::whole(2);

/// Multiplier for a set of reels.
pub fn evaluate(reels: [Symbol; 3]) -> Multiplier {
    let [a, b, c] = reels;
    if a == b && b == c {
        a.triple_multiplier()
    } else if a == b || b == c || a == c {
        PAIR_MULTIPLIER
    } else {
        Multiplier::ZERO
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Slots;

impl Slots {
    pub fn spin<R: RandomSource>(
        &mut self,
        ledger: &mut Ledger,
        bet: u64,
        rng: &mut R,
    ) -> Result<Outcome, GameError> {
        ledger.check_bet(bet)?;
        let reels = [rng.draw_symbol(), rng.draw_symbol(), rng.draw_symbol()];
        ledger.open_round(bet)?;

        let multiplier = evaluate(reels);
        debug!(bet, ?reels, %multiplier, "slots spin");
        Ok(Outcome::at_multiplier(
            bet,
            multiplier,
            OutcomeDetail::Slots { reels },
        ))
    }
}

impl CasinoGame for Slots {
    type Options = ();

    const GAME: GameId = GameId::Slots;

    fn start<R: RandomSource>(
        &mut self,
        ledger: &mut Ledger,
        bet: u64,
        _options: (),
        rng: &mut R,
    ) -> Result<Progress, GameError> {
        self.spin(ledger, bet, rng).map(Progress::Settled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::ScriptedRng;
    use wager_types::casino::Symbol::*;

    #[test]
    fn test_evaluate() {
        assert_eq!(evaluate([Seven, Seven, Seven]), Multiplier::whole(100));
        assert_eq!(evaluate([Cherry, Cherry, Cherry]), Multiplier::whole(5));
        assert_eq!(evaluate([Seven, Seven, Cherry]), Multiplier::whole(2));
        assert_eq!(evaluate([Bell, Lemon, Bell]), Multiplier::whole(2));
        assert_eq!(evaluate([Lemon, Star, Star]), Multiplier::whole(2));
        assert_eq!(evaluate([Cherry, Lemon, Orange]), Multiplier::ZERO);
    }

    #[test]
    fn test_spin_jackpot() {
        let mut ledger = Ledger::new(1_000);
        let outcome = Slots
            .spin(&mut ledger, 10, &mut ScriptedRng::new([6, 6, 6]))
            .expect("spin accepted");
        assert_eq!(outcome.detail, OutcomeDetail::Slots { reels: [Seven; 3] });
        assert_eq!(outcome.payout, 1_000);
        assert_eq!(outcome.profit(), 990);
        assert_eq!(ledger.balance(), 990);
    }

    #[test]
    fn test_spin_loss() {
        let mut ledger = Ledger::new(1_000);
        let outcome = Slots
            .spin(&mut ledger, 25, &mut ScriptedRng::new([0, 1, 2]))
            .expect("spin accepted");
        assert_eq!(outcome.payout, 0);
        assert_eq!(outcome.profit(), -25);
    }

    #[test]
    fn test_spin_rejected() {
        let mut ledger = Ledger::new(20);
        let mut rng = ScriptedRng::default();
        assert_eq!(
            Slots.spin(&mut ledger, 30, &mut rng),
            Err(GameError::InsufficientFunds)
        );
        assert_eq!(ledger.balance(), 20);
    }
}

//! Roulette game implementation.
//!
//! Single-zero wheel. A spin takes one stake that is split evenly across
//! every selection; each selection is then resolved against the same number.
//!
//! Payouts (total return per unit staked):
//! - Red / Black: 2x
//! - Green (zero): 14x
//! - Straight number: 36x

use super::{CasinoGame, GameError, Progress, RandomSource};
use crate::ledger::Ledger;
use tracing::debug;
use wager_types::casino::{Color, GameId, Outcome, OutcomeDetail, Selection, ROULETTE_SLOTS};

/// Pockets in wheel order, as (number, color).
pub const WHEEL: [(u8, Color); ROULETTE_SLOTS as usize] = [
    (0, Color::Green),
    (32, Color::Red),
    (15, Color::Black),
    (19, Color::Red),
    (4, Color::Black),
    (21, Color::Red),
    (2, Color::Black),
    (25, Color::Red),
    (17, Color::Black),
    (34, Color::Red),
    (6, Color::Black),
    (27, Color::Red),
    (13, Color::Black),
    (36, Color::Red),
    (11, Color::Black),
    (30, Color::Red),
    (8, Color::Black),
    (23, Color::Red),
    (10, Color::Black),
    (5, Color::Red),
    (24, Color::Black),
    (16, Color::Red),
    (33, Color::Black),
    (1, Color::Red),
    (20, Color::Black),
    (14, Color::Red),
    (31, Color::Black),
    (9, Color::Red),
    (22, Color::Black),
    (18, Color::Red),
    (29, Color::Black),
    (7, Color::Red),
    (28, Color::Black),
    (12, Color::Red),
    (35, Color::Black),
    (3, Color::Red),
    (26, Color::Black),
];

/// Pocket color of a number; `None` if the number is not on the wheel.
pub fn color_of(number: u8) -> Option<Color> {
    WHEEL
        .iter()
        .find(|(n, _)| *n == number)
        .map(|(_, color)| *color)
}

fn selection_wins(selection: Selection, number: u8, color: Color) -> bool {
    match selection {
        Selection::Color(c) => c == color,
        Selection::Number(n) => n == number,
    }
}

/// Total return of a spin: Σ floor(bet × payout / |selections|) over hits.
pub fn win_amount(bet: u64, selections: &[Selection], number: u8) -> u64 {
    let Some(color) = color_of(number) else {
        return 0;
    };
    let count = selections.len() as u64;
    if count == 0 {
        return 0;
    }
    selections
        .iter()
        .filter(|s| selection_wins(**s, number, color))
        .map(|s| bet.saturating_mul(s.payout()) / count)
        .sum()
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Roulette;

impl Roulette {
    pub fn spin<R: RandomSource>(
        &mut self,
        ledger: &mut Ledger,
        bet: u64,
        selections: &[Selection],
        rng: &mut R,
    ) -> Result<Outcome, GameError> {
        ledger.check_bet(bet)?;
        if selections.is_empty() {
            return Err(GameError::NoSelection);
        }
        if selections
            .iter()
            .any(|s| matches!(s, Selection::Number(n) if *n > 36))
        {
            return Err(GameError::InvalidBet);
        }

        // A repeated selection counts once
        let mut unique: Vec<Selection> = Vec::with_capacity(selections.len());
        for selection in selections {
            if !unique.contains(selection) {
                unique.push(*selection);
            }
        }

        let number = rng.spin_roulette();
        let color = color_of(number).unwrap_or(Color::Green);
        ledger.open_round(bet)?;

        let win = win_amount(bet, &unique, number);
        let winning = unique
            .iter()
            .copied()
            .filter(|s| selection_wins(*s, number, color))
            .collect();
        debug!(bet, number, %color, win, "roulette spin");
        Ok(Outcome::with_payout(
            bet,
            win,
            OutcomeDetail::Roulette {
                number,
                color,
                selections: unique,
                winning,
            },
        ))
    }
}

impl CasinoGame for Roulette {
    type Options = Vec<Selection>;

    const GAME: GameId = GameId::Roulette;

    fn start<R: RandomSource>(
        &mut self,
        ledger: &mut Ledger,
        bet: u64,
        options: Self::Options,
        rng: &mut R,
    ) -> Result<Progress, GameError> {
        self.spin(ledger, bet, &options, rng)
            .map(Progress::Settled)
    }
}

use super::{GameId, Outcome, OutcomeDetail, Verdict};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a notification should be presented
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
    Info,
}

/// Notification-worthy events produced while playing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    RoundSettled(Outcome),
    Rejected {
        game: Option<GameId>,
        message: String,
    },
}

impl Event {
    pub fn severity(&self) -> Severity {
        match self {
            Event::Rejected { .. } => Severity::Error,
            Event::RoundSettled(outcome) => match outcome.detail {
                OutcomeDetail::Blackjack {
                    verdict: Verdict::Push,
                    ..
                } => Severity::Info,
                _ if outcome.payout > 0 => Severity::Success,
                _ => Severity::Error,
            },
        }
    }

    pub fn message(&self) -> String {
        match self {
            Event::Rejected { message, .. } => message.clone(),
            Event::RoundSettled(outcome) => settled_message(outcome),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

fn settled_message(outcome: &Outcome) -> String {
    let won = dollars(outcome.payout);
    let lost = dollars(outcome.bet);
    match &outcome.detail {
        OutcomeDetail::Crash {
            reached,
            cashed_out: true,
            ..
        } => format!("Cashed out at {reached}! Won ${won}"),
        OutcomeDetail::Crash { reached, .. } => format!("Crashed at {reached}! Lost ${lost}"),
        OutcomeDetail::Roulette { number, color, .. } => {
            if outcome.payout > 0 {
                format!("Number {number} {color}! Won ${won}")
            } else {
                format!("Number {number} {color}! Lost ${lost}")
            }
        }
        OutcomeDetail::Blackjack { verdict, .. } => match verdict {
            Verdict::Blackjack => format!("Blackjack! Won ${won}"),
            Verdict::Win => format!("You won! Won ${won}"),
            Verdict::Push => "Push! Bet returned".to_string(),
            Verdict::Lose | Verdict::Bust => format!("You lost! Lost ${lost}"),
        },
        OutcomeDetail::Slots { reels } => {
            let [a, b, c] = reels;
            if a == b && b == c {
                format!("Three {a}! Won ${won} ({})", outcome.multiplier)
            } else if a == b || a == c {
                format!("Two {a}! Won ${won} ({})", outcome.multiplier)
            } else if b == c {
                format!("Two {b}! Won ${won} ({})", outcome.multiplier)
            } else {
                format!("No win. Lost ${lost}")
            }
        }
        OutcomeDetail::Dice { total, .. } => {
            if outcome.payout > 0 {
                format!("Rolled {total}! You won ${won} ({})", outcome.multiplier)
            } else {
                format!("Rolled {total}! You lost ${lost}")
            }
        }
    }
}

/// Formats an amount with thousands separators ("12,500").
pub fn dollars(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}


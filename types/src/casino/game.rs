use super::{Card, ROULETTE_COLOR_PAYOUT, ROULETTE_GREEN_PAYOUT, ROULETTE_NUMBER_PAYOUT};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Games offered against the shared balance
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameId {
    Crash,
    Roulette,
    Blackjack,
    Slots,
    Dice,
}

impl GameId {
    pub const ALL: [GameId; 5] = [
        GameId::Crash,
        GameId::Roulette,
        GameId::Blackjack,
        GameId::Slots,
        GameId::Dice,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GameId::Crash => "Crash",
            GameId::Roulette => "Roulette",
            GameId::Blackjack => "Blackjack",
            GameId::Slots => "Slots",
            GameId::Dice => "Dice",
        }
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown game: {0}")]
    UnknownGame(String),
    #[error("invalid multiplier: {0}")]
    InvalidMultiplier(String),
    #[error("invalid roulette selection: {0}")]
    InvalidSelection(String),
    #[error("invalid dice call: {0}")]
    InvalidCall(String),
}

impl FromStr for GameId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GameId::ALL
            .into_iter()
            .find(|game| game.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseError::UnknownGame(s.to_string()))
    }
}

/// Fixed-point multiplier in hundredths (150 = 1.50x).
///
/// Serialized as a decimal number (`1.5`) so stored history stays readable
/// by anything that treats the multiplier as a float.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Multiplier(u32);

impl Multiplier {
    pub const ZERO: Multiplier = Multiplier(0);
    pub const ONE: Multiplier = Multiplier(100);

    pub const fn from_hundredths(hundredths: u32) -> Self {
        Self(hundredths)
    }

    pub const fn whole(times: u32) -> Self {
        Self(times * 100)
    }

    pub const fn hundredths(self) -> u32 {
        self.0
    }

    /// Total return for a stake: floor(bet × multiplier).
    pub fn payout(self, bet: u64) -> u64 {
        bet.saturating_mul(self.0 as u64) / 100
    }

    /// Effective multiplier of a payout, truncated to hundredths.
    pub fn of_payout(payout: u64, bet: u64) -> Self {
        if bet == 0 {
            return Self::ZERO;
        }
        let hundredths = payout.saturating_mul(100) / bet;
        Self(u32::try_from(hundredths).unwrap_or(u32::MAX))
    }

    pub fn step(self, hundredths: u32) -> Self {
        Self(self.0.saturating_add(hundredths))
    }
}

impl Serialize for Multiplier {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(self.0 as f64 / 100.0)
    }
}

impl<'de> Deserialize<'de> for Multiplier {
    /// Accepts any non-negative number, rounded to the nearest hundredth.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        let hundredths = (value * 100.0).round();
        if !hundredths.is_finite() || hundredths < 0.0 || hundredths > u32::MAX as f64 {
            return Err(de::Error::custom(format!("invalid multiplier: {value}")));
        }
        Ok(Self(hundredths as u32))
    }
}

impl fmt::Display for Multiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}x", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Multiplier {
    type Err = ParseError;

    /// Accepts "2", "2.5", "2.50" and an optional trailing "x".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidMultiplier(s.to_string());
        let trimmed = s.trim().trim_end_matches(['x', 'X']);
        let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
        if whole.is_empty() || fraction.len() > 2 {
            return Err(invalid());
        }
        if !whole.bytes().all(|b| b.is_ascii_digit())
            || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }
        let whole: u32 = whole.parse().map_err(|_| invalid())?;
        let cents: u32 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<u32>().map_err(|_| invalid())? * 10,
            _ => fraction.parse().map_err(|_| invalid())?,
        };
        whole
            .checked_mul(100)
            .and_then(|h| h.checked_add(cents))
            .map(Multiplier)
            .ok_or_else(invalid)
    }
}

/// Pocket colors on the roulette wheel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Black,
    Green,
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Color::Red => "red",
            Color::Black => "black",
            Color::Green => "green",
        })
    }
}

/// A roulette bet target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Selection {
    Color(Color),
    Number(u8),
}

impl Selection {
    /// Total return per unit staked when the selection hits.
    pub fn payout(self) -> u64 {
        match self {
            Selection::Color(Color::Green) => ROULETTE_GREEN_PAYOUT,
            Selection::Color(_) => ROULETTE_COLOR_PAYOUT,
            Selection::Number(_) => ROULETTE_NUMBER_PAYOUT,
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Color(color) => write!(f, "{color} ({}x)", self.payout()),
            Selection::Number(n) => write!(f, "Number {n} ({}x)", self.payout()),
        }
    }
}

impl FromStr for Selection {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "red" => Ok(Selection::Color(Color::Red)),
            "black" => Ok(Selection::Color(Color::Black)),
            "green" => Ok(Selection::Color(Color::Green)),
            other => other
                .parse::<u8>()
                .ok()
                .filter(|n| *n <= 36)
                .map(Selection::Number)
                .ok_or_else(|| ParseError::InvalidSelection(s.to_string())),
        }
    }
}

/// Slot reel symbols, cheapest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Symbol {
    Cherry,
    Lemon,
    Orange,
    Grape,
    Bell,
    Star,
    Seven,
}

impl Symbol {
    pub const ALL: [Symbol; 7] = [
        Symbol::Cherry,
        Symbol::Lemon,
        Symbol::Orange,
        Symbol::Grape,
        Symbol::Bell,
        Symbol::Star,
        Symbol::Seven,
    ];

    /// Multiplier paid for three of this symbol.
    pub fn triple_multiplier(self) -> Multiplier {
        Multiplier::whole(match self {
            Symbol::Cherry => 5,
            Symbol::Lemon => 10,
            Symbol::Orange => 15,
            Symbol::Grape => 20,
            Symbol::Bell => 25,
            Symbol::Star => 50,
            Symbol::Seven => 100,
        })
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Symbol::Cherry => "🍒",
            Symbol::Lemon => "🍋",
            Symbol::Orange => "🍊",
            Symbol::Grape => "🍇",
            Symbol::Bell => "🔔",
            Symbol::Star => "⭐",
            Symbol::Seven => "7️⃣",
        })
    }
}

/// Dice bet on the sum of two dice relative to seven
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiceCall {
    Over,
    Under,
    Seven,
}

impl DiceCall {
    pub fn wins(self, total: u8) -> bool {
        match self {
            DiceCall::Over => total > 7,
            DiceCall::Under => total < 7,
            DiceCall::Seven => total == 7,
        }
    }

    pub fn multiplier(self) -> Multiplier {
        match self {
            DiceCall::Over | DiceCall::Under => Multiplier::whole(2),
            DiceCall::Seven => Multiplier::whole(5),
        }
    }
}

impl FromStr for DiceCall {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "over" => Ok(DiceCall::Over),
            "under" => Ok(DiceCall::Under),
            "seven" | "7" => Ok(DiceCall::Seven),
            _ => Err(ParseError::InvalidCall(s.to_string())),
        }
    }
}

/// How a blackjack hand settled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Blackjack,
    Win,
    Push,
    Lose,
    Bust,
}

impl Verdict {
    pub fn multiplier(self) -> Multiplier {
        match self {
            Verdict::Blackjack => Multiplier::from_hundredths(250),
            Verdict::Win => Multiplier::whole(2),
            Verdict::Push => Multiplier::ONE,
            Verdict::Lose | Verdict::Bust => Multiplier::ZERO,
        }
    }
}

/// Game-specific payload of a settled round
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OutcomeDetail {
    Crash {
        /// Multiplier showing when the round ended
        reached: Multiplier,
        crash_point: Multiplier,
        cashed_out: bool,
        ticks: u32,
    },
    Roulette {
        number: u8,
        color: Color,
        selections: Vec<Selection>,
        winning: Vec<Selection>,
    },
    Blackjack {
        player: Vec<Card>,
        dealer: Vec<Card>,
        player_score: u8,
        dealer_score: u8,
        verdict: Verdict,
        doubled: bool,
    },
    Slots {
        reels: [Symbol; 3],
    },
    Dice {
        dice: [u8; 2],
        total: u8,
        call: DiceCall,
    },
}

impl OutcomeDetail {
    pub fn game(&self) -> GameId {
        match self {
            OutcomeDetail::Crash { .. } => GameId::Crash,
            OutcomeDetail::Roulette { .. } => GameId::Roulette,
            OutcomeDetail::Blackjack { .. } => GameId::Blackjack,
            OutcomeDetail::Slots { .. } => GameId::Slots,
            OutcomeDetail::Dice { .. } => GameId::Dice,
        }
    }
}

/// Resolved result of a round. `payout` is the total return (stake included).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub game: GameId,
    pub bet: u64,
    pub multiplier: Multiplier,
    pub payout: u64,
    pub detail: OutcomeDetail,
}

impl Outcome {
    /// Settle at a fixed multiplier: payout = floor(bet × multiplier).
    pub fn at_multiplier(bet: u64, multiplier: Multiplier, detail: OutcomeDetail) -> Self {
        Self {
            game: detail.game(),
            bet,
            multiplier,
            payout: multiplier.payout(bet),
            detail,
        }
    }

    /// Settle with an exact payout; the multiplier is derived for display.
    pub fn with_payout(bet: u64, payout: u64, detail: OutcomeDetail) -> Self {
        Self {
            game: detail.game(),
            bet,
            multiplier: Multiplier::of_payout(payout, bet),
            payout,
            detail,
        }
    }

    pub fn profit(&self) -> i64 {
        self.payout as i64 - self.bet as i64
    }

    /// Multiplier for the history table; a crashed round shows where it crashed.
    pub fn recorded_multiplier(&self) -> Multiplier {
        match self.detail {
            OutcomeDetail::Crash { reached, .. } => reached,
            _ => self.multiplier,
        }
    }
}

//! Balance, wager totals, round history and profit series.
//!
//! The ledger is the only owner of the balance. Engines debit stakes through
//! [Ledger::open_round] and [Ledger::add_stake]; the coordinator credits
//! payouts through [Ledger::settle]. Every mutation re-checks its inputs so a
//! misbehaving caller can never drive the balance below zero.

use crate::casino::GameError;
use crate::state::{Store, StoreError};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::VecDeque;
use tracing::debug;
use wager_types::casino::{
    HistoryEntry, Outcome, Totals, UserStats, BALANCE_KEY, HISTORY_KEY, HISTORY_LIMIT, MIN_BET,
    STARTING_BALANCE, STATS_KEY,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ledger {
    balance: u64,
    totals: Totals,
    history: VecDeque<HistoryEntry>,
    profit_series: Vec<i64>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(STARTING_BALANCE)
    }
}

impl Ledger {
    pub fn new(balance: u64) -> Self {
        Self {
            balance,
            totals: Totals::default(),
            history: VecDeque::with_capacity(HISTORY_LIMIT),
            profit_series: Vec::new(),
        }
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn totals(&self) -> Totals {
        self.totals
    }

    /// Resolved rounds, newest first.
    pub fn history(&self) -> impl ExactSizeIterator<Item = &HistoryEntry> {
        self.history.iter()
    }

    pub fn profit_series(&self) -> &[i64] {
        &self.profit_series
    }

    pub fn can_afford(&self, amount: u64) -> bool {
        self.check_bet(amount).is_ok()
    }

    /// Validate a stake without touching the balance.
    pub fn check_bet(&self, amount: u64) -> Result<(), GameError> {
        if amount < MIN_BET {
            return Err(GameError::InvalidBet);
        }
        if amount > self.balance {
            return Err(GameError::InsufficientFunds);
        }
        Ok(())
    }

    pub fn debit(&mut self, amount: u64) -> Result<(), GameError> {
        if amount > self.balance {
            return Err(GameError::InsufficientFunds);
        }
        self.balance -= amount;
        Ok(())
    }

    pub fn credit(&mut self, amount: u64) {
        self.balance = self.balance.saturating_add(amount);
    }

    /// Take the stake for a new round and count it as played.
    pub fn open_round(&mut self, bet: u64) -> Result<(), GameError> {
        self.check_bet(bet)?;
        self.debit(bet)?;
        self.totals.total_wagered = self.totals.total_wagered.saturating_add(bet);
        self.totals.games_played = self.totals.games_played.saturating_add(1);
        debug!(bet, balance = self.balance, "stake taken");
        Ok(())
    }

    /// Take an additional stake for a round already open (double down).
    pub fn add_stake(&mut self, amount: u64) -> Result<(), GameError> {
        self.debit(amount)?;
        self.totals.total_wagered = self.totals.total_wagered.saturating_add(amount);
        debug!(amount, balance = self.balance, "extra stake taken");
        Ok(())
    }

    /// Pay out a settled round and record it.
    pub fn settle(&mut self, outcome: &Outcome, timestamp: DateTime<Utc>) -> HistoryEntry {
        self.credit(outcome.payout);
        self.totals.total_won = self.totals.total_won.saturating_add(outcome.payout);
        let entry = HistoryEntry {
            game: outcome.game,
            timestamp,
            bet_amount: outcome.bet,
            multiplier: outcome.recorded_multiplier(),
            profit: outcome.profit(),
        };
        self.record_round(entry.clone());
        entry
    }

    /// Prepend to the history (evicting the oldest past the limit) and extend
    /// the profit series.
    pub fn record_round(&mut self, entry: HistoryEntry) {
        self.profit_series.push(entry.profit);
        self.history.push_front(entry);
        self.history.truncate(HISTORY_LIMIT);
    }

    /// Restore a ledger; absent keys fall back to a fresh account.
    pub fn load<S: Store + ?Sized>(store: &S) -> Result<Self, StoreError> {
        let balance = read::<u64, _>(store, BALANCE_KEY)?.unwrap_or(STARTING_BALANCE);
        let mut history: VecDeque<HistoryEntry> =
            read(store, HISTORY_KEY)?.unwrap_or_default();
        history.truncate(HISTORY_LIMIT);
        let stats: UserStats = read(store, STATS_KEY)?.unwrap_or_default();
        Ok(Self {
            balance,
            totals: stats.totals,
            history,
            profit_series: stats.profit_history,
        })
    }

    pub fn save<S: Store + ?Sized>(&self, store: &mut S) -> Result<(), StoreError> {
        let stats = UserStats {
            totals: self.totals,
            profit_history: self.profit_series.clone(),
        };
        write(store, BALANCE_KEY, &self.balance)?;
        write(store, HISTORY_KEY, &self.history)?;
        write(store, STATS_KEY, &stats)
    }
}

fn read<T: DeserializeOwned, S: Store + ?Sized>(
    store: &S,
    key: &'static str,
) -> Result<Option<T>, StoreError> {
    store
        .load(key)
        .map(|raw| serde_json::from_str(&raw))
        .transpose()
        .map_err(|source| StoreError::Corrupt { key, source })
}

fn write<T: Serialize + ?Sized, S: Store + ?Sized>(
    store: &mut S,
    key: &'static str,
    value: &T,
) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value).map_err(|source| StoreError::Encode { key, source })?;
    store.save(key, raw);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MemoryStore;
    use wager_types::casino::{DiceCall, GameId, Multiplier, OutcomeDetail};

    fn at(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).expect("valid timestamp")
    }

    fn dice_outcome(bet: u64, total: u8) -> Outcome {
        let call = DiceCall::Seven;
        let multiplier = if call.wins(total) {
            call.multiplier()
        } else {
            Multiplier::ZERO
        };
        Outcome::at_multiplier(
            bet,
            multiplier,
            OutcomeDetail::Dice {
                dice: [1, total - 1],
                total,
                call,
            },
        )
    }

    fn entry(profit: i64) -> HistoryEntry {
        HistoryEntry {
            game: GameId::Slots,
            timestamp: at(0),
            bet_amount: 10,
            multiplier: Multiplier::ZERO,
            profit,
        }
    }

    #[test]
    fn test_can_afford() {
        let ledger = Ledger::new(100);
        assert!(ledger.can_afford(10));
        assert!(ledger.can_afford(100));
        assert!(!ledger.can_afford(9));
        assert!(!ledger.can_afford(101));
        assert_eq!(ledger.check_bet(0), Err(GameError::InvalidBet));
        assert_eq!(ledger.check_bet(101), Err(GameError::InsufficientFunds));
    }

    #[test]
    fn test_debit_rechecks_balance() {
        let mut ledger = Ledger::new(50);
        assert_eq!(ledger.debit(51), Err(GameError::InsufficientFunds));
        assert_eq!(ledger.balance(), 50);
        ledger.debit(50).expect("debit within balance");
        assert_eq!(ledger.balance(), 0);
        ledger.credit(0);
        assert_eq!(ledger.balance(), 0);
    }

    #[test]
    fn test_rejected_round_leaves_ledger_untouched() {
        let mut ledger = Ledger::new(100);
        let before = ledger.clone();
        assert_eq!(ledger.open_round(5), Err(GameError::InvalidBet));
        assert_eq!(ledger.open_round(500), Err(GameError::InsufficientFunds));
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_round_accounting() {
        let mut ledger = Ledger::new(1_000);
        ledger.open_round(50).expect("stake accepted");
        assert_eq!(ledger.balance(), 950);
        assert_eq!(ledger.totals().games_played, 1);
        assert_eq!(ledger.totals().total_wagered, 50);

        let entry = ledger.settle(&dice_outcome(50, 7), at(42));
        assert_eq!(entry.profit, 200);
        assert_eq!(entry.timestamp, at(42));
        assert_eq!(ledger.balance(), 1_200);
        assert_eq!(ledger.totals().total_won, 250);
        assert_eq!(ledger.profit_series(), &[200]);

        ledger.open_round(50).expect("stake accepted");
        ledger.settle(&dice_outcome(50, 4), at(43));
        assert_eq!(ledger.balance(), 1_150);
        assert_eq!(ledger.profit_series(), &[200, -50]);
        assert_eq!(ledger.totals().net_profit(), 150);
        assert_eq!(ledger.balance() as i64, 1_000 + ledger.profit_series().iter().sum::<i64>());
    }

    #[test]
    fn test_history_evicts_oldest() {
        let mut ledger = Ledger::default();
        for i in 0..51 {
            ledger.record_round(entry(i));
        }
        assert_eq!(ledger.history().len(), HISTORY_LIMIT);
        // Newest first; the first entry recorded (profit 0) is gone
        assert_eq!(ledger.history().next().map(|e| e.profit), Some(50));
        assert_eq!(ledger.history().last().map(|e| e.profit), Some(1));
        assert_eq!(ledger.profit_series().len(), 51);
    }

    #[test]
    fn test_load_defaults() {
        let store = MemoryStore::default();
        let ledger = Ledger::load(&store).expect("empty store loads");
        assert_eq!(ledger.balance(), STARTING_BALANCE);
        assert_eq!(ledger.history().len(), 0);
        assert_eq!(ledger.totals(), Totals::default());
    }

    #[test]
    fn test_save_and_load() {
        let mut ledger = Ledger::new(500);
        ledger.open_round(50).expect("stake accepted");
        ledger.settle(&dice_outcome(50, 7), at(1));

        let mut store = MemoryStore::default();
        ledger.save(&mut store).expect("ledger saves");
        assert_eq!(store.load(BALANCE_KEY).as_deref(), Some("700"));

        let restored = Ledger::load(&store).expect("ledger loads");
        assert_eq!(restored, ledger);
    }

    #[test]
    fn test_history_blob_shape() {
        let mut ledger = Ledger::new(500);
        ledger.open_round(100).expect("stake accepted");
        ledger.settle(
            &Outcome::at_multiplier(
                100,
                Multiplier::from_hundredths(150),
                OutcomeDetail::Crash {
                    reached: Multiplier::from_hundredths(150),
                    crash_point: Multiplier::from_hundredths(300),
                    cashed_out: true,
                    ticks: 50,
                },
            ),
            at(1_714_564_800_000),
        );

        let mut store = MemoryStore::default();
        ledger.save(&mut store).expect("ledger saves");
        assert_eq!(
            store.load(HISTORY_KEY).as_deref(),
            Some(
                r#"[{"game":"Crash","time":"2024-05-01T12:00:00.000Z","betAmount":100,"multiplier":1.5,"profit":50}]"#
            )
        );
    }

    #[test]
    fn test_load_browser_history() {
        let mut store = MemoryStore::default();
        store.save(BALANCE_KEY, "10050".to_string());
        store.save(
            HISTORY_KEY,
            r#"[{"game":"Roulette","time":"2024-05-01T12:01:30.250Z","betAmount":90,"multiplier":1.3333333333333333,"profit":30},
                {"game":"Crash","time":"2024-05-01T12:00:00.000Z","betAmount":100,"multiplier":1.5,"profit":50}]"#
                .to_string(),
        );
        store.save(
            STATS_KEY,
            r#"{"totalWagered":190,"totalWon":270,"gamesPlayed":2,"profitHistory":[50,30]}"#
                .to_string(),
        );

        let ledger = Ledger::load(&store).expect("browser blobs load");
        assert_eq!(ledger.balance(), 10_050);
        let history: Vec<&HistoryEntry> = ledger.history().collect();
        assert_eq!(history[0].game, GameId::Roulette);
        assert_eq!(history[0].multiplier, Multiplier::from_hundredths(133));
        assert_eq!(history[0].timestamp, at(1_714_564_890_250));
        assert_eq!(history[1].multiplier, Multiplier::from_hundredths(150));
        assert_eq!(ledger.totals().net_profit(), 80);
        assert_eq!(ledger.profit_series(), &[50, 30]);
    }

    #[test]
    fn test_load_millisecond_timestamps() {
        let mut store = MemoryStore::default();
        store.save(
            HISTORY_KEY,
            r#"[{"game":"Dice","time":42,"betAmount":50,"multiplier":0,"profit":-50}]"#.to_string(),
        );
        let ledger = Ledger::load(&store).expect("numeric time loads");
        assert_eq!(ledger.history().next().map(|e| e.timestamp), Some(at(42)));
    }

    #[test]
    fn test_crashed_round_records_crash_level() {
        let mut ledger = Ledger::default();
        ledger.open_round(100).expect("stake accepted");
        let entry = ledger.settle(
            &Outcome::at_multiplier(
                100,
                Multiplier::ZERO,
                OutcomeDetail::Crash {
                    reached: Multiplier::from_hundredths(240),
                    crash_point: Multiplier::from_hundredths(240),
                    cashed_out: false,
                    ticks: 140,
                },
            ),
            at(0),
        );
        assert_eq!(entry.multiplier, Multiplier::from_hundredths(240));
        assert_eq!(entry.profit, -100);
        assert_eq!(ledger.balance(), STARTING_BALANCE - 100);
    }

    #[test]
    fn test_load_rejects_corrupt_blob() {
        let mut store = MemoryStore::default();
        store.save(HISTORY_KEY, "not json".to_string());
        assert!(matches!(
            Ledger::load(&store),
            Err(StoreError::Corrupt { key: HISTORY_KEY, .. })
        ));
    }
}

//! Session coordinator.
//!
//! Owns the ledger, the randomness source and every engine, and routes bets
//! and player actions to them. At most one multi-step round (Crash or
//! Blackjack) may be in flight at a time; everything else is rejected with
//! [GameError::RoundInProgress] before any engine is touched.
//!
//! Scheduled work (crash ticks, dealer draws) is driven by the caller through
//! [Session::tick]. A tick that arrives when nothing is running is a no-op.

use crate::casino::{
    blackjack::{Blackjack, BlackjackView, Stage},
    crash::{Crash, CrashRound},
    dice::Dice,
    roulette::Roulette,
    slots::Slots,
    CasinoGame, GameError, GameRng, Progress, RandomSource,
};
use crate::ledger::Ledger;
use crate::state::{Store, StoreError};
use chrono::{SubsecRound, Utc};
use tracing::{info, warn};
use wager_types::casino::{
    DiceCall, Event, GameId, Multiplier, Outcome, Selection, EVENT_LIMIT,
};

/// Game-specific bet parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BetOptions {
    Crash { auto_cashout: Option<Multiplier> },
    Roulette { selections: Vec<Selection> },
    Blackjack,
    Slots,
    Dice { call: DiceCall },
}

impl BetOptions {
    pub fn game(&self) -> GameId {
        match self {
            BetOptions::Crash { .. } => GameId::Crash,
            BetOptions::Roulette { .. } => GameId::Roulette,
            BetOptions::Blackjack => GameId::Blackjack,
            BetOptions::Slots => GameId::Slots,
            BetOptions::Dice { .. } => GameId::Dice,
        }
    }
}

/// A request to open a round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bet {
    pub amount: u64,
    pub options: BetOptions,
}

impl Bet {
    pub fn new(amount: u64, options: BetOptions) -> Self {
        Self { amount, options }
    }

    pub fn game(&self) -> GameId {
        self.options.game()
    }

    /// Build a bet from a game name and free-form arguments.
    ///
    /// Crash takes an optional auto-cashout multiplier, Roulette one selection
    /// per argument and Dice a call; Blackjack and Slots ignore arguments.
    pub fn parse(game: &str, amount: u64, args: &[&str]) -> Result<Self, GameError> {
        let options = match game.parse::<GameId>()? {
            GameId::Crash => BetOptions::Crash {
                auto_cashout: args
                    .first()
                    .map(|arg| arg.parse::<Multiplier>())
                    .transpose()?,
            },
            GameId::Roulette => BetOptions::Roulette {
                selections: args
                    .iter()
                    .map(|arg| arg.parse::<Selection>())
                    .collect::<Result<_, _>>()?,
            },
            GameId::Blackjack => BetOptions::Blackjack,
            GameId::Slots => BetOptions::Slots,
            GameId::Dice => BetOptions::Dice {
                call: args.first().copied().unwrap_or_default().parse()?,
            },
        };
        Ok(Self::new(amount, options))
    }
}

/// Player actions on a round in flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Hit,
    Stand,
    Double,
    CashOut,
}

pub struct Session<R: RandomSource = GameRng> {
    ledger: Ledger,
    rng: R,
    crash: Crash,
    roulette: Roulette,
    blackjack: Blackjack,
    slots: Slots,
    dice: Dice,
    events: Vec<Event>,
    store: Option<Box<dyn Store>>,
}

impl Default for Session<GameRng> {
    fn default() -> Self {
        Self::new(GameRng::default())
    }
}

impl<R: RandomSource> Session<R> {
    pub fn new(rng: R) -> Self {
        Self::with_ledger(Ledger::default(), rng)
    }

    pub fn with_ledger(ledger: Ledger, rng: R) -> Self {
        Self {
            ledger,
            rng,
            crash: Crash::default(),
            roulette: Roulette,
            blackjack: Blackjack::default(),
            slots: Slots,
            dice: Dice,
            events: Vec::new(),
            store: None,
        }
    }

    /// Restore the ledger from `store` and save back to it after every change.
    pub fn with_store(store: impl Store + 'static, rng: R) -> Result<Self, StoreError> {
        let ledger = Ledger::load(&store)?;
        let mut session = Self::with_ledger(ledger, rng);
        session.store = Some(Box::new(store));
        Ok(session)
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn crash(&self) -> &Crash {
        &self.crash
    }

    pub fn crash_round(&self) -> Option<&CrashRound> {
        self.crash.round()
    }

    pub fn blackjack_view(&self) -> Option<BlackjackView> {
        self.blackjack.view()
    }

    /// The game holding the single in-flight round, if any.
    pub fn active_game(&self) -> Option<GameId> {
        if self.crash.is_active() {
            Some(GameId::Crash)
        } else if self.blackjack.is_active() {
            Some(GameId::Blackjack)
        } else {
            None
        }
    }

    /// Pending notifications, oldest first. Only the newest [EVENT_LIMIT] are
    /// kept until [Session::drain_events] is called.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Parse and place a bet by game name.
    pub fn place(
        &mut self,
        game: &str,
        amount: u64,
        args: &[&str],
    ) -> Result<Option<Outcome>, GameError> {
        match Bet::parse(game, amount, args) {
            Ok(bet) => self.start_round(bet),
            Err(err) => {
                self.reject(game.parse().ok(), &err);
                Err(err)
            }
        }
    }

    /// Open a round. Single-step games settle immediately and return their
    /// outcome; Crash and Blackjack usually return `None` and stay in flight.
    pub fn start_round(&mut self, bet: Bet) -> Result<Option<Outcome>, GameError> {
        let game = bet.game();
        match self.dispatch(bet) {
            Ok(progress) => {
                let outcome = self.apply(progress);
                if outcome.is_none() {
                    self.persist();
                }
                Ok(outcome)
            }
            Err(err) => {
                self.reject(Some(game), &err);
                Err(err)
            }
        }
    }

    fn dispatch(&mut self, bet: Bet) -> Result<Progress, GameError> {
        if let Some(active) = self.active_game() {
            return Err(GameError::RoundInProgress { active });
        }
        let Bet { amount, options } = bet;
        let (ledger, rng) = (&mut self.ledger, &mut self.rng);
        match options {
            BetOptions::Crash { auto_cashout } => self.crash.start(ledger, amount, auto_cashout, rng),
            BetOptions::Roulette { selections } => {
                self.roulette.start(ledger, amount, selections, rng)
            }
            BetOptions::Blackjack => self.blackjack.start(ledger, amount, (), rng),
            BetOptions::Slots => self.slots.start(ledger, amount, (), rng),
            BetOptions::Dice { call } => self.dice.start(ledger, amount, call, rng),
        }
    }

    /// Run one scheduled step: a crash tick, or one dealer draw once the
    /// player has finished. Returns the outcome if the step settled a round.
    pub fn tick(&mut self) -> Option<Outcome> {
        let (game, progress) = if self.crash.is_active() {
            (
                GameId::Crash,
                self.crash.advance(&mut self.ledger, &mut self.rng),
            )
        } else if self.dealer_pending() {
            (
                GameId::Blackjack,
                self.blackjack.advance(&mut self.ledger, &mut self.rng),
            )
        } else {
            return None;
        };
        match progress {
            Ok(progress) => self.apply(progress),
            Err(err) => {
                self.reject(Some(game), &err);
                None
            }
        }
    }

    /// Play the dealer's hand to the end without pacing.
    pub fn finish_dealer(&mut self) -> Option<Outcome> {
        while self.dealer_pending() {
            match self.blackjack.dealer_step() {
                Ok(Progress::Continue) => {}
                Ok(progress) => return self.apply(progress),
                Err(err) => {
                    self.reject(Some(GameId::Blackjack), &err);
                    return None;
                }
            }
        }
        None
    }

    /// Whether a blackjack round is waiting on dealer steps.
    pub fn dealer_pending(&self) -> bool {
        self.blackjack
            .round()
            .is_some_and(|round| round.stage() == Stage::DealerTurn)
    }

    pub fn act(&mut self, action: Action) -> Result<Option<Outcome>, GameError> {
        match action {
            Action::Hit => self.hit(),
            Action::Stand => self.stand(),
            Action::Double => self.double_down(),
            Action::CashOut => self.cash_out(),
        }
    }

    pub fn hit(&mut self) -> Result<Option<Outcome>, GameError> {
        let progress = self.blackjack.hit();
        self.resolve(GameId::Blackjack, progress)
    }

    pub fn stand(&mut self) -> Result<Option<Outcome>, GameError> {
        let progress = self.blackjack.stand();
        self.resolve(GameId::Blackjack, progress)
    }

    pub fn double_down(&mut self) -> Result<Option<Outcome>, GameError> {
        let progress = self.blackjack.double_down(&mut self.ledger);
        let outcome = self.resolve(GameId::Blackjack, progress)?;
        if outcome.is_none() {
            self.persist();
        }
        Ok(outcome)
    }

    pub fn cash_out(&mut self) -> Result<Option<Outcome>, GameError> {
        let progress = self.crash.cash_out().map(Progress::Settled);
        self.resolve(GameId::Crash, progress)
    }

    /// Wipe balance, history and statistics back to a fresh account.
    pub fn reset(&mut self) {
        self.ledger = Ledger::default();
        self.crash = Crash::default();
        self.blackjack = Blackjack::default();
        self.events.clear();
        info!(balance = self.ledger.balance(), "account reset");
        self.persist();
    }

    fn resolve(
        &mut self,
        game: GameId,
        progress: Result<Progress, GameError>,
    ) -> Result<Option<Outcome>, GameError> {
        match progress {
            Ok(progress) => Ok(self.apply(progress)),
            Err(err) => {
                self.reject(Some(game), &err);
                Err(err)
            }
        }
    }

    fn apply(&mut self, progress: Progress) -> Option<Outcome> {
        let outcome = progress.outcome()?;
        let entry = self.ledger.settle(&outcome, Utc::now().trunc_subsecs(3));
        info!(
            game = %outcome.game,
            bet = outcome.bet,
            payout = outcome.payout,
            profit = entry.profit,
            balance = self.ledger.balance(),
            "round settled"
        );
        self.notify(Event::RoundSettled(outcome.clone()));
        self.persist();
        Some(outcome)
    }

    fn reject(&mut self, game: Option<GameId>, err: &GameError) {
        warn!(?game, %err, "request rejected");
        self.notify(Event::Rejected {
            game,
            message: err.to_string(),
        });
    }

    fn notify(&mut self, event: Event) {
        self.events.push(event);
        if self.events.len() > EVENT_LIMIT {
            let excess = self.events.len() - EVENT_LIMIT;
            self.events.drain(..excess);
        }
    }

    fn persist(&mut self) {
        let Some(store) = self.store.as_mut() else {
            return;
        };
        if let Err(err) = self.ledger.save(&mut **store) {
            warn!("Failed to persist ledger: {:?}", err);
        }
    }
}

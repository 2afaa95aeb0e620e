//! Blackjack game implementation.
//!
//! Single deck, reshuffled every round. Cards are dealt from the back of the
//! shuffled deck: two to the player, then two to the dealer.
//!
//! Rules:
//! - A natural 21 settles at once (2.5x, or a push against a dealer 21).
//! - Double down is only offered before the first hit.
//! - Dealer draws below 17 and stands on any 17.
//!
//! The dealer plays one card per [Blackjack::dealer_step] so a caller can pace
//! the reveal.

use super::{CasinoGame, GameError, Progress, RandomSource};
use crate::ledger::Ledger;
use serde::Serialize;
use tracing::debug;
use wager_types::casino::{Card, GameId, Outcome, OutcomeDetail, Verdict, DEALER_STANDS_ON};

const BLACKJACK: u8 = 21;

/// Blackjack game stages
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Stage {
    PlayerTurn,
    DealerTurn,
}

/// Player moves
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Move {
    Hit,
    Stand,
    Double,
}

/// Score a hand: aces count 11, demoted to 1 one at a time while over 21.
pub fn score(cards: &[Card]) -> u8 {
    let mut value: u16 = cards.iter().map(|c| c.value() as u16).sum();
    let mut aces = cards.iter().filter(|c| c.is_ace()).count();

    while value > BLACKJACK as u16 && aces > 0 {
        value -= 10;
        aces -= 1;
    }
    value.min(u8::MAX as u16) as u8
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlackjackRound {
    deck: Vec<Card>,
    player: Vec<Card>,
    dealer: Vec<Card>,
    stage: Stage,
    /// Total stake, doubled included
    bet: u64,
    base_bet: u64,
    hits: u8,
    doubled: bool,
}

impl BlackjackRound {
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn player(&self) -> &[Card] {
        &self.player
    }

    pub fn bet(&self) -> u64 {
        self.bet
    }

    pub fn can_double(&self) -> bool {
        self.stage == Stage::PlayerTurn && self.hits == 0 && !self.doubled
    }

    fn draw(&mut self) -> Result<Card, GameError> {
        self.deck.pop().ok_or(GameError::DeckExhausted)
    }

    fn settle(self, verdict: Verdict) -> Outcome {
        let player_score = score(&self.player);
        let dealer_score = score(&self.dealer);
        debug!(player_score, dealer_score, ?verdict, bet = self.bet, "blackjack settled");
        Outcome::at_multiplier(
            self.bet,
            verdict.multiplier(),
            OutcomeDetail::Blackjack {
                player: self.player,
                dealer: self.dealer,
                player_score,
                dealer_score,
                verdict,
                doubled: self.doubled,
            },
        )
    }

    fn view(&self) -> BlackjackView {
        let revealed = self.stage != Stage::PlayerTurn;
        let dealer = self
            .dealer
            .iter()
            .enumerate()
            .map(|(i, card)| (revealed || i == 0).then_some(*card))
            .collect();
        BlackjackView {
            player: self.player.clone(),
            player_score: score(&self.player),
            dealer,
            dealer_score: revealed.then(|| score(&self.dealer)),
            stage: self.stage,
            bet: self.bet,
            can_double: self.can_double(),
        }
    }
}

/// What the player is allowed to see of a round in flight.
///
/// While it is the player's turn the dealer's hole card and score are `None`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BlackjackView {
    pub player: Vec<Card>,
    pub player_score: u8,
    pub dealer: Vec<Option<Card>>,
    pub dealer_score: Option<u8>,
    pub stage: Stage,
    pub bet: u64,
    pub can_double: bool,
}

#[derive(Clone, Debug, Default)]
pub struct Blackjack {
    round: Option<BlackjackRound>,
}

impl Blackjack {
    pub fn round(&self) -> Option<&BlackjackRound> {
        self.round.as_ref()
    }

    pub fn view(&self) -> Option<BlackjackView> {
        self.round.as_ref().map(BlackjackRound::view)
    }

    /// Shuffle a fresh deck and deal.
    pub fn deal<R: RandomSource>(
        &mut self,
        ledger: &mut Ledger,
        bet: u64,
        rng: &mut R,
    ) -> Result<Progress, GameError> {
        if self.round.is_some() {
            return Err(GameError::RoundInProgress {
                active: GameId::Blackjack,
            });
        }
        ledger.check_bet(bet)?;
        let mut deck = Card::deck();
        rng.shuffle(&mut deck);
        self.deal_from_deck(ledger, bet, deck)
    }

    /// Deal from a prepared deck; cards are taken from the back.
    pub(crate) fn deal_from_deck(
        &mut self,
        ledger: &mut Ledger,
        bet: u64,
        mut deck: Vec<Card>,
    ) -> Result<Progress, GameError> {
        if self.round.is_some() {
            return Err(GameError::RoundInProgress {
                active: GameId::Blackjack,
            });
        }
        ledger.check_bet(bet)?;
        if deck.len() < 4 {
            return Err(GameError::DeckExhausted);
        }
        let mut cards = deck.split_off(deck.len() - 4);
        cards.reverse();
        let player = cards[..2].to_vec();
        let dealer = cards[2..].to_vec();
        ledger.open_round(bet)?;

        let round = BlackjackRound {
            deck,
            player,
            dealer,
            stage: Stage::PlayerTurn,
            bet,
            base_bet: bet,
            hits: 0,
            doubled: false,
        };
        debug!(bet, player = score(&round.player), "blackjack dealt");

        if score(&round.player) == BLACKJACK {
            let verdict = if score(&round.dealer) == BLACKJACK {
                Verdict::Push
            } else {
                Verdict::Blackjack
            };
            return Ok(Progress::Settled(round.settle(verdict)));
        }
        self.round = Some(round);
        Ok(Progress::Continue)
    }

    pub fn play(&mut self, ledger: &mut Ledger, mv: Move) -> Result<Progress, GameError> {
        match mv {
            Move::Hit => self.hit(),
            Move::Stand => self.stand(),
            Move::Double => self.double_down(ledger),
        }
    }

    pub fn hit(&mut self) -> Result<Progress, GameError> {
        let round = self.player_turn()?;
        let card = round.draw()?;
        round.player.push(card);
        round.hits += 1;

        let value = score(&round.player);
        if value > BLACKJACK {
            return Ok(self.finish(Verdict::Bust));
        }
        if value == BLACKJACK {
            round.stage = Stage::DealerTurn;
        }
        Ok(Progress::Continue)
    }

    pub fn stand(&mut self) -> Result<Progress, GameError> {
        self.player_turn()?.stage = Stage::DealerTurn;
        Ok(Progress::Continue)
    }

    /// Double the stake, take exactly one card and stand.
    pub fn double_down(&mut self, ledger: &mut Ledger) -> Result<Progress, GameError> {
        let round = self.player_turn()?;
        if !round.can_double() {
            return Err(GameError::InvalidAction);
        }
        if round.deck.is_empty() {
            return Err(GameError::DeckExhausted);
        }
        ledger.add_stake(round.base_bet)?;
        round.bet = round.bet.saturating_add(round.base_bet);
        round.doubled = true;
        let card = round.draw()?;
        round.player.push(card);

        if score(&round.player) > BLACKJACK {
            return Ok(self.finish(Verdict::Bust));
        }
        round.stage = Stage::DealerTurn;
        Ok(Progress::Continue)
    }

    /// Play one dealer step: draw below 17, otherwise settle.
    pub fn dealer_step(&mut self) -> Result<Progress, GameError> {
        let round = self.round.as_mut().ok_or(GameError::NotActive)?;
        if round.stage != Stage::DealerTurn {
            return Err(GameError::InvalidAction);
        }

        let dealer = score(&round.dealer);
        if dealer < DEALER_STANDS_ON {
            let card = round.draw()?;
            round.dealer.push(card);
            return Ok(Progress::Continue);
        }

        let player = score(&round.player);
        let verdict = if dealer > BLACKJACK || player > dealer {
            Verdict::Win
        } else if player < dealer {
            Verdict::Lose
        } else {
            Verdict::Push
        };
        Ok(self.finish(verdict))
    }

    fn player_turn(&mut self) -> Result<&mut BlackjackRound, GameError> {
        let round = self.round.as_mut().ok_or(GameError::NotActive)?;
        if round.stage != Stage::PlayerTurn {
            return Err(GameError::InvalidAction);
        }
        Ok(round)
    }

    fn finish(&mut self, verdict: Verdict) -> Progress {
        match self.round.take() {
            Some(round) => Progress::Settled(round.settle(verdict)),
            None => Progress::Continue,
        }
    }
}

impl CasinoGame for Blackjack {
    type Options = ();

    const GAME: GameId = GameId::Blackjack;

    fn start<R: RandomSource>(
        &mut self,
        ledger: &mut Ledger,
        bet: u64,
        _options: (),
        rng: &mut R,
    ) -> Result<Progress, GameError> {
        self.deal(ledger, bet, rng)
    }

    fn is_active(&self) -> bool {
        self.round.is_some()
    }

    fn advance<R: RandomSource>(
        &mut self,
        _ledger: &mut Ledger,
        _rng: &mut R,
    ) -> Result<Progress, GameError> {
        self.dealer_step()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{stacked_deck, ScriptedRng};
    use wager_types::casino::{Rank, Suit};

    fn card(rank: Rank) -> Card {
        Card::new(rank, Suit::Clubs)
    }

    fn settled(progress: Progress) -> Outcome {
        progress.outcome().expect("round settled")
    }

    fn verdict(outcome: &Outcome) -> Verdict {
        match outcome.detail {
            OutcomeDetail::Blackjack { verdict, .. } => verdict,
            ref other => panic!("unexpected detail {other:?}"),
        }
    }

    /// Deal player (p1, p2) and dealer (d1, d2), then the rest in order.
    fn deal(ledger: &mut Ledger, bet: u64, order: &[Rank]) -> (Blackjack, Progress) {
        let cards: Vec<Card> = order.iter().copied().map(card).collect();
        let mut game = Blackjack::default();
        let progress = game
            .deal_from_deck(ledger, bet, stacked_deck(&cards))
            .expect("deal accepted");
        (game, progress)
    }

    #[test]
    fn test_score() {
        use wager_types::casino::Rank::*;
        assert_eq!(score(&[card(Ace), card(Ace), card(Nine)]), 21);
        assert_eq!(score(&[card(King), card(Queen)]), 20);
        assert_eq!(score(&[card(Ace), card(King), card(Five)]), 16);
        assert_eq!(score(&[card(Ace), card(Ace)]), 12);
        assert_eq!(score(&[card(Ace), card(King)]), 21);
        assert_eq!(score(&[card(King), card(Queen), card(Two)]), 22);
        assert_eq!(score(&[]), 0);
    }

    #[test]
    fn test_natural_pays_three_to_two() {
        use wager_types::casino::Rank::*;
        let mut ledger = Ledger::new(1_000);
        let (game, progress) = deal(&mut ledger, 15, &[Ace, King, Nine, Seven]);
        let outcome = settled(progress);
        assert_eq!(verdict(&outcome), Verdict::Blackjack);
        assert_eq!(outcome.payout, 37);
        assert!(game.round().is_none());
    }

    #[test]
    fn test_natural_against_dealer_21_pushes() {
        use wager_types::casino::Rank::*;
        let mut ledger = Ledger::new(1_000);
        let (_, progress) = deal(&mut ledger, 100, &[Ace, King, Queen, Ace]);
        let outcome = settled(progress);
        assert_eq!(verdict(&outcome), Verdict::Push);
        assert_eq!(outcome.payout, 100);
        assert_eq!(outcome.profit(), 0);
    }

    #[test]
    fn test_hit_to_bust() {
        use wager_types::casino::Rank::*;
        let mut ledger = Ledger::new(1_000);
        let (mut game, progress) = deal(&mut ledger, 100, &[Ten, Six, Nine, Eight, King]);
        assert_eq!(progress, Progress::Continue);
        let outcome = settled(game.hit().expect("hit allowed"));
        assert_eq!(verdict(&outcome), Verdict::Bust);
        assert_eq!(outcome.payout, 0);
        assert_eq!(game.hit(), Err(GameError::NotActive));
    }

    #[test]
    fn test_hit_to_21_moves_to_dealer() {
        use wager_types::casino::Rank::*;
        let mut ledger = Ledger::new(1_000);
        let (mut game, _) = deal(&mut ledger, 100, &[Ten, Six, Ten, Seven, Five]);
        assert_eq!(game.hit(), Ok(Progress::Continue));
        assert_eq!(game.round().map(|r| r.stage()), Some(Stage::DealerTurn));
        assert_eq!(game.hit(), Err(GameError::InvalidAction));

        let outcome = settled(game.dealer_step().expect("dealer stands on 17"));
        assert_eq!(verdict(&outcome), Verdict::Win);
        assert_eq!(outcome.payout, 200);
    }

    #[test]
    fn test_dealer_draws_below_17() {
        use wager_types::casino::Rank::*;
        let mut ledger = Ledger::new(1_000);
        // Player 19, dealer 12 then draws 4 (16) and 3 (19)
        let (mut game, _) = deal(&mut ledger, 50, &[Ten, Nine, Ten, Two, Four, Three]);
        game.stand().expect("stand allowed");
        assert_eq!(game.dealer_step(), Ok(Progress::Continue));
        assert_eq!(game.dealer_step(), Ok(Progress::Continue));
        let outcome = settled(game.dealer_step().expect("dealer stands"));
        assert_eq!(verdict(&outcome), Verdict::Push);
        assert_eq!(outcome.payout, 50);
    }

    #[test]
    fn test_dealer_bust_pays_player() {
        use wager_types::casino::Rank::*;
        let mut ledger = Ledger::new(1_000);
        let (mut game, _) = deal(&mut ledger, 50, &[Ten, Two, Ten, Six, King]);
        game.stand().expect("stand allowed");
        game.dealer_step().expect("dealer draws");
        let outcome = settled(game.dealer_step().expect("dealer settles"));
        assert_eq!(verdict(&outcome), Verdict::Win);
        assert_eq!(outcome.payout, 100);
    }

    #[test]
    fn test_dealer_beats_player() {
        use wager_types::casino::Rank::*;
        let mut ledger = Ledger::new(1_000);
        let (mut game, _) = deal(&mut ledger, 50, &[Ten, Seven, Ten, Nine]);
        game.stand().expect("stand allowed");
        let outcome = settled(game.dealer_step().expect("dealer settles"));
        assert_eq!(verdict(&outcome), Verdict::Lose);
        assert_eq!(outcome.profit(), -50);
    }

    #[test]
    fn test_double_down() {
        use wager_types::casino::Rank::*;
        let mut ledger = Ledger::new(1_000);
        let (mut game, _) = deal(&mut ledger, 100, &[Six, Five, Ten, Seven, Ten]);
        assert!(game.view().is_some_and(|v| v.can_double));
        game.double_down(&mut ledger).expect("double allowed");
        assert_eq!(ledger.balance(), 800);
        assert_eq!(ledger.totals().total_wagered, 200);

        let outcome = settled(game.dealer_step().expect("dealer settles"));
        assert_eq!(verdict(&outcome), Verdict::Win);
        assert_eq!(outcome.bet, 200);
        assert_eq!(outcome.payout, 400);
        assert!(matches!(
            outcome.detail,
            OutcomeDetail::Blackjack { doubled: true, .. }
        ));
    }

    #[test]
    fn test_double_down_bust() {
        use wager_types::casino::Rank::*;
        let mut ledger = Ledger::new(1_000);
        // Player 12 draws a King
        let (mut game, _) = deal(&mut ledger, 100, &[Ten, Two, Ten, Seven, King]);
        let outcome = settled(game.double_down(&mut ledger).expect("double allowed"));
        assert_eq!(verdict(&outcome), Verdict::Bust);
        assert_eq!(outcome.bet, 200);
        assert_eq!(outcome.payout, 0);
        assert_eq!(outcome.profit(), -200);
        assert!(matches!(
            outcome.detail,
            OutcomeDetail::Blackjack {
                doubled: true,
                player_score: 22,
                ..
            }
        ));
        assert!(game.round().is_none());
        assert_eq!(game.dealer_step(), Err(GameError::NotActive));
        assert_eq!(ledger.balance(), 800);
        assert_eq!(ledger.totals().total_wagered, 200);
    }

    #[test]
    fn test_double_after_hit_rejected() {
        use wager_types::casino::Rank::*;
        let mut ledger = Ledger::new(1_000);
        let (mut game, _) = deal(&mut ledger, 100, &[Two, Three, Ten, Seven, Four]);
        game.hit().expect("hit allowed");
        let before = game.round().cloned();
        assert_eq!(game.double_down(&mut ledger), Err(GameError::InvalidAction));
        assert_eq!(game.round().cloned(), before);
        assert_eq!(ledger.balance(), 900);
    }

    #[test]
    fn test_double_needs_funds() {
        use wager_types::casino::Rank::*;
        let mut ledger = Ledger::new(150);
        let (mut game, _) = deal(&mut ledger, 100, &[Six, Five, Ten, Seven, Ten]);
        let before = game.round().cloned();
        assert_eq!(
            game.double_down(&mut ledger),
            Err(GameError::InsufficientFunds)
        );
        assert_eq!(game.round().cloned(), before);
        assert_eq!(ledger.balance(), 50);
    }

    #[test]
    fn test_view_hides_hole_card() {
        use wager_types::casino::Rank::*;
        let mut ledger = Ledger::new(1_000);
        let (mut game, _) = deal(&mut ledger, 100, &[Ten, Seven, Nine, Eight]);
        let view = game.view().expect("round in flight");
        assert_eq!(view.dealer, vec![Some(card(Nine)), None]);
        assert_eq!(view.dealer_score, None);
        assert_eq!(view.player_score, 17);

        game.stand().expect("stand allowed");
        let view = game.view().expect("round in flight");
        assert_eq!(view.dealer, vec![Some(card(Nine)), Some(card(Eight))]);
        assert_eq!(view.dealer_score, Some(17));
        assert!(!view.can_double);
    }

    #[test]
    fn test_actions_without_round() {
        let mut ledger = Ledger::new(1_000);
        let mut game = Blackjack::default();
        assert_eq!(game.hit(), Err(GameError::NotActive));
        assert_eq!(game.stand(), Err(GameError::NotActive));
        assert_eq!(game.double_down(&mut ledger), Err(GameError::NotActive));
        assert_eq!(game.dealer_step(), Err(GameError::NotActive));
        assert!(game.view().is_none());
    }

    #[test]
    fn test_dealer_step_during_player_turn() {
        use wager_types::casino::Rank::*;
        let mut ledger = Ledger::new(1_000);
        let (mut game, _) = deal(&mut ledger, 100, &[Ten, Seven, Nine, Eight]);
        assert_eq!(game.dealer_step(), Err(GameError::InvalidAction));
    }

    #[test]
    fn test_shuffled_deal_uses_whole_deck() {
        let mut ledger = Ledger::new(1_000);
        let mut game = Blackjack::default();
        let mut rng = ScriptedRng::default();
        // Unshuffled deck: player A♠ K♠, dealer Q♠ J♠
        let outcome = settled(game.deal(&mut ledger, 100, &mut rng).expect("deal accepted"));
        assert_eq!(verdict(&outcome), Verdict::Blackjack);
        assert_eq!(outcome.payout, 250);
    }

    #[test]
    fn test_deal_rejections() {
        let mut ledger = Ledger::new(50);
        let mut game = Blackjack::default();
        assert_eq!(
            game.deal(&mut ledger, 100, &mut ScriptedRng::default()),
            Err(GameError::InsufficientFunds)
        );
        assert_eq!(
            game.deal_from_deck(&mut ledger, 10, vec![card(Rank::Two)]),
            Err(GameError::DeckExhausted)
        );
        assert_eq!(ledger.balance(), 50);
    }
}

//! One hand of simplified Blackjack as a pure state machine
//!
//! The engine performs no I/O. The session asks [`Hand::prompt`] what to send,
//! feeds each client reply to [`Hand::respond`], and renders the returned
//! [`HandEvent`]s as text. Cards are uniform over 1..=11; a 1 or an 11 drawn
//! by the player is an ace whose value the player chooses.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{prompts, Outcome, PromptKind, BLACKJACK, DEALER_STANDS_AT};
use std::fmt;

/// Source of card values in 1..=11.
pub trait Deck {
    fn draw(&mut self) -> u8;
}

impl<D: Deck + ?Sized> Deck for Box<D> {
    fn draw(&mut self) -> u8 {
        (**self).draw()
    }
}

pub struct RandomDeck<R> {
    rng: R,
}

impl<R: Rng> RandomDeck<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomDeck<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> Deck for RandomDeck<R> {
    fn draw(&mut self) -> u8 {
        self.rng.gen_range(1..=11)
    }
}

/// Deals a fixed sequence of cards, repeating it once exhausted.
/// An empty sequence always deals 10.
#[derive(Debug, Clone)]
pub struct StackedDeck {
    cards: Vec<u8>,
    next: usize,
}

impl StackedDeck {
    pub fn new(cards: impl IntoIterator<Item = u8>) -> Self {
        Self {
            cards: cards.into_iter().collect(),
            next: 0,
        }
    }
}

impl Deck for StackedDeck {
    fn draw(&mut self) -> u8 {
        if self.cards.is_empty() {
            return 10;
        }
        let card = self.cards[self.next % self.cards.len()];
        self.next += 1;
        card
    }
}

pub fn is_ace(card: u8) -> bool {
    card == 1 || card == 11
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    DrawOrStand,
    AceChoice { card: u8 },
    Resolved(Outcome),
}

/// Everything that happens during a hand, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandEvent {
    DealerReveal { card: u8 },
    Stood { score: u32 },
    InvalidDecision,
    AceDefaulted,
    Drew { card: u8, score: u32 },
    Blackjack { card: u8, score: u32 },
    Bust { card: u8, score: u32 },
    DealerDrew { card: u8, score: u32 },
    DealerBust { player: u32 },
    DealerWins { dealer: u32, player: u32 },
    PlayerWins { dealer: u32, player: u32 },
    Tie { score: u32 },
}

impl fmt::Display for HandEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandEvent::DealerReveal { card } => {
                write!(f, "The dealer's face-up card is: {}", card)
            }
            HandEvent::Stood { score } => write!(f, "Final score: {}.", score),
            HandEvent::InvalidDecision => write!(f, "Invalid input. Please type 'yes' or 'no'."),
            HandEvent::AceDefaulted => write!(f, "Invalid choice. Defaulting to 1."),
            HandEvent::Drew { card, score } => {
                write!(f, "You drew {}. Your total score is now {}.", card, score)
            }
            HandEvent::Blackjack { card, score } => {
                write!(f, "You drew {}. Your total score is {}! BLACKJACK!", card, score)
            }
            HandEvent::Bust { card, score } => {
                write!(f, "You drew {}. Your total score is {}. BUST!", card, score)
            }
            HandEvent::DealerDrew { card, score } => {
                write!(f, "The dealer drew a {}. Dealer's score: {}.", card, score)
            }
            HandEvent::DealerBust { player } => {
                write!(f, "Dealer BUST! You win with a score of {}!", player)
            }
            HandEvent::DealerWins { dealer, player } => write!(
                f,
                "Dealer wins with a score of {} against your {}.",
                dealer, player
            ),
            HandEvent::PlayerWins { dealer, player } => write!(
                f,
                "You win with a score of {} against the dealer's {}.",
                player, dealer
            ),
            HandEvent::Tie { score } => write!(
                f,
                "It's a tie! Both you and the dealer have a score of {}.",
                score
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Hand {
    player_score: u32,
    dealer_score: u32,
    phase: Phase,
}

impl Hand {
    /// Starts a hand by revealing the dealer's face-up card.
    pub fn deal<D: Deck + ?Sized>(deck: &mut D) -> (Self, Vec<HandEvent>) {
        let card = deck.draw();
        let hand = Self {
            player_score: 0,
            dealer_score: u32::from(card),
            phase: Phase::DrawOrStand,
        };
        (hand, vec![HandEvent::DealerReveal { card }])
    }

    pub fn player_score(&self) -> u32 {
        self.player_score
    }

    pub fn dealer_score(&self) -> u32 {
        self.dealer_score
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.phase {
            Phase::Resolved(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// The prompt the player must answer next, or `None` once resolved.
    pub fn prompt(&self) -> Option<(PromptKind, String)> {
        match self.phase {
            Phase::DrawOrStand => Some((
                PromptKind::DrawOrStand,
                prompts::draw_or_stand(self.player_score),
            )),
            Phase::AceChoice { card } => Some((PromptKind::AceValue, prompts::ace_value(card))),
            Phase::Resolved(_) => None,
        }
    }

    /// Applies one player reply and returns what happened as a result.
    pub fn respond<D: Deck + ?Sized>(&mut self, reply: &str, deck: &mut D) -> Vec<HandEvent> {
        let mut events = Vec::new();
        let reply = reply.trim();

        match self.phase {
            Phase::DrawOrStand => match reply {
                "no" => {
                    events.push(HandEvent::Stood {
                        score: self.player_score,
                    });
                    self.dealer_turn(deck, &mut events);
                }
                "yes" => {
                    let card = deck.draw();
                    if is_ace(card) {
                        self.phase = Phase::AceChoice { card };
                    } else {
                        self.add_player_card(card, u32::from(card), &mut events);
                    }
                }
                _ => events.push(HandEvent::InvalidDecision),
            },
            Phase::AceChoice { card } => {
                let value = match reply.parse::<u32>() {
                    Ok(1) => 1,
                    Ok(11) => 11,
                    _ => {
                        events.push(HandEvent::AceDefaulted);
                        1
                    }
                };
                self.phase = Phase::DrawOrStand;
                self.add_player_card(card, value, &mut events);
            }
            Phase::Resolved(_) => {}
        }

        events
    }

    fn add_player_card(&mut self, card: u8, value: u32, events: &mut Vec<HandEvent>) {
        self.player_score += value;
        let score = self.player_score;

        if score == BLACKJACK {
            events.push(HandEvent::Blackjack { card, score });
            self.phase = Phase::Resolved(Outcome::Win);
        } else if score > BLACKJACK {
            events.push(HandEvent::Bust { card, score });
            self.phase = Phase::Resolved(Outcome::Loss);
        } else {
            events.push(HandEvent::Drew { card, score });
            self.phase = Phase::DrawOrStand;
        }
    }

    fn dealer_turn<D: Deck + ?Sized>(&mut self, deck: &mut D, events: &mut Vec<HandEvent>) {
        while self.dealer_score < DEALER_STANDS_AT {
            let card = deck.draw();
            self.dealer_score += u32::from(card);
            events.push(HandEvent::DealerDrew {
                card,
                score: self.dealer_score,
            });
        }

        let dealer = self.dealer_score;
        let player = self.player_score;

        let outcome = if dealer > BLACKJACK {
            events.push(HandEvent::DealerBust { player });
            Outcome::Win
        } else if dealer > player {
            events.push(HandEvent::DealerWins { dealer, player });
            Outcome::Loss
        } else if dealer < player {
            events.push(HandEvent::PlayerWins { dealer, player });
            Outcome::Win
        } else {
            events.push(HandEvent::Tie { score: dealer });
            Outcome::Draw
        };

        self.phase = Phase::Resolved(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Plays `replies` in order against a stacked deck, collecting events.
    fn play(cards: &[u8], replies: &[&str]) -> (Hand, Vec<HandEvent>) {
        let mut deck = StackedDeck::new(cards.iter().copied());
        let (mut hand, mut events) = Hand::deal(&mut deck);
        for reply in replies {
            events.extend(hand.respond(reply, &mut deck));
        }
        (hand, events)
    }

    #[test]
    fn test_deal_reveals_dealer_card() {
        let (hand, events) = play(&[7], &[]);
        assert_eq!(events, vec![HandEvent::DealerReveal { card: 7 }]);
        assert_eq!(hand.dealer_score(), 7);
        assert_eq!(hand.player_score(), 0);
        assert_eq!(hand.phase(), Phase::DrawOrStand);
        assert!(hand.outcome().is_none());
    }

    #[test]
    fn test_first_prompt_is_draw_or_stand_at_zero() {
        let (hand, _) = play(&[7], &[]);
        let (kind, text) = hand.prompt().unwrap();
        assert_eq!(kind, PromptKind::DrawOrStand);
        assert!(text.contains("Your current score: 0."));
    }

    #[test]
    fn test_standing_at_zero_goes_straight_to_dealer() {
        // Dealer 10, then draws 7 -> 17 and stands; 17 > 0
        let (hand, events) = play(&[10, 7], &["no"]);
        assert_eq!(events[1], HandEvent::Stood { score: 0 });
        assert_eq!(events[2], HandEvent::DealerDrew { card: 7, score: 17 });
        assert_eq!(hand.player_score(), 0);
        assert_eq!(hand.outcome(), Some(Outcome::Loss));
    }

    #[test]
    fn test_exact_21_wins_without_more_cards() {
        // Dealer 5, player draws 10, 6, 5
        let (hand, events) = play(&[5, 10, 6, 5, 9], &["yes", "yes", "yes"]);
        assert_eq!(hand.player_score(), 21);
        assert_eq!(hand.outcome(), Some(Outcome::Win));
        assert_eq!(
            events.last(),
            Some(&HandEvent::Blackjack { card: 5, score: 21 })
        );
        // Dealer never drew
        assert_eq!(hand.dealer_score(), 5);
        assert!(hand.prompt().is_none());
    }

    #[test]
    fn test_bust_loses_and_dealer_never_plays() {
        let (hand, events) = play(&[4, 10, 9, 8], &["yes", "yes", "yes"]);
        assert_eq!(hand.player_score(), 27);
        assert_eq!(hand.outcome(), Some(Outcome::Loss));
        assert!(!events
            .iter()
            .any(|e| matches!(e, HandEvent::DealerDrew { .. })));
        assert_eq!(hand.dealer_score(), 4);
    }

    #[test]
    fn test_invalid_decision_reprompts_without_drawing() {
        let mut deck = StackedDeck::new([6, 9]);
        let (mut hand, _) = Hand::deal(&mut deck);

        let events = hand.respond("maybe", &mut deck);
        assert_eq!(events, vec![HandEvent::InvalidDecision]);
        assert_eq!(hand.player_score(), 0);
        assert_eq!(hand.phase(), Phase::DrawOrStand);

        // The next card is still the 9
        let events = hand.respond("yes", &mut deck);
        assert_eq!(events, vec![HandEvent::Drew { card: 9, score: 9 }]);
    }

    #[test]
    fn test_decisions_must_match_exactly() {
        let mut deck = StackedDeck::new([6, 9]);
        let (mut hand, _) = Hand::deal(&mut deck);

        for reply in ["YES", "y", "nope", "yesno", ""] {
            assert_eq!(
                hand.respond(reply, &mut deck),
                vec![HandEvent::InvalidDecision]
            );
        }
        assert_eq!(hand.player_score(), 0);
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        let (hand, _) = play(&[6, 9], &["yes\n"]);
        assert_eq!(hand.player_score(), 9);
    }

    #[test]
    fn test_ace_prompts_for_value() {
        for ace in [1u8, 11] {
            let mut deck = StackedDeck::new([6, ace]);
            let (mut hand, _) = Hand::deal(&mut deck);
            let events = hand.respond("yes", &mut deck);

            assert!(events.is_empty());
            assert_eq!(hand.phase(), Phase::AceChoice { card: ace });
            let (kind, text) = hand.prompt().unwrap();
            assert_eq!(kind, PromptKind::AceValue);
            assert!(text.contains(prompts::ACE_VALUE_MARKER));
        }
    }

    #[test]
    fn test_ace_value_choices() {
        let (hand, _) = play(&[6, 1], &["yes", "11"]);
        assert_eq!(hand.player_score(), 11);

        let (hand, _) = play(&[6, 11], &["yes", "1"]);
        assert_eq!(hand.player_score(), 1);
    }

    #[test]
    fn test_invalid_ace_choice_defaults_to_one() {
        let (hand, events) = play(&[6, 11], &["yes", "seven"]);
        assert_eq!(hand.player_score(), 1);
        assert!(events.contains(&HandEvent::AceDefaulted));
        assert_eq!(hand.phase(), Phase::DrawOrStand);
    }

    #[test]
    fn test_ace_as_eleven_can_make_blackjack() {
        let (hand, events) = play(&[6, 10, 11], &["yes", "yes", "11"]);
        assert_eq!(hand.outcome(), Some(Outcome::Win));
        assert_eq!(
            events.last(),
            Some(&HandEvent::Blackjack {
                card: 11,
                score: 21
            })
        );
    }

    #[test]
    fn test_dealer_aces_count_face_value() {
        // Dealer 6, draws 11 -> 17
        let (hand, _) = play(&[6, 11], &["no"]);
        assert_eq!(hand.dealer_score(), 17);
    }

    #[test]
    fn test_dealer_draws_until_seventeen() {
        // Dealer 2, draws 3, 4, 5, 6 -> 20
        let (hand, events) = play(&[2, 3, 4, 5, 6], &["no"]);
        assert_eq!(hand.dealer_score(), 20);
        let dealer_draws = events
            .iter()
            .filter(|e| matches!(e, HandEvent::DealerDrew { .. }))
            .count();
        assert_eq!(dealer_draws, 4);
    }

    #[test]
    fn test_dealer_bust_means_win() {
        // Dealer 10, player 5 stands, dealer draws 6 -> 16, 9 -> 25
        let (hand, events) = play(&[10, 5, 6, 9], &["yes", "no"]);
        assert_eq!(hand.outcome(), Some(Outcome::Win));
        assert_eq!(events.last(), Some(&HandEvent::DealerBust { player: 5 }));
    }

    #[test]
    fn test_dealer_higher_means_loss() {
        // Dealer 10 + 8 = 18, player 10 + 5 = 15
        let (hand, _) = play(&[10, 10, 5, 8], &["yes", "yes", "no"]);
        assert_eq!(hand.outcome(), Some(Outcome::Loss));
    }

    #[test]
    fn test_player_higher_means_win() {
        // Dealer 10 + 7 = 17, player 10 + 9 = 19
        let (hand, events) = play(&[10, 10, 9, 7], &["yes", "yes", "no"]);
        assert_eq!(hand.outcome(), Some(Outcome::Win));
        assert_eq!(
            events.last(),
            Some(&HandEvent::PlayerWins {
                dealer: 17,
                player: 19
            })
        );
    }

    #[test]
    fn test_equal_scores_draw() {
        // Dealer 10 + 8 = 18, player 10 + 8 = 18
        let (hand, events) = play(&[10, 10, 8, 8], &["yes", "yes", "no"]);
        assert_eq!(hand.outcome(), Some(Outcome::Draw));
        assert_eq!(events.last(), Some(&HandEvent::Tie { score: 18 }));
    }

    #[test]
    fn test_resolved_hand_ignores_replies() {
        let (mut hand, _) = play(&[10, 7], &["no"]);
        let mut deck = StackedDeck::new([5]);
        assert!(hand.respond("yes", &mut deck).is_empty());
        assert_eq!(hand.outcome(), Some(Outcome::Loss));
    }

    #[test]
    fn test_random_deck_stays_in_range() {
        let mut deck = RandomDeck::new(StdRng::seed_from_u64(7));
        for _ in 0..1000 {
            let card = deck.draw();
            assert!((1..=11).contains(&card));
        }
    }

    #[test]
    fn test_stacked_deck_repeats() {
        let mut deck = StackedDeck::new([3, 4]);
        assert_eq!(deck.draw(), 3);
        assert_eq!(deck.draw(), 4);
        assert_eq!(deck.draw(), 3);

        let mut empty = StackedDeck::new(Vec::new());
        assert_eq!(empty.draw(), 10);
    }

    #[test]
    fn test_event_texts() {
        assert_eq!(
            HandEvent::DealerReveal { card: 9 }.to_string(),
            "The dealer's face-up card is: 9"
        );
        assert_eq!(
            HandEvent::Bust { card: 8, score: 27 }.to_string(),
            "You drew 8. Your total score is 27. BUST!"
        );
        assert_eq!(
            HandEvent::DealerWins {
                dealer: 19,
                player: 15
            }
            .to_string(),
            "Dealer wins with a score of 19 against your 15."
        );
    }
}

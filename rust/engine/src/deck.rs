use rand::seq::SliceRandom;
use rand::Rng;

use crate::cards::{full_range, Card};

/// Builds the full card range in ascending order.
pub fn build() -> Vec<Card> {
    full_range()
}

/// Shuffles `deck` and splits off `k` cards as the removed set.
///
/// Returns `(remaining, removed)`. A full Fisher-Yates shuffle followed by a
/// slice keeps both the removed set and the remaining order uniform.
/// `k` larger than the deck removes everything.
pub fn sample_removed<R: Rng + ?Sized>(
    mut deck: Vec<Card>,
    k: usize,
    rng: &mut R,
) -> (Vec<Card>, Vec<Card>) {
    deck.shuffle(rng);
    let k = k.min(deck.len());
    let remaining = deck.split_off(k);
    (remaining, deck)
}

/// Draw pile for one round. The front card is drawn next.
#[derive(Debug, Clone, Default)]
pub struct Deck {
    cards: Vec<Card>,
    position: usize,
}

impl Deck {
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards, position: 0 }
    }

    /// Front card, or `None` once the deck is exhausted.
    pub fn draw(&mut self) -> Option<Card> {
        let card = self.cards.get(self.position).copied()?;
        self.position += 1;
        Some(card)
    }

    pub fn remaining(&self) -> usize {
        self.cards.len().saturating_sub(self.position)
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Cards not yet drawn, front first.
    pub fn undrawn(&self) -> &[Card] {
        &self.cards[self.position.min(self.cards.len())..]
    }

    pub fn clear(&mut self) {
        self.cards.clear();
        self.position = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use std::collections::HashSet;

    #[test]
    fn sample_removed_partitions_the_range() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let (remaining, removed) = sample_removed(build(), 9, &mut rng);
        assert_eq!(remaining.len(), 24);
        assert_eq!(removed.len(), 9);

        let all: HashSet<Card> = remaining.iter().chain(removed.iter()).copied().collect();
        assert_eq!(all.len(), 33);
    }

    #[test]
    fn oversized_removal_empties_the_deck() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let (remaining, removed) = sample_removed(build(), 100, &mut rng);
        assert!(remaining.is_empty());
        assert_eq!(removed.len(), 33);
    }

    #[test]
    fn draw_yields_front_first_then_none() {
        let cards = build();
        let mut deck = Deck::from_cards(cards[..2].to_vec());
        assert_eq!(deck.remaining(), 2);
        assert_eq!(deck.draw(), Some(cards[0]));
        assert_eq!(deck.undrawn(), &cards[1..2]);
        assert_eq!(deck.draw(), Some(cards[1]));
        assert!(deck.is_empty());
        assert_eq!(deck.draw(), None);
    }

    #[test]
    fn same_seed_same_split() {
        let mut a = ChaCha20Rng::seed_from_u64(99);
        let mut b = ChaCha20Rng::seed_from_u64(99);
        assert_eq!(sample_removed(build(), 9, &mut a), sample_removed(build(), 9, &mut b));
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest card value in play.
pub const MIN_CARD: u8 = 3;
/// Highest card value in play.
pub const MAX_CARD: u8 = 35;
/// Number of distinct cards in the full range.
pub const CARD_COUNT: usize = (MAX_CARD - MIN_CARD + 1) as usize;

/// A numbered card in `[MIN_CARD, MAX_CARD]`.
/// Every value appears exactly once per game; the face value is also its penalty.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Card(u8);

impl Card {
    /// Returns `None` when `value` is outside the card range.
    pub fn new(value: u8) -> Option<Self> {
        (MIN_CARD..=MAX_CARD).contains(&value).then_some(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// True when the two cards differ by exactly one.
    pub fn is_adjacent(self, other: Card) -> bool {
        self.0.abs_diff(other.0) == 1
    }

    /// Zero-based position of the card within the full range.
    pub fn index(self) -> usize {
        (self.0 - MIN_CARD) as usize
    }
}

impl TryFrom<u8> for Card {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Card::new(value)
            .ok_or_else(|| format!("card {value} outside {MIN_CARD}..={MAX_CARD}"))
    }
}

impl From<Card> for u8 {
    fn from(card: Card) -> Self {
        card.0
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// All cards in ascending order.
pub fn full_range() -> Vec<Card> {
    (MIN_CARD..=MAX_CARD).map(Card).collect()
}

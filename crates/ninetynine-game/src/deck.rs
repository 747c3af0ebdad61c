//! The card catalog and draw function.
//!
//! The game is effectively infinite-deck: drawing picks uniformly from a
//! fixed catalog with replacement, so a card never leaves the supply.

use ninetynine_protocol::Card;
use rand::Rng;

/// The fixed population cards are drawn from: values 1–10 plain, plus
/// the four rule cards (0 = pass, 1 = reverse, 2 = shuffle seats,
/// 3 = max out the stack).
pub const CARD_CATALOG: [Card; 14] = [
    Card::plain(1),
    Card::plain(2),
    Card::plain(3),
    Card::plain(4),
    Card::plain(5),
    Card::plain(6),
    Card::plain(7),
    Card::plain(8),
    Card::plain(9),
    Card::plain(10),
    Card::special(0),
    Card::special(1),
    Card::special(2),
    Card::special(3),
];

/// Draws one card uniformly from the catalog.
pub fn draw<R: Rng + ?Sized>(rng: &mut R) -> Card {
    CARD_CATALOG[rng.random_range(0..CARD_CATALOG.len())]
}

//! A seated player and their hand.

use ninetynine_protocol::{Card, PlayerSnapshot, PlayerStatus};

/// One seat at the table. Hands are private; snapshots never include them.
#[derive(Debug, Clone)]
pub struct Player {
    pub player_id: String,
    pub player_name: String,
    pub player_avatar_url: String,
    pub hand: Vec<Card>,
    pub is_out: bool,
    pub status: PlayerStatus,
}

impl Player {
    /// Creates a player waiting for the match to start, with no cards yet.
    pub fn new(
        player_id: impl Into<String>,
        player_name: impl Into<String>,
        player_avatar_url: impl Into<String>,
    ) -> Self {
        Self {
            player_id: player_id.into(),
            player_name: player_name.into(),
            player_avatar_url: player_avatar_url.into(),
            hand: Vec::new(),
            is_out: false,
            status: PlayerStatus::Waiting,
        }
    }

    /// Whether this player currently holds the given card.
    pub fn holds(&self, card: &Card) -> bool {
        self.hand.contains(card)
    }

    /// The public view of this seat.
    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            player_id: self.player_id.clone(),
            player_name: self.player_name.clone(),
            player_avatar_url: self.player_avatar_url.clone(),
            is_out: self.is_out,
            status: self.status,
        }
    }
}

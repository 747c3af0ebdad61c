//! Wire types for the ninetynine session protocol.
//!
//! Every structure in this module travels on the wire: inbound frames are
//! what a player's client sends over its WebSocket connection, outbound
//! frames are what the server pushes back after each state change. Field
//! names follow the client contract (camelCase), so every struct carries
//! explicit serde renames rather than relying on Rust naming.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Card
// ---------------------------------------------------------------------------

/// A single card: a value plus a flag marking it as a rule card.
///
/// Non-special cards add their value to the room's stack; special cards
/// trigger an effect keyed by their value instead. The wire shape is
/// `{"value": 5, "isSpecial": false}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub value: i32,
    #[serde(rename = "isSpecial")]
    pub is_special: bool,
}

impl Card {
    /// A plain value card.
    pub const fn plain(value: i32) -> Self {
        Self {
            value,
            is_special: false,
        }
    }

    /// A special (rule-effect) card.
    pub const fn special(value: i32) -> Self {
        Self {
            value,
            is_special: true,
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_special {
            write!(f, "special-{}", self.value)
        } else {
            write!(f, "{}", self.value)
        }
    }
}

// ---------------------------------------------------------------------------
// Statuses
// ---------------------------------------------------------------------------

/// Lifecycle of a room's match. `Ended` is terminal — a room never hosts
/// a second match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Waiting,
    Playing,
    Ended,
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Playing => write!(f, "playing"),
            Self::Ended => write!(f, "ended"),
        }
    }
}

/// A seated player's display status.
///
/// `Out` means eliminated by the rules (could not play on their turn);
/// `Left` means the connection went away mid-match. Both stay visible in
/// the roster until the match ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerStatus {
    Waiting,
    Playing,
    Out,
    Left,
}

impl fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Playing => write!(f, "playing"),
            Self::Out => write!(f, "out"),
            Self::Left => write!(f, "left"),
        }
    }
}

// ---------------------------------------------------------------------------
// Inbound frames
// ---------------------------------------------------------------------------

/// A frame received from a player's connection.
///
/// The `action` field tags the variant; unknown actions and missing
/// required fields both surface as a deserialization error, which the
/// decoder reports back on the offending connection without dropping it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ClientFrame {
    /// Take (or resume) a seat in the room's match.
    Join {
        #[serde(rename = "userId")]
        user_id: String,
        username: String,
        #[serde(rename = "profilePic", alias = "avatarRef")]
        profile_pic: String,
    },

    /// Ask the server to start the match (owner only).
    Start,

    /// Play one card from the sender's hand.
    Play { card: Card },

    /// Announce departure. The server treats connection closure as the
    /// authoritative leave signal, so this frame is a protocol no-op.
    Leave,
}

// ---------------------------------------------------------------------------
// Outbound frames
// ---------------------------------------------------------------------------

/// One player's public roster entry inside a [`GameSnapshot`].
///
/// Hands are never included here — a viewer's own hand travels in
/// `GameSnapshot::player_cards` only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    #[serde(rename = "playerId")]
    pub player_id: String,
    #[serde(rename = "playerName")]
    pub player_name: String,
    #[serde(rename = "playerAvatarURL")]
    pub player_avatar_url: String,
    #[serde(rename = "isOut")]
    pub is_out: bool,
    pub status: PlayerStatus,
}

/// A redacted view of one room's match state, produced per viewer.
///
/// `player_cards` holds only the receiving player's hand; for a
/// connection that has not joined yet it is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub players: Vec<PlayerSnapshot>,
    pub player_cards: Vec<Card>,
    pub status: GameStatus,
    pub current_player_index: usize,
    pub current_direction: i32,
    pub stack_value: i32,
    pub max_stack_value: i32,
    pub last_played_card: Option<Card>,
}

/// A frame pushed to a player's connection.
///
/// Plain error replies carry an empty `action` and no `gameData`; state
/// broadcasts carry the triggering action label and the viewer's
/// redacted snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerFrame {
    pub error: String,
    pub action: String,
    #[serde(rename = "gameData")]
    pub game_data: Option<GameSnapshot>,
}

impl ServerFrame {
    /// An error reply addressed to a single connection.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            action: String::new(),
            game_data: None,
        }
    }

    /// A state broadcast tagged with the action that produced it.
    pub fn action(label: impl Into<String>, game_data: GameSnapshot) -> Self {
        Self {
            error: String::new(),
            action: label.into(),
            game_data: Some(game_data),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

//! Game state machine and per-room actor for the ninetynine server.
//!
//! [`Game`] is the pure rules engine; [`spawn_game`] wraps it in a
//! tokio task that serializes all mutations through one command channel
//! and announces state changes as [`GameNotice`]s.

pub mod actor;
pub mod config;
pub mod deck;
pub mod error;
pub mod game;
pub mod player;

pub use actor::{GameHandle, GameNotice, spawn_game};
pub use config::GameConfig;
pub use error::GameError;
pub use game::{Game, GameEvent};
pub use player::Player;

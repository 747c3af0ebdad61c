//! Game-level error types.

use thiserror::Error;

/// Errors surfaced by game operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// The play violated turn order, hand membership, or the stack ceiling.
    #[error("invalid play")]
    InvalidPlay,

    /// Start was requested while a match was already in progress.
    #[error("game has already started")]
    AlreadyStarted,

    /// Start was requested with fewer seated players than the minimum.
    #[error("not enough players")]
    NotEnoughPlayers,

    /// The game actor has stopped and can no longer take commands.
    #[error("game is unavailable")]
    Unavailable,
}

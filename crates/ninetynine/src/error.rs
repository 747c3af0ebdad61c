//! Unified error type for the ninetynine server.

use ninetynine_game::GameError;
use ninetynine_protocol::ProtocolError;
use ninetynine_room::RoomError;
use ninetynine_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum NinetynineError {
    /// A transport-level error (connection, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid frame).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A game-level error (invalid play, already started).
    #[error(transparent)]
    Game(#[from] GameError),

    /// A room-level error (not found, unavailable, store).
    #[error(transparent)]
    Room(#[from] RoomError),
}

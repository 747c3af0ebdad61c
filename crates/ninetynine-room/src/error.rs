//! Room-level error types.

use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced while attaching to or operating a room.
#[derive(Debug, Error)]
pub enum RoomError {
    /// No room with this id exists in the store.
    #[error("room {0} does not exist")]
    NotFound(String),

    /// The room's pool actor has stopped and cannot take commands.
    #[error("room {0} is unavailable")]
    Unavailable(String),

    /// The persistence backend failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

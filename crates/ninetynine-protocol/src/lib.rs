//! Wire protocol for the ninetynine session engine.
//!
//! This crate defines the language clients and the server speak:
//!
//! - **Frames** ([`ClientFrame`], [`ServerFrame`], [`GameSnapshot`]) —
//!   the structures that travel on each player's WebSocket connection.
//! - **Codec** ([`Codec`], [`JsonCodec`]) — how frames become bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong in between.
//!
//! The protocol layer sits between transport (raw bytes) and the room
//! actors (game semantics). It knows nothing about connections, pools,
//! or turn order — only frame shapes.

mod codec;
mod error;
mod frames;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use frames::{
    Card, ClientFrame, GameSnapshot, GameStatus, PlayerSnapshot, PlayerStatus,
    ServerFrame,
};

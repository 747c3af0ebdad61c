//! # ninetynine
//!
//! Real-time WebSocket session server for the 99 card game.
//!
//! Clients connect to `/ws/{roomId}`, join with a user id, and play
//! cards against a running stack that must never exceed 99. Each room
//! is a pair of actors (game rules + connection pool) spawned on first
//! attach; every state change is broadcast to all connections with a
//! per-player redacted view.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use ninetynine::prelude::*;
//!
//! # async fn run() -> Result<(), NinetynineError> {
//! let store = Arc::new(InMemoryStore::new());
//! store.insert_room(RoomDoc::new("lobby", "owner-id")).await;
//!
//! let server = ServerBuilder::new().bind("0.0.0.0:8080").build(store).await?;
//! server.run().await
//! # }
//! ```

mod client;
pub mod error;
pub mod server;

pub use error::NinetynineError;
pub use server::{Server, ServerBuilder};

pub mod prelude {
    pub use crate::{NinetynineError, Server, ServerBuilder};
    pub use ninetynine_game::{GameConfig, GameError, Player};
    pub use ninetynine_protocol::{
        Card, ClientFrame, GameSnapshot, GameStatus, PlayerStatus, ServerFrame,
    };
    pub use ninetynine_room::{
        InMemoryStore, RoomDoc, RoomError, RoomStore,
    };
}

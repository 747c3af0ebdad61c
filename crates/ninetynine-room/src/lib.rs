//! Room management for the ninetynine session engine.
//!
//! A room is a pair of actors: the game actor (rules and turn order,
//! from `ninetynine-game`) and the pool actor (connection fan-out and
//! ownership, defined here). [`RoomRegistry`] spawns them on demand for
//! rooms that exist in the [`RoomStore`] and shares them between
//! connections.

pub mod error;
pub mod pool;
pub mod registry;
pub mod store;

pub use error::RoomError;
pub use pool::PoolHandle;
pub use registry::{RoomRegistry, RoomSession};
pub use store::{
    InMemoryStore, RoomDoc, RoomStore, StoreError, StoreUpdate,
    spawn_room_updater,
};

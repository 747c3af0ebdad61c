//! The room registry.
//!
//! Maps room ids to live pool/game actor pairs. Rooms are created
//! lazily: the first connection to a room id that exists in the store
//! spawns its actors, later connections share them, and a pool removes
//! its own entry when it stops.

use std::collections::HashMap;
use std::sync::Arc;

use ninetynine_game::{GameConfig, GameHandle, spawn_game};
use tokio::sync::{Mutex, mpsc};

use crate::error::RoomError;
use crate::pool::{PoolContext, PoolHandle, spawn_pool};
use crate::store::{RoomStore, StoreError, spawn_room_updater};

pub(crate) type SessionMap = Arc<Mutex<HashMap<String, RoomSession>>>;

/// A live room: the handles a connection task needs.
#[derive(Debug, Clone)]
pub struct RoomSession {
    pub room_id: String,
    pub pool: PoolHandle,
    pub game: GameHandle,
}

/// Lazily spawns and hands out room sessions.
#[derive(Debug)]
pub struct RoomRegistry<S> {
    store: Arc<S>,
    config: GameConfig,
    sessions: SessionMap,
}

impl<S> Clone for RoomRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            config: self.config.clone(),
            sessions: self.sessions.clone(),
        }
    }
}

impl<S: RoomStore> RoomRegistry<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_config(store, GameConfig::default())
    }

    pub fn with_config(store: Arc<S>, config: GameConfig) -> Self {
        Self {
            store,
            config,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Attaches to the room, spawning its actors on first use.
    ///
    /// Fails with [`RoomError::NotFound`] when the room id is not in
    /// the store; connecting never creates a room.
    pub async fn attach(&self, room_id: &str) -> Result<RoomSession, RoomError> {
        let doc = self.store.find_room(room_id).await.map_err(|e| match e {
            StoreError::RoomNotFound(id) => RoomError::NotFound(id),
            other => RoomError::Store(other),
        })?;

        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get(room_id) {
            if !session.pool.is_closed() {
                return Ok(session.clone());
            }
        }

        let (notices_tx, notices_rx) = mpsc::unbounded_channel();
        let game = spawn_game(self.config.clone(), notices_tx);
        let updates =
            spawn_room_updater(self.store.clone(), room_id.to_string());
        let pool = spawn_pool(PoolContext {
            room_id: room_id.to_string(),
            owner_id: doc.owner_id,
            game: game.clone(),
            notices: notices_rx,
            store: self.store.clone(),
            updates,
            sessions: self.sessions.clone(),
        });

        let session = RoomSession {
            room_id: room_id.to_string(),
            pool,
            game,
        };
        sessions.insert(room_id.to_string(), session.clone());
        tracing::info!(room_id, "room session spawned");
        Ok(session)
    }

    /// Number of rooms with live actors.
    pub async fn live_rooms(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

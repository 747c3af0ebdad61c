//! Room persistence.
//!
//! The server never blocks gameplay on the store: each live room gets a
//! small updater task fed by an unbounded channel, and writes are
//! applied in the background in arrival order. [`RoomStore`] is the
//! seam a database-backed implementation would plug into;
//! [`InMemoryStore`] is the bundled implementation.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use ninetynine_protocol::GameStatus;
use thiserror::Error;
use tokio::sync::{RwLock, mpsc};

/// The persisted record for one room.
#[derive(Debug, Clone)]
pub struct RoomDoc {
    pub room_id: String,
    /// Creation time, unix seconds.
    pub created_at: i64,
    pub owner_id: String,
    pub max_capacity: usize,
    pub max_spectator: usize,
    /// Lifecycle as stored: "waiting", "playing" or "ended".
    pub status: String,
    /// Ids of players currently seated.
    pub players: Vec<String>,
}

impl RoomDoc {
    /// A fresh room owned by `owner_id`, waiting for players.
    pub fn new(room_id: impl Into<String>, owner_id: impl Into<String>) -> Self {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64;
        Self {
            room_id: room_id.into(),
            created_at,
            owner_id: owner_id.into(),
            max_capacity: 8,
            max_spectator: 8,
            status: GameStatus::Waiting.to_string(),
            players: Vec::new(),
        }
    }
}

/// One background write against a room record.
#[derive(Debug, Clone)]
pub enum StoreUpdate {
    Status(GameStatus),
    Players(Vec<String>),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("room {0} does not exist")]
    RoomNotFound(String),

    #[error("store backend failed: {0}")]
    Backend(String),
}

/// Persistence operations a room backend must provide.
///
/// Returned futures are `Send` so pool actors stay spawnable for any
/// implementation.
pub trait RoomStore: Send + Sync + 'static {
    /// Looks up a room record by id.
    fn find_room(
        &self,
        room_id: &str,
    ) -> impl Future<Output = Result<RoomDoc, StoreError>> + Send;

    /// Applies one field update to a room record.
    fn apply_update(
        &self,
        room_id: &str,
        update: StoreUpdate,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Drops a player from the room roster. When the departing player
    /// owned the room, ownership passes to the first remaining player
    /// and the new owner's id is returned.
    fn remove_player(
        &self,
        room_id: &str,
        player_id: &str,
    ) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;
}

/// In-process store keyed by room id.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    rooms: RwLock<HashMap<String, RoomDoc>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates or replaces a room record.
    pub async fn insert_room(&self, doc: RoomDoc) {
        self.rooms.write().await.insert(doc.room_id.clone(), doc);
    }
}

impl RoomStore for InMemoryStore {
    async fn find_room(&self, room_id: &str) -> Result<RoomDoc, StoreError> {
        self.rooms
            .read()
            .await
            .get(room_id)
            .cloned()
            .ok_or_else(|| StoreError::RoomNotFound(room_id.to_string()))
    }

    async fn apply_update(
        &self,
        room_id: &str,
        update: StoreUpdate,
    ) -> Result<(), StoreError> {
        let mut rooms = self.rooms.write().await;
        let doc = rooms
            .get_mut(room_id)
            .ok_or_else(|| StoreError::RoomNotFound(room_id.to_string()))?;
        match update {
            StoreUpdate::Status(status) => doc.status = status.to_string(),
            StoreUpdate::Players(players) => doc.players = players,
        }
        Ok(())
    }

    async fn remove_player(
        &self,
        room_id: &str,
        player_id: &str,
    ) -> Result<Option<String>, StoreError> {
        let mut rooms = self.rooms.write().await;
        let doc = rooms
            .get_mut(room_id)
            .ok_or_else(|| StoreError::RoomNotFound(room_id.to_string()))?;
        doc.players.retain(|p| p != player_id);
        if doc.owner_id == player_id {
            if let Some(next) = doc.players.first() {
                doc.owner_id = next.clone();
                return Ok(Some(next.clone()));
            }
        }
        Ok(None)
    }
}

/// Spawns the background updater for one room and returns its feed.
///
/// The task drains until its channel closes, or until it has persisted
/// the terminal `ended` status.
pub fn spawn_room_updater<S: RoomStore>(
    store: Arc<S>,
    room_id: String,
) -> mpsc::UnboundedSender<StoreUpdate> {
    let (sender, mut receiver) = mpsc::unbounded_channel::<StoreUpdate>();
    tokio::spawn(async move {
        while let Some(update) = receiver.recv().await {
            let ended =
                matches!(update, StoreUpdate::Status(GameStatus::Ended));
            if let Err(error) = store.apply_update(&room_id, update).await {
                tracing::warn!(%room_id, %error, "room update failed");
            }
            if ended {
                break;
            }
        }
        tracing::debug!(%room_id, "room updater stopped");
    });
    sender
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_find_room_unknown_id() {
        let store = InMemoryStore::new();
        let err = store.find_room("nope").await.unwrap_err();
        assert!(matches!(err, StoreError::RoomNotFound(id) if id == "nope"));
    }

    #[tokio::test]
    async fn test_apply_update_rewrites_fields() {
        let store = InMemoryStore::new();
        store.insert_room(RoomDoc::new("r1", "u1")).await;

        store
            .apply_update("r1", StoreUpdate::Status(GameStatus::Playing))
            .await
            .unwrap();
        store
            .apply_update(
                "r1",
                StoreUpdate::Players(vec!["u1".into(), "u2".into()]),
            )
            .await
            .unwrap();

        let doc = store.find_room("r1").await.unwrap();
        assert_eq!(doc.status, "playing");
        assert_eq!(doc.players, vec!["u1".to_string(), "u2".to_string()]);
    }

    #[tokio::test]
    async fn test_remove_player_reassigns_ownership() {
        let store = InMemoryStore::new();
        let mut doc = RoomDoc::new("r1", "u1");
        doc.players = vec!["u1".into(), "u2".into()];
        store.insert_room(doc).await;

        let new_owner = store.remove_player("r1", "u1").await.unwrap();
        assert_eq!(new_owner.as_deref(), Some("u2"));

        let doc = store.find_room("r1").await.unwrap();
        assert_eq!(doc.owner_id, "u2");
        assert_eq!(doc.players, vec!["u2".to_string()]);
    }

    #[tokio::test]
    async fn test_remove_player_keeps_owner_when_not_owner() {
        let store = InMemoryStore::new();
        let mut doc = RoomDoc::new("r1", "u1");
        doc.players = vec!["u1".into(), "u2".into()];
        store.insert_room(doc).await;

        let new_owner = store.remove_player("r1", "u2").await.unwrap();
        assert_eq!(new_owner, None);
        assert_eq!(store.find_room("r1").await.unwrap().owner_id, "u1");
    }

    #[tokio::test]
    async fn test_updater_applies_in_order_and_stops_after_ended() {
        let store = Arc::new(InMemoryStore::new());
        store.insert_room(RoomDoc::new("r1", "u1")).await;

        let updates = spawn_room_updater(store.clone(), "r1".to_string());
        updates
            .send(StoreUpdate::Status(GameStatus::Playing))
            .unwrap();
        updates
            .send(StoreUpdate::Players(vec!["u1".into(), "u2".into()]))
            .unwrap();
        updates
            .send(StoreUpdate::Status(GameStatus::Ended))
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        let doc = store.find_room("r1").await.unwrap();
        assert_eq!(doc.status, "ended");
        assert_eq!(doc.players, vec!["u1".to_string(), "u2".to_string()]);

        // The updater exits after the terminal write; late sends fail.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(
            updates
                .send(StoreUpdate::Status(GameStatus::Waiting))
                .is_err()
        );
    }
}

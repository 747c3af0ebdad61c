//! The per-room connection pool actor.
//!
//! One pool task owns the fan-out set for a room: which connections are
//! attached, which player each one speaks for, and who owns the room.
//! It consumes the game actor's notices and delivers each player their
//! own redacted view, pushes lifecycle changes to the store updater,
//! and tears the room down once the last connection is gone.

use std::collections::HashMap;
use std::sync::Arc;

use ninetynine_game::{GameHandle, GameNotice};
use ninetynine_protocol::{GameSnapshot, GameStatus, ServerFrame};
use ninetynine_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot};

use crate::error::RoomError;
use crate::registry::SessionMap;
use crate::store::{RoomStore, StoreUpdate};

const COMMAND_CHANNEL_SIZE: usize = 64;

#[derive(Debug)]
enum PoolCommand {
    Register {
        conn_id: ConnectionId,
        sender: mpsc::UnboundedSender<ServerFrame>,
    },
    Bind {
        conn_id: ConnectionId,
        player_id: String,
    },
    Unregister {
        conn_id: ConnectionId,
    },
    Broadcast {
        frame: ServerFrame,
    },
    OwnerId {
        reply: oneshot::Sender<String>,
    },
}

/// Cloneable handle for sending commands to a room's pool actor.
#[derive(Debug, Clone)]
pub struct PoolHandle {
    room_id: String,
    sender: mpsc::Sender<PoolCommand>,
}

impl PoolHandle {
    /// Attaches a connection's outbound frame queue to the room.
    pub async fn register(
        &self,
        conn_id: ConnectionId,
        sender: mpsc::UnboundedSender<ServerFrame>,
    ) -> Result<(), RoomError> {
        self.send(PoolCommand::Register { conn_id, sender }).await
    }

    /// Records which player a connection speaks for, after a join.
    pub async fn bind(
        &self,
        conn_id: ConnectionId,
        player_id: impl Into<String>,
    ) -> Result<(), RoomError> {
        self.send(PoolCommand::Bind {
            conn_id,
            player_id: player_id.into(),
        })
        .await
    }

    /// Detaches a connection, retiring its player's seat when no other
    /// connection speaks for them.
    pub async fn unregister(&self, conn_id: ConnectionId) -> Result<(), RoomError> {
        self.send(PoolCommand::Unregister { conn_id }).await
    }

    /// Sends one literal frame to every attached connection.
    pub async fn broadcast(&self, frame: ServerFrame) -> Result<(), RoomError> {
        self.send(PoolCommand::Broadcast { frame }).await
    }

    /// The current room owner's player id.
    pub async fn owner_id(&self) -> Result<String, RoomError> {
        let (reply, response) = oneshot::channel();
        self.send(PoolCommand::OwnerId { reply }).await?;
        response
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }

    /// Whether the pool actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    pub(crate) fn same_channel(&self, other: &PoolHandle) -> bool {
        self.sender.same_channel(&other.sender)
    }

    async fn send(&self, command: PoolCommand) -> Result<(), RoomError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }
}

/// Everything a pool actor needs at spawn time.
pub(crate) struct PoolContext<S> {
    pub room_id: String,
    pub owner_id: String,
    pub game: GameHandle,
    pub notices: mpsc::UnboundedReceiver<GameNotice>,
    pub store: Arc<S>,
    pub updates: mpsc::UnboundedSender<StoreUpdate>,
    pub sessions: SessionMap,
}

/// Spawns the pool actor for one room and returns its handle.
pub(crate) fn spawn_pool<S: RoomStore>(ctx: PoolContext<S>) -> PoolHandle {
    let (sender, receiver) = mpsc::channel(COMMAND_CHANNEL_SIZE);
    let handle = PoolHandle {
        room_id: ctx.room_id.clone(),
        sender,
    };
    let actor = PoolActor {
        room_id: ctx.room_id,
        owner_id: ctx.owner_id,
        members: HashMap::new(),
        commands: receiver,
        notices: ctx.notices,
        game: ctx.game,
        store: ctx.store,
        updates: ctx.updates,
        sessions: ctx.sessions,
        handle: handle.clone(),
        game_alive: true,
    };
    tokio::spawn(actor.run());
    handle
}

struct Member {
    sender: mpsc::UnboundedSender<ServerFrame>,
    player_id: Option<String>,
}

struct PoolActor<S> {
    room_id: String,
    owner_id: String,
    members: HashMap<ConnectionId, Member>,
    commands: mpsc::Receiver<PoolCommand>,
    notices: mpsc::UnboundedReceiver<GameNotice>,
    game: GameHandle,
    store: Arc<S>,
    updates: mpsc::UnboundedSender<StoreUpdate>,
    sessions: SessionMap,
    handle: PoolHandle,
    /// Cleared once the game actor drops its notice sender, so the
    /// select loop stops polling the closed channel.
    game_alive: bool,
}

impl<S: RoomStore> PoolActor<S> {
    async fn run(mut self) {
        tracing::info!(room_id = %self.room_id, "room pool started");
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => {
                        if self.handle_command(command).await {
                            break;
                        }
                    }
                    None => break,
                },
                notice = self.notices.recv(), if self.game_alive => match notice {
                    Some(notice) => self.handle_notice(notice),
                    None => {
                        self.game_alive = false;
                        if self.members.is_empty() {
                            break;
                        }
                    }
                },
            }
        }
        self.teardown().await;
    }

    /// Returns true when the pool should shut down.
    async fn handle_command(&mut self, command: PoolCommand) -> bool {
        match command {
            PoolCommand::Register { conn_id, sender } => {
                self.members
                    .insert(conn_id, Member { sender, player_id: None });
                tracing::debug!(
                    room_id = %self.room_id,
                    %conn_id,
                    members = self.members.len(),
                    "connection registered",
                );
            }
            PoolCommand::Bind { conn_id, player_id } => {
                if let Some(member) = self.members.get_mut(&conn_id) {
                    member.player_id = Some(player_id);
                }
                let players: Vec<String> = self
                    .members
                    .values()
                    .filter_map(|m| m.player_id.clone())
                    .collect();
                let _ = self.updates.send(StoreUpdate::Players(players));
            }
            PoolCommand::Unregister { conn_id } => {
                let Some(member) = self.members.remove(&conn_id) else {
                    return false;
                };
                tracing::debug!(
                    room_id = %self.room_id,
                    %conn_id,
                    members = self.members.len(),
                    "connection unregistered",
                );
                if let Some(player_id) = member.player_id {
                    // A reconnect binds a second connection to the same
                    // seat; only the last one retires it.
                    let still_bound = self
                        .members
                        .values()
                        .any(|m| m.player_id.as_deref() == Some(&player_id));
                    if !still_bound {
                        self.drop_player(&player_id).await;
                    }
                }
                // No connections left means no session to keep: tear
                // the room down whether or not the match finished.
                if self.members.is_empty() {
                    return true;
                }
            }
            PoolCommand::Broadcast { frame } => {
                let mut dead = Vec::new();
                for (conn_id, member) in &self.members {
                    if member.sender.send(frame.clone()).is_err() {
                        dead.push(*conn_id);
                    }
                }
                for conn_id in dead {
                    self.members.remove(&conn_id);
                }
            }
            PoolCommand::OwnerId { reply } => {
                let _ = reply.send(self.owner_id.clone());
            }
        }
        false
    }

    /// Retires a departed player's seat and reassigns ownership.
    async fn drop_player(&mut self, player_id: &str) {
        let _ = self.game.unregister(player_id).await;
        match self.store.remove_player(&self.room_id, player_id).await {
            Ok(Some(new_owner)) => {
                tracing::info!(
                    room_id = %self.room_id,
                    %new_owner,
                    "room ownership transferred",
                );
                self.owner_id = new_owner;
            }
            Ok(None) => {}
            Err(error) => {
                tracing::warn!(room_id = %self.room_id, %error, "roster update failed");
            }
        }
    }

    fn handle_notice(&mut self, notice: GameNotice) {
        match notice {
            GameNotice::Status(status) => {
                let _ = self.updates.send(StoreUpdate::Status(status));
                if status == GameStatus::Ended {
                    tracing::info!(room_id = %self.room_id, "match ended");
                }
            }
            GameNotice::Action {
                label,
                snapshots,
                observer,
            } => self.broadcast(&label, &snapshots, &observer),
        }
    }

    /// Fans an action out to every connection, each with its own view.
    /// Connections whose queue is gone are dropped from the pool.
    fn broadcast(
        &mut self,
        label: &str,
        snapshots: &HashMap<String, GameSnapshot>,
        observer: &GameSnapshot,
    ) {
        let mut dead = Vec::new();
        for (conn_id, member) in &self.members {
            let view = member
                .player_id
                .as_ref()
                .and_then(|id| snapshots.get(id))
                .unwrap_or(observer)
                .clone();
            let frame = ServerFrame::action(label, view);
            if member.sender.send(frame).is_err() {
                dead.push(*conn_id);
            }
        }
        for conn_id in dead {
            tracing::debug!(room_id = %self.room_id, %conn_id, "dropping dead connection");
            self.members.remove(&conn_id);
        }
    }

    async fn teardown(self) {
        let _ = self.game.stop().await;
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get(&self.room_id) {
            if session.pool.same_channel(&self.handle) {
                sessions.remove(&self.room_id);
            }
        }
        tracing::info!(room_id = %self.room_id, "room pool stopped");
    }
}

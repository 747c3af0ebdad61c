//! The per-room game actor.
//!
//! One tokio task owns the [`Game`] for a room; every mutation arrives
//! on a single command channel, so plays from different connections are
//! applied in one strict order. State changes go out as [`GameNotice`]s
//! on an unbounded channel the room pool consumes.

use std::collections::HashMap;

use ninetynine_protocol::{GameSnapshot, GameStatus};
use tokio::sync::{mpsc, oneshot};

use crate::config::GameConfig;
use crate::error::GameError;
use crate::game::{Game, GameEvent};
use crate::player::Player;

const COMMAND_CHANNEL_SIZE: usize = 64;

/// Commands the actor accepts from connection tasks and the pool.
#[derive(Debug)]
enum GameCommand {
    Register {
        player: Player,
    },
    Start,
    PlayCard {
        player_id: String,
        card: ninetynine_protocol::Card,
        reply: oneshot::Sender<Result<(), GameError>>,
    },
    Unregister {
        player_id: String,
    },
    Snapshot {
        viewer: Option<String>,
        reply: oneshot::Sender<GameSnapshot>,
    },
    Stop,
}

/// A state change announced to the pool for broadcast.
#[derive(Debug)]
pub enum GameNotice {
    /// Something happened; broadcast the label with a per-player view.
    /// `snapshots` maps player id to that player's view (their own hand
    /// in `player_cards`); `observer` is the view with no hand, for
    /// connections that never joined the match.
    Action {
        label: String,
        snapshots: HashMap<String, GameSnapshot>,
        observer: GameSnapshot,
    },
    /// The match moved to a new lifecycle phase.
    Status(GameStatus),
}

/// Cloneable handle for sending commands to a game actor.
#[derive(Debug, Clone)]
pub struct GameHandle {
    sender: mpsc::Sender<GameCommand>,
}

impl GameHandle {
    /// Seats a player (or resumes their seat on reconnect).
    pub async fn register(&self, player: Player) -> Result<(), GameError> {
        self.sender
            .send(GameCommand::Register { player })
            .await
            .map_err(|_| GameError::Unavailable)
    }

    /// Requests the match start. The actor validates and announces the
    /// outcome; callers wanting a synchronous verdict should check the
    /// snapshot first.
    pub async fn start(&self) -> Result<(), GameError> {
        self.sender
            .send(GameCommand::Start)
            .await
            .map_err(|_| GameError::Unavailable)
    }

    /// Validates and applies a play atomically inside the actor.
    pub async fn play_card(
        &self,
        player_id: impl Into<String>,
        card: ninetynine_protocol::Card,
    ) -> Result<(), GameError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(GameCommand::PlayCard {
                player_id: player_id.into(),
                card,
                reply,
            })
            .await
            .map_err(|_| GameError::Unavailable)?;
        response.await.map_err(|_| GameError::Unavailable)?
    }

    /// Removes a player's seat after their connection goes away.
    pub async fn unregister(
        &self,
        player_id: impl Into<String>,
    ) -> Result<(), GameError> {
        self.sender
            .send(GameCommand::Unregister {
                player_id: player_id.into(),
            })
            .await
            .map_err(|_| GameError::Unavailable)
    }

    /// Fetches the current state as seen by `viewer`.
    pub async fn snapshot(
        &self,
        viewer: Option<String>,
    ) -> Result<GameSnapshot, GameError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(GameCommand::Snapshot { viewer, reply })
            .await
            .map_err(|_| GameError::Unavailable)?;
        response.await.map_err(|_| GameError::Unavailable)
    }

    /// Asks the actor to shut down.
    pub async fn stop(&self) -> Result<(), GameError> {
        self.sender
            .send(GameCommand::Stop)
            .await
            .map_err(|_| GameError::Unavailable)
    }

    /// Whether the actor has stopped and dropped its receiver.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Spawns a game actor for one room and returns its handle. Notices are
/// pushed to `notices` in the order the underlying events happened.
pub fn spawn_game(
    config: GameConfig,
    notices: mpsc::UnboundedSender<GameNotice>,
) -> GameHandle {
    let (sender, receiver) = mpsc::channel(COMMAND_CHANNEL_SIZE);
    let actor = GameActor {
        game: Game::new(config),
        receiver,
        notices,
    };
    tokio::spawn(actor.run());
    GameHandle { sender }
}

struct GameActor {
    game: Game,
    receiver: mpsc::Receiver<GameCommand>,
    notices: mpsc::UnboundedSender<GameNotice>,
}

impl GameActor {
    async fn run(mut self) {
        tracing::debug!("game actor started");
        while let Some(command) = self.receiver.recv().await {
            match command {
                GameCommand::Register { player } => {
                    let event = self.game.register(player);
                    self.announce(&[event]);
                }
                GameCommand::Start => {
                    let mut rng = rand::rng();
                    match self.game.start(&mut rng) {
                        Ok(events) => self.announce(&events),
                        Err(error) => {
                            tracing::debug!(%error, "start rejected");
                        }
                    }
                }
                GameCommand::PlayCard {
                    player_id,
                    card,
                    reply,
                } => {
                    let mut rng = rand::rng();
                    match self.game.play_card(&player_id, card, &mut rng) {
                        Ok(events) => {
                            let _ = reply.send(Ok(()));
                            self.announce(&events);
                        }
                        Err(error) => {
                            let _ = reply.send(Err(error));
                        }
                    }
                }
                GameCommand::Unregister { player_id } => {
                    let events = self.game.handle_leave(&player_id);
                    self.announce(&events);
                }
                GameCommand::Snapshot { viewer, reply } => {
                    let _ = reply.send(self.game.snapshot(viewer.as_deref()));
                }
                GameCommand::Stop => break,
            }

            // Once the match has ended and its final notices are out,
            // the actor has nothing left to do.
            if self.game.status() == GameStatus::Ended {
                break;
            }
        }
        tracing::debug!("game actor stopped");
    }

    /// Publishes one notice per event, with views rendered at this
    /// moment so the pool never needs to query back.
    fn announce(&self, events: &[GameEvent]) {
        for event in events {
            match event {
                GameEvent::Started => {
                    let _ = self
                        .notices
                        .send(GameNotice::Status(GameStatus::Playing));
                }
                GameEvent::Ended => {
                    let _ = self
                        .notices
                        .send(GameNotice::Status(GameStatus::Ended));
                }
                _ => {}
            }

            let snapshots = self
                .game
                .players()
                .iter()
                .map(|p| {
                    (
                        p.player_id.clone(),
                        self.game.snapshot(Some(&p.player_id)),
                    )
                })
                .collect();
            let _ = self.notices.send(GameNotice::Action {
                label: event.label(),
                snapshots,
                observer: self.game.snapshot(None),
            });
        }
    }
}

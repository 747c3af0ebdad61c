//! Per-connection client task.
//!
//! Each accepted connection gets its own task running [`run_client`].
//! The flow is:
//!   1. Register an outbound frame queue with the room's pool
//!   2. Spawn a writer pumping that queue onto the socket
//!   3. Loop: receive frames → dispatch join / start / play / leave
//!
//! Error replies go through the same outbound queue as broadcasts, so a
//! connection always sees its frames in a single order.

use ninetynine_game::{GameError, Player};
use ninetynine_protocol::{ClientFrame, Codec, GameStatus, JsonCodec, ServerFrame};
use ninetynine_room::RoomSession;
use ninetynine_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::NinetynineError;

/// Runs one connection from attach to close.
pub(crate) async fn run_client(
    conn: WebSocketConnection,
    session: RoomSession,
    codec: JsonCodec,
) -> Result<(), NinetynineError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, room_id = %session.room_id, "client attached");

    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ServerFrame>();
    if let Err(error) = session.pool.register(conn_id, out_tx.clone()).await {
        let _ = conn.close().await;
        return Err(error.into());
    }

    // Writer: pumps the outbound queue onto the socket until the queue
    // closes or the socket dies.
    let writer_conn = conn.clone();
    let writer = tokio::spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            let bytes = match codec.encode(&frame) {
                Ok(bytes) => bytes,
                Err(error) => {
                    tracing::warn!(%error, "failed to encode frame");
                    continue;
                }
            };
            if writer_conn.send(&bytes).await.is_err() {
                break;
            }
        }
    });

    // The player this connection speaks for, set by the first join.
    let mut player_id: Option<String> = None;

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::debug!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(error) => {
                tracing::debug!(%conn_id, %error, "recv error");
                break;
            }
        };

        let frame: ClientFrame = match codec.decode(&data) {
            Ok(frame) => frame,
            Err(error) => {
                tracing::debug!(%conn_id, %error, "undecodable frame");
                let _ = out_tx.send(ServerFrame::error("Invalid request body"));
                continue;
            }
        };

        match frame {
            ClientFrame::Join {
                user_id,
                username,
                profile_pic,
            } => {
                let player =
                    Player::new(user_id.clone(), username, profile_pic);
                if let Err(error) = session.game.register(player).await {
                    let _ = out_tx.send(ServerFrame::error(error.to_string()));
                    continue;
                }
                if session.pool.bind(conn_id, user_id.clone()).await.is_err() {
                    // The pool is gone; fall through to cleanup.
                    break;
                }
                player_id = Some(user_id);
            }

            ClientFrame::Start => {
                match start_rejection(&session, player_id.as_deref()).await {
                    Ok(Some(message)) => {
                        let _ = out_tx.send(ServerFrame::error(message));
                    }
                    Ok(None) => {
                        if session.game.start().await.is_err() {
                            break;
                        }
                    }
                    Err(error) => {
                        tracing::debug!(%conn_id, %error, "room is gone");
                        break;
                    }
                }
            }

            ClientFrame::Play { card } => {
                let Some(player_id) = player_id.as_deref() else {
                    let _ = out_tx.send(ServerFrame::error("Invalid play"));
                    continue;
                };
                match session.game.play_card(player_id, card).await {
                    Ok(()) => {}
                    Err(GameError::InvalidPlay) => {
                        let _ = out_tx.send(ServerFrame::error("Invalid play"));
                    }
                    Err(error) => {
                        let _ =
                            out_tx.send(ServerFrame::error(error.to_string()));
                    }
                }
            }

            ClientFrame::Leave => {
                // Departure is signalled by closing the connection; the
                // frame itself changes nothing.
                tracing::debug!(%conn_id, "client sent leave");
            }
        }
    }

    let _ = session.pool.unregister(conn_id).await;
    let _ = conn.close().await;
    drop(out_tx);
    let _ = writer.await;
    tracing::debug!(%conn_id, "client detached");
    Ok(())
}

/// Checks a start request against the room's current state. Returns the
/// rejection message to send, or `None` when the request may proceed.
/// The game actor re-validates, so a race here cannot corrupt state.
async fn start_rejection(
    session: &RoomSession,
    player_id: Option<&str>,
) -> Result<Option<&'static str>, NinetynineError> {
    let snapshot = session.game.snapshot(None).await?;
    if snapshot.status != GameStatus::Waiting {
        return Ok(Some("Game has already started"));
    }
    if snapshot.players.len() < 2 {
        return Ok(Some("Not enough players"));
    }
    let owner_id = session.pool.owner_id().await?;
    if player_id != Some(owner_id.as_str()) {
        return Ok(Some("Only owner can start the game"));
    }
    Ok(None)
}

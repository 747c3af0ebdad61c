//! `Server` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → room → game. Each
//! accepted connection is routed by its request path (`/ws/{roomId}`)
//! to the room it asked for, then handed to the per-connection client
//! task.

use std::sync::Arc;

use ninetynine_protocol::{Codec, JsonCodec, ServerFrame};
use ninetynine_room::{RoomError, RoomRegistry, RoomStore};
use ninetynine_transport::{Connection, Transport, WebSocketConnection, WebSocketTransport};

use ninetynine_game::GameConfig;

use crate::NinetynineError;
use crate::client::run_client;

/// Builder for configuring and starting a server.
///
/// # Example
///
/// ```rust,ignore
/// let store = Arc::new(InMemoryStore::new());
/// let server = ServerBuilder::new()
///     .bind("0.0.0.0:8080")
///     .build(store)
///     .await?;
/// server.run().await
/// ```
pub struct ServerBuilder {
    bind_addr: String,
    game_config: GameConfig,
}

impl ServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            game_config: GameConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Overrides the per-room match configuration.
    pub fn game_config(mut self, config: GameConfig) -> Self {
        self.game_config = config;
        self
    }

    /// Binds the listener and builds the server around the given store.
    pub async fn build<S: RoomStore>(
        self,
        store: Arc<S>,
    ) -> Result<Server<S>, NinetynineError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let registry = RoomRegistry::with_config(store, self.game_config);
        Ok(Server {
            transport,
            registry,
            codec: JsonCodec,
        })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running ninetynine server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct Server<S> {
    transport: WebSocketTransport,
    registry: RoomRegistry<S>,
    codec: JsonCodec,
}

impl<S: RoomStore> Server<S> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a client task for each.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), NinetynineError> {
        tracing::info!("ninetynine server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let registry = self.registry.clone();
                    let codec = self.codec;
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection(conn, registry, codec).await
                        {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

/// Routes one accepted connection to its room, or rejects it.
async fn handle_connection<S: RoomStore>(
    conn: WebSocketConnection,
    registry: RoomRegistry<S>,
    codec: JsonCodec,
) -> Result<(), NinetynineError> {
    let Some(room_id) = room_id_from_path(conn.path()) else {
        tracing::debug!(path = conn.path(), "rejecting unroutable path");
        return reject(&conn, &codec, "Room does not exist").await;
    };

    let session = match registry.attach(room_id).await {
        Ok(session) => session,
        Err(RoomError::NotFound(id)) => {
            tracing::debug!(room_id = %id, "rejecting unknown room");
            return reject(&conn, &codec, "Room does not exist").await;
        }
        Err(e) => return Err(e.into()),
    };

    run_client(conn, session, codec).await
}

/// Sends one error frame and closes the connection.
async fn reject(
    conn: &WebSocketConnection,
    codec: &JsonCodec,
    message: &str,
) -> Result<(), NinetynineError> {
    let bytes = codec.encode(&ServerFrame::error(message))?;
    conn.send(&bytes).await?;
    conn.close().await?;
    Ok(())
}

/// Extracts the room id from a `/ws/{roomId}` request path.
fn room_id_from_path(path: &str) -> Option<&str> {
    let rest = path.strip_prefix("/ws/")?;
    let room_id = rest.strip_suffix('/').unwrap_or(rest);
    if room_id.is_empty() || room_id.contains('/') {
        return None;
    }
    Some(room_id)
}

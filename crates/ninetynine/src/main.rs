//! Server binary.
//!
//! Configuration comes from the environment:
//!   - `NINETYNINE_ADDR`  — listen address (default `127.0.0.1:8080`)
//!   - `NINETYNINE_ROOMS` — comma-separated `roomId=ownerId` pairs to
//!     seed into the in-memory store at boot
//!   - `RUST_LOG`         — tracing filter (default `info`)

use std::sync::Arc;

use ninetynine::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), NinetynineError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::var("NINETYNINE_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:8080".to_string());

    let store = Arc::new(InMemoryStore::new());
    if let Ok(rooms) = std::env::var("NINETYNINE_ROOMS") {
        for entry in rooms.split(',').filter(|e| !e.is_empty()) {
            match entry.split_once('=') {
                Some((room_id, owner_id)) => {
                    tracing::info!(room_id, owner_id, "seeding room");
                    store.insert_room(RoomDoc::new(room_id, owner_id)).await;
                }
                None => {
                    tracing::warn!(entry, "ignoring malformed room entry");
                }
            }
        }
    }

    let server = ServerBuilder::new().bind(&addr).build(store).await?;
    tracing::info!(%addr, "starting ninetynine server");
    server.run().await
}

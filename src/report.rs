//! report.rs — 逐房對帳：參與者數 + 聽眾數 → rooms 表
use futures_util::{stream, StreamExt};
use tracing::{info, warn, error};

use crate::{
    services::ListenerService,
    state::{ListenerCount, RoomOutcome, RoomSnapshot},
    store::Store,
};

/// Reconciles one room. Never fails: every error ends up in the outcome.
pub async fn reconcile(room: &RoomSnapshot, listeners: &ListenerService, store: &Store) -> RoomOutcome {
    let count = match listeners.listener_count(&room.name).await {
        Ok(n) => ListenerCount::Known(n),
        Err(e) => {
            warn!(room = %room.name, error = %e, "listener lookup failed");
            ListenerCount::Unknown
        }
    };

    info!(
        room = %room.name,
        participants = room.participant_count,
        listeners = %count,
        "updating room"
    );

    let persist_error = match store.upsert(room, count).await {
        Ok(()) => None,
        Err(e) => {
            error!(room = %room.name, error = %e, "room upsert failed");
            Some(e.to_string())
        }
    };

    RoomOutcome {
        name:              room.name.clone(),
        participant_count: room.participant_count,
        listeners:         count,
        persist_error,
    }
}

/// Fans out over the rooms with at most `concurrency` lookups in flight.
/// Outcomes come back in the same order as `rooms`.
pub async fn reconcile_all(
    rooms: &[RoomSnapshot],
    listeners: &ListenerService,
    store: &Store,
    concurrency: usize,
) -> Vec<RoomOutcome> {
    stream::iter(rooms)
        .map(|room| reconcile(room, listeners, store))
        .buffered(concurrency.max(1))
        .collect()
        .await
}

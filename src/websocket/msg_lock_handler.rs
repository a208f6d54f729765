use tracing::debug;

use crate::models::{ClientId, LockMessage, ServerMessage};
use crate::table::{LockOutcome, TableError};
use crate::ws::TableRoom;

/// Handle acquire_lock - a re-acquire by the holder is not broadcast again
pub async fn handle_acquire_lock(room: &TableRoom, client_id: ClientId, msg: LockMessage) -> Result<bool, TableError> {
    debug!("Client {} acquiring lock on {} in table {}", client_id, msg.cell, room.id());

    let cell = msg.cell;
    room.mutate(client_id, move |state| {
        state.check_layout(msg.layout_version)?;
        match state.acquire_lock(cell, client_id)? {
            LockOutcome::Acquired => Ok(Some(ServerMessage::AcquireLock { client_id, cell })),
            LockOutcome::AlreadyHeld => Ok(None),
        }
    })
    .await
}

/// Handle release_lock - only the holder's own lock is released
pub async fn handle_release_lock(room: &TableRoom, client_id: ClientId, msg: LockMessage) -> Result<bool, TableError> {
    debug!("Client {} releasing lock on {} in table {}", client_id, msg.cell, room.id());

    let cell = msg.cell;
    room.mutate(client_id, move |state| {
        state.check_layout(msg.layout_version)?;
        Ok(state
            .release_lock(cell, client_id)
            .then_some(ServerMessage::ReleaseLock { cell }))
    })
    .await
}

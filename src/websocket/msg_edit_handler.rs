use tracing::debug;

use crate::models::{CellEdit, ClientId, ServerMessage};
use crate::table::TableError;
use crate::ws::TableRoom;

/// Handle insert/delete/replace - Check, Apply and Broadcast
pub async fn handle_edit_message(room: &TableRoom, client_id: ClientId, edit: CellEdit) -> Result<bool, TableError> {
    debug!("Edit from client {} on table {} at {}: {:?}", client_id, room.id(), edit.cell, edit.diff);

    let CellEdit { cell, diff, layout_version } = edit;
    room.mutate(client_id, move |state| {
        state.check_layout(layout_version)?;
        state.apply_text_diff(cell, &diff, client_id)?;
        Ok(ServerMessage::from_edit(client_id, cell, diff))
    })
    .await
}

use tracing::debug;

use crate::models::{ClientId, InsertColumnsMessage, InsertRowsMessage, ServerMessage};
use crate::table::TableError;
use crate::ws::TableRoom;

/// Handle insert_rows - structural changes bump the layout version
pub async fn handle_insert_rows(room: &TableRoom, client_id: ClientId, msg: InsertRowsMessage) -> Result<bool, TableError> {
    debug!(
        "Client {} inserting {} rows at {} in table {}",
        client_id, msg.num_rows, msg.insertion_index, room.id()
    );

    room.mutate(client_id, move |state| {
        state.insert_rows(msg.insertion_index, msg.num_rows)?;
        if msg.num_rows == 0 {
            return Ok(None);
        }
        Ok(Some(ServerMessage::InsertRows {
            client_id,
            insertion_index: msg.insertion_index,
            num_rows: msg.num_rows,
            layout_version: state.layout_version(),
        }))
    })
    .await
}

/// Handle insert_columns
pub async fn handle_insert_columns(room: &TableRoom, client_id: ClientId, msg: InsertColumnsMessage) -> Result<bool, TableError> {
    debug!(
        "Client {} inserting {} columns at {} in table {}",
        client_id, msg.num_cols, msg.insertion_index, room.id()
    );

    room.mutate(client_id, move |state| {
        state.insert_columns(msg.insertion_index, msg.num_cols)?;
        if msg.num_cols == 0 {
            return Ok(None);
        }
        Ok(Some(ServerMessage::InsertColumns {
            client_id,
            insertion_index: msg.insertion_index,
            num_cols: msg.num_cols,
            layout_version: state.layout_version(),
        }))
    })
    .await
}

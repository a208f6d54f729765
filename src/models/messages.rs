use serde::{Deserialize, Serialize};

use super::{CellData, CellRef, ClientId};
use crate::text::Diff;

// Client → server. Any `client_id` a client sends is ignored: the session's
// own id is stamped on everything it broadcasts.

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InsertMessage {
    pub cell: CellRef,
    pub index: usize,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_version: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DeleteMessage {
    pub cell: CellRef,
    pub start: usize,
    pub end: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_version: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReplaceMessage {
    pub cell: CellRef,
    pub start: usize,
    pub end: usize,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_version: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LockMessage {
    pub cell: CellRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_version: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InsertRowsMessage {
    pub insertion_index: usize,
    pub num_rows: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InsertColumnsMessage {
    pub insertion_index: usize,
    pub num_cols: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Insert(InsertMessage),
    Delete(DeleteMessage),
    Replace(ReplaceMessage),
    AcquireLock(LockMessage),
    ReleaseLock(LockMessage),
    InsertRows(InsertRowsMessage),
    InsertColumns(InsertColumnsMessage),
}

impl ClientMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::Insert(_) => "insert",
            ClientMessage::Delete(_) => "delete",
            ClientMessage::Replace(_) => "replace",
            ClientMessage::AcquireLock(_) => "acquire_lock",
            ClientMessage::ReleaseLock(_) => "release_lock",
            ClientMessage::InsertRows(_) => "insert_rows",
            ClientMessage::InsertColumns(_) => "insert_columns",
        }
    }
}

/// A text edit addressed to one cell, in the shape the table state consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct CellEdit {
    pub cell: CellRef,
    pub diff: Diff,
    pub layout_version: Option<u64>,
}

impl From<InsertMessage> for CellEdit {
    fn from(msg: InsertMessage) -> Self {
        Self {
            cell: msg.cell,
            diff: Diff::Insert { index: msg.index, text: msg.text },
            layout_version: msg.layout_version,
        }
    }
}

impl From<DeleteMessage> for CellEdit {
    fn from(msg: DeleteMessage) -> Self {
        Self {
            cell: msg.cell,
            diff: Diff::Delete { start: msg.start, end: msg.end },
            layout_version: msg.layout_version,
        }
    }
}

impl From<ReplaceMessage> for CellEdit {
    fn from(msg: ReplaceMessage) -> Self {
        Self {
            cell: msg.cell,
            diff: Diff::Replace { start: msg.start, end: msg.end, text: msg.text },
            layout_version: msg.layout_version,
        }
    }
}

// Server → client

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InitMessage {
    pub client_id: ClientId,
    pub table: Vec<Vec<CellData>>,
    pub layout_version: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Init(InitMessage),
    Insert {
        client_id: ClientId,
        cell: CellRef,
        index: usize,
        text: String,
    },
    Delete {
        client_id: ClientId,
        cell: CellRef,
        start: usize,
        end: usize,
    },
    Replace {
        client_id: ClientId,
        cell: CellRef,
        start: usize,
        end: usize,
        text: String,
    },
    AcquireLock {
        client_id: ClientId,
        cell: CellRef,
    },
    ReleaseLock {
        cell: CellRef,
    },
    InsertRows {
        client_id: ClientId,
        insertion_index: usize,
        num_rows: usize,
        layout_version: u64,
    },
    InsertColumns {
        client_id: ClientId,
        insertion_index: usize,
        num_cols: usize,
        layout_version: u64,
    },
    Error {
        message: String,
    },
}

impl ServerMessage {
    /// The broadcast form of an applied edit. `Diff::None` has no wire form.
    pub fn from_edit(client_id: ClientId, cell: CellRef, diff: Diff) -> Option<Self> {
        match diff {
            Diff::None => None,
            Diff::Insert { index, text } => Some(ServerMessage::Insert { client_id, cell, index, text }),
            Diff::Delete { start, end } => Some(ServerMessage::Delete { client_id, cell, start, end }),
            Diff::Replace { start, end, text } => {
                Some(ServerMessage::Replace { client_id, cell, start, end, text })
            }
        }
    }
}

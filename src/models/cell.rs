use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Per-table connection identifier, assigned by the server.
pub type ClientId = u64;

/// Identifier of a table in the persistence service.
pub type TableId = i64;

/// Grid coordinate, `[row, col]` on the wire.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(from = "(usize, usize)", into = "(usize, usize)")]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

impl CellRef {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl From<(usize, usize)> for CellRef {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

impl From<CellRef> for (usize, usize) {
    fn from(cell: CellRef) -> Self {
        (cell.row, cell.col)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// A cell as sent to clients in `init` and snapshots.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default, ToSchema)]
pub struct CellData {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<ClientId>,
}

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{CellData, TableId};

/// Current contents of a loaded table
#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct TableSnapshotResponse {
    pub table_id: TableId,
    pub rows: usize,
    pub cols: usize,
    pub layout_version: u64,
    pub table: Vec<Vec<CellData>>,
}

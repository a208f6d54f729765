use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{error, info};

use super::room::TableRoom;
use crate::db::dbtables;
use crate::models::TableId;
use crate::table::{GridLimits, TableState};

/// Shape of a table created without a stored definition.
#[derive(Debug, Clone, Copy)]
pub struct TableDefaults {
    pub rows: usize,
    pub cols: usize,
    pub limits: GridLimits,
}

/// Process-wide owner of every loaded table.
///
/// Tables are loaded lazily on their first connection and stay loaded until
/// shutdown, so client ids are never reused within a table.
pub struct TableRegistry {
    tables: RwLock<HashMap<TableId, Arc<TableRoom>>>,
    defaults: TableDefaults,
}

impl TableRegistry {
    pub fn new(defaults: TableDefaults) -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            defaults,
        }
    }

    pub async fn get(&self, table_id: TableId) -> Option<Arc<TableRoom>> {
        self.tables.read().await.get(&table_id).cloned()
    }

    /// Get a loaded table, loading it first if needed.
    pub async fn get_or_load(&self, table_id: TableId) -> Arc<TableRoom> {
        if let Some(room) = self.get(table_id).await {
            return room;
        }

        // Load outside the map lock; a concurrent first load is discarded below.
        let state = self.load_state(table_id).await;

        let mut tables = self.tables.write().await;
        tables
            .entry(table_id)
            .or_insert_with(|| {
                info!("Table {} loaded ({}x{})", table_id, state.rows(), state.cols());
                Arc::new(TableRoom::new(table_id, state))
            })
            .clone()
    }

    pub async fn rooms(&self) -> Vec<Arc<TableRoom>> {
        self.tables.read().await.values().cloned().collect()
    }

    async fn load_state(&self, table_id: TableId) -> TableState {
        let limits = self.defaults.limits;

        if let Some(db) = dbtables::get_db() {
            match db.load_table(table_id).await {
                Ok(Some(stored)) => {
                    info!(
                        "Loaded table {} (owner {}) from database with {} stored cells",
                        stored.id,
                        stored.owner_id,
                        stored.cells.len()
                    );
                    return TableState::with_texts(
                        stored.rows.min(limits.max_rows),
                        stored.cols.min(limits.max_cols),
                        limits,
                        stored.cells,
                    );
                }
                Ok(None) => info!("Table {} not found in database, using defaults", table_id),
                Err(e) => error!("Database error loading table {}: {}", table_id, e),
            }
        }

        TableState::new(self.defaults.rows, self.defaults.cols, limits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> TableRegistry {
        TableRegistry::new(TableDefaults { rows: 3, cols: 4, limits: GridLimits::default() })
    }

    #[tokio::test]
    async fn loads_tables_lazily_with_defaults() {
        let registry = registry();
        assert!(registry.get(1).await.is_none());

        let room = registry.get_or_load(1).await;
        let snapshot = room.snapshot().await;
        assert_eq!((snapshot.rows, snapshot.cols), (3, 4));
        assert!(registry.get(1).await.is_some());
    }

    #[tokio::test]
    async fn same_id_returns_the_same_room() {
        let registry = registry();
        let a = registry.get_or_load(5).await;
        let b = registry.get_or_load(5).await;
        let c = registry.get_or_load(6).await;
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(registry.rooms().await.len(), 2);
    }
}

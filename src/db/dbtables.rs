use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Error as SqlxError, Row};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::info;

use crate::models::{CellRef, TableId};

// Global database instance
static DB: OnceCell<Arc<DbTables>> = OnceCell::const_new();

/// Initialize the global database connection
///
/// # Arguments
/// * `database_url` - PostgreSQL connection string
pub async fn init_db(database_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let db = DbTables::new(database_url).await?;
    DB.set(Arc::new(db))
        .map_err(|_| "Database already initialized")?;
    Ok(())
}

/// Get the global database instance
pub fn get_db() -> Option<Arc<DbTables>> {
    DB.get().cloned()
}

/// A table as stored by the table service
#[derive(Debug, Clone)]
pub struct StoredTable {
    pub id: TableId,
    pub owner_id: i64,
    pub rows: usize,
    pub cols: usize,
    pub cells: Vec<(CellRef, String)>,
}

/// Read-only access to the table service's database
pub struct DbTables {
    pool: PgPool,
}

impl DbTables {
    /// Create a new database connection pool
    pub async fn new(database_url: &str) -> Result<Self, SqlxError> {
        info!("Connecting to database...");

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .connect(database_url)
            .await?;

        info!("Database connection pool created successfully");

        Ok(Self { pool })
    }

    /// Load a table's dimensions and stored cell texts
    ///
    /// # Returns
    /// * `Ok(None)` if no table with that id exists
    pub async fn load_table(&self, table_id: TableId) -> Result<Option<StoredTable>, SqlxError> {
        let row = sqlx::query("SELECT id, owner_id, width, height FROM tables WHERE id = $1")
            .bind(table_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let width: i32 = row.try_get("width")?;
        let height: i32 = row.try_get("height")?;

        let cell_rows = sqlx::query(
            "SELECT row_num, column_num, text FROM table_cells WHERE table_id = $1 ORDER BY row_num, column_num",
        )
        .bind(table_id)
        .fetch_all(&self.pool)
        .await?;

        let mut cells = Vec::with_capacity(cell_rows.len());
        for cell_row in cell_rows {
            let row_num: i32 = cell_row.try_get("row_num")?;
            let column_num: i32 = cell_row.try_get("column_num")?;
            let text: String = cell_row.try_get("text")?;
            // Negative coordinates cannot address the grid.
            if let (Ok(r), Ok(c)) = (usize::try_from(row_num), usize::try_from(column_num)) {
                cells.push((CellRef::new(r, c), text));
            }
        }

        Ok(Some(StoredTable {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            rows: usize::try_from(height).unwrap_or(0),
            cols: usize::try_from(width).unwrap_or(0),
            cells,
        }))
    }

    /// Check whether a user owns a table or has it shared with them
    pub async fn user_has_access(&self, table_id: TableId, user_id: i64) -> Result<bool, SqlxError> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM tables WHERE id = $1 AND owner_id = $2
                UNION ALL
                SELECT 1 FROM table_shares WHERE table_id = $1 AND user_id = $2
            ) AS has_access
            "#,
        )
        .bind(table_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        row.try_get("has_access")
    }
}

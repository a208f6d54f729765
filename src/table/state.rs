use std::iter;

use thiserror::Error;

use crate::models::{CellData, CellRef, ClientId};
use crate::text::{patch, Diff, PatchError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("cell {cell} is outside the {rows}x{cols} grid")]
    OutOfBounds { cell: CellRef, rows: usize, cols: usize },

    #[error("insertion index {index} is outside 0..={len}")]
    InsertionOutOfBounds { index: usize, len: usize },

    #[error("grid would exceed the limit of {limit} {axis}")]
    TooLarge { axis: &'static str, limit: usize },

    #[error("cell {cell} is locked by client {owner}")]
    LockConflict { cell: CellRef, owner: ClientId },

    #[error("cell {cell} is already locked by client {owner}")]
    AlreadyLocked { cell: CellRef, owner: ClientId },

    #[error("layout version {sent} is stale, current is {current}")]
    StaleLayout { sent: u64, current: u64 },

    #[error("malformed diff: {0}")]
    MalformedDiff(#[from] PatchError),
}

impl TableError {
    /// Whether the originator should be told. Everything else is dropped silently.
    pub fn is_malformed(&self) -> bool {
        matches!(self, TableError::MalformedDiff(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    pub lock_owner: Option<ClientId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLimits {
    pub max_rows: usize,
    pub max_cols: usize,
}

impl Default for GridLimits {
    fn default() -> Self {
        Self { max_rows: 10_000, max_cols: 1_000 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOutcome {
    Acquired,
    AlreadyHeld,
}

/// Authoritative contents of one table.
///
/// Cells live in a single row-major arena indexed by `row * cols + col`.
/// Lock ownership is stored on the cells themselves, so it moves with them
/// when rows or columns are inserted.
#[derive(Debug, Clone)]
pub struct TableState {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
    layout_version: u64,
    limits: GridLimits,
}

impl TableState {
    pub fn new(rows: usize, cols: usize, limits: GridLimits) -> Self {
        Self {
            rows,
            cols,
            cells: vec![Cell::default(); rows * cols],
            layout_version: 0,
            limits,
        }
    }

    /// Build a table seeded with stored texts. Entries outside the grid are skipped.
    pub fn with_texts(
        rows: usize,
        cols: usize,
        limits: GridLimits,
        texts: impl IntoIterator<Item = (CellRef, String)>,
    ) -> Self {
        let mut table = Self::new(rows, cols, limits);
        for (cell, text) in texts {
            if let Some(idx) = table.index(cell) {
                table.cells[idx].text = text;
            }
        }
        table
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn layout_version(&self) -> u64 {
        self.layout_version
    }

    pub fn cell(&self, cell: CellRef) -> Option<&Cell> {
        self.index(cell).map(|idx| &self.cells[idx])
    }

    fn index(&self, cell: CellRef) -> Option<usize> {
        (cell.row < self.rows && cell.col < self.cols).then(|| cell.row * self.cols + cell.col)
    }

    fn index_or_err(&self, cell: CellRef) -> Result<usize, TableError> {
        self.index(cell).ok_or(TableError::OutOfBounds { cell, rows: self.rows, cols: self.cols })
    }

    /// Reject an operation addressed against a grid shape that no longer exists.
    /// Clients that do not report a version are trusted.
    pub fn check_layout(&self, sent: Option<u64>) -> Result<(), TableError> {
        match sent {
            Some(sent) if sent != self.layout_version => Err(TableError::StaleLayout {
                sent,
                current: self.layout_version,
            }),
            _ => Ok(()),
        }
    }

    /// Patch the text of `cell` on behalf of `client` and return the new text.
    pub fn apply_text_diff(&mut self, cell: CellRef, diff: &Diff, client: ClientId) -> Result<&str, TableError> {
        let idx = self.index_or_err(cell)?;
        let target = &mut self.cells[idx];
        if let Some(owner) = target.lock_owner {
            if owner != client {
                return Err(TableError::LockConflict { cell, owner });
            }
        }
        target.text = patch(&target.text, diff)?;
        Ok(&target.text)
    }

    pub fn acquire_lock(&mut self, cell: CellRef, client: ClientId) -> Result<LockOutcome, TableError> {
        let idx = self.index_or_err(cell)?;
        let target = &mut self.cells[idx];
        match target.lock_owner {
            Some(owner) if owner == client => Ok(LockOutcome::AlreadyHeld),
            Some(owner) => Err(TableError::AlreadyLocked { cell, owner }),
            None => {
                target.lock_owner = Some(client);
                Ok(LockOutcome::Acquired)
            }
        }
    }

    /// Release `client`'s lock on `cell`. Returns whether a lock was released;
    /// a lock held by anyone else is left alone.
    pub fn release_lock(&mut self, cell: CellRef, client: ClientId) -> bool {
        let Some(idx) = self.index(cell) else {
            return false;
        };
        let target = &mut self.cells[idx];
        if target.lock_owner == Some(client) {
            target.lock_owner = None;
            true
        } else {
            false
        }
    }

    /// Release every lock `client` holds, returning the cells in row-major order.
    pub fn release_all(&mut self, client: ClientId) -> Vec<CellRef> {
        let cols = self.cols;
        self.cells
            .iter_mut()
            .enumerate()
            .filter(|(_, c)| c.lock_owner == Some(client))
            .map(|(idx, c)| {
                c.lock_owner = None;
                CellRef::new(idx / cols, idx % cols)
            })
            .collect()
    }

    #[cfg(test)]
    pub fn locked_by(&self, client: ClientId) -> Vec<CellRef> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.lock_owner == Some(client))
            .map(|(idx, _)| CellRef::new(idx / self.cols, idx % self.cols))
            .collect()
    }

    pub fn lock_count(&self) -> usize {
        self.cells.iter().filter(|c| c.lock_owner.is_some()).count()
    }

    /// Insert `count` blank rows before row `at`, shifting later rows down.
    pub fn insert_rows(&mut self, at: usize, count: usize) -> Result<(), TableError> {
        if at > self.rows {
            return Err(TableError::InsertionOutOfBounds { index: at, len: self.rows });
        }
        if count == 0 {
            return Ok(());
        }
        let rows = self
            .rows
            .checked_add(count)
            .filter(|rows| *rows <= self.limits.max_rows)
            .ok_or(TableError::TooLarge { axis: "rows", limit: self.limits.max_rows })?;

        let offset = at * self.cols;
        self.cells
            .splice(offset..offset, iter::repeat_with(Cell::default).take(count * self.cols));
        self.rows = rows;
        self.layout_version += 1;
        Ok(())
    }

    /// Insert `count` blank columns before column `at` in every row.
    pub fn insert_columns(&mut self, at: usize, count: usize) -> Result<(), TableError> {
        if at > self.cols {
            return Err(TableError::InsertionOutOfBounds { index: at, len: self.cols });
        }
        if count == 0 {
            return Ok(());
        }
        let cols = self
            .cols
            .checked_add(count)
            .filter(|cols| *cols <= self.limits.max_cols)
            .ok_or(TableError::TooLarge { axis: "columns", limit: self.limits.max_cols })?;

        let mut cells = Vec::with_capacity(self.rows * cols);
        let mut old = std::mem::take(&mut self.cells).into_iter();
        for _ in 0..self.rows {
            cells.extend(old.by_ref().take(at));
            cells.extend(iter::repeat_with(Cell::default).take(count));
            cells.extend(old.by_ref().take(self.cols - at));
        }
        self.cells = cells;
        self.cols = cols;
        self.layout_version += 1;
        Ok(())
    }

    /// Value copy of the grid in wire form.
    pub fn snapshot(&self) -> Vec<Vec<CellData>> {
        if self.cols == 0 {
            return vec![Vec::new(); self.rows];
        }
        self.cells
            .chunks(self.cols)
            .map(|row| {
                row.iter()
                    .map(|c| CellData { text: c.text.clone(), owner_id: c.lock_owner })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: usize, cols: usize) -> TableState {
        TableState::new(rows, cols, GridLimits::default())
    }

    fn insert(index: usize, text: &str) -> Diff {
        Diff::Insert { index, text: text.to_string() }
    }

    fn texts(t: &TableState) -> Vec<Vec<String>> {
        t.snapshot()
            .into_iter()
            .map(|row| row.into_iter().map(|c| c.text).collect())
            .collect()
    }

    #[test]
    fn new_table_is_blank_and_unlocked() {
        let t = table(3, 3);
        assert_eq!(t.snapshot(), vec![vec![CellData::default(); 3]; 3]);
        assert_eq!(t.lock_count(), 0);
    }

    #[test]
    fn apply_text_diff_stores_patched_text() {
        let mut t = table(3, 3);
        let cell = CellRef::new(1, 2);
        assert_eq!(t.apply_text_diff(cell, &insert(0, "hi"), 1).unwrap(), "hi");
        assert_eq!(t.apply_text_diff(cell, &insert(2, "!"), 2).unwrap(), "hi!");
        assert_eq!(t.cell(cell).unwrap().text, "hi!");
    }

    #[test]
    fn apply_text_diff_rejects_out_of_bounds() {
        let mut t = table(3, 3);
        let err = t.apply_text_diff(CellRef::new(3, 0), &insert(0, "x"), 1).unwrap_err();
        assert!(matches!(err, TableError::OutOfBounds { rows: 3, cols: 3, .. }));
    }

    #[test]
    fn locked_cell_rejects_other_writers() {
        let mut t = table(2, 2);
        let cell = CellRef::new(0, 0);
        t.apply_text_diff(cell, &insert(0, "mine"), 1).unwrap();
        t.acquire_lock(cell, 1).unwrap();

        let err = t.apply_text_diff(cell, &insert(0, "theirs"), 2).unwrap_err();
        assert_eq!(err, TableError::LockConflict { cell, owner: 1 });
        assert_eq!(t.cell(cell).unwrap().text, "mine");

        assert_eq!(t.apply_text_diff(cell, &insert(4, "!"), 1).unwrap(), "mine!");
    }

    #[test]
    fn malformed_diff_leaves_text_untouched() {
        let mut t = table(1, 1);
        let cell = CellRef::new(0, 0);
        t.apply_text_diff(cell, &insert(0, "ab"), 1).unwrap();
        let err = t.apply_text_diff(cell, &Diff::Delete { start: 1, end: 5 }, 1).unwrap_err();
        assert!(err.is_malformed());
        assert_eq!(t.cell(cell).unwrap().text, "ab");
    }

    #[test]
    fn acquire_is_exclusive_and_idempotent() {
        let mut t = table(2, 2);
        let cell = CellRef::new(1, 1);
        assert_eq!(t.acquire_lock(cell, 1), Ok(LockOutcome::Acquired));
        assert_eq!(t.acquire_lock(cell, 1), Ok(LockOutcome::AlreadyHeld));
        assert_eq!(t.acquire_lock(cell, 2), Err(TableError::AlreadyLocked { cell, owner: 1 }));
        assert!(t.acquire_lock(CellRef::new(2, 0), 1).is_err());
    }

    #[test]
    fn release_only_clears_own_lock() {
        let mut t = table(2, 2);
        let cell = CellRef::new(0, 1);
        t.acquire_lock(cell, 1).unwrap();

        assert!(!t.release_lock(cell, 2));
        assert_eq!(t.cell(cell).unwrap().lock_owner, Some(1));
        assert!(!t.release_lock(CellRef::new(0, 0), 1));
        assert!(!t.release_lock(CellRef::new(9, 9), 1));

        assert!(t.release_lock(cell, 1));
        assert_eq!(t.cell(cell).unwrap().lock_owner, None);
    }

    #[test]
    fn release_all_returns_every_held_cell() {
        let mut t = table(3, 3);
        t.acquire_lock(CellRef::new(2, 1), 1).unwrap();
        t.acquire_lock(CellRef::new(0, 0), 1).unwrap();
        t.acquire_lock(CellRef::new(1, 1), 2).unwrap();

        assert_eq!(t.release_all(1), vec![CellRef::new(0, 0), CellRef::new(2, 1)]);
        assert_eq!(t.lock_count(), 1);
        assert_eq!(t.locked_by(2), vec![CellRef::new(1, 1)]);
    }

    #[test]
    fn insert_rows_shifts_existing_rows_down() {
        let mut t = table(3, 2);
        for row in 0..3 {
            t.apply_text_diff(CellRef::new(row, 0), &insert(0, &format!("r{row}")), 1).unwrap();
        }
        t.acquire_lock(CellRef::new(1, 0), 7).unwrap();

        t.insert_rows(1, 2).unwrap();

        assert_eq!(t.rows(), 5);
        assert_eq!(t.layout_version(), 1);
        assert_eq!(
            texts(&t),
            vec![
                vec!["r0".to_string(), String::new()],
                vec![String::new(), String::new()],
                vec![String::new(), String::new()],
                vec!["r1".to_string(), String::new()],
                vec!["r2".to_string(), String::new()],
            ]
        );
        assert_eq!(t.locked_by(7), vec![CellRef::new(3, 0)]);
        assert_eq!(t.cell(CellRef::new(1, 0)).unwrap(), &Cell::default());
    }

    #[test]
    fn insert_rows_at_either_end() {
        let mut t = table(1, 1);
        t.insert_rows(0, 1).unwrap();
        t.insert_rows(2, 1).unwrap();
        assert_eq!(t.rows(), 3);
        assert_eq!(t.insert_rows(4, 1), Err(TableError::InsertionOutOfBounds { index: 4, len: 3 }));
    }

    #[test]
    fn insert_zero_rows_keeps_layout_version() {
        let mut t = table(2, 2);
        t.insert_rows(1, 0).unwrap();
        assert_eq!(t.layout_version(), 0);
        assert_eq!(t.rows(), 2);
    }

    #[test]
    fn insert_rows_respects_limit() {
        let mut t = TableState::new(2, 2, GridLimits { max_rows: 4, max_cols: 4 });
        assert_eq!(t.insert_rows(0, 3), Err(TableError::TooLarge { axis: "rows", limit: 4 }));
        assert!(t.insert_rows(0, 2).is_ok());
        assert!(t.insert_rows(0, usize::MAX).is_err());
    }

    #[test]
    fn insert_columns_shifts_cells_right_in_every_row() {
        let mut t = table(2, 2);
        t.apply_text_diff(CellRef::new(0, 1), &insert(0, "a"), 1).unwrap();
        t.apply_text_diff(CellRef::new(1, 0), &insert(0, "b"), 1).unwrap();
        t.acquire_lock(CellRef::new(0, 1), 3).unwrap();

        t.insert_columns(1, 1).unwrap();

        assert_eq!(t.cols(), 3);
        assert_eq!(
            texts(&t),
            vec![
                vec![String::new(), String::new(), "a".to_string()],
                vec!["b".to_string(), String::new(), String::new()],
            ]
        );
        assert_eq!(t.locked_by(3), vec![CellRef::new(0, 2)]);
        assert_eq!(t.insert_columns(5, 1), Err(TableError::InsertionOutOfBounds { index: 5, len: 3 }));
    }

    #[test]
    fn stale_layout_is_rejected() {
        let mut t = table(1, 1);
        assert!(t.check_layout(None).is_ok());
        assert!(t.check_layout(Some(0)).is_ok());
        t.insert_rows(0, 1).unwrap();
        assert_eq!(t.check_layout(Some(0)), Err(TableError::StaleLayout { sent: 0, current: 1 }));
    }

    #[test]
    fn seeded_texts_outside_the_grid_are_skipped() {
        let t = TableState::with_texts(
            1,
            2,
            GridLimits::default(),
            vec![(CellRef::new(0, 1), "kept".to_string()), (CellRef::new(4, 0), "lost".to_string())],
        );
        assert_eq!(texts(&t), vec![vec![String::new(), "kept".to_string()]]);
    }
}

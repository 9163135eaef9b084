//! In-memory record store with the same grid shape and normalization path as
//! the remote backend, held in process. Used by tests and local dry runs.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::StoreError;
use crate::record::LeadRecord;
use crate::schema::{self, ColumnSchema};
use crate::store::RecordStore;

/// Record store over an in-process grid. Row 0 is the header row.
pub struct MemoryStore {
    grid: Mutex<Vec<Vec<String>>>,
}

impl MemoryStore {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            grid: Mutex::new(vec![to_row(headers)]),
        }
    }

    pub fn with_rows(headers: &[&str], rows: &[&[&str]]) -> Self {
        let store = Self::new(headers);
        for row in rows {
            store.push_row(row);
        }
        store
    }

    pub fn push_row(&self, row: &[&str]) {
        self.locked().push(to_row(row));
    }

    /// Snapshot of the data rows (header excluded).
    pub fn rows(&self) -> Vec<Vec<String>> {
        self.locked()[1..].to_vec()
    }

    /// Reorder two data rows, simulating a concurrent external writer.
    pub fn swap_rows(&self, a: usize, b: usize) {
        self.locked()[1..].swap(a, b);
    }

    fn locked(&self) -> MutexGuard<'_, Vec<Vec<String>>> {
        self.grid.lock().expect("MemoryStore mutex poisoned")
    }
}

fn to_row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn fetch_all(&self) -> Result<Vec<LeadRecord>, StoreError> {
        let grid = self.locked();
        let Some((headers, rows)) = grid.split_first() else {
            return Ok(Vec::new());
        };
        let schema = ColumnSchema::from_headers(headers)?;
        Ok(rows.iter().map(|row| schema.record_from_row(row)).collect())
    }

    async fn find_by_key(&self, email: &str) -> Result<Option<LeadRecord>, StoreError> {
        let grid = self.locked();
        let Some((headers, rows)) = grid.split_first() else {
            return Ok(None);
        };
        let schema = ColumnSchema::from_headers(headers)?;
        Ok(rows
            .iter()
            .find(|row| schema.cell(row, schema::CONTACT_EMAIL).trim() == email)
            .map(|row| schema.record_from_row(row)))
    }

    async fn update_fields(
        &self,
        email: &str,
        fields: &[(&str, String)],
    ) -> Result<(), StoreError> {
        let mut grid = self.locked();
        let (headers, rows) = grid.split_first_mut().ok_or_else(|| {
            StoreError::RecordNotFound {
                email: email.to_string(),
            }
        })?;
        let schema = ColumnSchema::from_headers(headers)?;
        let row = rows
            .iter_mut()
            .find(|row| schema.cell(row, schema::CONTACT_EMAIL).trim() == email)
            .ok_or_else(|| StoreError::RecordNotFound {
                email: email.to_string(),
            })?;

        for (field, value) in fields {
            let Some(col) = schema.position(field) else {
                continue;
            };
            if row.len() <= col {
                row.resize(col + 1, String::new());
            }
            row[col] = value.clone();
        }
        Ok(())
    }

    async fn append(&self, record: &LeadRecord) -> Result<(), StoreError> {
        let mut grid = self.locked();
        let Some(headers) = grid.first() else {
            return Err(StoreError::InvalidResponse(
                "cannot append to a grid with no header row".into(),
            ));
        };
        let schema = ColumnSchema::from_headers(headers)?;
        let row = schema.project(&record.to_fields());
        grid.push(row);
        Ok(())
    }
}

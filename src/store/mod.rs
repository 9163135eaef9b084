//! Record store adapters: a narrow read/update contract over the external
//! tabular store, keyed by contact email.

pub mod memory;
pub mod sheets;

pub use memory::MemoryStore;
pub use sheets::{SheetsConfig, SheetsStore};

use async_trait::async_trait;

use crate::error::StoreError;
use crate::record::LeadRecord;

/// Narrow interface over the external tabular store.
///
/// The store is non-transactional and externally writable, so every write
/// re-resolves the target row by `CONTACT_EMAIL` immediately before writing.
/// Row indices captured during a read must never be reused for a write.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Read the full grid and return every record, canonicalized.
    /// An empty store yields an empty list, not an error.
    async fn fetch_all(&self) -> Result<Vec<LeadRecord>, StoreError>;

    /// Records whose status cell is empty, eligible for the next pass.
    /// Must not mutate the store.
    async fn fetch_pending(&self) -> Result<Vec<LeadRecord>, StoreError> {
        let records = self.fetch_all().await?;
        Ok(records.into_iter().filter(|r| r.status.is_pending()).collect())
    }

    /// Locate a record by exact match on its contact email.
    async fn find_by_key(&self, email: &str) -> Result<Option<LeadRecord>, StoreError>;

    /// Write the given canonical fields on the row matching `email`.
    ///
    /// Fields absent from the sheet's header are silently skipped; the
    /// sheet's schema is authoritative over which fields can be persisted.
    async fn update_fields(&self, email: &str, fields: &[(&str, String)])
    -> Result<(), StoreError>;

    /// Append a new row, projected onto the sheet's current header order.
    async fn append(&self, record: &LeadRecord) -> Result<(), StoreError>;
}

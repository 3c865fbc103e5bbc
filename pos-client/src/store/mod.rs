//! redb-based durable record store
//!
//! One logical JSON collection per string key, single writer, synchronous
//! reads and writes. A finite byte quota is enforced over the sum of stored
//! collection sizes; a write that would push usage past the quota fails with
//! [`StoreError::QuotaExceeded`] and leaves the stored data untouched.
//!
//! # Durability
//!
//! redb commits with `Durability::Immediate`: the database file is always in
//! a consistent state, which matters for terminals that lose power without
//! warning.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Table holding all collections: key = collection name, value = JSON array
const RECORDS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("records");

/// Logical collection keys
pub mod keys {
    /// Curated catalog stock
    pub const STOCK_CURATED: &str = "stock-curated";
    /// User-added catalog stock
    pub const STOCK_CUSTOM: &str = "stock-custom";
    /// Order history, newest-first
    pub const ORDER_HISTORY: &str = "order-history";
    /// System logs, newest-first
    pub const SYSTEM_LOGS: &str = "system-logs";
    /// Free item records, newest-first
    pub const FREE_ITEM_RECORDS: &str = "free-item-records";
    /// Pending action queue, overwritten wholesale on each change
    pub const PENDING_ACTIONS: &str = "pending-actions";
}

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage quota exceeded: write of {requested} bytes over {quota} byte quota")]
    QuotaExceeded { requested: u64, quota: u64 },
}

impl StoreError {
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, StoreError::QuotaExceeded { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable record store backed by redb
#[derive(Clone)]
pub struct RecordStore {
    db: Arc<Database>,
    quota_bytes: u64,
}

impl RecordStore {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>, quota_bytes: u64) -> StoreResult<Self> {
        let db = Database::create(path)?;

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(RECORDS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self {
            db: Arc::new(db),
            quota_bytes,
        })
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory(quota_bytes: u64) -> StoreResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(RECORDS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self {
            db: Arc::new(db),
            quota_bytes,
        })
    }

    /// Handle onto the same database with a different quota (for testing
    /// quota-pressure paths against pre-seeded data)
    #[cfg(test)]
    pub(crate) fn with_quota(&self, quota_bytes: u64) -> Self {
        Self {
            db: Arc::clone(&self.db),
            quota_bytes,
        }
    }

    /// Configured byte quota
    pub fn quota_bytes(&self) -> u64 {
        self.quota_bytes
    }

    /// Total bytes currently held across all collections
    pub fn usage_bytes(&self) -> StoreResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RECORDS_TABLE)?;
        let mut total = 0u64;
        for entry in table.iter()? {
            let (_, value) = entry?;
            total += value.value().len() as u64;
        }
        Ok(total)
    }

    /// Read a collection; a missing key yields an empty list
    pub fn read_collection<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Vec<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RECORDS_TABLE)?;
        match table.get(key)? {
            Some(guard) => Ok(serde_json::from_slice(guard.value())?),
            None => Ok(Vec::new()),
        }
    }

    /// Overwrite a collection, enforcing the byte quota
    ///
    /// The quota check accounts for the bytes freed by replacing the key's
    /// previous value. On [`StoreError::QuotaExceeded`] nothing is written.
    pub fn write_collection<T: Serialize>(&self, key: &str, records: &[T]) -> StoreResult<()> {
        let bytes = serde_json::to_vec(records)?;
        let new_len = bytes.len() as u64;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(RECORDS_TABLE)?;

            let mut usage = 0u64;
            let mut old_len = 0u64;
            for entry in table.iter()? {
                let (k, v) = entry?;
                let len = v.value().len() as u64;
                if k.value() == key {
                    old_len = len;
                }
                usage += len;
            }

            if usage - old_len + new_len > self.quota_bytes {
                // abort() is implied when the transaction is dropped
                return Err(StoreError::QuotaExceeded {
                    requested: new_len,
                    quota: self.quota_bytes,
                });
            }

            table.insert(key, bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Remove a collection entirely, freeing its quota share
    pub fn delete_collection(&self, key: &str) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(RECORDS_TABLE)?;
            table.remove(key)?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

pub mod cart_file;
pub mod sqlite;

use crate::cart::CartState;
use crate::model::{PriceRecord, SearchHistoryEntry, StorageError};
use std::collections::HashSet;

pub use cart_file::JsonCartFile;
pub use sqlite::SqliteStorage;

/// Query history and the price results each query produced.
#[async_trait::async_trait]
pub trait HistoryStore: Send + Sync {
    async fn insert_history(&self, query: &str) -> Result<SearchHistoryEntry, StorageError>;
    async fn insert_results(&self, records: &[PriceRecord]) -> Result<(), StorageError>;
    /// Newest first.
    async fn select_recent_history(&self, limit: usize) -> Result<Vec<SearchHistoryEntry>, StorageError>;
}

/// Whole-document persistence for the carts.
pub trait CartPersistence {
    /// `Ok(None)` when nothing was saved yet.
    fn load(&self) -> Result<Option<CartState>, StorageError>;
    fn save(&self, state: &CartState) -> Result<(), StorageError>;
}

/// Distinct queries of a history listing, keeping the first (newest) occurrence.
pub fn unique_queries(entries: &[SearchHistoryEntry]) -> Vec<String> {
    let mut seen = HashSet::new();
    entries
        .iter()
        .filter(|e| seen.insert(e.query.as_str()))
        .map(|e| e.query.clone())
        .collect()
}

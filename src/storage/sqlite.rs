use crate::model::{PriceRecord, Retailer, SearchHistoryEntry, StorageError};
use crate::storage::HistoryStore;
use crate::utils::parse_datetime;
use chrono::Utc;
use rusqlite::{Connection, params};
use tokio::sync::Mutex;

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens the database file and creates the tables if needed.
    pub fn new(db_path: &str) -> Result<Self, StorageError> {
        Self::with_connection(Connection::open(db_path)?)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS search_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                query TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS price_results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                search_id INTEGER NOT NULL REFERENCES search_history(id),
                store_name TEXT NOT NULL,
                store TEXT,
                price REAL NOT NULL,
                currency TEXT NOT NULL,
                product_name TEXT NOT NULL,
                unit TEXT NOT NULL DEFAULT '',
                product_url TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_price_results_search ON price_results(search_id);
            ",
        )?;

        Ok(Self { conn })
    }

    /// Records a query and returns the stored entry with its new id.
    pub fn save_search(&self, query: &str) -> Result<SearchHistoryEntry, StorageError> {
        let created_at = Utc::now();
        self.conn.execute(
            "INSERT INTO search_history (query, created_at) VALUES (?1, ?2)",
            params![query, created_at.to_rfc3339()],
        )?;

        Ok(SearchHistoryEntry {
            id: self.conn.last_insert_rowid(),
            query: query.to_string(),
            created_at,
        })
    }

    /// Inserts a batch of results in one transaction. Records without a
    /// `search_id` cannot be linked to a query and are skipped.
    pub fn save_results(&mut self, records: &[PriceRecord]) -> Result<usize, StorageError> {
        let created_at = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        let mut saved = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO price_results (
                    search_id, store_name, store, price, currency,
                    product_name, unit, product_url, created_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for record in records {
                let Some(search_id) = record.search_id else {
                    continue;
                };
                stmt.execute(params![
                    search_id,
                    &record.store_name,
                    record.store.map(Retailer::display_name),
                    record.price,
                    &record.currency,
                    &record.product_name,
                    &record.unit,
                    &record.product_url,
                    &created_at,
                ])?;
                saved += 1;
            }
        }
        tx.commit()?;
        Ok(saved)
    }

    /// Returns the latest searches, newest first. Ids grow with insertion time.
    pub fn get_recent_searches(&self, limit: usize) -> Result<Vec<SearchHistoryEntry>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, query, created_at FROM search_history
             ORDER BY id DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            let id: i64 = row.get(0)?;
            let query: String = row.get(1)?;
            let created_at: String = row.get(2)?;
            Ok((id, query, created_at))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (id, query, created_at) = row?;
            let created_at = parse_datetime(&created_at)
                .ok_or_else(|| StorageError::InvalidTimestamp(created_at.clone()))?;
            entries.push(SearchHistoryEntry { id, query, created_at });
        }

        Ok(entries)
    }
}

// Read-back of stored results, used to check what a search saved.
#[cfg(test)]
impl SqliteStorage {
    pub fn get_results_for_search(&self, search_id: i64) -> Result<Vec<PriceRecord>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT search_id, store_name, store, price, currency, product_name, unit, product_url
             FROM price_results WHERE search_id = ?1 ORDER BY price ASC, id ASC",
        )?;

        let rows = stmt.query_map(params![search_id], Self::map_record)?;
        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }

        Ok(records)
    }

    fn map_record(row: &rusqlite::Row) -> Result<PriceRecord, rusqlite::Error> {
        let store: Option<String> = row.get(2)?;
        Ok(PriceRecord {
            search_id: Some(row.get(0)?),
            store_name: row.get(1)?,
            store: store.as_deref().and_then(Retailer::from_display_name),
            price: row.get(3)?,
            currency: row.get(4)?,
            product_name: row.get(5)?,
            unit: row.get(6)?,
            product_url: row.get(7)?,
        })
    }
}

#[async_trait::async_trait]
impl HistoryStore for Mutex<SqliteStorage> {
    async fn insert_history(&self, query: &str) -> Result<SearchHistoryEntry, StorageError> {
        self.lock().await.save_search(query)
    }

    async fn insert_results(&self, records: &[PriceRecord]) -> Result<(), StorageError> {
        self.lock().await.save_results(records).map(|_| ())
    }

    async fn select_recent_history(&self, limit: usize) -> Result<Vec<SearchHistoryEntry>, StorageError> {
        self.lock().await.get_recent_searches(limit)
    }
}

// Core structs: Retailer, PriceRecord, SearchHistoryEntry and error types
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The six supermarket chains the carts are keyed by.
///
/// Declaration order is the resolver's tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Retailer {
    Leclerc,
    Carrefour,
    Intermarche,
    Lidl,
    Aldi,
    Auchan,
}

impl Retailer {
    /// Enumeration order, used for alias matching.
    pub const ALL: [Retailer; 6] = [
        Retailer::Leclerc,
        Retailer::Carrefour,
        Retailer::Intermarche,
        Retailer::Lidl,
        Retailer::Aldi,
        Retailer::Auchan,
    ];

    /// Order of the keys in the persisted cart document.
    pub const CART_LAYOUT: [Retailer; 6] = [
        Retailer::Intermarche,
        Retailer::Lidl,
        Retailer::Auchan,
        Retailer::Aldi,
        Retailer::Carrefour,
        Retailer::Leclerc,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Retailer::Leclerc => "E.Leclerc",
            Retailer::Carrefour => "Carrefour",
            Retailer::Intermarche => "Intermarché",
            Retailer::Lidl => "Lidl",
            Retailer::Aldi => "Aldi",
            Retailer::Auchan => "Auchan",
        }
    }

    pub fn from_display_name(name: &str) -> Option<Retailer> {
        Self::ALL.into_iter().find(|r| r.display_name() == name)
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// A validated price estimate for one product at one store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    /// Store label exactly as the model wrote it.
    pub store_name: String,
    #[serde(default)]
    pub store: Option<Retailer>,
    pub price: f64,
    pub currency: String,
    pub product_name: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub product_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHistoryEntry {
    pub id: i64,
    pub query: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("query is empty")]
    EmptyQuery,
    #[error("price model unavailable: {0}")]
    ModelUnavailable(#[from] ModelError),
    #[error("the model did not return a valid price list (raw: {snippet:?})")]
    MalformedAiResponse { snippet: String },
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("no Gemini API key configured (set GEMINI_API_KEY)")]
    MissingApiKey,
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

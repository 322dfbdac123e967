use crate::links::resolve_url;
use crate::llm::PriceModel;
use crate::model::{PipelineError, PriceRecord};
use crate::normalizer::normalize_all;
use crate::parser::{ModelResponseParser, Parser};
use crate::storage::HistoryStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Query → model → parsed, store-resolved, linked records, cheapest first.
pub struct ResultPipeline {
    model: Arc<dyn PriceModel>,
    history: Option<Arc<dyn HistoryStore>>,
    parser: ModelResponseParser,
}

impl ResultPipeline {
    /// Without a history store the results are only returned, never saved.
    pub fn new(model: Arc<dyn PriceModel>, history: Option<Arc<dyn HistoryStore>>) -> Self {
        Self {
            model,
            history,
            parser: ModelResponseParser::new(),
        }
    }

    pub async fn run_query(&self, query: &str) -> Result<Vec<PriceRecord>, PipelineError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(PipelineError::EmptyQuery);
        }

        info!("Processing query: {}", query);
        let raw = self.model.estimate_prices(query).await?;

        let mut records = self.parser.parse(&raw)?;
        normalize_all(&mut records);
        for record in records.iter_mut() {
            resolve_url(record);
        }
        info!("Query '{}' produced {} record(s)", query, records.len());

        self.save_history(query, &mut records).await;
        Ok(records)
    }

    /// Storage problems are logged only; the caller still gets its records.
    async fn save_history(&self, query: &str, records: &mut [PriceRecord]) {
        let Some(history) = &self.history else {
            debug!("History storage not configured, results not saved");
            return;
        };

        let entry = match history.insert_history(query).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!("History insert failed for '{}': {}", query, e);
                return;
            }
        };

        for record in records.iter_mut() {
            record.search_id = Some(entry.id);
        }

        if let Err(e) = history.insert_results(records).await {
            warn!("Saving results of search #{} failed: {}", entry.id, e);
        }
    }
}

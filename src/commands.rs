use crate::cart::{AddOrigin, AddOutcome, CartStore, promote_best_deal};
use crate::model::PriceRecord;
use crate::normalizer::resolve_store;
use crate::pipeline::ResultPipeline;
use crate::report::{SortMode, format_carts, format_error, format_history, format_results, sort_records};
use crate::storage::{CartPersistence, HistoryStore, unique_queries};
use std::sync::Arc;
use tracing::{info, warn};

const HELP: &str = "📋 Available commands:\n\
    <product> or /search <product>: compare prices\n\
    /sort asc|desc: reorder the last results\n\
    /add <n>: put result n into its store's cart\n\
    /cart: show carts and totals\n\
    /remove <store> <index>: remove a cart item\n\
    /clear confirm: empty all carts\n\
    /history: recent searches\n\
    /quit: exit";

/// What the command loop should do after a line was handled.
#[derive(Debug, PartialEq)]
pub enum Reply {
    Text(String),
    Quit,
}

/// State of one interactive user.
pub struct Session<P: CartPersistence> {
    pipeline: ResultPipeline,
    history: Option<Arc<dyn HistoryStore>>,
    history_limit: usize,
    carts: CartStore<P>,
    sort_mode: SortMode,
    last_query: String,
    last_results: Vec<PriceRecord>,
}

impl<P: CartPersistence> Session<P> {
    pub fn new(
        pipeline: ResultPipeline,
        history: Option<Arc<dyn HistoryStore>>,
        history_limit: usize,
        carts: CartStore<P>,
    ) -> Self {
        Self {
            pipeline,
            history,
            history_limit,
            carts,
            sort_mode: SortMode::PriceAsc,
            last_query: String::new(),
            last_results: Vec::new(),
        }
    }

    async fn search(&mut self, query: &str) -> String {
        let records = match self.pipeline.run_query(query).await {
            Ok(records) => records,
            Err(e) => {
                warn!("Query '{}' failed: {}", query.trim(), e);
                return format!("❌ {}", format_error(&e));
            }
        };

        let best_deal = match promote_best_deal(&records, &mut self.carts) {
            Some(AddOutcome::Added(retailer)) => {
                format!("\n⭐ Best deal added to the {} cart.", retailer.display_name())
            }
            Some(AddOutcome::Duplicate(retailer)) => {
                format!("\n⭐ Best deal already in the {} cart.", retailer.display_name())
            }
            Some(AddOutcome::Unroutable) | None => String::new(),
        };

        self.last_query = query.trim().to_string();
        self.last_results = records;
        sort_records(&mut self.last_results, self.sort_mode);

        let mut out = format_results(&self.last_query, &self.last_results);
        out.push_str(&best_deal);
        if let Some(history) = self.recent_history().await {
            out.push('\n');
            out.push_str(&history);
        }
        out
    }

    async fn recent_history(&self) -> Option<String> {
        let store = self.history.as_ref()?;
        match store.select_recent_history(self.history_limit).await {
            Ok(entries) => Some(format_history(&unique_queries(&entries))),
            Err(e) => {
                warn!("Error fetching history: {}", e);
                None
            }
        }
    }

    fn add(&mut self, arg: &str) -> String {
        let Some(record) = arg
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| self.last_results.get(i))
        else {
            return format!("No result #{} in the last search.", arg);
        };

        match self.carts.add(record, AddOrigin::Manual) {
            AddOutcome::Added(retailer) => format!("✅ Added to the {} cart.", retailer.display_name()),
            AddOutcome::Duplicate(retailer) => format!("Already in the {} cart.", retailer.display_name()),
            AddOutcome::Unroutable => format!("No cart for store '{}'.", record.store_name),
        }
    }

    fn remove(&mut self, args: &str) -> String {
        let Some((store, index)) = args.trim().rsplit_once(' ') else {
            return "Usage: /remove <store> <index>".to_string();
        };
        let Some(retailer) = resolve_store(store) else {
            return format!("Unknown store '{}'.", store.trim());
        };
        let Ok(index) = index.parse::<usize>() else {
            return "Usage: /remove <store> <index>".to_string();
        };

        match self.carts.remove(retailer, index) {
            Some(item) => format!("🗑 Removed {} from the {} cart.", item.product_name, retailer.display_name()),
            None => format!("Nothing at index {} in the {} cart.", index, retailer.display_name()),
        }
    }
}

/// Handles one input line and returns what to show the user.
pub async fn handle_command<P: CartPersistence>(line: &str, session: &mut Session<P>) -> Reply {
    let line = line.trim();
    let (command, args) = match line.split_once(char::is_whitespace) {
        Some((command, args)) => (command, args.trim()),
        None => (line, ""),
    };
    info!("Handling command: {}", command);

    let text = match command {
        "" => return Reply::Text(String::new()),
        "/quit" | "/exit" => return Reply::Quit,
        "/help" => HELP.to_string(),
        "/search" => session.search(args).await,
        "/sort" => match SortMode::parse(args) {
            Some(mode) => {
                session.sort_mode = mode;
                sort_records(&mut session.last_results, mode);
                format_results(&session.last_query, &session.last_results)
            }
            None => "Usage: /sort asc|desc".to_string(),
        },
        "/add" => session.add(args),
        "/cart" => format_carts(session.carts.state()),
        "/remove" => session.remove(args),
        "/clear" if args == "confirm" => {
            session.carts.clear();
            "🧹 All carts emptied.".to_string()
        }
        "/clear" => "Empty all carts? Send /clear confirm to proceed.".to_string(),
        "/history" => session
            .recent_history()
            .await
            .unwrap_or_else(|| "Search history is unavailable.".to_string()),
        c if c.starts_with('/') => format!("Unknown command {}. Send /help for the list.", c),
        _ => session.search(line).await,
    };

    Reply::Text(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::PriceModel;
    use crate::model::{ModelError, Retailer};
    use crate::storage::{JsonCartFile, SqliteStorage};
    use serde_json::json;
    use tempfile::TempDir;
    use tokio::sync::Mutex;

    struct FixedModel(String);

    #[async_trait::async_trait]
    impl PriceModel for FixedModel {
        async fn estimate_prices(&self, _query: &str) -> Result<String, ModelError> {
            Ok(self.0.clone())
        }
    }

    fn session(dir: &TempDir) -> Session<JsonCartFile> {
        let reply = json!([
            { "store_name": "Carrefour", "price": 1.35, "product_name": "Lait Candia 1L" },
            { "store_name": "Lidl", "price": 0.89, "product_name": "Lait Milbona 1L" },
            { "store_name": "Monoprix", "price": 1.10, "product_name": "Lait Monoprix 1L" }
        ])
        .to_string();
        let history: Arc<dyn HistoryStore> = Arc::new(Mutex::new(SqliteStorage::open_in_memory().unwrap()));
        let pipeline = ResultPipeline::new(Arc::new(FixedModel(reply)), Some(history.clone()));
        let carts = CartStore::new(JsonCartFile::new(dir.path().join("carts.json")));
        Session::new(pipeline, Some(history), 10, carts)
    }

    async fn text(line: &str, session: &mut Session<JsonCartFile>) -> String {
        match handle_command(line, session).await {
            Reply::Text(text) => text,
            Reply::Quit => panic!("unexpected quit"),
        }
    }

    #[tokio::test]
    async fn bare_text_searches_and_promotes_best_deal() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(&dir);

        let out = text("lait", &mut session).await;

        assert!(out.contains("Prices for \"lait\""));
        assert!(out.contains("⭐ Best deal added to the Lidl cart."));
        assert!(out.contains("Recent searches: lait"));
        assert_eq!(session.carts.state().cart(Retailer::Lidl).len(), 1);
    }

    #[tokio::test]
    async fn manual_add_routes_by_store_and_rejects_unknown_stores() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(&dir);
        text("/search lait", &mut session).await;

        assert_eq!(text("/add 3", &mut session).await, "✅ Added to the Carrefour cart.");
        assert_eq!(text("/add 3", &mut session).await, "Already in the Carrefour cart.");
        assert_eq!(text("/add 2", &mut session).await, "No cart for store 'Monoprix'.");
        assert_eq!(text("/add 9", &mut session).await, "No result #9 in the last search.");
        assert_eq!(text("/add 0", &mut session).await, "No result #0 in the last search.");
    }

    #[tokio::test]
    async fn sort_desc_reorders_last_results() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(&dir);
        text("lait", &mut session).await;

        text("/sort desc", &mut session).await;
        assert_eq!(session.last_results[0].product_name, "Lait Candia 1L");
        assert_eq!(text("/sort name", &mut session).await, "Usage: /sort asc|desc");
    }

    #[tokio::test]
    async fn remove_and_clear_need_valid_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(&dir);
        text("lait", &mut session).await;

        assert_eq!(text("/remove Lidl 4", &mut session).await, "Nothing at index 4 in the Lidl cart.");
        assert_eq!(text("/remove Monoprix 0", &mut session).await, "Unknown store 'Monoprix'.");
        assert_eq!(text("/remove E.Leclerc", &mut session).await, "Usage: /remove <store> <index>");
        assert_eq!(text("/remove E.Leclerc x", &mut session).await, "Usage: /remove <store> <index>");
        assert_eq!(
            text("/remove Lidl 0", &mut session).await,
            "🗑 Removed Lait Milbona 1L from the Lidl cart."
        );

        text("/add 1", &mut session).await;
        assert!(text("/clear", &mut session).await.contains("/clear confirm"));
        assert_eq!(session.carts.state().item_count(), 1);
        text("/clear confirm", &mut session).await;
        assert_eq!(session.carts.state().item_count(), 0);
    }

    #[tokio::test]
    async fn carts_survive_a_new_session() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut session = session(&dir);
            text("lait", &mut session).await;
        }
        let mut session = session(&dir);
        assert!(text("/cart", &mut session).await.contains("🛒 Lidl: 0.89€ (1 item(s))"));
    }

    #[tokio::test]
    async fn quit_and_unknown_commands() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(&dir);
        assert_eq!(handle_command("/quit", &mut session).await, Reply::Quit);
        assert!(text("/frobnicate", &mut session).await.starts_with("Unknown command /frobnicate"));
        assert_eq!(text("   ", &mut session).await, "");
        assert!(text("/search   ", &mut session).await.starts_with("❌ Type a product"));
    }
}

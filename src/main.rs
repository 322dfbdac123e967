mod cart;
mod commands;
mod config;
mod links;
mod llm;
mod model;
mod normalizer;
mod parser;
mod pipeline;
mod report;
mod storage;
mod utils;

use cart::CartStore;
use commands::{Reply, Session, handle_command};
use config::{AppConfig, load_config};
use llm::GeminiClient;
use pipeline::ResultPipeline;
use std::sync::Arc;
use storage::{HistoryStore, JsonCartFile, SqliteStorage};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Logs go to stderr, command output to stdout
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    // Set panic hook to log details about any panic
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("😱 Panic occurred: {:?}", panic_info);
    }));

    let config: AppConfig = match load_config("config.json") {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Config load error: {}", e);
            return;
        }
    };

    let model = match GeminiClient::new(&config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to create model client: {}", e);
            return;
        }
    };
    if config.gemini_api_key.is_none() {
        warn!("GEMINI_API_KEY is not set, searches will fail until it is configured");
    }

    let history = open_history(&config);
    let pipeline = ResultPipeline::new(model, history.clone());
    let carts = CartStore::new(JsonCartFile::new(&config.carts_path));
    let mut session = Session::new(pipeline, history, config.history_limit, carts);

    // One-shot mode: the arguments form a single query
    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        if let Reply::Text(text) = handle_command(&format!("/search {}", args.join(" ")), &mut session).await {
            println!("{}", text);
        }
        return;
    }

    info!("🚀 Food Scan started");
    println!("Type a product to compare prices, or /help.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        let _ = stdout.write_all(b"> ").await;
        let _ = stdout.flush().await;

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read input: {}", e);
                break;
            }
        };

        match handle_command(&line, &mut session).await {
            Reply::Text(text) if text.is_empty() => {}
            Reply::Text(text) => println!("{}", text),
            Reply::Quit => break,
        }
    }
    info!("Food Scan stopped");
}

/// History is optional: without a database the searches still work.
fn open_history(config: &AppConfig) -> Option<Arc<dyn HistoryStore>> {
    let path = config.database_path.as_deref()?;
    match SqliteStorage::new(path) {
        Ok(storage) => {
            info!("Search history stored in {}", path);
            Some(Arc::new(Mutex::new(storage)))
        }
        Err(e) => {
            warn!("Search history unavailable: {}", e);
            None
        }
    }
}

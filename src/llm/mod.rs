pub mod gemini;
pub mod prompt;

use crate::model::ModelError;

pub use gemini::GeminiClient;

/// A generative model asked for supermarket prices. The returned text is untrusted.
#[async_trait::async_trait]
pub trait PriceModel: Send + Sync {
    async fn estimate_prices(&self, query: &str) -> Result<String, ModelError>;
}

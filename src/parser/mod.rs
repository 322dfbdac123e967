// Model response parsing: JSON extraction, then per-candidate validation
pub mod extractor;
pub mod validator;

use crate::model::{PipelineError, PriceRecord};
use extractor::extract_json_array;
use tracing::warn;
use validator::{malformed, validate_batch};

pub trait Parser {
    fn parse(&self, text: &str) -> Result<Vec<PriceRecord>, PipelineError>;
}

pub struct ModelResponseParser;

impl ModelResponseParser {
    pub fn new() -> Self {
        Self
    }
}

impl Parser for ModelResponseParser {
    fn parse(&self, text: &str) -> Result<Vec<PriceRecord>, PipelineError> {
        let candidate = extract_json_array(text);
        let value: serde_json::Value = serde_json::from_str(&candidate).map_err(|e| {
            warn!("Model response is not valid JSON: {}", e);
            malformed(text)
        })?;

        validate_batch(&value, text)
    }
}

use crate::config::AppConfig;
use crate::llm::PriceModel;
use crate::llm::prompt::build_prompt;
use crate::model::ModelError;
use crate::utils::truncate_chars;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// Gemini `generateContent` client.
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    api_base: String,
    model: String,
    search_grounding: bool,
}

impl GeminiClient {
    pub fn new(config: &AppConfig) -> Result<Self, ModelError> {
        let client = Client::builder()
            .user_agent("FoodScan/0.1")
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            api_key: config.gemini_api_key.clone(),
            api_base: config.gemini_api_base.trim_end_matches('/').to_string(),
            model: config.gemini_model.clone(),
            search_grounding: config.search_grounding,
        })
    }

    fn build_url(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.api_base, self.model)
    }
}

#[async_trait::async_trait]
impl PriceModel for GeminiClient {
    async fn estimate_prices(&self, query: &str) -> Result<String, ModelError> {
        let api_key = self.api_key.as_deref().ok_or(ModelError::MissingApiKey)?;

        let mut body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": build_prompt(query, self.search_grounding) }] }]
        });
        if self.search_grounding {
            body["tools"] = json!([{ "google_search": {} }]);
        }

        info!("Asking {} for prices of '{}'", self.model, query);
        let response = self
            .client
            .post(self.build_url())
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "unknown".into());
            warn!("Gemini responded [{}]: {}", status, body);
            return Err(ModelError::Status {
                status: status.as_u16(),
                body: truncate_chars(&body, 200),
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect::<String>())
            .unwrap_or_default();

        debug!("Raw model response: {}", text);
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base: &str, key: Option<&str>) -> AppConfig {
        AppConfig {
            gemini_api_key: key.map(str::to_string),
            gemini_api_base: base.to_string(),
            ..AppConfig::default()
        }
    }

    #[tokio::test]
    async fn joins_text_parts_of_first_candidate() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "candidates": [
                { "content": { "parts": [{ "text": "```json\n[" }, { "text": "]\n```" }] } },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        });

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiClient::new(&config(&server.uri(), Some("test-key"))).unwrap();
        let text = client.estimate_prices("lait").await.unwrap();
        assert_eq!(text, "```json\n[]\n```");
    }

    #[tokio::test]
    async fn grounded_requests_carry_the_search_tool() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({ "tools": [{ "google_search": {} }] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "candidates": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let mut cfg = config(&server.uri(), Some("k"));
        cfg.search_grounding = true;
        let client = GeminiClient::new(&cfg).unwrap();
        assert_eq!(client.estimate_prices("beurre").await.unwrap(), "");
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
            .mount(&server)
            .await;

        let client = GeminiClient::new(&config(&server.uri(), Some("bad"))).unwrap();
        let err = client.estimate_prices("lait").await.unwrap_err();
        assert!(matches!(err, ModelError::Status { status: 403, ref body } if body == "API key not valid"));
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = GeminiClient::new(&config(&server.uri(), None)).unwrap();
        assert!(matches!(
            client.estimate_prices("lait").await,
            Err(ModelError::MissingApiKey)
        ));
    }
}

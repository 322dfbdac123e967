use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_api_base: String,
    /// Lets the model use Google Search while estimating prices.
    pub search_grounding: bool,
    pub request_timeout_seconds: u64,
    /// `null` disables search history.
    pub database_path: Option<String>,
    pub carts_path: String,
    pub history_limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_model: "gemini-2.5-flash".to_string(),
            gemini_api_base: "https://generativelanguage.googleapis.com".to_string(),
            search_grounding: false,
            request_timeout_seconds: 60,
            database_path: Some("food_scan.db".to_string()),
            carts_path: "carts.json".to_string(),
            history_limit: 10,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Reads the JSON config file (defaults when it does not exist), then applies
/// environment overrides.
pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let config = match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content)?,
        Err(e) if e.kind() == ErrorKind::NotFound => AppConfig::default(),
        Err(e) => return Err(e.into()),
    };
    Ok(apply_env_overrides(config, |key| std::env::var(key).ok()))
}

/// `GEMINI_API_KEY` and `FOOD_SCAN_DB` take precedence over the file.
fn apply_env_overrides<F>(mut config: AppConfig, lookup: F) -> AppConfig
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = lookup("GEMINI_API_KEY").filter(|k| !k.trim().is_empty()) {
        config.gemini_api_key = Some(key);
    }
    if let Some(path) = lookup("FOOD_SCAN_DB").filter(|p| !p.trim().is_empty()) {
        config.database_path = Some(path);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from_map(map: HashMap<&'static str, &'static str>) -> impl Fn(&str) -> Option<String> {
        move |key: &str| map.get(key).map(|v| v.to_string())
    }

    #[test]
    fn empty_object_gives_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.gemini_model, "gemini-2.5-flash");
        assert_eq!(config.history_limit, 10);
    }

    #[test]
    fn file_values_override_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{ "search_grounding": true, "database_path": null, "carts_path": "/tmp/c.json" }"#,
        )
        .unwrap();
        assert!(config.search_grounding);
        assert_eq!(config.database_path, None);
        assert_eq!(config.carts_path, "/tmp/c.json");
    }

    #[test]
    fn environment_wins_over_file() {
        let config = AppConfig {
            gemini_api_key: Some("from-file".to_string()),
            ..AppConfig::default()
        };
        let env = HashMap::from([("GEMINI_API_KEY", "from-env"), ("FOOD_SCAN_DB", "/data/h.db")]);
        let config = apply_env_overrides(config, lookup_from_map(env));
        assert_eq!(config.gemini_api_key.as_deref(), Some("from-env"));
        assert_eq!(config.database_path.as_deref(), Some("/data/h.db"));
    }

    #[test]
    fn blank_environment_values_are_ignored() {
        let env = HashMap::from([("GEMINI_API_KEY", "  ")]);
        let config = apply_env_overrides(AppConfig::default(), lookup_from_map(env));
        assert_eq!(config.gemini_api_key, None);
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert!(load_config(path.to_str().unwrap()).is_ok());
    }

    #[test]
    fn broken_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ \"history_limit\": \"ten\" }").unwrap();
        assert!(matches!(load_config(path.to_str().unwrap()), Err(ConfigError::Parse(_))));
    }
}

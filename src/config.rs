use std::{env, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const ENV_BASE_URL: &str = "GRASP_PLANNER_BASE_URL";
pub const ENV_API_KEY: &str = "GRASP_PLANNER_API_KEY";
pub const ENV_MODEL: &str = "GRASP_PLANNER_MODEL";
pub const ENV_MAX_TOKENS: &str = "GRASP_PLANNER_MAX_TOKENS";
pub const ENV_HTTP_RETRIES: &str = "GRASP_PLANNER_HTTP_RETRIES";
pub const ENV_TIMEOUT_SECS: &str = "GRASP_PLANNER_TIMEOUT_SECS";

/// Where and how to reach the completion service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// OpenAI-compatible API root, e.g. a local vLLM server.
    pub base_url: String,
    pub api_key: String,
    /// Served model id. When absent the first model listed by the server is used.
    pub model: Option<String>,
    /// Overrides the per-task response budget of the catalog.
    pub max_tokens: Option<u32>,
    /// Extra attempts after a connection-level failure.
    pub http_retries: u32,
    pub timeout_secs: Option<u64>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/v1".to_string(),
            api_key: "EMPTY".to_string(),
            model: None,
            max_tokens: None,
            http_retries: 1,
            timeout_secs: None,
        }
    }
}

impl PlannerConfig {
    /// Defaults overlaid with the `GRASP_PLANNER_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    /// Reads a JSON config file; missing keys take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(base_url) = lookup(ENV_BASE_URL) {
            self.base_url = base_url;
        }
        if let Some(api_key) = lookup(ENV_API_KEY) {
            self.api_key = api_key;
        }
        if let Some(model) = lookup(ENV_MODEL) {
            self.model = Some(model);
        }
        if let Some(value) = lookup(ENV_MAX_TOKENS) {
            self.max_tokens = Some(parse_number(ENV_MAX_TOKENS, &value)?);
        }
        if let Some(value) = lookup(ENV_HTTP_RETRIES) {
            self.http_retries = parse_number(ENV_HTTP_RETRIES, &value)?;
        }
        if let Some(value) = lookup(ENV_TIMEOUT_SECS) {
            self.timeout_secs = Some(parse_number(ENV_TIMEOUT_SECS, &value)?);
        }
        Ok(self)
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{key} must be a non-negative integer, got '{value}'")))
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, io::Write};

    use super::*;

    fn overrides(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_point_at_local_server() {
        let config = PlannerConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000/v1");
        assert_eq!(config.api_key, "EMPTY");
        assert_eq!(config.http_retries, 1);
        assert!(config.model.is_none());
    }

    #[test]
    fn overrides_replace_fields() {
        let config = PlannerConfig::default()
            .with_overrides(overrides(&[
                (ENV_BASE_URL, "http://gpu-box:9000/v1"),
                (ENV_MODEL, "qwen2.5-vl"),
                (ENV_MAX_TOKENS, "512"),
                (ENV_HTTP_RETRIES, "3"),
                (ENV_TIMEOUT_SECS, "30"),
                (ENV_API_KEY, ""),
            ]))
            .unwrap();
        assert_eq!(config.base_url, "http://gpu-box:9000/v1");
        assert_eq!(config.model.as_deref(), Some("qwen2.5-vl"));
        assert_eq!(config.max_tokens, Some(512));
        assert_eq!(config.http_retries, 3);
        assert_eq!(config.timeout_secs, Some(30));
        assert_eq!(config.api_key, "EMPTY");
    }

    #[test]
    fn invalid_number_is_a_config_error() {
        let err = PlannerConfig::default()
            .with_overrides(overrides(&[(ENV_MAX_TOKENS, "lots")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains(ENV_MAX_TOKENS)));
    }

    #[test]
    fn file_fills_missing_keys_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"model": "qwen2.5-vl", "max_tokens": 300}}"#).unwrap();

        let config = PlannerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.model.as_deref(), Some("qwen2.5-vl"));
        assert_eq!(config.max_tokens, Some(300));
        assert_eq!(config.base_url, PlannerConfig::default().base_url);
    }

    #[test]
    fn endpoint_joins_paths() {
        let config = PlannerConfig {
            base_url: "http://host/v1/".to_string(),
            ..PlannerConfig::default()
        };
        assert_eq!(config.endpoint("/chat/completions"), "http://host/v1/chat/completions");
        assert_eq!(config.endpoint("models"), "http://host/v1/models");
    }
}

//! Client configuration.
//!
//! Settings come from three layers, later ones winning: built-in defaults, an optional
//! YAML file, then environment variables. The env knobs are the same ones the HTTP
//! transport has always honoured (`AI_HTTP_TIMEOUT_SECS`, `AI_PROXY_URL`, ...).

use crate::{Error, ErrorContext, Result};
use keyring::Entry;
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";
const KEYRING_SERVICE: &str = "ai-schema-fix";

/// Which requests the schema-fixing transport inspects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterceptConfig {
    /// Substring of the URL path that marks a chat-completions request.
    pub path_fragment: String,
}

impl Default for InterceptConfig {
    fn default() -> Self {
        Self {
            path_fragment: CHAT_COMPLETIONS_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Used for keyring lookup and the `<PROVIDER>_API_KEY` env var.
    pub provider_id: String,
    pub base_url: String,
    pub model: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout_secs: u64,
    pub proxy: Option<String>,
    pub intercept: InterceptConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            provider_id: "openai".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: String::new(),
            api_key: None,
            timeout_secs: 30,
            pool_max_idle_per_host: 32,
            pool_idle_timeout_secs: 90,
            proxy: None,
            intercept: InterceptConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_path_fragment(mut self, fragment: impl Into<String>) -> Self {
        self.intercept.path_fragment = fragment.into();
        self
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid YAML configuration: {}", e),
                ErrorContext::new().with_source("config_loader"),
            )
        })
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content).map_err(|e| match e {
            Error::Configuration { message, context } => Error::Configuration {
                message,
                context: context.with_field_path(path.display().to_string()),
            },
            other => other,
        })
    }

    pub fn with_env_overrides(self) -> Self {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Apply env-style overrides from an arbitrary lookup. Unparsable numbers are ignored.
    pub fn apply_env_with<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(v) = var("OPENAI_BASE_URL") {
            self.base_url = v;
        }
        if let Some(v) = var("OPENAI_MODEL") {
            self.model = v;
        }
        if let Some(secs) = var("AI_HTTP_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .or_else(|| var("AI_TIMEOUT_SECS").and_then(|s| s.parse::<u64>().ok()))
        {
            self.timeout_secs = secs;
        }
        if let Some(n) =
            var("AI_HTTP_POOL_MAX_IDLE_PER_HOST").and_then(|s| s.parse::<usize>().ok())
        {
            self.pool_max_idle_per_host = n;
        }
        if let Some(secs) =
            var("AI_HTTP_POOL_IDLE_TIMEOUT_SECS").and_then(|s| s.parse::<u64>().ok())
        {
            self.pool_idle_timeout_secs = secs;
        }
        if let Some(v) = var("AI_PROXY_URL") {
            self.proxy = Some(v);
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(Error::configuration_with_context(
                "model must not be empty",
                ErrorContext::new().with_field_path("model"),
            ));
        }
        if self.intercept.path_fragment.is_empty() {
            return Err(Error::configuration_with_context(
                "path fragment must not be empty",
                ErrorContext::new().with_field_path("intercept.path_fragment"),
            ));
        }
        self.chat_completions_url().map(|_| ())
    }

    pub fn chat_completions_url(&self) -> Result<Url> {
        let raw = format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            CHAT_COMPLETIONS_PATH
        );
        Url::parse(&raw).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid base URL: {}", e),
                ErrorContext::new()
                    .with_field_path("base_url")
                    .with_details(self.base_url.clone()),
            )
        })
    }

    /// Explicit key, then the OS keyring, then `<PROVIDER>_API_KEY`.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.is_empty()) {
            return Some(key.clone());
        }

        if let Ok(entry) = Entry::new(KEYRING_SERVICE, &self.provider_id) {
            if let Ok(key) = entry.get_password() {
                return Some(key);
            }
        }

        let env_var = format!("{}_API_KEY", self.provider_id.to_uppercase());
        std::env::var(env_var).ok()
    }
}

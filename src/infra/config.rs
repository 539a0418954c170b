// src/infra/config.rs — Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::infra::paths;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub completion: CompletionConfig,

    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Static bearer tokens accepted by the API, mapped to user ids.
    /// Token issuance itself is an external concern; this table is what
    /// `verify(token)` resolves against.
    #[serde(default)]
    pub tokens: Vec<TokenEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenEntry {
    pub token: String,
    pub user_id: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8790,
            tokens: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// OpenAI-compatible endpoint serving the assistant.
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".into(),
            model: "mixtral-8x7b-32768".into(),
            api_key_env: "GROQ_API_KEY".into(),
            temperature: 0.7,
            max_tokens: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Base URL of the wayfarer server the chat client syncs against.
    pub remote_url: String,
    /// Bearer token presented by the client on every call.
    pub token: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            remote_url: "http://127.0.0.1:8790".into(),
            token: None,
        }
    }
}

impl Config {
    /// Load config from the default location, falling back to defaults
    /// if no config.toml exists.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&paths::config_file_path())
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {e}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let c = Config::default();
        assert_eq!(c.server.port, 8790);
        assert!(c.server.tokens.is_empty());
        assert_eq!(c.completion.max_tokens, 1000);
    }

    #[test]
    fn test_parse_partial_toml() {
        let c: Config = toml::from_str(
            r#"
            [server]
            port = 9000
            tokens = [{ token = "tk-1", user_id = "u-1", name = "Ada" }]
            "#,
        )
        .unwrap();
        assert_eq!(c.server.port, 9000);
        assert_eq!(c.server.tokens[0].user_id, "u-1");
        // Unspecified sections fall back to defaults
        assert_eq!(c.completion.model, "mixtral-8x7b-32768");
        assert_eq!(c.sync.remote_url, "http://127.0.0.1:8790");
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let c = Config::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(c.server.port, 8790);
    }
}

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_PROVIDER: &str = "v0";
pub const DEFAULT_V0_ENDPOINT: &str = "https://api.v0.dev/v1/chats";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Which generation service to call and how.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneratorSettings {
    /// `v0`, or one of the `llm` crate providers (`openai`, `anthropic`, ...).
    pub provider: String,
    /// Model name. Ignored by the v0 backend.
    pub model: String,
    /// Chat endpoint for the v0 backend.
    pub endpoint: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            model: String::new(),
            endpoint: DEFAULT_V0_ENDPOINT.to_string(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl GeneratorSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Local providers run without a credential.
    pub fn requires_api_key(&self) -> bool {
        self.provider != "ollama"
    }

    /// The credential, if one is set and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    pub fn is_configured(&self) -> bool {
        !self.provider.is_empty() && (!self.requires_api_key() || self.api_key().is_some())
    }
}

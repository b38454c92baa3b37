//! Environment variable secret store

use std::collections::HashMap;
use std::env;

use once_cell::sync::Lazy;

use super::traits::{SecretStore, SecretStoreError, SecretStoreResult};

/// Mapping from provider names to environment variable names
static ENV_VAR_MAP: Lazy<HashMap<&'static str, Vec<&'static str>>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("openai", vec!["OPENAI_API_KEY"]);
    m.insert("anthropic", vec!["ANTHROPIC_API_KEY"]);
    m.insert("gemini", vec!["GEMINI_API_KEY", "GOOGLE_API_KEY"]);
    m.insert("groq", vec!["GROQ_API_KEY"]);
    m.insert("xai", vec!["XAI_API_KEY"]);
    m.insert("deepseek", vec!["DEEPSEEK_API_KEY"]);
    m.insert("mistral", vec!["MISTRAL_API_KEY"]);
    m.insert("openrouter", vec!["OPENROUTER_API_KEY"]);
    m.insert("ollama", vec![]); // Ollama doesn't need an API key
    m
});

/// Provider-agnostic variables checked after the provider mapping
const FALLBACK_VARS: &[&str] = &["TINYAGENT_API_KEY", "LITELLM_API_KEY"];

/// Secret store that reads from environment variables
///
/// Read-only. Provider names map to their conventional variables
/// (`anthropic` → `ANTHROPIC_API_KEY`), then to `<PROVIDER>_API_KEY`, then
/// to the provider-agnostic `TINYAGENT_API_KEY` / `LITELLM_API_KEY`.
#[derive(Debug, Default)]
pub struct EnvSecretStore {
    _private: (),
}

impl EnvSecretStore {
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Get the environment variable names for a provider
    pub fn env_vars_for_provider(provider: &str) -> Option<&'static [&'static str]> {
        ENV_VAR_MAP.get(provider.to_lowercase().as_str()).map(|v| v.as_slice())
    }

    fn read(var: &str) -> Option<String> {
        env::var(var).ok().filter(|v| !v.is_empty())
    }
}

impl SecretStore for EnvSecretStore {
    fn name(&self) -> &str {
        "env"
    }

    fn get(&self, key: &str) -> Option<String> {
        if let Some(value) = Self::read(key) {
            return Some(value);
        }

        let lower_key = key.to_lowercase();
        if let Some(env_vars) = ENV_VAR_MAP.get(lower_key.as_str()) {
            // Providers without keys never fall through to the generic variables
            if env_vars.is_empty() {
                return None;
            }
            if let Some(value) = env_vars.iter().find_map(|v| Self::read(v)) {
                return Some(value);
            }
        }

        if let Some(value) = Self::read(&format!("{}_API_KEY", key.to_uppercase())) {
            return Some(value);
        }

        FALLBACK_VARS.iter().find_map(|v| Self::read(v))
    }

    fn store(&self, _key: &str, _value: &str) -> SecretStoreResult<()> {
        Err(SecretStoreError::ReadOnly)
    }
}

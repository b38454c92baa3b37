//! Model client boundary
//!
//! All remote providers go through the `genai` crate (`GenaiModelClient`),
//! which handles provider protocols and tool calling. OpenAI-compatible
//! providers that genai does not know natively are reached through its
//! `ServiceTargetResolver`.
//!
//! The `ScriptedModelClient` is kept for tests and the offline `mock` provider.

mod traits;
mod error;
mod genai_adapter;
mod genai_client;
mod scripted;

pub use traits::{ModelClient, ModelRequest};
pub use error::{ModelError, ModelResult};
pub use genai_client::GenaiModelClient;
pub use genai_adapter::{is_genai_native, requires_api_key};
pub use scripted::{RecordedRequest, ScriptMode, ScriptedModelClient};

use std::sync::Arc;

use crate::config::ModelSettings;
use crate::logging::Logger;
use crate::secrets::SecretStore;

/// Create the model client for the configured provider
///
/// `mock` gives the echo client; every other provider goes through genai.
/// Fails when a provider that needs a key has none.
pub fn create_model_client(
    settings: &ModelSettings,
    secrets: &dyn SecretStore,
    logger: Arc<dyn Logger>,
) -> ModelResult<Arc<dyn ModelClient>> {
    let provider = settings.provider_id();
    if provider == "mock" {
        return Ok(Arc::new(ScriptedModelClient::echo(logger)));
    }

    let api_key = settings.resolve_api_key(secrets);
    if api_key.is_none() && requires_api_key(&provider) && settings.api_base.is_none() {
        return Err(ModelError::missing_api_key(provider));
    }

    logger.info(&format!(
        "Creating model client: provider={}, model={}, api_key={}",
        provider,
        settings.model_name(),
        if api_key.is_some() { "set" } else { "none" }
    ));
    Ok(Arc::new(GenaiModelClient::new(settings, api_key, logger)))
}

/// List provider ids with known defaults
pub fn supported_providers() -> Vec<&'static str> {
    vec![
        // Native genai providers
        "openai",
        "anthropic",
        "gemini",
        "ollama",
        "groq",
        "xai",
        "deepseek",
        "cohere",
        // OpenAI-compatible providers via resolver
        "openrouter",
        "mistral",
        // Offline
        "mock",
    ]
}

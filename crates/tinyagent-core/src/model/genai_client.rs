//! GenaiModelClient - model client backed by the genai crate
//!
//! Handles every genai-supported provider (OpenAI, Anthropic, Gemini, Ollama, ...)
//! plus OpenAI-compatible endpoints (OpenRouter, Mistral, custom `api_base`).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use genai::chat::ChatRequest;
use genai::Client;

use crate::config::ModelSettings;
use crate::logging::Logger;
use crate::types::ModelReply;

use super::error::{ModelError, ModelResult};
use super::genai_adapter::{
    classify_error, create_client, from_genai_response, system_text, to_genai_messages, to_genai_options,
    to_genai_tools,
};
use super::traits::{ModelClient, ModelRequest};

/// Model client for remote providers
pub struct GenaiModelClient {
    provider_id: String,
    model_name: String,
    settings: ModelSettings,
    timeout: Duration,
    client: Client,
    logger: Arc<dyn Logger>,
}

impl GenaiModelClient {
    /// Create a client; `api_key` has already been resolved by the caller
    pub fn new(settings: &ModelSettings, api_key: Option<String>, logger: Arc<dyn Logger>) -> Self {
        let provider_id = settings.provider_id();
        let client = create_client(&provider_id, api_key, settings.api_base.clone());
        Self {
            model_name: settings.model_name().to_string(),
            provider_id,
            settings: settings.clone(),
            timeout: settings.timeout(),
            client,
            logger,
        }
    }

    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[async_trait]
impl ModelClient for GenaiModelClient {
    fn name(&self) -> &str {
        &self.provider_id
    }

    async fn send(&self, request: ModelRequest<'_>) -> ModelResult<ModelReply> {
        let messages = to_genai_messages(&request)?;
        self.logger.info(&format!(
            "[GenaiModelClient] send: provider={}, model={}, messages={}, tools={}",
            self.provider_id,
            self.model_name,
            messages.len(),
            request.tools.len()
        ));

        let mut chat_req = ChatRequest::new(messages).with_system(system_text(&request));
        if !request.tools.is_empty() {
            chat_req = chat_req.with_tools(to_genai_tools(request.tools));
        }
        let options = to_genai_options(&self.settings);

        let exec = self.client.exec_chat(&self.model_name, chat_req, Some(&options));
        let response = match tokio::time::timeout(self.timeout, exec).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                let err = classify_error(&self.provider_id, &e);
                self.logger.error(&format!("[GenaiModelClient] request failed: {}", err));
                return Err(err);
            }
            Err(_) => {
                self.logger.warn(&format!(
                    "[GenaiModelClient] request timed out after {}s",
                    self.timeout.as_secs()
                ));
                return Err(ModelError::transient(
                    &self.provider_id,
                    format!("request timed out after {}s", self.timeout.as_secs()),
                ));
            }
        };

        let reply = from_genai_response(&self.provider_id, response)?;
        self.logger.debug(&format!(
            "[GenaiModelClient] response: {} tool call(s), usage={:?}",
            reply.response.calls().len(),
            reply.usage
        ));
        Ok(reply)
    }
}

//! Adapter between tinyagent types and genai types
//!
//! Turns, tool specs and settings go in as genai chat requests; genai chat
//! responses and errors come back out as `ModelReply` and `ModelError`.
//!
//! Auth never goes through genai's own env var lookup: the key is resolved
//! from our `SecretStore` before the client is built.

use std::future::Future;
use std::pin::Pin;

use genai::chat::{
    ChatMessage as GenaiMessage, ChatOptions as GenaiOptions, ChatResponse as GenaiResponse,
    Tool as GenaiTool, ToolCall as GenaiToolCall, ToolResponse as GenaiToolResponse,
    Usage as GenaiUsage,
};
use genai::resolver::{AuthData, AuthResolver, Endpoint, ServiceTargetResolver};
use genai::{adapter::AdapterKind, Client, ModelIden, ServiceTarget};
use serde_json::{json, Value};

use crate::config::ModelSettings;
use crate::types::{ModelReply, ModelResponse, TokenUsage, ToolCallRequest, ToolSpec, Turn, TurnContent, TurnRole};

use super::error::{ModelError, ModelResult};
use super::traits::ModelRequest;

// ============================================================================
// Request Conversion: tinyagent -> genai
// ============================================================================

/// System prompt with attachments appended as context blocks
pub fn system_text(request: &ModelRequest<'_>) -> String {
    if request.attachments.is_empty() {
        return request.system_prompt.to_string();
    }
    let docs: Vec<String> = request.attachments.iter().map(|a| a.render()).collect();
    format!(
        "{}\n\nThe user attached the following documents:\n\n{}",
        request.system_prompt,
        docs.join("\n\n")
    )
}

/// Convert one tool call request to a genai ToolCall
pub fn to_genai_tool_call(call: &ToolCallRequest) -> ModelResult<GenaiToolCall> {
    // Built through serde so provider-specific optional fields take their defaults
    serde_json::from_value(json!({
        "call_id": call.id,
        "fn_name": call.name,
        "fn_arguments": call.arguments,
    }))
    .map_err(|e| ModelError::protocol("genai", format!("cannot encode tool call {}: {}", call.id, e)))
}

/// Convert one turn to genai messages
///
/// Explanatory text on a tool-call turn is not replayed; providers expect
/// the assistant tool-use message on its own.
pub fn to_genai_message(turn: &Turn) -> ModelResult<GenaiMessage> {
    let message = match (&turn.role, &turn.content) {
        (TurnRole::User, TurnContent::Text { text }) => GenaiMessage::user(text.clone()),
        (TurnRole::Model, TurnContent::Text { text }) => GenaiMessage::assistant(text.clone()),
        (_, TurnContent::ToolCalls { calls, .. }) => {
            let calls = calls.iter().map(to_genai_tool_call).collect::<ModelResult<Vec<_>>>()?;
            GenaiMessage::from(calls)
        }
        (_, TurnContent::ToolResult { result }) => {
            GenaiMessage::from(GenaiToolResponse::new(result.call_id.clone(), result.model_content()))
        }
        (TurnRole::Tool, TurnContent::Text { text }) => GenaiMessage::user(text.clone()),
    };
    Ok(message)
}

/// Convert the request's history and pending input to genai messages
pub fn to_genai_messages(request: &ModelRequest<'_>) -> ModelResult<Vec<GenaiMessage>> {
    request.turns().map(to_genai_message).collect()
}

/// Convert a ToolSpec to a genai Tool
pub fn to_genai_tool(spec: &ToolSpec) -> GenaiTool {
    GenaiTool::new(&spec.name)
        .with_description(&spec.description)
        .with_schema(spec.input_schema())
}

/// Convert tool specs to genai tools
pub fn to_genai_tools(specs: &[ToolSpec]) -> Vec<GenaiTool> {
    specs.iter().map(to_genai_tool).collect()
}

/// Convert model settings to genai ChatOptions
pub fn to_genai_options(settings: &ModelSettings) -> GenaiOptions {
    let mut options = GenaiOptions::default().with_max_tokens(settings.max_tokens);

    if let Some(temp) = settings.temperature {
        options = options.with_temperature(temp as f64);
    }

    options
}

// ============================================================================
// Response Conversion: genai -> tinyagent
// ============================================================================

/// Convert a genai ToolCall to a ToolCallRequest
pub fn from_genai_tool_call(tc: &GenaiToolCall) -> ToolCallRequest {
    // Some providers hand back the arguments as a JSON-encoded string
    let arguments = match &tc.fn_arguments {
        Value::String(raw) => serde_json::from_str::<Value>(raw).unwrap_or_else(|_| tc.fn_arguments.clone()),
        other => other.clone(),
    };
    ToolCallRequest::new(tc.call_id.clone(), tc.fn_name.clone(), arguments)
}

/// Convert genai usage, `None` when the service reported nothing
pub fn from_genai_usage(usage: &GenaiUsage) -> Option<TokenUsage> {
    if usage.prompt_tokens.is_none() && usage.completion_tokens.is_none() {
        return None;
    }
    let count = |n: Option<i32>| n.unwrap_or(0).max(0) as u32;
    Some(TokenUsage {
        prompt_tokens: count(usage.prompt_tokens),
        completion_tokens: count(usage.completion_tokens),
    })
}

/// Convert a complete genai response
pub fn from_genai_response(provider: &str, response: GenaiResponse) -> ModelResult<ModelReply> {
    let usage = from_genai_usage(&response.usage);
    let text = response.first_text().map(str::to_string);
    let calls: Vec<ToolCallRequest> = response
        .into_tool_calls()
        .iter()
        .map(from_genai_tool_call)
        .collect();
    build_reply(provider, text, calls, usage)
}

/// Check the extracted parts of a response and assemble the reply
pub(crate) fn build_reply(
    provider: &str,
    text: Option<String>,
    calls: Vec<ToolCallRequest>,
    usage: Option<TokenUsage>,
) -> ModelResult<ModelReply> {
    if let Some(call) = calls.iter().find(|c| c.id.is_empty() || c.name.is_empty()) {
        return Err(ModelError::protocol(
            provider,
            format!("tool call without id or name: {:?}", call),
        ));
    }

    let response = ModelResponse::from_parts(text, calls)
        .ok_or_else(|| ModelError::protocol(provider, "empty response: no text and no tool calls"))?;
    Ok(ModelReply { response, usage })
}

/// Classify a genai failure as transient or protocol-level
///
/// Decided by the error variant; the message is only inspected for
/// variants that do not say either way.
pub fn classify_error(provider: &str, error: &genai::Error) -> ModelError {
    use genai::webc::Error as WebError;
    use genai::Error as E;

    let message = error.to_string();
    match error {
        E::RequiresApiKey { .. } | E::NoAuthData { .. } => ModelError::missing_api_key(provider),
        E::NoChatResponse { .. }
        | E::InvalidJsonResponseElement { .. }
        | E::ChatResponseGeneration { .. }
        | E::StreamParse { .. }
        | E::JsonValueExt(_)
        | E::SerdeJson(_) => ModelError::protocol(provider, message),
        E::WebAdapterCall { webc_error, .. } | E::WebModelCall { webc_error, .. } => match webc_error {
            WebError::ResponseFailedNotJson { .. }
            | WebError::ResponseFailedInvalidJson { .. }
            | WebError::JsonValueExt(_) => ModelError::protocol(provider, message),
            WebError::ResponseFailedStatus { .. } | WebError::Reqwest(_) => ModelError::transient(provider, message),
        },
        E::HttpError { .. } | E::WebStream { .. } | E::ChatResponse { .. } => ModelError::transient(provider, message),
        _ => classify_message(provider, message),
    }
}

/// Fallback classification from the error text
pub(crate) fn classify_message(provider: &str, message: String) -> ModelError {
    let lower = message.to_lowercase();
    let protocol_markers = ["json", "parse", "deserializ", "invalid response", "no content", "unexpected"];
    if protocol_markers.iter().any(|m| lower.contains(m)) {
        ModelError::protocol(provider, message)
    } else {
        // Network, timeout, rate limit and anything else the service reports
        ModelError::transient(provider, message)
    }
}

// ============================================================================
// Provider Resolution
// ============================================================================

/// Default API base for a provider id
pub fn default_api_base(provider: &str) -> &'static str {
    match provider {
        "openai" => "https://api.openai.com/v1/",
        "anthropic" => "https://api.anthropic.com/v1/",
        "gemini" => "https://generativelanguage.googleapis.com/v1beta/",
        "ollama" => "http://localhost:11434/",
        "groq" => "https://api.groq.com/openai/v1/",
        "xai" => "https://api.x.ai/v1/",
        "deepseek" => "https://api.deepseek.com/",
        "cohere" => "https://api.cohere.com/v1/",
        "openrouter" => "https://openrouter.ai/api/v1/",
        "mistral" => "https://api.mistral.ai/v1/",
        _ => "https://api.openai.com/v1/",
    }
}

/// genai adapter for a provider id; unknown providers speak the OpenAI protocol
pub fn adapter_kind(provider: &str) -> AdapterKind {
    match provider {
        "anthropic" => AdapterKind::Anthropic,
        "gemini" | "google" => AdapterKind::Gemini,
        "ollama" => AdapterKind::Ollama,
        "groq" => AdapterKind::Groq,
        "xai" => AdapterKind::Xai,
        "deepseek" => AdapterKind::DeepSeek,
        "cohere" => AdapterKind::Cohere,
        _ => AdapterKind::OpenAI,
    }
}

/// Check if a provider is natively supported by genai
pub fn is_genai_native(provider: &str) -> bool {
    matches!(
        provider,
        "openai" | "anthropic" | "gemini" | "google" | "ollama" | "groq" | "xai" | "deepseek" | "cohere"
    )
}

/// Whether a provider needs an API key at all
pub fn requires_api_key(provider: &str) -> bool {
    !matches!(provider, "ollama" | "mock")
}

/// Create a genai Client bound to one provider
///
/// The provider id decides the adapter (genai would otherwise infer it from
/// the model name), `api_base` overrides the endpoint.
pub fn create_client(provider: &str, api_key: Option<String>, api_base: Option<String>) -> Client {
    let auth_key = api_key;
    let auth_resolver = AuthResolver::from_resolver_async_fn(
        move |_model_iden: ModelIden| -> Pin<Box<dyn Future<Output = genai::resolver::Result<Option<AuthData>>> + Send>> {
            let key = auth_key.clone();
            // None lets genai handle keyless providers such as Ollama
            Box::pin(async move { Ok(key.map(AuthData::from_single)) })
        },
    );

    let target_provider = provider.to_string();
    let target_resolver = ServiceTargetResolver::from_resolver_fn(
        move |target: ServiceTarget| -> Result<ServiceTarget, genai::resolver::Error> {
            let wanted = adapter_kind(&target_provider);
            let adapter_changed = target.model.adapter_kind != wanted;

            if !adapter_changed && api_base.is_none() && is_genai_native(&target_provider) {
                return Ok(target);
            }

            let endpoint = match &api_base {
                Some(base) => Endpoint::from_owned(base.clone()),
                None if adapter_changed || !is_genai_native(&target_provider) => {
                    Endpoint::from_static(default_api_base(&target_provider))
                }
                None => target.endpoint,
            };

            Ok(ServiceTarget {
                endpoint,
                auth: target.auth,
                model: ModelIden::new(wanted, target.model.model_name.clone()),
            })
        },
    );

    Client::builder()
        .with_auth_resolver(auth_resolver)
        .with_service_target_resolver(target_resolver)
        .build()
}

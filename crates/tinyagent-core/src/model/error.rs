//! Model client error types

use thiserror::Error;

/// Errors that can occur while asking the model for a response
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// No API key could be resolved for a provider that needs one
    #[error("API key is required for {provider}")]
    MissingApiKey { provider: String },

    /// Network failure, timeout, rate limit or server-side error
    #[error("{provider} service unavailable: {message}")]
    Transient { provider: String, message: String },

    /// The service answered with something that cannot be interpreted
    #[error("Invalid response from {provider}: {message}")]
    Protocol { provider: String, message: String },
}

impl ModelError {
    pub fn missing_api_key(provider: impl Into<String>) -> Self {
        Self::MissingApiKey {
            provider: provider.into(),
        }
    }

    pub fn transient(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transient {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn protocol(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Protocol {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether resending the same request might succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, ModelError::Transient { .. })
    }
}

pub type ModelResult<T> = Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_kind() {
        let err = ModelError::transient("anthropic", "HTTP 529 overloaded");
        assert!(err.is_transient());
        assert_eq!(err.to_string(), "anthropic service unavailable: HTTP 529 overloaded");

        let err = ModelError::protocol("openai", "empty choices");
        assert!(!err.is_transient());
        assert_eq!(err.to_string(), "Invalid response from openai: empty choices");

        assert_eq!(
            ModelError::missing_api_key("groq").to_string(),
            "API key is required for groq"
        );
    }
}

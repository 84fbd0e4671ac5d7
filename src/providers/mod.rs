/*!
 * Provider implementations for different translation services.
 *
 * This module contains client implementations for various LLM providers:
 * - Ollama: Local LLM server
 * - OpenAI: OpenAI API integration (also used for LM Studio)
 * - Anthropic: Anthropic API integration
 * - Mock: Scriptable provider used by tests
 *
 * Clients make exactly one HTTP call per `complete`. Retrying is the
 * caller's job so that a single attempt budget covers every provider.
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Common trait for all LLM providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably in the translation service.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Complete a request using this provider
    ///
    /// # Arguments
    /// * `request` - The request to complete
    ///
    /// # Returns
    /// * `Result<Self::Response, ProviderError>` - The response from the provider or an error
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Extract text from the provider response
    fn extract_text(response: &Self::Response) -> String;
}

/// Map a transport failure to a provider error
pub(crate) fn classify_reqwest_error(provider: &str, error: reqwest::Error) -> ProviderError {
    if error.is_connect() || error.is_timeout() {
        ProviderError::ConnectionError(format!("{}: {}", provider, error))
    } else {
        ProviderError::RequestFailed(format!("{}: {}", provider, error))
    }
}

/// Map a non-success HTTP status to a provider error
pub(crate) fn classify_status(status: reqwest::StatusCode, body: String) -> ProviderError {
    match status.as_u16() {
        401 | 403 => ProviderError::AuthenticationError(body),
        429 => ProviderError::RateLimitExceeded(body),
        code => ProviderError::ApiError { status_code: code, message: body },
    }
}

pub mod ollama;
pub mod openai;
pub mod anthropic;
pub mod mock;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifyStatus_shouldPickVariant() {
        let auth = classify_status(reqwest::StatusCode::UNAUTHORIZED, "no".to_string());
        assert!(matches!(auth, ProviderError::AuthenticationError(_)));

        let limited = classify_status(reqwest::StatusCode::TOO_MANY_REQUESTS, "slow down".to_string());
        assert!(matches!(limited, ProviderError::RateLimitExceeded(_)));

        let server = classify_status(reqwest::StatusCode::BAD_GATEWAY, "down".to_string());
        assert!(matches!(server, ProviderError::ApiError { status_code: 502, .. }));
        assert!(server.is_retryable());
    }
}

/*!
 * Core translation service implementation.
 *
 * `TranslationCapability` is the single seam between the pipeline and any
 * language model: one prompt in, one completion out. `TranslationService`
 * implements it over the configured HTTP provider.
 */

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::{debug, warn};
use std::time::{Duration, Instant};
use url::Url;

use crate::app_config::{TranslationCommonConfig, TranslationConfig, TranslationProvider as ConfigTranslationProvider};
use crate::errors::{ProviderError, TranslationError};
use crate::providers::anthropic::{Anthropic, AnthropicRequest};
use crate::providers::ollama::{GenerationRequest, Ollama};
use crate::providers::openai::{OpenAI, OpenAIRequest};
use crate::providers::Provider;

/// System prompt shared by every provider
const SYSTEM_PROMPT: &str = "You are a professional subtitle translator. \
    Follow the instructions in the user message exactly and reply with only the requested output, \
    without explanations or notes.";

/// Anything that can turn a prompt into a completion
///
/// Implementations make one attempt per call. Callers own retrying.
#[async_trait]
pub trait TranslationCapability: Send + Sync {
    async fn complete_text(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Attempt budget shared by every request the pipeline makes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included
    pub max_attempts: u32,
    /// Attempt n waits n times this before the next try
    pub backoff_ms: u64,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_ms: u64) -> Self {
        Self { max_attempts: max_attempts.max(1), backoff_ms }
    }

    /// Single attempt, no waiting
    pub fn once() -> Self {
        Self::new(1, 0)
    }

    /// Send `prompt` until `accept` takes the reply or attempts run out
    ///
    /// `accept` turns a raw completion into the caller's value; rejecting it
    /// counts as a failed attempt. Non-retryable provider errors stop early.
    pub async fn run<T, F>(
        &self,
        capability: &dyn TranslationCapability,
        prompt: &str,
        mut accept: F,
    ) -> Result<T, TranslationError>
    where
        T: Send,
        F: FnMut(&str) -> Result<T, TranslationError> + Send,
    {
        let mut attempt = 1;
        loop {
            let error = match capability.complete_text(prompt).await {
                Ok(reply) => match accept(&reply) {
                    Ok(value) => return Ok(value),
                    Err(e) => e,
                },
                Err(e) if !e.is_retryable() => return Err(e.into()),
                Err(e) => e.into(),
            };

            if attempt >= self.max_attempts {
                return Err(error);
            }
            warn!("Attempt {}/{} failed: {}", attempt, self.max_attempts, error);
            tokio::time::sleep(Duration::from_millis(self.backoff_ms * attempt as u64)).await;
            attempt += 1;
        }
    }
}

impl From<&TranslationCommonConfig> for RetryPolicy {
    fn from(common: &TranslationCommonConfig) -> Self {
        Self::new(common.max_attempts, common.retry_backoff_ms)
    }
}

/// Validate an endpoint string before handing it to a client
///
/// An empty endpoint is passed through; clients then use their public default.
fn normalize_endpoint(endpoint: &str) -> Result<String> {
    if endpoint.is_empty() {
        return Ok(String::new());
    }

    let url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Url::parse(endpoint)?
    } else {
        Url::parse(&format!("http://{}", endpoint))?
    };

    if url.host_str().is_none() {
        return Err(anyhow!("Invalid host in endpoint: {}", endpoint));
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// Translation provider implementation variants
enum TranslationProviderImpl {
    /// Ollama LLM service
    Ollama { client: Ollama },

    /// OpenAI API service
    OpenAI { client: OpenAI },

    /// LM Studio local server (OpenAI-compatible)
    LMStudio { client: OpenAI },

    /// Anthropic API service
    Anthropic { client: Anthropic },
}

/// Translation service backed by the configured provider
pub struct TranslationService {
    /// Provider implementation
    provider: TranslationProviderImpl,

    /// Configuration for the translation service
    pub config: TranslationConfig,
}

impl TranslationService {
    /// Create a new translation service with the given configuration
    pub fn new(config: TranslationConfig) -> Result<Self> {
        let endpoint = normalize_endpoint(&config.get_endpoint())?;
        let timeout_secs = config.get_timeout_secs();

        let provider = match config.provider {
            ConfigTranslationProvider::Ollama => TranslationProviderImpl::Ollama {
                client: Ollama::new(endpoint, timeout_secs),
            },
            ConfigTranslationProvider::OpenAI => TranslationProviderImpl::OpenAI {
                client: OpenAI::new(config.get_api_key(), endpoint, timeout_secs),
            },
            ConfigTranslationProvider::LMStudio => {
                // LM Studio often doesn't require an API key; use a default if empty
                let api_key = {
                    let k = config.get_api_key();
                    if k.is_empty() { "lm-studio".to_string() } else { k }
                };
                TranslationProviderImpl::LMStudio {
                    client: OpenAI::new(api_key, endpoint, timeout_secs),
                }
            }
            ConfigTranslationProvider::Anthropic => TranslationProviderImpl::Anthropic {
                client: Anthropic::new(config.get_api_key(), endpoint, timeout_secs),
            },
        };

        Ok(Self { provider, config })
    }

    /// Get the maximum number of tokens for a given model
    fn max_tokens_for_model(model: &str) -> u32 {
        match model {
            // OpenAI models
            "gpt-4" | "gpt-4-0613" => 8192,
            "gpt-4-32k" | "gpt-4-32k-0613" => 32768,
            "gpt-3.5-turbo-16k" | "gpt-3.5-turbo-16k-0613" => 16384,
            m if m.starts_with("gpt-4o") || m.starts_with("gpt-4.1") => 16384,

            // Anthropic models
            m if m.starts_with("claude-3-5") || m.starts_with("claude-3-7") => 8192,
            m if m.starts_with("claude") => 4096,

            // Default for unknown models
            _ => 4096,
        }
    }
}

#[async_trait]
impl TranslationCapability for TranslationService {
    async fn complete_text(&self, prompt: &str) -> Result<String, ProviderError> {
        let start_time = Instant::now();
        let model = self.config.get_model();
        let temperature = self.config.common.temperature;

        let text = match &self.provider {
            TranslationProviderImpl::Ollama { client } => {
                let request = GenerationRequest::new(&model, prompt)
                    .system(SYSTEM_PROMPT)
                    .temperature(temperature);
                let response = client.complete(request).await?;
                Ollama::extract_text(&response)
            }
            TranslationProviderImpl::OpenAI { client } | TranslationProviderImpl::LMStudio { client } => {
                let request = OpenAIRequest::new(&model)
                    .add_message("system", SYSTEM_PROMPT)
                    .add_message("user", prompt)
                    .temperature(temperature)
                    .max_tokens(Self::max_tokens_for_model(&model));
                let response = client.complete(request).await?;
                OpenAI::extract_text(&response)
            }
            TranslationProviderImpl::Anthropic { client } => {
                let request = AnthropicRequest::new(&model, Self::max_tokens_for_model(&model))
                    .system(SYSTEM_PROMPT)
                    .add_message("user", prompt)
                    .temperature(temperature);
                let response = client.complete(request).await?;
                Anthropic::extract_text(&response)
            }
        };

        debug!("{} completion received in {:?}", self.config.provider, start_time.elapsed());
        Ok(text)
    }
}

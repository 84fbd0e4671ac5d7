use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::Path;

use crate::language_utils;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Language of the caption track (ISO code, or zh_cn / zh_tw)
    pub origin_language: String,

    /// Language to translate into; "none" disables translation output
    pub target_language: String,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Output subtitle config
    #[serde(default)]
    pub subtitle: SubtitleConfig,

    /// Caption acquisition config
    #[serde(default)]
    pub acquisition: AcquisitionConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: Ollama
    #[default]
    Ollama,
    // @provider: OpenAI
    OpenAI,
    // @provider: Anthropic
    Anthropic,
    // @provider: LM Studio (OpenAI-compatible local server)
    LMStudio,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Ollama => "Ollama",
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::LMStudio => "LM Studio",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Ollama => "ollama".to_string(),
            Self::OpenAI => "openai".to_string(),
            Self::Anthropic => "anthropic".to_string(),
            Self::LMStudio => "lmstudio".to_string(),
        }
    }

    fn default_model(&self) -> String {
        match self {
            Self::Ollama => "llama3.2:3b".to_string(),
            Self::OpenAI => "gpt-4o-mini".to_string(),
            Self::Anthropic => "claude-3-haiku-20240307".to_string(),
            // Placeholder; users should set the model loaded in LM Studio
            Self::LMStudio => "local-model".to_string(),
        }
    }

    fn default_endpoint(&self) -> String {
        match self {
            Self::Ollama => "http://localhost:11434".to_string(),
            Self::OpenAI => "https://api.openai.com/v1".to_string(),
            Self::Anthropic => "https://api.anthropic.com".to_string(),
            Self::LMStudio => "http://localhost:1234/v1".to_string(),
        }
    }

    fn requires_api_key(&self) -> bool {
        matches!(self, Self::OpenAI | Self::Anthropic)
    }
}

// Implement Display trait for TranslationProvider
impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

// Implement FromStr trait for TranslationProvider
impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            "lmstudio" => Ok(Self::LMStudio),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: TranslationProvider) -> Self {
        Self {
            provider_type: provider_type.to_lowercase_string(),
            model: provider_type.default_model(),
            api_key: String::new(),
            endpoint: provider_type.default_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// How merged captions are sent to the provider
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TranslationMode {
    /// One request per merged sentence with surrounding context
    #[default]
    PerSentence,
    /// One request for the whole transcript, re-timed from word timings
    WholeTranscript,
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Translation provider to use
    #[serde(default)]
    pub provider: TranslationProvider,

    /// Available translation providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Common translation settings
    #[serde(default)]
    pub common: TranslationCommonConfig,
}

/// Common translation settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// Maximum number of translation requests in flight at once
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,

    /// Attempts per text before falling back to the original
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Linear backoff unit between attempts (attempt n waits n * this)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Temperature parameter for text generation (0.0 to 1.0)
    /// Lower values make output more deterministic, higher values more creative
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Neighbouring sentences given as context on each side
    #[serde(default = "default_context_sentences")]
    pub context_sentences: usize,

    /// Per-sentence or whole-transcript translation
    #[serde(default)]
    pub mode: TranslationMode,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            max_parallel: default_max_parallel(),
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            temperature: default_temperature(),
            context_sentences: default_context_sentences(),
            mode: TranslationMode::default(),
        }
    }
}

/// Which subtitle variant is the primary deliverable
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubtitleResultType {
    OriginOnly,
    TargetOnly,
    BilingualTranslationOnTop,
    #[default]
    BilingualTranslationOnBottom,
}

impl SubtitleResultType {
    pub fn is_bilingual(&self) -> bool {
        matches!(self, Self::BilingualTranslationOnTop | Self::BilingualTranslationOnBottom)
    }
}

/// Language used for display names in the subtitle manifest
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum UiLanguage {
    #[default]
    English,
    SimplifiedChinese,
}

/// Configuration for subtitle processing
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SubtitleConfig {
    /// Primary output variant, also decides bilingual line order
    #[serde(default)]
    pub result_type: SubtitleResultType,

    /// Language of the manifest display names
    #[serde(default)]
    pub ui_language: UiLanguage,

    /// Gap above which two captions are never merged
    #[serde(default = "default_merge_gap_ms")]
    pub merge_gap_ms: u64,

    /// Character count at which a merge group is closed
    #[serde(default = "default_merge_max_chars")]
    pub merge_max_chars: usize,

    /// Space left between a clamped caption and the next one
    #[serde(default = "default_overlap_padding_ms")]
    pub overlap_padding_ms: u64,

    /// Longest caption produced by whole-transcript re-chunking
    #[serde(default = "default_max_block_chars")]
    pub max_block_chars: usize,
}

impl Default for SubtitleConfig {
    fn default() -> Self {
        Self {
            result_type: SubtitleResultType::default(),
            ui_language: UiLanguage::default(),
            merge_gap_ms: default_merge_gap_ms(),
            merge_max_chars: default_merge_max_chars(),
            overlap_padding_ms: default_overlap_padding_ms(),
            max_block_chars: default_max_block_chars(),
        }
    }
}

/// Settings for downloading caption tracks
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AcquisitionConfig {
    /// Path or name of the yt-dlp binary
    #[serde(default = "default_ytdlp_path")]
    pub ytdlp_path: String,

    /// Optional proxy URL passed to yt-dlp
    #[serde(default)]
    pub proxy: Option<String>,

    /// Optional cookies file passed to yt-dlp
    #[serde(default)]
    pub cookies_path: Option<String>,

    /// Optional ffmpeg location passed to yt-dlp
    #[serde(default)]
    pub ffmpeg_path: Option<String>,

    /// Download attempts before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: default_ytdlp_path(),
            proxy: None,
            cookies_path: None,
            ffmpeg_path: None,
            max_attempts: default_max_attempts(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_parallel() -> usize {
    4
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_temperature() -> f32 {
    0.3
}

fn default_context_sentences() -> usize {
    3
}

fn default_merge_gap_ms() -> u64 {
    200
}

fn default_merge_max_chars() -> usize {
    250
}

fn default_overlap_padding_ms() -> u64 {
    50
}

fn default_max_block_chars() -> usize {
    80
}

fn default_ytdlp_path() -> String {
    "yt-dlp".to_string()
}

impl Config {
    /// Load a configuration file, or write the defaults there if it is missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }

        log::warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Validate languages
        language_utils::validate_project_language(&self.origin_language)?;
        if !language_utils::is_no_translation(&self.target_language) {
            language_utils::validate_project_language(&self.target_language)?;
        }

        let common = &self.translation.common;
        if common.max_parallel == 0 {
            return Err(anyhow!("translation.common.max_parallel must be at least 1"));
        }
        if common.max_attempts == 0 {
            return Err(anyhow!("translation.common.max_attempts must be at least 1"));
        }
        if self.acquisition.max_attempts == 0 {
            return Err(anyhow!("acquisition.max_attempts must be at least 1"));
        }

        // Validate API key for hosted providers
        if self.translation.provider.requires_api_key() && self.translation.get_api_key().is_empty() {
            return Err(anyhow!(
                "Translation API key is required for {} provider",
                self.translation.provider.display_name()
            ));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            origin_language: "en".to_string(),
            target_language: "zh_cn".to_string(),
            translation: TranslationConfig::default(),
            subtitle: SubtitleConfig::default(),
            acquisition: AcquisitionConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl TranslationConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        let provider_str = self.provider.to_lowercase_string();
        self.available_providers.iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Mutable access used by CLI overrides
    pub fn get_active_provider_config_mut(&mut self) -> Option<&mut ProviderConfig> {
        let provider_str = self.provider.to_lowercase_string();
        self.available_providers.iter_mut()
            .find(|p| p.provider_type == provider_str)
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        self.get_active_provider_config()
            .filter(|p| !p.model.is_empty())
            .map(|p| p.model.clone())
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// Get the API key for the active provider
    pub fn get_api_key(&self) -> String {
        self.get_active_provider_config()
            .map(|p| p.api_key.clone())
            .unwrap_or_default()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        self.get_active_provider_config()
            .filter(|p| !p.endpoint.is_empty())
            .map(|p| p.endpoint.clone())
            .unwrap_or_else(|| self.provider.default_endpoint())
    }

    /// Get the request timeout for the active provider
    pub fn get_timeout_secs(&self) -> u64 {
        self.get_active_provider_config()
            .map(|p| p.timeout_secs)
            .filter(|secs| *secs > 0)
            .unwrap_or_else(default_timeout_secs)
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            available_providers: vec![
                ProviderConfig::new(TranslationProvider::Ollama),
                ProviderConfig::new(TranslationProvider::OpenAI),
                ProviderConfig::new(TranslationProvider::Anthropic),
                ProviderConfig::new(TranslationProvider::LMStudio),
            ],
            common: TranslationCommonConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_shouldValidate() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.subtitle.merge_gap_ms, 200);
        assert_eq!(config.subtitle.merge_max_chars, 250);
        assert_eq!(config.translation.common.context_sentences, 3);
    }

    #[test]
    fn test_validate_withOpenAiAndNoKey_shouldFail() {
        let mut config = Config::default();
        config.translation.provider = TranslationProvider::OpenAI;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_withZeroParallelism_shouldFail() {
        let mut config = Config::default();
        config.translation.common.max_parallel = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_withPartialJson_shouldFillDefaults() {
        let json = r#"{"origin_language": "en", "target_language": "none",
                       "subtitle": {"result_type": "bilingual_translation_on_top"}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.subtitle.result_type, SubtitleResultType::BilingualTranslationOnTop);
        assert_eq!(config.subtitle.overlap_padding_ms, 50);
        assert_eq!(config.translation.common.mode, TranslationMode::PerSentence);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_providerFromStr_withMixedCase_shouldParse() {
        let provider: TranslationProvider = "LMStudio".parse().unwrap();
        assert_eq!(provider, TranslationProvider::LMStudio);
        assert!("gemini".parse::<TranslationProvider>().is_err());
    }
}

/*!
 * Error types for the rollsub application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 *
 * Only acquisition, format and file-level errors end a run. Everything that
 * concerns a single line of text is recovered where it happens.
 */

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Whether repeating the same request may succeed
    ///
    /// Model output varies between calls, so unparseable replies are retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RequestFailed(_) | Self::ConnectionError(_) | Self::RateLimitExceeded(_) | Self::ParseError(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500 || *status_code == 429,
            Self::AuthenticationError(_) => false,
        }
    }
}

/// Errors that can occur while acquiring or reading caption files
#[derive(Error, Debug)]
pub enum CaptionError {
    /// The caption source gave up after its own retries
    #[error("Caption acquisition failed after {attempts} attempts: {message}")]
    Acquisition {
        /// Attempts made before giving up
        attempts: u32,
        /// Last failure reported by the source
        message: String,
    },

    /// The caption file has an extension we cannot read
    #[error("Unsupported caption format: {0}")]
    UnsupportedFormat(String),

    /// A single cue or block could not be parsed
    #[error("Invalid caption block at line {line}: {reason}")]
    BlockParse {
        /// 1-based line number where the block starts
        line: usize,
        /// Why the block was rejected
        reason: String,
    },

    /// Parsing finished without a single usable block
    #[error("No caption content found in {0}")]
    NoContent(String),

    /// Reading or writing a caption file failed
    #[error("Caption file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur during translation
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// A structured split returned the wrong number of parts
    #[error("Split returned {got} parts, expected {expected}")]
    SplitMismatch {
        /// Number of original fragments
        expected: usize,
        /// Number of parts in the response
        got: usize,
    },

    /// The provider answered with something we could not interpret
    #[error("Malformed translation response: {0}")]
    MalformedResponse(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from caption acquisition or parsing
    #[error("Caption error: {0}")]
    Caption(#[from] CaptionError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// The caller cancelled the task between two stages
    #[error("Task {0} was cancelled")]
    Cancelled(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isRetryable_withServerError_shouldBeTrue() {
        let error = ProviderError::ApiError { status_code: 503, message: "busy".to_string() };
        assert!(error.is_retryable());
    }

    #[test]
    fn test_isRetryable_withAuthError_shouldBeFalse() {
        assert!(!ProviderError::AuthenticationError("bad key".to_string()).is_retryable());
        let error = ProviderError::ApiError { status_code: 400, message: "bad".to_string() };
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_appError_fromCaptionError_shouldWrap() {
        let error: AppError = CaptionError::UnsupportedFormat("movie.ass".to_string()).into();
        assert!(error.to_string().contains("movie.ass"));
    }
}

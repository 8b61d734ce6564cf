// LLM Gateway Error Types
// Feature: LLM Gateway

use thiserror::Error;

/// LLM Gateway Error
#[derive(Error, Debug)]
pub enum LlmError {
    /// Connection failed
    #[error("Cannot connect to LLM provider: {0}")]
    ConnectionFailed(String),

    /// Authentication failed
    #[error("Invalid or expired API key: {0}")]
    AuthFailed(String),

    /// Rate limited
    #[error("API rate limit exceeded, please try again later")]
    RateLimited,

    /// Input too long for the model's context window
    #[error("Input exceeds the model's context length: {0}")]
    TokenLimitExceeded(String),

    /// Request timeout
    #[error("LLM provider response timeout")]
    Timeout,

    /// Model not found
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// API error from provider
    #[error("LLM provider error: {0}")]
    ApiError(String),

    /// Streaming response failed mid-flight
    #[error("Stream error: {0}")]
    Stream(String),

    /// JSON parsing error
    #[error("Response parse error: {0}")]
    ParseError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else if err.is_connect() {
            LlmError::ConnectionFailed(err.to_string())
        } else {
            LlmError::ApiError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::ParseError(err.to_string())
    }
}

/// Result type for LLM operations
pub type LlmResult<T> = Result<T, LlmError>;

/// LLM error codes for API consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorCode {
    ConnectionFailed,
    AuthFailed,
    RateLimited,
    TokenLimitExceeded,
    Timeout,
    ModelNotFound,
    ApiError,
    Stream,
    ParseError,
    InvalidConfig,
}

impl LlmErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmErrorCode::ConnectionFailed => "LLM_CONNECTION_FAILED",
            LlmErrorCode::AuthFailed => "LLM_AUTH_FAILED",
            LlmErrorCode::RateLimited => "LLM_RATE_LIMITED",
            LlmErrorCode::TokenLimitExceeded => "LLM_TOKEN_LIMIT",
            LlmErrorCode::Timeout => "LLM_TIMEOUT",
            LlmErrorCode::ModelNotFound => "LLM_MODEL_NOT_FOUND",
            LlmErrorCode::ApiError => "LLM_API_ERROR",
            LlmErrorCode::Stream => "LLM_STREAM_ERROR",
            LlmErrorCode::ParseError => "LLM_PARSE_ERROR",
            LlmErrorCode::InvalidConfig => "LLM_INVALID_CONFIG",
        }
    }
}

impl LlmError {
    pub fn code(&self) -> LlmErrorCode {
        match self {
            LlmError::ConnectionFailed(_) => LlmErrorCode::ConnectionFailed,
            LlmError::AuthFailed(_) => LlmErrorCode::AuthFailed,
            LlmError::RateLimited => LlmErrorCode::RateLimited,
            LlmError::TokenLimitExceeded(_) => LlmErrorCode::TokenLimitExceeded,
            LlmError::Timeout => LlmErrorCode::Timeout,
            LlmError::ModelNotFound(_) => LlmErrorCode::ModelNotFound,
            LlmError::ApiError(_) => LlmErrorCode::ApiError,
            LlmError::Stream(_) => LlmErrorCode::Stream,
            LlmError::ParseError(_) => LlmErrorCode::ParseError,
            LlmError::InvalidConfig(_) => LlmErrorCode::InvalidConfig,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(LlmError::RateLimited.code().as_str(), "LLM_RATE_LIMITED");
        assert_eq!(
            LlmError::Stream("boom".to_string()).code(),
            LlmErrorCode::Stream
        );
    }

    #[test]
    fn test_serde_error_maps_to_parse_error() {
        let err: LlmError = serde_json::from_str::<serde_json::Value>("{oops")
            .unwrap_err()
            .into();
        assert_eq!(err.code(), LlmErrorCode::ParseError);
    }
}

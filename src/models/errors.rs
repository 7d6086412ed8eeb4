//! Centralized Error Handling Module
//!
//! Every failure carries a unique code so logs can be grouped without
//! parsing messages.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - RPC_xxx: gas simulator transport
//! - REQ_xxx: request validation at the relay boundary
//! - PIPELINE_xxx: scoring pipeline
//! - GUARD_xxx / USER_xxx: enforcement outcomes at the wallet decorator
//! - API_xxx / CFG_xxx: outer surfaces

use std::fmt;

/// Application-wide error type
#[derive(Debug)]
pub struct GuardError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl GuardError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl fmt::Display for GuardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for GuardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // RPC Errors
    // ============================================
    /// RPC connection failed
    RpcConnectionFailed,
    /// RPC request timeout
    RpcTimeout,
    /// RPC returned non-2xx
    RpcHttpStatus,
    /// RPC returned error response
    RpcError,
    /// Invalid RPC response
    RpcInvalidResponse,

    // ============================================
    // Request Errors
    // ============================================
    /// Method is not one the guard analyzes
    RequestUnsupportedMethod,
    /// Params do not carry the expected payload
    RequestMalformed,

    // ============================================
    // Pipeline Errors
    // ============================================
    /// Unexpected fault inside feature/score/policy
    PipelineFault,

    // ============================================
    // Enforcement outcomes
    // ============================================
    /// Verdict was block
    GuardBlocked,
    /// User declined after a warning
    UserCancelled,
    /// Wrapped provider failed
    ProviderError,

    // ============================================
    // API / Config Errors
    // ============================================
    ApiBadRequest,
    ConfigInvalidValue,

    /// Unknown error
    Unknown,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RpcConnectionFailed => "RPC_CONNECTION_FAILED",
            Self::RpcTimeout => "RPC_TIMEOUT",
            Self::RpcHttpStatus => "RPC_HTTP_STATUS",
            Self::RpcError => "RPC_ERROR",
            Self::RpcInvalidResponse => "RPC_INVALID_RESPONSE",

            Self::RequestUnsupportedMethod => "REQ_UNSUPPORTED_METHOD",
            Self::RequestMalformed => "REQ_MALFORMED",

            Self::PipelineFault => "PIPELINE_FAULT",

            Self::GuardBlocked => "GUARD_BLOCKED",
            Self::UserCancelled => "USER_CANCELLED",
            Self::ProviderError => "PROVIDER_ERROR",

            Self::ApiBadRequest => "API_BAD_REQUEST",
            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",

            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// HTTP status code for API responses
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ApiBadRequest
            | Self::RequestMalformed
            | Self::RequestUnsupportedMethod
            | Self::ConfigInvalidValue => 400,
            Self::GuardBlocked | Self::UserCancelled => 403,
            Self::RpcTimeout => 504,
            Self::RpcConnectionFailed | Self::RpcHttpStatus | Self::RpcError => 502,
            _ => 500,
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RpcTimeout | Self::RpcConnectionFailed | Self::RpcHttpStatus
        )
    }
}

// ============================================
// Convenience constructors
// ============================================

impl GuardError {
    pub fn rpc_timeout(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RpcTimeout, msg)
    }

    pub fn rpc_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RpcError, msg)
    }

    pub fn unsupported_method(method: &str) -> Self {
        Self::new(
            ErrorCode::RequestUnsupportedMethod,
            format!("Method not analyzed by guard: {}", method),
        )
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RequestMalformed, msg)
    }

    pub fn pipeline(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::PipelineFault, msg)
    }

    pub fn blocked(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::GuardBlocked, msg)
    }

    pub fn user_cancelled() -> Self {
        Self::new(
            ErrorCode::UserCancelled,
            "Operation cancelled by user after warning",
        )
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiBadRequest, msg)
    }
}

/// Application Result type
pub type GuardResult<T> = Result<T, GuardError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<eyre::Report> for GuardError {
    fn from(err: eyre::Report) -> Self {
        Self::new(ErrorCode::Unknown, err.to_string())
    }
}

impl From<reqwest::Error> for GuardError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(ErrorCode::RpcTimeout, "Request timeout")
        } else if err.is_connect() {
            Self::new(ErrorCode::RpcConnectionFailed, "Connection failed")
        } else if err.is_decode() {
            Self::with_source(ErrorCode::RpcInvalidResponse, "Invalid response body", err)
        } else {
            Self::with_source(ErrorCode::Unknown, "HTTP client error", err)
        }
    }
}

impl From<serde_json::Error> for GuardError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::RequestMalformed, "JSON parse error", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = GuardError::rpc_timeout("eth_estimateGas timed out");
        assert_eq!(err.code, ErrorCode::RpcTimeout);
        assert_eq!(err.code_str(), "RPC_TIMEOUT");
        assert_eq!(err.to_string(), "[RPC_TIMEOUT] eth_estimateGas timed out");
    }

    #[test]
    fn test_retryable() {
        assert!(ErrorCode::RpcTimeout.is_retryable());
        assert!(!ErrorCode::GuardBlocked.is_retryable());
        assert!(!ErrorCode::RequestMalformed.is_retryable());
    }

    #[test]
    fn test_http_status() {
        assert_eq!(ErrorCode::RequestMalformed.http_status(), 400);
        assert_eq!(ErrorCode::GuardBlocked.http_status(), 403);
        assert_eq!(ErrorCode::PipelineFault.http_status(), 500);
    }

    #[test]
    fn test_source_chain() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: GuardError = json_err.into();
        assert_eq!(err.code, ErrorCode::RequestMalformed);
        assert!(std::error::Error::source(&err).is_some());
    }
}

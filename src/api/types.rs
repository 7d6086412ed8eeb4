//! API Request/Response Types

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::state::GuardStats;
use crate::models::errors::GuardError;
use crate::models::messages::VerdictMessage;
use crate::models::types::RiskAssessment;

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    pub latency_ms: f64,
    pub timestamp: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, latency_ms: f64) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(error: ApiError, latency_ms: f64) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// API Error
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

impl From<&GuardError> for ApiError {
    fn from(err: &GuardError) -> Self {
        Self {
            code: err.code_str().to_string(),
            message: err.message.clone(),
            retryable: err.code.is_retryable(),
        }
    }
}

// ============================================
// Health & Stats
// ============================================

#[derive(Debug, Serialize)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub guard_enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct StatsData {
    #[serde(flatten)]
    pub guard: GuardStats,
    pub api_version: String,
}

// ============================================
// Checks
// ============================================

/// A CHECK submitted over HTTP; the id is optional here
#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub method: String,
    #[serde(default)]
    pub params: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct CheckData {
    #[serde(flatten)]
    pub verdict: VerdictMessage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment: Option<RiskAssessment>,
}

/// Provider call to analyze without going through the relay
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub method: String,
    #[serde(default)]
    pub params: Vec<Value>,
}

// ============================================
// Address screening
// ============================================

#[derive(Debug, Deserialize)]
pub struct AddressScreenRequest {
    pub address: String,
}


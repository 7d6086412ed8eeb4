//! API Request Handlers

use axum::{
    extract::{Json, State},
    http::StatusCode,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use super::types::*;
use crate::core::analyzer::GuardAnalyzer;
use crate::core::state::GuardState;
use crate::models::errors::GuardError;
use crate::models::messages::CheckMessage;
use crate::models::types::{Analysis, Request};
use crate::utils::address::{screen_address, AddressRisk};

/// Shared application state
pub struct AppState {
    pub analyzer: GuardAnalyzer,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(analyzer: GuardAnalyzer) -> Self {
        Self {
            analyzer,
            start_time: Instant::now(),
        }
    }

    pub fn guard_state(&self) -> &Arc<GuardState> {
        self.analyzer.state()
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

type ApiRejection = (StatusCode, Json<ApiResponse<()>>);
type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiRejection>;

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn reject(err: &GuardError, start: Instant) -> ApiRejection {
    let status =
        StatusCode::from_u16(err.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(ApiResponse::error(ApiError::from(err), elapsed_ms(start))),
    )
}

// ============================================
// Health Check
// ============================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthData>> {
    let start = Instant::now();
    let settings = state.analyzer.settings_snapshot().await;

    let data = HealthData {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        guard_enabled: settings.enabled,
    };

    Json(ApiResponse::success(data, elapsed_ms(start)))
}

// ============================================
// Checks
// ============================================

/// CHECK in, VERDICT (plus the assessment when scoring ran) out.
/// Always answers 200: a broken request still gets a verdict.
pub async fn check_request(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CheckRequest>,
) -> Json<ApiResponse<CheckData>> {
    let start = Instant::now();

    let check = CheckMessage {
        id: req
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        method: req.method,
        params: req.params,
    };

    let (verdict, analysis) = state.analyzer.check_detailed(&check).await;

    let data = CheckData {
        verdict,
        assessment: analysis.and_then(|a| a.assessment),
    };
    Json(ApiResponse::success(data, elapsed_ms(start)))
}

/// Full pipeline output for one provider call
pub async fn analyze_request(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeRequest>,
) -> ApiResult<Analysis> {
    let start = Instant::now();

    let request = Request::from_call(&req.method, &req.params).map_err(|e| {
        warn!(code = e.code_str(), method = %req.method, "Rejected analyze request");
        reject(&e, start)
    })?;

    let analysis = state
        .analyzer
        .analyze(&request)
        .await
        .map_err(|e| reject(&e, start))?;

    info!(
        method = request.method.as_str(),
        action = analysis.verdict.action.as_str(),
        score = ?analysis.assessment.as_ref().map(|a| a.score),
        "🔍 Analysis complete"
    );

    Ok(Json(ApiResponse::success(analysis, elapsed_ms(start))))
}

// ============================================
// Address Screening
// ============================================

pub async fn screen_address_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddressScreenRequest>,
) -> ApiResult<AddressRisk> {
    let start = Instant::now();

    if req.address.trim().is_empty() {
        return Err(reject(&GuardError::bad_request("address is required"), start));
    }

    let guard = state.guard_state();
    let risk = screen_address(&req.address, |addr| guard.is_recently_flagged(addr));
    Ok(Json(ApiResponse::success(risk, elapsed_ms(start))))
}

// ============================================
// Stats
// ============================================

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<ApiResponse<StatsData>> {
    let start = Instant::now();
    let guard = state.guard_state().stats();

    info!(
        "📊 Guard Stats | Checked: {} | Allowed: {} | Warned: {} | Blocked: {} | Failures: {}",
        guard.checked, guard.allowed, guard.warned, guard.blocked, guard.internal_failures
    );

    let data = StatsData {
        guard,
        api_version: env!("CARGO_PKG_VERSION").to_string(),
    };

    Json(ApiResponse::success(data, elapsed_ms(start)))
}

//! Core analyzer module
//! Runs the guard pipeline for one request: settings snapshot, optional
//! gas simulation, feature extraction, scoring and policy.
//!
//! `handle_check` is the analyzer boundary. Bad params and pipeline
//! faults below it still yield a verdict, chosen by the snapshot's
//! `fail_open` flag. A panic in the pipeline is caught the same way only
//! when panics unwind; the release profile aborts instead.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::core::features::FeatureExtractor;
use crate::core::policy::{PolicyResolver, MSG_GUARD_DISABLED};
use crate::core::risk_score::RiskScorer;
use crate::core::state::GuardState;
use crate::models::config::{GuardConfig, GuardSettings, SettingsSource, StaticSettings};
use crate::models::errors::{GuardError, GuardResult};
use crate::models::messages::{CheckMessage, VerdictMessage};
use crate::models::types::{
    Action, Analysis, Features, Request, RequestPayload, SimulationOutcome, Verdict,
};
use crate::providers::gas_simulator::{GasEstimator, RpcGasSimulator};
use crate::utils::address::is_valid_address;
use crate::utils::constants::DEFAULT_SIM_TIMEOUT;

pub const MSG_RECENTLY_FLAGGED: &str = "counterparty was recently flagged by the guard";

/// The privileged analyzer
#[derive(Clone)]
pub struct GuardAnalyzer {
    settings: Arc<dyn SettingsSource>,
    simulator: Option<Arc<dyn GasEstimator>>,
    /// Hard cap on one simulation, on top of the estimator's own timeout
    simulation_budget: Duration,
    state: Arc<GuardState>,
}

impl GuardAnalyzer {
    pub fn new(settings: Arc<dyn SettingsSource>, state: Arc<GuardState>) -> Self {
        Self {
            settings,
            simulator: None,
            simulation_budget: DEFAULT_SIM_TIMEOUT,
            state,
        }
    }

    /// Wire settings, state and the RPC simulator from process config
    pub fn from_config(config: &GuardConfig) -> GuardResult<Self> {
        let settings = Arc::new(StaticSettings::new(config.settings.clone()));
        let state = Arc::new(GuardState::new(config.state.clone()));
        let simulator = RpcGasSimulator::new(config.simulator.clone())?;
        Ok(Self::new(settings, state)
            .with_simulator(Arc::new(simulator), config.simulator.rpc_timeout))
    }

    /// Enable gas simulation (still requires `rpc_url` in the settings)
    pub fn with_simulator(mut self, simulator: Arc<dyn GasEstimator>, budget: Duration) -> Self {
        self.simulator = Some(simulator);
        self.simulation_budget = budget;
        self
    }

    pub fn state(&self) -> &Arc<GuardState> {
        &self.state
    }

    pub async fn settings_snapshot(&self) -> GuardSettings {
        self.settings.snapshot().await
    }

    /// Answer one CHECK. Never fails.
    pub async fn handle_check(&self, check: &CheckMessage) -> VerdictMessage {
        self.check_detailed(check).await.0
    }

    /// Like [`handle_check`](Self::handle_check), also returning the
    /// analysis when the pipeline ran to completion
    pub async fn check_detailed(&self, check: &CheckMessage) -> (VerdictMessage, Option<Analysis>) {
        let start = Instant::now();
        let settings = self.settings.snapshot().await;

        if !settings.enabled {
            self.state.record_verdict(Action::Allow);
            let verdict = Verdict::with_message(Action::Allow, MSG_GUARD_DISABLED);
            return (VerdictMessage::new(check.id.clone(), verdict), None);
        }

        let this = self.clone();
        let task_check = check.clone();
        let task_settings = settings.clone();
        let outcome = tokio::spawn(async move {
            let request = task_check.to_request()?;
            this.analyze_with(&request, &task_settings).await
        })
        .await;

        let (verdict, analysis) = match outcome {
            Ok(Ok(analysis)) => (analysis.verdict.clone(), Some(analysis)),
            Ok(Err(e)) => (self.failure_verdict(&e, &settings), None),
            Err(join_err) => {
                let e = GuardError::pipeline(format!("analysis task aborted: {}", join_err));
                (self.failure_verdict(&e, &settings), None)
            }
        };

        info!(
            id = %check.id,
            method = %check.method,
            action = verdict.action.as_str(),
            latency_ms = start.elapsed().as_millis() as u64,
            "verdict issued"
        );
        (VerdictMessage::new(check.id.clone(), verdict), analysis)
    }

    /// Analyze with a fresh settings snapshot
    pub async fn analyze(&self, request: &Request) -> GuardResult<Analysis> {
        let settings = self.settings.snapshot().await;
        self.analyze_with(request, &settings).await
    }

    /// Full pipeline against an explicit settings snapshot
    pub async fn analyze_with(
        &self,
        request: &Request,
        settings: &GuardSettings,
    ) -> GuardResult<Analysis> {
        if !settings.enabled {
            let verdict = PolicyResolver::resolve_without_scoring(request.method, false, settings);
            self.state.record_verdict(verdict.action);
            return Ok(Analysis {
                features: Features::default(),
                assessment: None,
                simulation: None,
                verdict,
            });
        }

        let simulation = self.simulate(request, settings).await;
        let features = FeatureExtractor::extract(request, simulation.as_ref());

        let (assessment, verdict) = if settings.ai_enabled {
            let assessment = RiskScorer::score(&features, settings.sensitivity);
            debug!(
                score = assessment.score,
                level = assessment.level.as_str(),
                reasons = assessment.reasons.len(),
                "request scored"
            );
            let verdict = PolicyResolver::resolve(
                assessment.level,
                request.method,
                settings.sensitivity,
                settings,
            );
            let verdict = PolicyResolver::annotate(verdict, &assessment);
            (Some(assessment), verdict)
        } else {
            let verdict =
                PolicyResolver::resolve_without_scoring(request.method, features.sim_failed, settings);
            (None, verdict)
        };

        let verdict = self.apply_recency(request, verdict);

        Ok(Analysis {
            features,
            assessment,
            simulation,
            verdict,
        })
    }

    async fn simulate(
        &self,
        request: &Request,
        settings: &GuardSettings,
    ) -> Option<SimulationOutcome> {
        let tx = match &request.payload {
            RequestPayload::Transaction(tx) => tx,
            _ => return None,
        };
        let rpc_url = settings.rpc_url.as_deref()?;
        let simulator = self.simulator.as_ref()?;

        match tokio::time::timeout(self.simulation_budget, simulator.simulate(tx, rpc_url)).await {
            Ok(outcome) => Some(outcome),
            Err(_) => {
                warn!(budget_ms = self.simulation_budget.as_millis() as u64, "⏳ Gas simulation exceeded budget");
                Some(SimulationOutcome::failure("gas simulation timed out"))
            }
        }
    }

    /// Note repeat counterparties, then update the recency set and counters
    fn apply_recency(&self, request: &Request, mut verdict: Verdict) -> Verdict {
        let counterparty = request
            .counterparty()
            .filter(|addr| is_valid_address(addr));

        if let Some(addr) = counterparty.as_deref() {
            if self.state.is_recently_flagged(addr) {
                let message = match verdict.message.take() {
                    Some(m) => format!("{}\n{}", m, MSG_RECENTLY_FLAGGED),
                    None => MSG_RECENTLY_FLAGGED.to_string(),
                };
                verdict.message = Some(message);
            }
            if verdict.is_flagged() {
                self.state.flag_counterparty(addr);
            }
        }

        self.state.record_verdict(verdict.action);
        verdict
    }

    /// Verdict for an internal failure, per `fail_open`
    pub fn failure_verdict(&self, err: &GuardError, settings: &GuardSettings) -> Verdict {
        self.state.record_internal_failure();
        let verdict = if settings.fail_open {
            Verdict::with_message(
                Action::Allow,
                format!("Guard could not analyze this request ({}); allowed by fail-open policy", err),
            )
        } else {
            Verdict::warn(format!(
                "Guard could not analyze this request ({}); review carefully before proceeding",
                err
            ))
        };
        error!(code = err.code_str(), action = verdict.action.as_str(), "❌ Guard pipeline failure: {}", err.message);
        self.state.record_verdict(verdict.action);
        verdict
    }
}

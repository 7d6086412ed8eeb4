//! Verdict relay
//!
//! Three contexts joined by channels: the interception point (page side),
//! an untrusted bridge, and the analyzer service.

pub mod bridge;
pub mod interceptor;
pub mod provider;
pub mod service;

pub use bridge::Bridge;
pub use interceptor::{CheckState, Interceptor, PendingCheck, RelayStats};
pub use provider::{AutoConfirm, ConfirmPrompt, GuardedProvider, WalletProvider};
pub use service::AnalyzerService;

use futures_util::future::join_all;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::core::analyzer::GuardAnalyzer;
use crate::models::config::RelayConfig;
use crate::utils::constants::{DEFAULT_MAX_CONCURRENT_CHECKS, RELAY_CHANNEL_CAPACITY};

/// A running relay
pub struct GuardRelay {
    interceptor: Interceptor,
    tasks: Vec<JoinHandle<()>>,
}

impl GuardRelay {
    /// Wire the three contexts together and start their tasks
    pub fn start(analyzer: GuardAnalyzer, config: RelayConfig) -> Self {
        Self::start_with(analyzer, config, DEFAULT_MAX_CONCURRENT_CHECKS)
    }

    pub fn start_with(analyzer: GuardAnalyzer, config: RelayConfig, max_concurrent: usize) -> Self {
        let (page_out_tx, page_out_rx) = mpsc::channel(RELAY_CHANNEL_CAPACITY);
        let (page_in_tx, page_in_rx) = mpsc::channel(RELAY_CHANNEL_CAPACITY);
        let (analyzer_in_tx, analyzer_in_rx) = mpsc::channel(RELAY_CHANNEL_CAPACITY);
        let (analyzer_out_tx, analyzer_out_rx) = mpsc::channel(RELAY_CHANNEL_CAPACITY);

        let timeout_ms = config.timeout.as_millis() as u64;
        let interceptor = Interceptor::new(page_out_tx, config);

        let tasks = vec![
            interceptor.spawn_inbound(page_in_rx),
            Bridge {
                from_page: page_out_rx,
                to_analyzer: analyzer_in_tx,
                from_analyzer: analyzer_out_rx,
                to_page: page_in_tx,
            }
            .spawn(),
            AnalyzerService::new(analyzer, max_concurrent).spawn(analyzer_in_rx, analyzer_out_tx),
        ];

        info!(timeout_ms, max_concurrent, "🔗 Relay started");
        Self { interceptor, tasks }
    }

    /// Handle for issuing checks
    pub fn interceptor(&self) -> &Interceptor {
        &self.interceptor
    }

    /// Stop all relay tasks and wait for them to finish. Checks issued
    /// afterwards resolve to the fallback at once.
    pub async fn shutdown(self) {
        for task in &self.tasks {
            task.abort();
        }
        join_all(self.tasks).await;
        info!("🔌 Relay stopped");
    }
}

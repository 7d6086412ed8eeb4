//! Analyzer service
//!
//! Consumes CHECKs from the relay, analyzes each one in its own task
//! (bounded by a semaphore) and emits the VERDICT with the same id.

use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::core::analyzer::GuardAnalyzer;
use crate::models::messages::RelayMessage;

pub struct AnalyzerService {
    analyzer: GuardAnalyzer,
    semaphore: Arc<Semaphore>,
}

impl AnalyzerService {
    pub fn new(analyzer: GuardAnalyzer, max_concurrent: usize) -> Self {
        Self {
            analyzer,
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    pub fn analyzer(&self) -> &GuardAnalyzer {
        &self.analyzer
    }

    /// Serve until the inbound channel closes
    pub fn spawn(
        self,
        mut inbound: mpsc::Receiver<RelayMessage>,
        outbound: mpsc::Sender<RelayMessage>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("🛡️ Analyzer service listening for CHECKs");

            while let Some(message) = inbound.recv().await {
                let check = match message {
                    RelayMessage::Check(check) => check,
                    RelayMessage::Verdict(v) => {
                        debug!(id = %v.id, "VERDICT arriving at analyzer ignored");
                        continue;
                    }
                };

                let analyzer = self.analyzer.clone();
                let semaphore = self.semaphore.clone();
                let outbound = outbound.clone();

                tokio::spawn(async move {
                    let _permit = match semaphore.acquire().await {
                        Ok(p) => p,
                        Err(_) => return,
                    };
                    let verdict = analyzer.handle_check(&check).await;
                    if outbound.send(RelayMessage::Verdict(verdict)).await.is_err() {
                        warn!(id = %check.id, "⚠️ Relay closed before VERDICT could be sent");
                    }
                });
            }

            debug!("analyzer service inbound channel closed");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::GuardState;
    use crate::models::config::{GuardSettings, StaticSettings};
    use crate::models::messages::CheckMessage;
    use crate::models::types::Action;

    #[tokio::test]
    async fn test_answers_with_same_id() {
        let analyzer = GuardAnalyzer::new(
            Arc::new(StaticSettings::new(GuardSettings::default())),
            Arc::new(GuardState::default()),
        );
        let (check_tx, check_rx) = mpsc::channel(8);
        let (verdict_tx, mut verdict_rx) = mpsc::channel(8);
        AnalyzerService::new(analyzer, 4).spawn(check_rx, verdict_tx);

        check_tx
            .send(RelayMessage::Check(CheckMessage {
                id: "abc".into(),
                method: "personal_sign".into(),
                params: vec![serde_json::json!("0x68656c6c6f")],
            }))
            .await
            .unwrap();

        match verdict_rx.recv().await {
            Some(RelayMessage::Verdict(v)) => {
                assert_eq!(v.id, "abc");
                assert_eq!(v.action, Action::Warn);
            }
            other => panic!("expected VERDICT, got {:?}", other),
        }
    }
}

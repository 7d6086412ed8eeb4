//! Interception point
//!
//! Issues one CHECK per intercepted call and waits for the matching
//! VERDICT under a bounded window. Each pending check is resolved exactly
//! once: whoever removes it from the pending map first (the VERDICT
//! handler or the timer) owns the terminal transition, and the loser is a
//! no-op.

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout_at;
use tracing::{debug, info, warn};

use crate::models::config::RelayConfig;
use crate::models::messages::{CheckMessage, RelayMessage, VerdictMessage};
use crate::models::types::Verdict;
use crate::utils::constants::COMPLETED_HISTORY_LIMIT;

/// Lifecycle of one check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CheckState {
    Pending,
    Resolved,
    TimedOut,
}

impl CheckState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CheckState::Pending)
    }
}

/// Correlation record for an issued CHECK
#[derive(Debug, Clone)]
pub struct PendingCheck {
    pub id: String,
    pub created_at: Instant,
    pub state: CheckState,
}

struct PendingEntry {
    check: PendingCheck,
    responder: oneshot::Sender<Verdict>,
}

/// Counters local to the interception point
#[derive(Debug, Default)]
struct RelayCounters {
    issued: AtomicU64,
    resolved: AtomicU64,
    timed_out: AtomicU64,
    discarded: AtomicU64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RelayStats {
    pub issued: u64,
    pub resolved: u64,
    pub timed_out: u64,
    pub discarded: u64,
    pub pending: usize,
}

/// Bounded memory of terminal ids, oldest dropped first
#[derive(Default)]
struct CompletedLog {
    states: DashMap<String, CheckState>,
    order: Mutex<VecDeque<String>>,
}

impl CompletedLog {
    fn record(&self, id: String, state: CheckState) {
        self.states.insert(id.clone(), state);
        let mut order = match self.order.lock() {
            Ok(order) => order,
            Err(poisoned) => poisoned.into_inner(),
        };
        order.push_back(id);
        while order.len() > COMPLETED_HISTORY_LIMIT {
            if let Some(old) = order.pop_front() {
                self.states.remove(&old);
            }
        }
    }

    fn get(&self, id: &str) -> Option<CheckState> {
        self.states.get(id).map(|s| *s)
    }
}

/// Held across `Interceptor::check`; ends the check if the future is dropped
struct AbandonGuard<'a> {
    interceptor: &'a Interceptor,
    id: &'a str,
}

impl Drop for AbandonGuard<'_> {
    fn drop(&mut self) {
        if self.interceptor.time_out(self.id) {
            debug!(id = %self.id, "caller stopped waiting, check timed out");
        }
    }
}

/// Handle to the interception point; cheap to clone
#[derive(Clone)]
pub struct Interceptor {
    outbound: mpsc::Sender<RelayMessage>,
    pending: Arc<DashMap<String, PendingEntry>>,
    completed: Arc<CompletedLog>,
    counters: Arc<RelayCounters>,
    sequence: Arc<AtomicU64>,
    config: RelayConfig,
}

impl Interceptor {
    pub fn new(outbound: mpsc::Sender<RelayMessage>, config: RelayConfig) -> Self {
        Self {
            outbound,
            pending: Arc::new(DashMap::new()),
            completed: Arc::new(CompletedLog::default()),
            counters: Arc::new(RelayCounters::default()),
            sequence: Arc::new(AtomicU64::new(0)),
            config,
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Timestamp, process-local sequence and a random suffix
    fn next_id(&self) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!(
            "{}-{}-{:08x}",
            Utc::now().timestamp_millis(),
            seq,
            rand::random::<u32>()
        )
    }

    /// Register a new pending check and return its id and receiver
    fn register(&self) -> (String, oneshot::Receiver<Verdict>) {
        let (tx, rx) = oneshot::channel();
        let mut responder = Some(tx);
        loop {
            let id = self.next_id();
            if let Entry::Vacant(slot) = self.pending.entry(id.clone()) {
                if let Some(responder) = responder.take() {
                    slot.insert(PendingEntry {
                        check: PendingCheck {
                            id: id.clone(),
                            created_at: Instant::now(),
                            state: CheckState::Pending,
                        },
                        responder,
                    });
                }
                return (id, rx);
            }
        }
    }

    /// Ask for a verdict on one intercepted call. Always returns: either
    /// the analyzer's verdict or the configured fallback.
    ///
    /// The window starts when the CHECK is issued and covers handing it to
    /// the relay as well as waiting for the answer. A caller that stops
    /// polling early times the check out on drop.
    pub async fn check(&self, method: &str, params: Vec<Value>) -> Verdict {
        let deadline = tokio::time::Instant::now() + self.config.timeout;
        let (id, mut rx) = self.register();
        let _abandon = AbandonGuard {
            interceptor: self,
            id: &id,
        };
        self.counters.issued.fetch_add(1, Ordering::Relaxed);

        let message = RelayMessage::Check(CheckMessage {
            id: id.clone(),
            method: method.to_string(),
            params,
        });
        debug!(id = %id, method, "CHECK issued");

        match timeout_at(deadline, self.outbound.send(message)).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => {
                warn!(id = %id, "⚠️ Relay channel closed, using fallback verdict");
                return self.expire(&id, rx).await;
            }
            Err(_) => {
                warn!(
                    id = %id,
                    method,
                    "⚠️ Relay channel full for the whole window, using fallback"
                );
                return self.expire(&id, rx).await;
            }
        }

        let waited = timeout_at(deadline, &mut rx).await;
        match waited {
            Ok(Ok(verdict)) => verdict,
            Ok(Err(_)) => self.expire(&id, rx).await,
            Err(_) => {
                warn!(
                    id = %id,
                    method,
                    timeout_ms = self.config.timeout.as_millis() as u64,
                    "⏳ No verdict in time, using fallback"
                );
                self.expire(&id, rx).await
            }
        }
    }

    /// Move a still-pending check to `TimedOut`. False if it was already
    /// terminal.
    fn time_out(&self, id: &str) -> bool {
        match self.pending.remove(id) {
            Some((_, mut entry)) => {
                entry.check.state = CheckState::TimedOut;
                self.completed.record(entry.check.id, CheckState::TimedOut);
                self.counters.timed_out.fetch_add(1, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Timer side of the race
    async fn expire(&self, id: &str, rx: oneshot::Receiver<Verdict>) -> Verdict {
        if self.time_out(id) {
            return self.config.fallback.clone();
        }
        // The VERDICT handler won; its send happens right after its removal
        rx.await.unwrap_or_else(|_| self.config.fallback.clone())
    }

    /// VERDICT side of the race. Returns whether the verdict was accepted.
    pub fn on_verdict(&self, message: VerdictMessage) -> bool {
        match self.pending.remove(&message.id) {
            Some((_, mut entry)) => {
                entry.check.state = CheckState::Resolved;
                let latency_ms = entry.check.created_at.elapsed().as_millis() as u64;
                self.completed.record(entry.check.id.clone(), CheckState::Resolved);
                self.counters.resolved.fetch_add(1, Ordering::Relaxed);
                info!(
                    id = %message.id,
                    action = message.action.as_str(),
                    latency_ms,
                    "VERDICT accepted"
                );
                // Receiver may be gone if the caller was dropped; nothing to do then
                let _ = entry.responder.send(message.verdict());
                true
            }
            None => {
                self.counters.discarded.fetch_add(1, Ordering::Relaxed);
                match self.completed.get(&message.id) {
                    Some(state) => {
                        debug!(id = %message.id, ?state, "late VERDICT discarded")
                    }
                    None => debug!(id = %message.id, "VERDICT for unknown id discarded"),
                }
                false
            }
        }
    }

    /// Single dispatch point for inbound relay traffic
    pub fn dispatch(&self, message: RelayMessage) {
        match message {
            RelayMessage::Verdict(verdict) => {
                self.on_verdict(verdict);
            }
            RelayMessage::Check(check) => {
                debug!(id = %check.id, "CHECK arriving at interception point ignored");
            }
        }
    }

    /// Drain inbound messages until the channel closes
    pub fn spawn_inbound(&self, mut inbound: mpsc::Receiver<RelayMessage>) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            while let Some(message) = inbound.recv().await {
                this.dispatch(message);
            }
            debug!("interception point inbound channel closed");
        })
    }

    /// Current state of a check id, if known
    pub fn check_state(&self, id: &str) -> Option<CheckState> {
        if self.pending.contains_key(id) {
            return Some(CheckState::Pending);
        }
        self.completed.get(id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn stats(&self) -> RelayStats {
        RelayStats {
            issued: self.counters.issued.load(Ordering::Relaxed),
            resolved: self.counters.resolved.load(Ordering::Relaxed),
            timed_out: self.counters.timed_out.load(Ordering::Relaxed),
            discarded: self.counters.discarded.load(Ordering::Relaxed),
            pending: self.pending.len(),
        }
    }
}

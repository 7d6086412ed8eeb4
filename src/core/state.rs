//! Guard State
//!
//! Process-lifetime counters and the recently-flagged counterparty set.
//! Created once at startup and handed around by `Arc`; there is no global
//! instance. Counter bumps are atomic and set inserts go through DashMap
//! shard locks, so interleaved checks never lose an update.

use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::debug;

use crate::models::config::StateConfig;
use crate::models::types::Action;
use crate::utils::address::normalize_address;

/// Counters plus recency set
pub struct GuardState {
    checked: AtomicU64,
    allowed: AtomicU64,
    warned: AtomicU64,
    blocked: AtomicU64,
    internal_failures: AtomicU64,
    /// lowercase address -> flagged at
    recent: DashMap<String, Instant>,
    config: StateConfig,
    started_at: Instant,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Default, Serialize)]
pub struct GuardStats {
    pub checked: u64,
    pub allowed: u64,
    pub warned: u64,
    pub blocked: u64,
    pub internal_failures: u64,
    pub recently_flagged: usize,
    pub uptime_seconds: u64,
}

impl Default for GuardState {
    fn default() -> Self {
        Self::new(StateConfig::default())
    }
}

impl GuardState {
    pub fn new(config: StateConfig) -> Self {
        Self {
            checked: AtomicU64::new(0),
            allowed: AtomicU64::new(0),
            warned: AtomicU64::new(0),
            blocked: AtomicU64::new(0),
            internal_failures: AtomicU64::new(0),
            recent: DashMap::new(),
            config,
            started_at: Instant::now(),
        }
    }

    /// Count one analyzed request and its outcome
    pub fn record_verdict(&self, action: Action) {
        self.checked.fetch_add(1, Ordering::Relaxed);
        let counter = match action {
            Action::Allow => &self.allowed,
            Action::Warn => &self.warned,
            Action::Block => &self.blocked,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_internal_failure(&self) {
        self.internal_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Remember a counterparty that earned a warning
    pub fn flag_counterparty(&self, address: &str) {
        let key = normalize_address(address);
        if key.is_empty() {
            return;
        }
        self.recent.insert(key.clone(), Instant::now());
        debug!(address = %key, "flagged counterparty");

        if self.recent.len() > self.config.recent_capacity {
            self.evict();
        }
    }

    /// Whether the address was flagged within the TTL
    pub fn is_recently_flagged(&self, address: &str) -> bool {
        let key = normalize_address(address);
        let fresh = match self.recent.get(&key) {
            Some(entry) => entry.elapsed() <= self.config.recent_ttl,
            None => return false,
        };
        if !fresh {
            self.recent.remove(&key);
        }
        fresh
    }

    /// Drop expired entries, then the oldest ones until back under capacity
    fn evict(&self) {
        let ttl = self.config.recent_ttl;
        self.recent.retain(|_, flagged_at| flagged_at.elapsed() <= ttl);

        let overflow = self.recent.len().saturating_sub(self.config.recent_capacity);
        if overflow == 0 {
            return;
        }
        let mut by_age: Vec<(String, Instant)> = self
            .recent
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect();
        by_age.sort_by_key(|(_, at)| *at);
        for (key, _) in by_age.into_iter().take(overflow) {
            self.recent.remove(&key);
        }
    }

    pub fn stats(&self) -> GuardStats {
        GuardStats {
            checked: self.checked.load(Ordering::Relaxed),
            allowed: self.allowed.load(Ordering::Relaxed),
            warned: self.warned.load(Ordering::Relaxed),
            blocked: self.blocked.load(Ordering::Relaxed),
            internal_failures: self.internal_failures.load(Ordering::Relaxed),
            recently_flagged: self.recent.len(),
            uptime_seconds: self.started_at.elapsed().as_secs(),
        }
    }
}

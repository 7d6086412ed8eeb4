//! Configuration module for the guard
//!
//! `GuardSettings` is the per-request snapshot owned by the external
//! settings store. `GuardConfig` holds the process-level knobs (relay
//! window, simulator limits, recency set) and is read from the environment.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use std::time::Duration;
use tracing::{info, warn};

use crate::models::types::{Action, Sensitivity, Verdict};
use crate::utils::constants::{
    DEFAULT_HIGH_GAS_THRESHOLD, DEFAULT_RECENT_CAPACITY, DEFAULT_RECENT_TTL,
    DEFAULT_RELAY_TIMEOUT, DEFAULT_SIM_TIMEOUT, MAX_RELAY_TIMEOUT, MIN_RELAY_TIMEOUT,
    SIM_TIMEOUT_MARGIN,
};

/// User-facing guard settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GuardSettings {
    /// Master switch; off means every request is allowed
    pub enabled: bool,
    /// Internal failures resolve to `allow` when true, `warn` otherwise
    pub fail_open: bool,
    /// JSON-RPC endpoint for gas estimation; `None` disables simulation
    pub rpc_url: Option<String>,
    /// Run the risk scorer
    pub ai_enabled: bool,
    pub sensitivity: Sensitivity,
}

impl Default for GuardSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            fail_open: true,
            rpc_url: None,
            ai_enabled: true,
            sensitivity: Sensitivity::Medium,
        }
    }
}

/// Read side of the external settings store.
/// The analyzer takes one snapshot per check and never writes back.
#[async_trait]
pub trait SettingsSource: Send + Sync {
    async fn snapshot(&self) -> GuardSettings;
}

/// In-memory settings store
#[derive(Debug, Default)]
pub struct StaticSettings {
    inner: RwLock<GuardSettings>,
}

impl StaticSettings {
    pub fn new(settings: GuardSettings) -> Self {
        Self {
            inner: RwLock::new(settings),
        }
    }

    /// Replace the stored settings (the settings editor's write path)
    pub fn replace(&self, settings: GuardSettings) {
        match self.inner.write() {
            Ok(mut guard) => *guard = settings,
            Err(poisoned) => *poisoned.into_inner() = settings,
        }
    }

    pub fn current(&self) -> GuardSettings {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl SettingsSource for StaticSettings {
    async fn snapshot(&self) -> GuardSettings {
        self.current()
    }
}

/// Verdict wait at the interception point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// How long a pending check waits for its VERDICT
    pub timeout: Duration,
    /// What the caller gets when the window closes first
    pub fallback: Verdict,
}

impl RelayConfig {
    /// Window clamped to the supported range
    pub fn new(timeout: Duration, fallback: Verdict) -> Self {
        Self {
            timeout: timeout.clamp(MIN_RELAY_TIMEOUT, MAX_RELAY_TIMEOUT),
            fallback,
        }
    }

    /// Window taken as-is (tests and embedders with their own bounds)
    pub fn unclamped(timeout: Duration, fallback: Verdict) -> Self {
        Self { timeout, fallback }
    }

    pub fn default_fallback() -> Verdict {
        Verdict::warn("guard did not respond in time")
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_RELAY_TIMEOUT,
            fallback: Self::default_fallback(),
        }
    }
}

/// Gas simulator limits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatorConfig {
    /// HTTP timeout for one `eth_estimateGas` round trip
    pub rpc_timeout: Duration,
    /// Estimates above this are reported as high gas
    pub high_gas_threshold: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            rpc_timeout: DEFAULT_SIM_TIMEOUT,
            high_gas_threshold: DEFAULT_HIGH_GAS_THRESHOLD,
        }
    }
}

/// Recency set limits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateConfig {
    pub recent_capacity: usize,
    pub recent_ttl: Duration,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            recent_capacity: DEFAULT_RECENT_CAPACITY,
            recent_ttl: DEFAULT_RECENT_TTL,
        }
    }
}

/// HTTP surface bind address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Process-level configuration
#[derive(Debug, Clone, Default)]
pub struct GuardConfig {
    pub settings: GuardSettings,
    pub relay: RelayConfig,
    pub simulator: SimulatorConfig,
    pub state: StateConfig,
    pub server: ServerConfig,
}

fn env_parse<T>(key: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    let parsed = parse(&raw);
    if parsed.is_none() {
        warn!("⚠️ Ignoring unparseable {}={:?}, keeping default", key, raw);
    }
    parsed
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl GuardConfig {
    /// Load from `GUARD_*` environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(v) = env_parse("GUARD_ENABLED", parse_bool) {
            config.settings.enabled = v;
        }
        if let Some(v) = env_parse("GUARD_FAIL_OPEN", parse_bool) {
            config.settings.fail_open = v;
        }
        if let Some(v) = env_parse("GUARD_AI_ENABLED", parse_bool) {
            config.settings.ai_enabled = v;
        }
        if let Some(v) = env_parse("GUARD_SENSITIVITY", Sensitivity::parse) {
            config.settings.sensitivity = v;
        }
        config.settings.rpc_url = std::env::var("GUARD_RPC_URL")
            .or_else(|_| std::env::var("ETH_HTTP_URL"))
            .ok()
            .filter(|url| !url.trim().is_empty());

        let timeout = env_parse("GUARD_RELAY_TIMEOUT_MS", |s| s.trim().parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_RELAY_TIMEOUT);
        let fallback = env_parse("GUARD_RELAY_FALLBACK", Action::parse)
            .map(|action| Verdict::with_message(action, "guard did not respond in time"))
            .unwrap_or_else(RelayConfig::default_fallback);
        config.relay = RelayConfig::new(timeout, fallback);

        if let Some(ms) = env_parse("GUARD_SIM_TIMEOUT_MS", |s| s.trim().parse::<u64>().ok()) {
            config.simulator.rpc_timeout = Duration::from_millis(ms);
        }
        if let Some(v) = env_parse("GUARD_HIGH_GAS_THRESHOLD", |s| s.trim().parse::<u64>().ok()) {
            config.simulator.high_gas_threshold = v;
        }

        if let Ok(host) = std::env::var("GUARD_HOST") {
            config.server.host = host;
        }
        if let Some(port) = env_parse("PORT", |s| s.trim().parse::<u16>().ok())
            .or_else(|| env_parse("GUARD_PORT", |s| s.trim().parse::<u16>().ok()))
        {
            config.server.port = port;
        }

        if config.settings.rpc_url.is_some() {
            info!("🔑 Gas simulation RPC configured (URL hidden)");
        }

        config.validate()
    }

    /// Enforce cross-field constraints: the simulator must give up strictly
    /// before the relay window closes.
    pub fn validate(mut self) -> Self {
        let ceiling = self.relay.timeout.saturating_sub(SIM_TIMEOUT_MARGIN);
        if self.simulator.rpc_timeout > ceiling {
            warn!(
                "⚠️ Simulator timeout {:?} not below relay window {:?}, clamping to {:?}",
                self.simulator.rpc_timeout, self.relay.timeout, ceiling
            );
            self.simulator.rpc_timeout = ceiling;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let s = GuardSettings::default();
        assert!(s.enabled);
        assert!(s.fail_open);
        assert!(s.ai_enabled);
        assert_eq!(s.sensitivity, Sensitivity::Medium);
        assert!(s.rpc_url.is_none());
    }

    #[test]
    fn test_settings_partial_json() {
        let s: GuardSettings =
            serde_json::from_str(r#"{"enabled":false,"sensitivity":"high"}"#).unwrap();
        assert!(!s.enabled);
        assert_eq!(s.sensitivity, Sensitivity::High);
        assert!(s.fail_open);
    }

    #[test]
    fn test_relay_window_clamped() {
        let short = RelayConfig::new(Duration::from_millis(10), Verdict::allow());
        assert_eq!(short.timeout, MIN_RELAY_TIMEOUT);
        let long = RelayConfig::new(Duration::from_secs(120), Verdict::allow());
        assert_eq!(long.timeout, MAX_RELAY_TIMEOUT);
        let exact = RelayConfig::unclamped(Duration::from_millis(10), Verdict::allow());
        assert_eq!(exact.timeout, Duration::from_millis(10));
    }

    #[test]
    fn test_simulator_timeout_below_relay() {
        let mut config = GuardConfig::default();
        config.relay = RelayConfig::new(Duration::from_secs(3), Verdict::allow());
        config.simulator.rpc_timeout = Duration::from_secs(5);
        let config = config.validate();
        assert!(config.simulator.rpc_timeout < config.relay.timeout);
        assert_eq!(config.simulator.rpc_timeout, Duration::from_millis(2_500));
    }

    #[test]
    fn test_default_fallback_is_warn() {
        assert_eq!(RelayConfig::default().fallback.action, Action::Warn);
    }

    #[test]
    fn test_static_settings_replace() {
        let store = StaticSettings::default();
        store.replace(GuardSettings {
            enabled: false,
            ..GuardSettings::default()
        });
        assert!(!store.current().enabled);
    }
}

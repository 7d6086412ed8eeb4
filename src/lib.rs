//! Wallet Guard Library
//!
//! Pre-signature risk guard for wallet provider requests:
//! - Decodes transactions and EIP-712 payloads into risk features
//! - Scores them with fixed weights and maps the level to a verdict
//! - Optionally dry-runs transactions with `eth_estimateGas`
//! - Relays CHECK/VERDICT messages across isolated contexts with a
//!   bounded wait and a fallback verdict

pub mod api;
pub mod core;
pub mod models;
pub mod providers;
pub mod relay;
pub mod utils;

pub use crate::core::{
    FeatureExtractor, GuardAnalyzer, GuardState, GuardStats, PolicyResolver, RiskScorer,
};
pub use models::{
    Action, Analysis, CheckMessage, ErrorCode, Features, GuardConfig, GuardError, GuardResult,
    GuardSettings, RelayConfig, RelayMessage, Request, RiskAssessment, RiskLevel, Sensitivity,
    SettingsSource, StaticSettings, Verdict, VerdictMessage, WalletMethod,
};
pub use providers::{GasEstimator, RpcGasSimulator};
pub use relay::{GuardRelay, GuardedProvider, Interceptor, WalletProvider};
pub use utils::constants::{APP_NAME, APP_VERSION};

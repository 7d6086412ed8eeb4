//! Constants Module - Single Source of Truth
//!
//! Selector table, numeric thresholds and default knobs used across the
//! guard. Nothing else in the crate hardcodes these values.

use alloy_primitives::U256;
use std::time::Duration;

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "WalletGuard";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for outgoing RPC requests
pub const USER_AGENT: &str = "WalletGuard/0.1.0";

// ============================================
// KNOWN SELECTORS (lowercase, 0x-prefixed)
// ============================================

/// `approve(address,uint256)`
pub const SELECTOR_APPROVE: &str = "0x095ea7b3";
/// `setApprovalForAll(address,bool)`
pub const SELECTOR_SET_APPROVAL_FOR_ALL: &str = "0xa22cb465";
/// `transferOwnership(address)`
pub const SELECTOR_TRANSFER_OWNERSHIP: &str = "0xf2fde38b";
/// `upgradeTo(address)`
pub const SELECTOR_UPGRADE_TO: &str = "0x3659cfe6";
/// `upgradeToAndCall(address,bytes)`
pub const SELECTOR_UPGRADE_TO_AND_CALL: &str = "0x4f1ef286";

/// Selectors that touch contract ownership or implementation
pub const ADMIN_SELECTORS: [&str; 3] = [
    SELECTOR_TRANSFER_OWNERSHIP,
    SELECTOR_UPGRADE_TO,
    SELECTOR_UPGRADE_TO_AND_CALL,
];

// ============================================
// NUMERIC THRESHOLDS
// ============================================

/// 1 ETH in wei (10^18)
pub const ONE_ETH_WEI: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Unlimited allowance sentinel: 64 hex `f` (max uint256)
pub const MAX_UINT_HEX: &str = "ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff";

/// Gas estimate above which the simulator reports "high gas"
pub const DEFAULT_HIGH_GAS_THRESHOLD: u64 = 1_000_000;

/// Maximum score
pub const MAX_SCORE: u8 = 100;

// ============================================
// RELAY / SIMULATOR TIMING
// ============================================

/// Default verdict wait at the interception point
pub const DEFAULT_RELAY_TIMEOUT: Duration = Duration::from_secs(10);
/// Lower bound for the relay window
pub const MIN_RELAY_TIMEOUT: Duration = Duration::from_millis(2_500);
/// Upper bound for the relay window
pub const MAX_RELAY_TIMEOUT: Duration = Duration::from_secs(30);

/// Default gas simulator HTTP timeout
pub const DEFAULT_SIM_TIMEOUT: Duration = Duration::from_secs(4);
/// Minimum gap kept between the simulator timeout and the relay window
pub const SIM_TIMEOUT_MARGIN: Duration = Duration::from_millis(500);

// ============================================
// GUARD STATE
// ============================================

/// Recently flagged counterparties kept in memory
pub const DEFAULT_RECENT_CAPACITY: usize = 512;
/// How long a flagged counterparty stays "recent"
pub const DEFAULT_RECENT_TTL: Duration = Duration::from_secs(3_600);

/// Completed check ids remembered to classify late verdicts
pub const COMPLETED_HISTORY_LIMIT: usize = 4_096;

/// Buffer of each relay hop
pub const RELAY_CHANNEL_CAPACITY: usize = 256;
/// Checks analyzed at once by the analyzer service
pub const DEFAULT_MAX_CONCURRENT_CHECKS: usize = 64;
/// In-flight HTTP requests before the API applies backpressure
pub const API_MAX_CONCURRENT_REQUESTS: usize = 512;

// ============================================
// WALLET METHODS
// ============================================

/// Methods the interception point sends through the guard
pub const RISKY_METHODS: [&str; 6] = [
    "eth_sendTransaction",
    "eth_signTypedData",
    "eth_signTypedData_v3",
    "eth_signTypedData_v4",
    "personal_sign",
    "eth_sign",
];

/// Zero (burn) address
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

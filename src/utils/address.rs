//! Address helpers
//!
//! Shape validation plus a cheap heuristic screen for counterparties.
//! The screen never touches the network; the caller supplies the
//! recently-flagged lookup.

use serde::Serialize;

use crate::utils::constants::ZERO_ADDRESS;

/// `^0x[0-9a-fA-F]{40}$`
pub fn is_valid_address(address: &str) -> bool {
    match address.strip_prefix("0x") {
        Some(body) => body.len() == 40 && body.bytes().all(|b| b.is_ascii_hexdigit()),
        None => false,
    }
}

/// Lowercased key used for address sets
#[inline]
pub fn normalize_address(address: &str) -> String {
    address.trim().to_ascii_lowercase()
}

/// Heuristic screen result for one address
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddressRisk {
    pub address: String,
    pub valid: bool,
    /// 0.0 - 1.0
    pub score: f64,
    pub recently_flagged: bool,
    pub reason: String,
}

/// Base risk of an unknown but well-formed address
const BASE_RISK: f64 = 0.2;
/// Long zero runs are a common vanity/poisoning trick
const ZERO_RUN_PENALTY: f64 = 0.3;
const ZERO_RUN_LEN: usize = 10;
const RECENTLY_FLAGGED_RISK: f64 = 0.85;
const BURN_ADDRESS_RISK: f64 = 0.1;

fn longest_zero_run(address: &str) -> usize {
    address
        .trim_start_matches("0x")
        .split(|c| c != '0')
        .map(str::len)
        .max()
        .unwrap_or(0)
}

/// Score an address against shape rules and a recency lookup
pub fn screen_address(address: &str, is_flagged: impl Fn(&str) -> bool) -> AddressRisk {
    let valid = is_valid_address(address);
    let recently_flagged = valid && is_flagged(address);

    let score = if !valid {
        1.0
    } else if recently_flagged {
        RECENTLY_FLAGGED_RISK
    } else if normalize_address(address) == ZERO_ADDRESS {
        BURN_ADDRESS_RISK
    } else if longest_zero_run(address) >= ZERO_RUN_LEN {
        BASE_RISK + ZERO_RUN_PENALTY
    } else {
        BASE_RISK
    };
    let score = score.min(1.0);

    let reason = if !valid {
        "Malformed address".to_string()
    } else {
        risk_reason(score).to_string()
    };

    AddressRisk {
        address: address.to_string(),
        valid,
        score,
        recently_flagged,
        reason,
    }
}

/// Human-readable bucket for an address score
pub fn risk_reason(score: f64) -> &'static str {
    if score > 0.8 {
        "Very high scam risk"
    } else if score > 0.6 {
        "High scam risk"
    } else if score > 0.4 {
        "Medium risk"
    } else if score > 0.2 {
        "Low risk"
    } else {
        "Address looks safe"
    }
}

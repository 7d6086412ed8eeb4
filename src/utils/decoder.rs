//! Call data decoder module
//! Splits transaction call data into selector and ABI words and parses
//! hex quantities. Every function is total: bad input yields `None`.

use alloy_primitives::U256;
use alloy_sol_types::{sol, SolCall};

// Function signatures the guard recognises
sol! {
    function approve(address spender, uint256 amount) external returns (bool);
    function setApprovalForAll(address operator, bool approved) external;
    function transferOwnership(address newOwner) external;
    function upgradeTo(address newImplementation) external;
    function upgradeToAndCall(address newImplementation, bytes data) external payable;
}

/// ABI word size
const WORD: usize = 32;

/// Call kinds the feature extractor cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownCall {
    Approve,
    SetApprovalForAll,
    TransferOwnership,
    UpgradeTo,
    UpgradeToAndCall,
}

impl KnownCall {
    pub fn from_selector(selector: [u8; 4]) -> Option<Self> {
        match selector {
            s if s == approveCall::SELECTOR => Some(Self::Approve),
            s if s == setApprovalForAllCall::SELECTOR => Some(Self::SetApprovalForAll),
            s if s == transferOwnershipCall::SELECTOR => Some(Self::TransferOwnership),
            s if s == upgradeToCall::SELECTOR => Some(Self::UpgradeTo),
            s if s == upgradeToAndCallCall::SELECTOR => Some(Self::UpgradeToAndCall),
            _ => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(
            self,
            Self::TransferOwnership | Self::UpgradeTo | Self::UpgradeToAndCall
        )
    }
}

/// Decoded view over transaction call data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallData {
    bytes: Vec<u8>,
}

impl CallData {
    /// Parse `0x`-prefixed (or bare) hex. Returns `None` for absent,
    /// empty or non-hex data. When only the arguments are malformed the
    /// selector is still kept, with no arguments.
    pub fn parse(data: &str) -> Option<Self> {
        let body = data.trim();
        let body = body
            .strip_prefix("0x")
            .or_else(|| body.strip_prefix("0X"))
            .unwrap_or(body);
        if body.is_empty() {
            return None;
        }
        match hex::decode(body) {
            Ok(bytes) => Some(Self { bytes }),
            Err(_) => {
                let bytes = hex::decode(body.get(..8)?).ok()?;
                Some(Self { bytes })
            }
        }
    }

    /// First four bytes, if present
    pub fn selector(&self) -> Option<[u8; 4]> {
        self.bytes.get(..4)?.try_into().ok()
    }

    /// Selector as lowercase `0x` hex, empty when the data is too short
    pub fn selector_hex(&self) -> String {
        self.selector()
            .map(|s| format!("0x{}", hex::encode(s)))
            .unwrap_or_default()
    }

    pub fn known_call(&self) -> Option<KnownCall> {
        self.selector().and_then(KnownCall::from_selector)
    }

    /// Arguments after the selector
    pub fn args(&self) -> &[u8] {
        self.bytes.get(4..).unwrap_or(&[])
    }

    /// ABI word `index` of the arguments
    pub fn word(&self, index: usize) -> Option<&[u8]> {
        let start = index.checked_mul(WORD)?;
        self.args().get(start..start + WORD)
    }

    /// ABI word `index` read as an address (low 20 bytes), lowercase hex
    pub fn word_address(&self, index: usize) -> Option<String> {
        let word = self.word(index)?;
        Some(format!("0x{}", hex::encode(&word[WORD - 20..])))
    }

    /// Final 32 bytes of the call data
    pub fn last_word(&self) -> Option<&[u8]> {
        if self.args().len() < WORD {
            return None;
        }
        self.bytes.get(self.bytes.len() - WORD..)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Word equals max uint256
pub fn is_max_word(word: &[u8]) -> bool {
    word.len() == WORD && word.iter().all(|b| *b == 0xff)
}

/// Word has any non-zero byte
pub fn is_nonzero_word(word: &[u8]) -> bool {
    word.iter().any(|b| *b != 0)
}

/// Parse a JSON-RPC quantity: `0x` hex, or decimal digits.
/// Returns `None` on anything else, including overflow.
pub fn parse_quantity(value: &str) -> Option<U256> {
    let value = value.trim();
    if let Some(hex_body) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        if hex_body.is_empty() {
            return None;
        }
        return U256::from_str_radix(hex_body, 16).ok();
    }
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    U256::from_str_radix(value, 10).ok()
}

/// Parse a hex quantity that must fit in u64 (gas amounts)
pub fn parse_u64_quantity(value: &str) -> Option<u64> {
    parse_quantity(value)?.try_into().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::constants::*;

    #[test]
    fn test_selector_table_matches_abi() {
        let hex_of = |s: [u8; 4]| format!("0x{}", hex::encode(s));
        assert_eq!(hex_of(approveCall::SELECTOR), SELECTOR_APPROVE);
        assert_eq!(
            hex_of(setApprovalForAllCall::SELECTOR),
            SELECTOR_SET_APPROVAL_FOR_ALL
        );
        assert_eq!(
            hex_of(transferOwnershipCall::SELECTOR),
            SELECTOR_TRANSFER_OWNERSHIP
        );
        assert_eq!(hex_of(upgradeToCall::SELECTOR), SELECTOR_UPGRADE_TO);
        assert_eq!(
            hex_of(upgradeToAndCallCall::SELECTOR),
            SELECTOR_UPGRADE_TO_AND_CALL
        );
    }

    #[test]
    fn test_empty_and_malformed_data() {
        assert!(CallData::parse("0x").is_none());
        assert!(CallData::parse("").is_none());
        assert!(CallData::parse("0xzz").is_none());
        let short = CallData::parse("0x095ea7").unwrap();
        assert_eq!(short.selector_hex(), "");
        assert!(short.last_word().is_none());
    }

    #[test]
    fn test_selector_survives_bad_arguments() {
        let odd = format!("{}{}f", SELECTOR_APPROVE, MAX_UINT_HEX);
        let call = CallData::parse(&odd).unwrap();
        assert_eq!(call.selector_hex(), SELECTOR_APPROVE);
        assert_eq!(call.known_call(), Some(KnownCall::Approve));
        assert!(call.args().is_empty());
        assert!(call.last_word().is_none());

        let junk = format!("{}zz", SELECTOR_SET_APPROVAL_FOR_ALL);
        let call = CallData::parse(&junk).unwrap();
        assert_eq!(call.known_call(), Some(KnownCall::SetApprovalForAll));

        assert!(CallData::parse("0x095ea7zz").is_none());
    }

    #[test]
    fn test_word_address() {
        let data = format!(
            "{}{:0>64}{}",
            SELECTOR_APPROVE, "AbCdEf0000000000000000000000000000000001", MAX_UINT_HEX
        );
        let call = CallData::parse(&data).unwrap();
        assert_eq!(
            call.word_address(0).as_deref(),
            Some("0xabcdef0000000000000000000000000000000001")
        );
        assert!(call.word_address(2).is_none());
    }

    #[test]
    fn test_words() {
        let data = format!("{}{}{}", SELECTOR_APPROVE, "0".repeat(64), MAX_UINT_HEX);
        let call = CallData::parse(&data).unwrap();
        assert_eq!(call.known_call(), Some(KnownCall::Approve));
        assert!(is_max_word(call.last_word().unwrap()));
        assert!(!is_nonzero_word(call.word(0).unwrap()));
        assert!(call.word(2).is_none());
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("0xde0b6b3a7640000"), Some(ONE_ETH_WEI));
        assert_eq!(parse_quantity("1000000000000000000"), Some(ONE_ETH_WEI));
        assert_eq!(parse_quantity("0x0"), Some(U256::ZERO));
        assert_eq!(parse_quantity("0x"), None);
        assert_eq!(parse_quantity("1.5"), None);
        assert_eq!(parse_quantity("0xnothex"), None);
        assert_eq!(parse_u64_quantity("0x5208"), Some(21_000));
    }
}

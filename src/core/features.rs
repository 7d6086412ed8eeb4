//! Feature extraction
//!
//! Turns one request (plus an optional simulation outcome) into the flat
//! [`Features`] record the scorer consumes. Total: malformed fields
//! degrade to `false` / `None`, nothing here returns an error.

use crate::models::types::{
    Features, Request, RequestPayload, SimulationOutcome, TransactionRequest, TypedDataRequest,
};
use crate::utils::address::is_valid_address;
use crate::utils::constants::ONE_ETH_WEI;
use crate::utils::decoder::{is_max_word, is_nonzero_word, parse_quantity, CallData, KnownCall};

/// Stateless extractor
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Extract features from any request
    pub fn extract(request: &Request, simulation: Option<&SimulationOutcome>) -> Features {
        match &request.payload {
            RequestPayload::Transaction(tx) => Self::for_transaction(tx, simulation),
            RequestPayload::TypedData(typed) => Self::for_typed_data(typed),
            RequestPayload::RawMessage(_) => Features::default(),
        }
    }

    /// Transaction features
    pub fn for_transaction(
        tx: &TransactionRequest,
        simulation: Option<&SimulationOutcome>,
    ) -> Features {
        let call = tx.data.as_deref().and_then(CallData::parse);
        let selector = call.as_ref().map(CallData::selector_hex).unwrap_or_default();
        let known = call.as_ref().and_then(CallData::known_call);

        let unlimited_approve = match (&call, known) {
            (Some(call), Some(KnownCall::Approve)) => {
                call.last_word().map(is_max_word).unwrap_or(false)
            }
            _ => false,
        };

        let set_approval_for_all = match (&call, known) {
            (Some(call), Some(KnownCall::SetApprovalForAll)) => {
                call.word(1).map(is_nonzero_word).unwrap_or(false)
            }
            _ => false,
        };

        let admin_op = known.map(|k| k.is_admin()).unwrap_or(false);

        let high_value = tx
            .value
            .as_deref()
            .and_then(parse_quantity)
            .map(|v| v >= ONE_ETH_WEI)
            .unwrap_or(false);

        let sim_failed = simulation.map(|s| !s.ok).unwrap_or(false);
        let sim_high_gas = simulation.map(SimulationOutcome::is_high_gas).unwrap_or(false);

        Features {
            selector,
            unlimited_approve,
            set_approval_for_all,
            admin_op,
            high_value,
            sim_failed,
            sim_high_gas,
            ..Features::default()
        }
    }

    /// Structured signature features
    pub fn for_typed_data(typed: &TypedDataRequest) -> Features {
        let declares_permit = typed
            .types
            .keys()
            .any(|name| name.to_ascii_lowercase().contains("permit"));
        let is_permit_like = declares_permit || typed.message.contains_key("spender");

        let spender = typed.message_field("spender");
        let permit_value = typed
            .message_field("value")
            .or_else(|| typed.message_field("amount"));
        let permit_deadline = typed
            .message_field("deadline")
            .or_else(|| typed.message_field("expiry"));

        let spender_malformed = spender
            .as_deref()
            .map(|s| !is_valid_address(s))
            .unwrap_or(false);

        Features {
            is_permit_like,
            spender,
            spender_malformed,
            permit_value,
            permit_deadline,
            ..Features::default()
        }
    }
}

//! Type definitions for the guard
//! Requests, features, assessments and verdicts

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::utils::address::is_valid_address;
use crate::utils::constants::RISKY_METHODS;
use crate::utils::decoder::{CallData, KnownCall};

/// Wallet method a request was issued with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WalletMethod {
    SendTransaction,
    SignTypedData,
    PersonalSign,
    Sign,
}

impl WalletMethod {
    /// Map a provider method name onto the guarded method set
    pub fn from_rpc_name(name: &str) -> Option<Self> {
        match name {
            "eth_sendTransaction" => Some(Self::SendTransaction),
            "eth_signTypedData" | "eth_signTypedData_v3" | "eth_signTypedData_v4" => {
                Some(Self::SignTypedData)
            }
            "personal_sign" => Some(Self::PersonalSign),
            "eth_sign" => Some(Self::Sign),
            _ => None,
        }
    }

    /// Whether the provider method is intercepted at all
    pub fn is_risky(name: &str) -> bool {
        RISKY_METHODS.contains(&name)
    }

    /// Raw message signatures can be replayed or phished regardless of content
    pub fn is_raw_sign(&self) -> bool {
        matches!(self, Self::PersonalSign | Self::Sign)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SendTransaction => "sendTransaction",
            Self::SignTypedData => "signTypedData",
            Self::PersonalSign => "personalSign",
            Self::Sign => "sign",
        }
    }
}

/// Transaction object as handed to `eth_sendTransaction`.
/// Every field is optional; the extractor treats missing fields as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "input")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

impl TransactionRequest {
    /// Build from a loosely shaped JSON object, keeping only string fields
    pub fn from_value(value: &Value) -> Self {
        let field = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            to: field("to"),
            data: field("data").or_else(|| field("input")),
            value: field("value"),
            from: field("from"),
        }
    }
}

/// EIP-712 style payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypedDataRequest {
    #[serde(default)]
    pub domain: Map<String, Value>,
    #[serde(default)]
    pub types: BTreeMap<String, Value>,
    #[serde(default)]
    pub message: Map<String, Value>,
}

impl TypedDataRequest {
    /// Build from an object; non-object sections collapse to empty
    pub fn from_value(value: &Value) -> Self {
        let object = |key: &str| value.get(key).and_then(Value::as_object).cloned();
        Self {
            domain: object("domain").unwrap_or_default(),
            types: object("types")
                .map(|m| m.into_iter().collect())
                .unwrap_or_default(),
            message: object("message").unwrap_or_default(),
        }
    }

    /// Message field rendered verbatim: strings as-is, numbers as decimal text
    pub fn message_field(&self, key: &str) -> Option<String> {
        match self.message.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

/// Raw message signing request (`personal_sign` / `eth_sign`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSignRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl RawSignRequest {
    /// `personal_sign` puts the message first, `eth_sign` the account first;
    /// wallets accept either, so the address is whichever param looks like one.
    pub fn from_params(params: &[Value]) -> Self {
        let strings: Vec<&str> = params.iter().filter_map(Value::as_str).collect();
        let address = strings.iter().find(|s| is_valid_address(s)).map(|s| s.to_string());
        let message = strings
            .iter()
            .find(|s| Some(**s) != address.as_deref())
            .map(|s| s.to_string());
        Self { message, address }
    }
}

/// Payload carried by a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RequestPayload {
    Transaction(TransactionRequest),
    TypedData(TypedDataRequest),
    RawMessage(RawSignRequest),
}

/// A captured wallet request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub method: WalletMethod,
    pub payload: RequestPayload,
}

impl Request {
    pub fn transaction(tx: TransactionRequest) -> Self {
        Self {
            method: WalletMethod::SendTransaction,
            payload: RequestPayload::Transaction(tx),
        }
    }

    pub fn typed_data(typed: TypedDataRequest) -> Self {
        Self {
            method: WalletMethod::SignTypedData,
            payload: RequestPayload::TypedData(typed),
        }
    }

    /// Address the request hands rights or value to, if any
    pub fn counterparty(&self) -> Option<String> {
        match &self.payload {
            RequestPayload::Transaction(tx) => {
                let call = tx.data.as_deref().and_then(CallData::parse);
                match call.as_ref().and_then(CallData::known_call) {
                    // `to` is the token contract; rights go to the spender/operator
                    Some(KnownCall::Approve | KnownCall::SetApprovalForAll) => {
                        call.as_ref().and_then(|c| c.word_address(0))
                    }
                    _ => tx.to.clone(),
                }
            }
            RequestPayload::TypedData(typed) => typed.message_field("spender"),
            RequestPayload::RawMessage(_) => None,
        }
    }
}

/// Result of a dry-run gas estimate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SimulationOutcome {
    pub fn success(gas: u64) -> Self {
        Self {
            ok: true,
            gas: Some(gas),
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            gas: None,
            message: Some(message.into()),
        }
    }

    pub fn high_gas(gas: u64, threshold: u64) -> Self {
        Self {
            ok: false,
            gas: Some(gas),
            message: Some(format!("High gas estimate: {} (threshold {})", gas, threshold)),
        }
    }

    /// Failure whose message mentions a high gas pattern
    pub fn is_high_gas(&self) -> bool {
        !self.ok
            && self
                .message
                .as_deref()
                .map(|m| m.to_ascii_lowercase().contains("high gas"))
                .unwrap_or(false)
    }
}

/// Risk features derived from exactly one request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Features {
    pub selector: String,
    pub unlimited_approve: bool,
    pub set_approval_for_all: bool,
    pub admin_op: bool,
    pub high_value: bool,
    pub sim_failed: bool,
    pub sim_high_gas: bool,
    pub is_permit_like: bool,
    pub spender: Option<String>,
    pub spender_malformed: bool,
    pub permit_value: Option<String>,
    pub permit_deadline: Option<String>,
}

/// Sensitivity of the level thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    Low,
    #[default]
    Medium,
    High,
}

impl Sensitivity {
    /// `(medium, high)` score thresholds
    pub fn thresholds(&self) -> (u8, u8) {
        match self {
            Self::Low => (40, 65),
            Self::Medium => (33, 50),
            Self::High => (25, 45),
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// Discrete risk level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            RiskLevel::Low => "✅",
            RiskLevel::Medium => "🟠",
            RiskLevel::High => "🔴",
        }
    }
}

/// Score, level and the ordered reasons behind them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: u8,
    pub level: RiskLevel,
    pub reasons: Vec<String>,
}

impl RiskAssessment {
    pub fn summary(&self) -> String {
        let mut output = format!(
            "{} Risk: {} | Score: {}/100",
            self.level.emoji(),
            self.level.as_str(),
            self.score
        );
        for reason in &self.reasons {
            output.push_str(&format!("\n   - {}", reason));
        }
        output
    }
}

/// What the calling layer should do with the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Allow,
    Warn,
    Block,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Allow => "allow",
            Action::Warn => "warn",
            Action::Block => "block",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" => Some(Self::Allow),
            "warn" => Some(Self::Warn),
            "block" => Some(Self::Block),
            _ => None,
        }
    }
}

/// Terminal decision for one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub action: Action,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Verdict {
    pub fn allow() -> Self {
        Self {
            action: Action::Allow,
            message: None,
        }
    }

    pub fn with_message(action: Action, message: impl Into<String>) -> Self {
        Self {
            action,
            message: Some(message.into()),
        }
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::with_message(Action::Warn, message)
    }

    pub fn block(message: impl Into<String>) -> Self {
        Self::with_message(Action::Block, message)
    }

    pub fn is_flagged(&self) -> bool {
        self.action != Action::Allow
    }
}

/// Everything the analyzer learned about one request
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub features: Features,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment: Option<RiskAssessment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simulation: Option<SimulationOutcome>,
    pub verdict: Verdict,
}

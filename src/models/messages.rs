//! Relay message shapes
//!
//! Context-to-context traffic is a single tagged union so every hop
//! dispatches on one exhaustive `match`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::errors::{GuardError, GuardResult};
use crate::models::types::{
    Action, RawSignRequest, Request, RequestPayload, TransactionRequest, TypedDataRequest,
    Verdict, WalletMethod,
};

/// Interception point -> analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckMessage {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: Vec<Value>,
}

/// Analyzer -> interception point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictMessage {
    pub id: String,
    pub action: Action,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl VerdictMessage {
    pub fn new(id: impl Into<String>, verdict: Verdict) -> Self {
        Self {
            id: id.into(),
            action: verdict.action,
            message: verdict.message,
        }
    }

    pub fn verdict(&self) -> Verdict {
        Verdict {
            action: self.action,
            message: self.message.clone(),
        }
    }
}

/// Everything that travels between contexts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelayMessage {
    Check(CheckMessage),
    Verdict(VerdictMessage),
}

impl RelayMessage {
    pub fn id(&self) -> &str {
        match self {
            RelayMessage::Check(c) => &c.id,
            RelayMessage::Verdict(v) => &v.id,
        }
    }
}

impl CheckMessage {
    /// Validate the raw call and lift it into a typed [`Request`]
    pub fn to_request(&self) -> GuardResult<Request> {
        Request::from_call(&self.method, &self.params)
    }
}

/// Typed data arrives either as an object or as a JSON string of one
fn typed_data_param(params: &[Value]) -> Option<Value> {
    params.iter().take(2).find_map(|p| match p {
        Value::Object(_) => Some(p.clone()),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(v @ Value::Object(_)) => Some(v),
            _ => None,
        },
        _ => None,
    })
}

impl Request {
    /// Build a request from a provider method name and its params
    pub fn from_call(method: &str, params: &[Value]) -> GuardResult<Self> {
        let wallet_method =
            WalletMethod::from_rpc_name(method).ok_or_else(|| GuardError::unsupported_method(method))?;

        let payload = match wallet_method {
            WalletMethod::SendTransaction => {
                let tx = params
                    .first()
                    .filter(|p| p.is_object())
                    .ok_or_else(|| GuardError::malformed("eth_sendTransaction expects a transaction object"))?;
                RequestPayload::Transaction(TransactionRequest::from_value(tx))
            }
            WalletMethod::SignTypedData => {
                let typed = typed_data_param(params)
                    .ok_or_else(|| GuardError::malformed("typed data payload missing or not an object"))?;
                RequestPayload::TypedData(TypedDataRequest::from_value(&typed))
            }
            WalletMethod::PersonalSign | WalletMethod::Sign => {
                RequestPayload::RawMessage(RawSignRequest::from_params(params))
            }
        };

        Ok(Self {
            method: wallet_method,
            payload,
        })
    }
}

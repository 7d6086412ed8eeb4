//! Guarded wallet provider
//!
//! Wraps a wallet provider so risky calls pass through the guard before
//! reaching it. Non-risky calls go straight through.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use crate::models::errors::{GuardError, GuardResult};
use crate::models::types::{Action, WalletMethod};
use crate::relay::interceptor::Interceptor;

pub const DEFAULT_CONFIRM_PROMPT: &str = "Risk detected. Proceed?";
pub const DEFAULT_BLOCK_MESSAGE: &str = "Operation blocked by wallet guard";

/// The wallet-side request function being guarded
#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn request(&self, method: &str, params: Vec<Value>) -> GuardResult<Value>;
}

/// Asks the user whether to go ahead after a warning
#[async_trait]
pub trait ConfirmPrompt: Send + Sync {
    async fn confirm(&self, message: &str) -> bool;
}

/// Answers every prompt the same way; for headless embedders
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

#[async_trait]
impl ConfirmPrompt for AutoConfirm {
    async fn confirm(&self, message: &str) -> bool {
        info!(accepted = self.0, "auto-answered prompt: {}", message);
        self.0
    }
}

pub struct GuardedProvider<P, C> {
    inner: P,
    prompt: C,
    interceptor: Interceptor,
}

impl<P: WalletProvider, C: ConfirmPrompt> GuardedProvider<P, C> {
    pub fn new(inner: P, prompt: C, interceptor: Interceptor) -> Self {
        Self {
            inner,
            prompt,
            interceptor,
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P: WalletProvider, C: ConfirmPrompt> WalletProvider for GuardedProvider<P, C> {
    async fn request(&self, method: &str, params: Vec<Value>) -> GuardResult<Value> {
        if !WalletMethod::is_risky(method) {
            return self.inner.request(method, params).await;
        }

        let verdict = self.interceptor.check(method, params.clone()).await;
        match verdict.action {
            Action::Allow => {}
            Action::Warn => {
                let message = verdict.message.as_deref().unwrap_or(DEFAULT_CONFIRM_PROMPT);
                if !self.prompt.confirm(message).await {
                    info!(method, "🚫 User declined after warning");
                    return Err(GuardError::user_cancelled());
                }
            }
            Action::Block => {
                warn!(method, "🚫 Call blocked by guard");
                return Err(GuardError::blocked(
                    verdict.message.unwrap_or_else(|| DEFAULT_BLOCK_MESSAGE.to_string()),
                ));
            }
        }

        self.inner.request(method, params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::RelayConfig;
    use crate::models::errors::ErrorCode;
    use crate::models::messages::{RelayMessage, VerdictMessage};
    use crate::models::types::Verdict;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[derive(Clone, Default)]
    struct CountingProvider {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl WalletProvider for CountingProvider {
        async fn request(&self, method: &str, _params: Vec<Value>) -> GuardResult<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!(method))
        }
    }

    /// Answers every CHECK with the same verdict
    fn answering(verdict: Verdict) -> Interceptor {
        let (tx, mut rx) = mpsc::channel::<RelayMessage>(8);
        let interceptor = Interceptor::new(
            tx,
            RelayConfig::unclamped(Duration::from_secs(5), Verdict::allow()),
        );
        let responder = interceptor.clone();
        tokio::spawn(async move {
            while let Some(RelayMessage::Check(check)) = rx.recv().await {
                responder.on_verdict(VerdictMessage::new(check.id, verdict.clone()));
            }
        });
        interceptor
    }

    #[tokio::test]
    async fn test_non_risky_passes_without_check() {
        let inner = CountingProvider::default();
        let (tx, _rx) = mpsc::channel(1);
        let interceptor = Interceptor::new(tx, RelayConfig::default());
        let guarded = GuardedProvider::new(inner.clone(), AutoConfirm(false), interceptor.clone());

        let out = guarded.request("eth_chainId", vec![]).await.unwrap();
        assert_eq!(out, json!("eth_chainId"));
        assert_eq!(interceptor.stats().issued, 0);
    }

    #[tokio::test]
    async fn test_block_never_reaches_wallet() {
        let inner = CountingProvider::default();
        let guarded = GuardedProvider::new(
            inner.clone(),
            AutoConfirm(true),
            answering(Verdict::block("drainer")),
        );
        let err = guarded.request("eth_sign", vec![]).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::GuardBlocked);
        assert_eq!(err.message, "drainer");
        assert_eq!(inner.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_warn_follows_prompt() {
        let inner = CountingProvider::default();
        let declined = GuardedProvider::new(
            inner.clone(),
            AutoConfirm(false),
            answering(Verdict::warn("careful")),
        );
        let err = declined.request("personal_sign", vec![]).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::UserCancelled);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 0);

        let accepted = GuardedProvider::new(
            inner.clone(),
            AutoConfirm(true),
            answering(Verdict::warn("careful")),
        );
        accepted.request("personal_sign", vec![]).await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }
}

//! Policy resolution
//!
//! Maps a risk level, the wallet method and the settings snapshot to a
//! final verdict. First matching rule wins. The default resolver never
//! emits `block`; a caller may escalate `warn` on its own.

use crate::models::config::GuardSettings;
use crate::models::types::{
    Action, RiskAssessment, RiskLevel, Sensitivity, Verdict, WalletMethod,
};

pub const MSG_GUARD_DISABLED: &str = "guard disabled";
pub const MSG_RAW_SIGN: &str =
    "Raw message signature requested. Raw signatures can be replayed or used for phishing; only sign messages you fully understand.";
pub const MSG_SIMULATION_FAILED: &str =
    "Transaction simulation failed (possible revert). Review before proceeding.";

pub struct PolicyResolver;

impl PolicyResolver {
    /// Resolve a verdict from a scored level
    pub fn resolve(
        level: RiskLevel,
        method: WalletMethod,
        sensitivity: Sensitivity,
        settings: &GuardSettings,
    ) -> Verdict {
        if let Some(verdict) = Self::unconditional(method, settings) {
            return verdict;
        }
        match level {
            RiskLevel::High => Verdict::warn(format!("High risk detected for {}", method.as_str())),
            RiskLevel::Medium if sensitivity == Sensitivity::High => {
                Verdict::warn(format!("Medium risk detected for {}", method.as_str()))
            }
            RiskLevel::Medium | RiskLevel::Low => Verdict::allow(),
        }
    }

    /// Rules that hold regardless of scoring. `None` means scoring decides.
    pub fn unconditional(method: WalletMethod, settings: &GuardSettings) -> Option<Verdict> {
        if !settings.enabled {
            return Some(Verdict::with_message(Action::Allow, MSG_GUARD_DISABLED));
        }
        if method.is_raw_sign() {
            return Some(Verdict::warn(MSG_RAW_SIGN));
        }
        None
    }

    /// Policy when the scorer is switched off: only the method rule and a
    /// failed simulation can raise a warning.
    pub fn resolve_without_scoring(
        method: WalletMethod,
        sim_failed: bool,
        settings: &GuardSettings,
    ) -> Verdict {
        if let Some(verdict) = Self::unconditional(method, settings) {
            return verdict;
        }
        if sim_failed {
            return Verdict::warn(MSG_SIMULATION_FAILED);
        }
        Verdict::allow()
    }

    /// Attach the assessment's score and reasons to a flagged verdict
    pub fn annotate(mut verdict: Verdict, assessment: &RiskAssessment) -> Verdict {
        if !verdict.is_flagged() || assessment.reasons.is_empty() {
            return verdict;
        }
        let headline = verdict.message.take().unwrap_or_default();
        let mut message = format!("{} (score {}/100)", headline, assessment.score);
        for reason in &assessment.reasons {
            message.push_str(&format!("\n- {}", reason));
        }
        verdict.message = Some(message);
        verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const METHODS: [WalletMethod; 4] = [
        WalletMethod::SendTransaction,
        WalletMethod::SignTypedData,
        WalletMethod::PersonalSign,
        WalletMethod::Sign,
    ];
    const LEVELS: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];
    const SENSITIVITIES: [Sensitivity; 3] =
        [Sensitivity::Low, Sensitivity::Medium, Sensitivity::High];

    #[test]
    fn test_disabled_always_allows() {
        let settings = GuardSettings {
            enabled: false,
            ..GuardSettings::default()
        };
        for method in METHODS {
            for level in LEVELS {
                let v = PolicyResolver::resolve(level, method, Sensitivity::High, &settings);
                assert_eq!(v.action, Action::Allow);
                assert_eq!(v.message.as_deref(), Some(MSG_GUARD_DISABLED));
            }
        }
    }

    #[test]
    fn test_raw_sign_always_warns() {
        let settings = GuardSettings::default();
        for method in [WalletMethod::PersonalSign, WalletMethod::Sign] {
            for level in LEVELS {
                for sensitivity in SENSITIVITIES {
                    let v = PolicyResolver::resolve(level, method, sensitivity, &settings);
                    assert_eq!(v.action, Action::Warn);
                }
            }
        }
    }

    #[test]
    fn test_level_rules() {
        let s = GuardSettings::default();
        let tx = WalletMethod::SendTransaction;
        assert_eq!(
            PolicyResolver::resolve(RiskLevel::High, tx, Sensitivity::Low, &s).action,
            Action::Warn
        );
        assert_eq!(
            PolicyResolver::resolve(RiskLevel::Medium, tx, Sensitivity::High, &s).action,
            Action::Warn
        );
        assert_eq!(
            PolicyResolver::resolve(RiskLevel::Medium, tx, Sensitivity::Medium, &s).action,
            Action::Allow
        );
        assert_eq!(
            PolicyResolver::resolve(RiskLevel::Low, tx, Sensitivity::High, &s).action,
            Action::Allow
        );
    }

    #[test]
    fn test_never_blocks() {
        let s = GuardSettings::default();
        for method in METHODS {
            for level in LEVELS {
                for sensitivity in SENSITIVITIES {
                    let v = PolicyResolver::resolve(level, method, sensitivity, &s);
                    assert_ne!(v.action, Action::Block);
                }
            }
        }
    }

    #[test]
    fn test_without_scoring() {
        let s = GuardSettings::default();
        let tx = WalletMethod::SendTransaction;
        assert_eq!(
            PolicyResolver::resolve_without_scoring(tx, true, &s).action,
            Action::Warn
        );
        assert_eq!(
            PolicyResolver::resolve_without_scoring(tx, false, &s).action,
            Action::Allow
        );
        assert_eq!(
            PolicyResolver::resolve_without_scoring(WalletMethod::Sign, false, &s).action,
            Action::Warn
        );
    }

    #[test]
    fn test_annotate() {
        let assessment = RiskAssessment {
            score: 35,
            level: RiskLevel::Medium,
            reasons: vec!["unlimited allowance".to_string()],
        };
        let v = PolicyResolver::annotate(Verdict::warn("Medium risk"), &assessment);
        let msg = v.message.unwrap();
        assert!(msg.starts_with("Medium risk (score 35/100)"));
        assert!(msg.contains("- unlimited allowance"));

        let allowed = PolicyResolver::annotate(Verdict::allow(), &assessment);
        assert!(allowed.message.is_none());
    }
}

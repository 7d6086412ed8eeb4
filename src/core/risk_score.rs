//! Risk Scoring Module
//! Weighted additive score (0-100) with sensitivity-dependent levels
//!
//! Checks run in a fixed order and that order is also the order of
//! `reasons`, so identical features always render identically.

use crate::models::types::{Features, RiskAssessment, RiskLevel, Sensitivity};
use crate::utils::constants::MAX_SCORE;

/// One weighted check
pub struct RiskCheck {
    pub weight: u8,
    pub reason: &'static str,
    pub applies: fn(&Features) -> bool,
}

/// Evaluation order is significant
pub const RISK_CHECKS: [RiskCheck; 8] = [
    RiskCheck {
        weight: 35,
        reason: "unlimited allowance",
        applies: |f| f.unlimited_approve,
    },
    RiskCheck {
        weight: 40,
        reason: "full operator access",
        applies: |f| f.set_approval_for_all,
    },
    RiskCheck {
        weight: 30,
        reason: "admin-sensitive operation",
        applies: |f| f.admin_op,
    },
    RiskCheck {
        weight: 20,
        reason: "high-value transfer",
        applies: |f| f.high_value,
    },
    RiskCheck {
        weight: 30,
        reason: "simulation failure (possible revert)",
        applies: |f| f.sim_failed,
    },
    RiskCheck {
        weight: 15,
        reason: "abnormally high gas estimate",
        applies: |f| f.sim_high_gas,
    },
    RiskCheck {
        weight: 25,
        reason: "permit-style signature granting spend rights",
        applies: |f| f.is_permit_like,
    },
    RiskCheck {
        weight: 10,
        reason: "unknown/malformed spender",
        applies: |f| f.spender_malformed,
    },
];

/// Pure scorer
pub struct RiskScorer;

impl RiskScorer {
    pub fn score(features: &Features, sensitivity: Sensitivity) -> RiskAssessment {
        let mut total: u32 = 0;
        let mut reasons = Vec::new();

        for check in RISK_CHECKS.iter() {
            if (check.applies)(features) {
                total += u32::from(check.weight);
                reasons.push(check.reason.to_string());
            }
        }

        let score = total.min(u32::from(MAX_SCORE)) as u8;
        RiskAssessment {
            score,
            level: Self::level_for(score, sensitivity),
            reasons,
        }
    }

    /// Map a score onto a level using the sensitivity's thresholds
    pub fn level_for(score: u8, sensitivity: Sensitivity) -> RiskLevel {
        let (medium, high) = sensitivity.thresholds();
        if score >= high {
            RiskLevel::High
        } else if score >= medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SENSITIVITIES: [Sensitivity; 3] =
        [Sensitivity::Low, Sensitivity::Medium, Sensitivity::High];

    /// Features with the boolean checks set from a bitmask
    fn features_from_mask(mask: u8) -> Features {
        let bit = |i: u8| mask & (1 << i) != 0;
        Features {
            unlimited_approve: bit(0),
            set_approval_for_all: bit(1),
            admin_op: bit(2),
            high_value: bit(3),
            sim_failed: bit(4),
            sim_high_gas: bit(5),
            is_permit_like: bit(6),
            spender_malformed: bit(7),
            ..Features::default()
        }
    }

    #[test]
    fn test_no_features_is_low() {
        let a = RiskScorer::score(&Features::default(), Sensitivity::Medium);
        assert_eq!(a.score, 0);
        assert_eq!(a.level, RiskLevel::Low);
        assert!(a.reasons.is_empty());
    }

    #[test]
    fn test_score_bounded_for_all_combinations() {
        for mask in 0..=u8::MAX {
            for sensitivity in SENSITIVITIES {
                let a = RiskScorer::score(&features_from_mask(mask), sensitivity);
                assert!(a.score <= 100, "mask {:08b} scored {}", mask, a.score);
                assert_eq!(a.reasons.len(), mask.count_ones() as usize);
            }
        }
        let everything = RiskScorer::score(&features_from_mask(u8::MAX), Sensitivity::Low);
        assert_eq!(everything.score, 100);
        assert_eq!(everything.level, RiskLevel::High);
    }

    #[test]
    fn test_deterministic() {
        let f = features_from_mask(0b0101_1001);
        assert_eq!(
            RiskScorer::score(&f, Sensitivity::High),
            RiskScorer::score(&f, Sensitivity::High)
        );
    }

    #[test]
    fn test_reason_order_is_evaluation_order() {
        // permit (25) is listed after high value (20) despite the larger weight
        let f = Features {
            high_value: true,
            is_permit_like: true,
            unlimited_approve: true,
            ..Features::default()
        };
        let a = RiskScorer::score(&f, Sensitivity::Medium);
        assert_eq!(
            a.reasons,
            vec![
                "unlimited allowance",
                "high-value transfer",
                "permit-style signature granting spend rights"
            ]
        );
        assert_eq!(a.score, 80);
    }

    #[test]
    fn test_thresholds_monotonic_in_sensitivity() {
        let (low_m, low_h) = Sensitivity::Low.thresholds();
        let (med_m, med_h) = Sensitivity::Medium.thresholds();
        let (high_m, high_h) = Sensitivity::High.thresholds();
        assert!(low_m >= med_m && med_m >= high_m);
        assert!(low_h >= med_h && med_h >= high_h);

        // A score never loses level when sensitivity goes up
        for score in 0..=100u8 {
            let l = RiskScorer::level_for(score, Sensitivity::Low);
            let m = RiskScorer::level_for(score, Sensitivity::Medium);
            let h = RiskScorer::level_for(score, Sensitivity::High);
            assert!(l <= m && m <= h, "score {}", score);
        }
    }

    #[test]
    fn test_level_boundaries() {
        assert_eq!(RiskScorer::level_for(32, Sensitivity::Medium), RiskLevel::Low);
        assert_eq!(RiskScorer::level_for(33, Sensitivity::Medium), RiskLevel::Medium);
        assert_eq!(RiskScorer::level_for(50, Sensitivity::Medium), RiskLevel::High);
        assert_eq!(RiskScorer::level_for(25, Sensitivity::High), RiskLevel::Medium);
        assert_eq!(RiskScorer::level_for(64, Sensitivity::Low), RiskLevel::Medium);
        assert_eq!(RiskScorer::level_for(65, Sensitivity::Low), RiskLevel::High);
    }

    #[test]
    fn test_unlimited_approve_alone() {
        let f = Features {
            unlimited_approve: true,
            ..Features::default()
        };
        let a = RiskScorer::score(&f, Sensitivity::Medium);
        assert_eq!(a.score, 35);
        assert_eq!(a.level, RiskLevel::Medium);
        assert!(a.reasons.contains(&"unlimited allowance".to_string()));
    }
}

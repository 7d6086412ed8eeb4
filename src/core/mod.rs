//! Core Module - Guard Pipeline
//!
//! Feature extraction, risk scoring, policy resolution and the analyzer
//! that runs them in order.

pub mod analyzer;
pub mod features;
pub mod policy;
pub mod risk_score;
pub mod state;

pub use analyzer::GuardAnalyzer;
pub use features::FeatureExtractor;
pub use policy::PolicyResolver;
pub use risk_score::RiskScorer;
pub use state::{GuardState, GuardStats};

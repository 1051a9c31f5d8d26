//! Consensus rules: rule-activation flags, difficulty adjustment (ASERT
//! with an LWMA pre-activation fallback), the adaptive block-size limit,
//! coinbase subsidy schedule, and minimum-fee policy.

pub mod abla;
pub mod difficulty;
pub mod fee;
pub mod flags;
pub mod reward;

pub use abla::{AblaConfig, AblaState};
pub use flags::RuleFlags;

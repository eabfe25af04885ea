//! Registry settings.
//!
//! These are the governance parameters written into the registry root account
//! by `initialize_registry`. Values are provided explicitly by the caller; this
//! crate never reads the environment.

use thiserror::Error;

/// Basis-point denominator for approval ratios.
pub const BPS_DENOMINATOR: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("governance threshold must be in 1..=10000 bps, got {0}")]
    Threshold(u64),
    #[error("review period must be greater than zero")]
    ReviewPeriod,
    #[error("max risk score must be in 1..=101, got {0}")]
    MaxRiskScore(u8),
}

/// Governance parameters of a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RegistrySettings {
    /// Required share of "for" votes, in basis points.
    pub governance_threshold_bps: u64,
    pub review_period_seconds: u64,
    /// Submissions must score strictly below this to be approved.
    pub max_risk_score: u8,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            governance_threshold_bps: 8_000,
            review_period_seconds: 7 * 24 * 60 * 60,
            // Admits the low and medium bands.
            max_risk_score: 61,
        }
    }
}

/// Validate a settings object before it is written on chain.
pub fn validate_settings(s: &RegistrySettings) -> Result<(), SettingsError> {
    if s.governance_threshold_bps == 0 || s.governance_threshold_bps > BPS_DENOMINATOR {
        return Err(SettingsError::Threshold(s.governance_threshold_bps));
    }
    if s.review_period_seconds == 0 {
        return Err(SettingsError::ReviewPeriod);
    }
    if s.max_risk_score == 0 || s.max_risk_score > 101 {
        return Err(SettingsError::MaxRiskScore(s.max_risk_score));
    }
    Ok(())
}

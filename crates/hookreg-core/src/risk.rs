//! Risk scoring for transfer-hook programs.
//!
//! The registry stores a 0-100 score and a pass/fail flag for automated
//! checks. Both are derived here from a set of observable risk flags so every
//! assessor produces the same numbers for the same observations.

use std::fmt;

/// Observations about a hook program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RiskFlags {
    pub has_upgrade_authority: bool,
    pub is_verified_build: bool,
    pub performs_token_transfers: bool,
    pub requests_many_accounts: bool,
    pub can_block_transfers: bool,
    pub is_audited: bool,
    pub source_code_available: bool,
    pub follows_best_practices: bool,
}

impl Default for RiskFlags {
    /// Nothing proven: assume an upgrade authority exists.
    fn default() -> Self {
        Self {
            has_upgrade_authority: true,
            is_verified_build: false,
            performs_token_transfers: false,
            requests_many_accounts: false,
            can_block_transfers: false,
            is_audited: false,
            source_code_available: false,
            follows_best_practices: false,
        }
    }
}

/// Display classification of a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

impl RiskBand {
    /// 0-30 low, 31-60 medium, 61 and above high.
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=30 => Self::Low,
            31..=60 => Self::Medium,
            _ => Self::High,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for RiskBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score and verdict computed from flags; this is what gets submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RiskReport {
    pub score: u8,
    pub band: RiskBand,
    pub automated_checks_passed: bool,
    pub requires_manual_review: bool,
    pub notes: String,
}

impl RiskFlags {
    /// Risky flags add, mitigations subtract (saturating at zero), capped at 100.
    pub fn score(&self) -> u8 {
        let mut score: u8 = 0;
        if self.has_upgrade_authority {
            score += 15;
        }
        if self.performs_token_transfers {
            score += 25;
        }
        if self.requests_many_accounts {
            score += 10;
        }
        if self.can_block_transfers {
            score += 20;
        }

        if self.is_verified_build {
            score = score.saturating_sub(15);
        }
        if self.is_audited {
            score = score.saturating_sub(20);
        }
        if self.source_code_available {
            score = score.saturating_sub(10);
        }
        if self.follows_best_practices {
            score = score.saturating_sub(10);
        }
        score.min(100)
    }

    pub fn passes_automated_checks(&self) -> bool {
        !self.performs_token_transfers
            && !self.can_block_transfers
            && self.source_code_available
            && self.score() <= 40
    }

    pub fn notes(&self) -> String {
        let mut notes = Vec::new();
        if self.is_verified_build {
            notes.push("verified build");
        }
        if self.source_code_available {
            notes.push("source code publicly available");
        }
        if self.is_audited {
            notes.push("audited");
        }
        if self.follows_best_practices {
            notes.push("follows development best practices");
        }
        if self.has_upgrade_authority {
            notes.push("WARN has upgrade authority");
        }
        if self.performs_token_transfers {
            notes.push("RISK performs token transfers");
        }
        if self.can_block_transfers {
            notes.push("RISK can block transfers");
        }
        if self.requests_many_accounts {
            notes.push("WARN requests many accounts");
        }
        if notes.is_empty() {
            notes.push("basic assessment completed; manual review recommended");
        }
        notes.join("; ")
    }

    pub fn report(&self) -> RiskReport {
        let score = self.score();
        RiskReport {
            score,
            band: RiskBand::from_score(score),
            automated_checks_passed: self.passes_automated_checks(),
            requires_manual_review: score > 60,
            notes: self.notes(),
        }
    }
}

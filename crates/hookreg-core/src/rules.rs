//! Approval state machine.
//!
//! `Pending -> UnderReview -> {Approved, Rejected}`, with `Approved ->
//! Suspended` as post-hoc revocation. The registry program enforces these
//! rules at commit time; the client evaluates the same rules against freshly
//! read state so that doomed calls are refused before anything is signed.
//!
//! Deadline semantics: votes are accepted while `now < review_ends_at`;
//! finalization is allowed once `now >= review_ends_at`.

use thiserror::Error;

use crate::config::{RegistrySettings, BPS_DENOMINATOR};
use crate::model::{ApprovalStatus, HookSubmission};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("status cannot move from {from} to {to}")]
    InvalidTransition {
        from: ApprovalStatus,
        to: ApprovalStatus,
    },

    #[error("{operation} requires status {expected}, submission is {actual}")]
    WrongStatus {
        operation: &'static str,
        expected: &'static str,
        actual: ApprovalStatus,
    },

    #[error("vote window closed at {review_ends_at} (now {now})")]
    VoteWindowClosed { review_ends_at: i64, now: i64 },

    #[error("review period ends at {review_ends_at} (now {now})")]
    ReviewNotEnded { review_ends_at: i64, now: i64 },
}

/// Targets reachable through the authority-only status update.
///
/// `Approved` and `Rejected` after review are only produced by finalization.
pub fn check_status_update(
    from: ApprovalStatus,
    to: ApprovalStatus,
) -> Result<(), TransitionError> {
    use ApprovalStatus::*;
    match (from, to) {
        (Pending, UnderReview) | (Pending, Rejected) | (Approved, Suspended) => Ok(()),
        _ => Err(TransitionError::InvalidTransition { from, to }),
    }
}

/// Assessment is accepted while the submission has not been decided.
pub fn check_assessment(sub: &HookSubmission) -> Result<(), TransitionError> {
    match sub.status {
        ApprovalStatus::Pending | ApprovalStatus::UnderReview => Ok(()),
        actual => Err(TransitionError::WrongStatus {
            operation: "assess_hook_risk",
            expected: "pending or under_review",
            actual,
        }),
    }
}

pub fn check_vote(sub: &HookSubmission, now: i64) -> Result<(), TransitionError> {
    if sub.status != ApprovalStatus::UnderReview {
        return Err(TransitionError::WrongStatus {
            operation: "cast_governance_vote",
            expected: "under_review",
            actual: sub.status,
        });
    }
    if now >= sub.review_ends_at {
        return Err(TransitionError::VoteWindowClosed {
            review_ends_at: sub.review_ends_at,
            now,
        });
    }
    Ok(())
}

/// The deadline is checked first: an early call is always `ReviewNotEnded`.
pub fn check_finalize(sub: &HookSubmission, now: i64) -> Result<(), TransitionError> {
    if now < sub.review_ends_at {
        return Err(TransitionError::ReviewNotEnded {
            review_ends_at: sub.review_ends_at,
            now,
        });
    }
    if sub.status != ApprovalStatus::UnderReview {
        return Err(TransitionError::WrongStatus {
            operation: "finalize_hook_approval",
            expected: "under_review",
            actual: sub.status,
        });
    }
    Ok(())
}

pub fn check_badge(sub: &HookSubmission) -> Result<(), TransitionError> {
    if sub.status != ApprovalStatus::Approved {
        return Err(TransitionError::WrongStatus {
            operation: "auto_approve_token_badge",
            expected: "approved",
            actual: sub.status,
        });
    }
    Ok(())
}

/// Vote counters of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tally {
    pub votes_for: u64,
    pub votes_against: u64,
}

impl Tally {
    pub fn of(sub: &HookSubmission) -> Self {
        Self {
            votes_for: sub.votes_for,
            votes_against: sub.votes_against,
        }
    }

    pub fn total(&self) -> u64 {
        self.votes_for.saturating_add(self.votes_against)
    }

    /// Share of "for" votes in basis points, `None` when nobody voted.
    pub fn approval_bps(&self) -> Option<u64> {
        let total = u128::from(self.total());
        if total == 0 {
            return None;
        }
        let bps = u128::from(self.votes_for) * u128::from(BPS_DENOMINATOR) / total;
        Some(bps as u64)
    }

    /// `votes_for / total >= threshold`, evaluated without rounding.
    pub fn meets(&self, threshold_bps: u64) -> bool {
        let total = u128::from(self.total());
        if total == 0 {
            return false;
        }
        u128::from(self.votes_for) * u128::from(BPS_DENOMINATOR)
            >= u128::from(threshold_bps) * total
    }
}

/// Count one vote. Counters saturate instead of wrapping.
pub fn apply_vote(sub: &mut HookSubmission, vote: bool) {
    if vote {
        sub.votes_for = sub.votes_for.saturating_add(1);
    } else {
        sub.votes_against = sub.votes_against.saturating_add(1);
    }
}

/// Terminal status written by finalization.
pub fn decide_outcome(sub: &HookSubmission, settings: &RegistrySettings) -> ApprovalStatus {
    let approved = Tally::of(sub).meets(settings.governance_threshold_bps)
        && sub.automated_checks_passed
        && sub.risk_score < settings.max_risk_score;
    if approved {
        ApprovalStatus::Approved
    } else {
        ApprovalStatus::Rejected
    }
}

//! Level decisions and the patches they produce
//!
//! The state machine never mutates items directly. It computes a
//! [`ReviewPatch`] that the caller applies locally and forwards to the
//! remote store.

use crate::error::ReviewError;
use crate::status::Reviewable;
use crate::transition::validate_transition;
use chrono::{DateTime, Utc};
use reqflow_model::{
    ItemId, LevelNumber, Patchable, Requirement, RequirementPatch, ReviewLevel, ReviewStatus,
    ScheduledReview, UserRef,
};
use serde::{Deserialize, Serialize};

/// Whether level writes must follow the transition table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransitionPolicy {
    /// Table is advisory; any status may be written
    #[default]
    Permissive,
    /// Writes outside the table fail with [`ReviewError::IllegalTransition`]
    Enforced,
}

/// A reviewer's decision on one level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelDecision {
    /// Level being decided
    pub level: LevelNumber,
    /// New status
    pub status: ReviewStatus,
    /// Replacement opinion; `None` keeps the current one
    pub opinion: Option<String>,
    /// Reviewer to record; `None` keeps the current one
    pub reviewer: Option<UserRef>,
}

impl LevelDecision {
    /// Decision without opinion or reviewer
    #[inline]
    #[must_use]
    pub fn new(level: LevelNumber, status: ReviewStatus) -> Self {
        Self {
            level,
            status,
            opinion: None,
            reviewer: None,
        }
    }

    /// With opinion
    #[inline]
    #[must_use]
    pub fn with_opinion(mut self, opinion: impl Into<String>) -> Self {
        self.opinion = Some(opinion.into());
        self
    }

    /// With reviewer
    #[inline]
    #[must_use]
    pub fn with_reviewer(mut self, reviewer: UserRef) -> Self {
        self.reviewer = Some(reviewer);
        self
    }
}

/// Replacement review block for one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewPatch {
    /// Target item
    pub id: ItemId,
    /// Review block after the decision
    pub review: ScheduledReview,
}

impl ReviewPatch {
    /// Apply to a local copy of the requirement
    pub fn apply_to(&self, item: &mut Requirement) {
        item.apply(&RequirementPatch::Review(Some(self.review.clone())));
    }
}

impl From<ReviewPatch> for RequirementPatch {
    fn from(patch: ReviewPatch) -> Self {
        RequirementPatch::Review(Some(patch.review))
    }
}

/// Computes level decisions under a [`TransitionPolicy`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ReviewStateMachine {
    policy: TransitionPolicy,
}

impl ReviewStateMachine {
    /// Create state machine
    #[inline]
    #[must_use]
    pub fn new(policy: TransitionPolicy) -> Self {
        Self { policy }
    }

    /// Active policy
    #[inline]
    #[must_use]
    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    /// Decide a level, stamping the current time
    ///
    /// # Errors
    /// See [`ReviewStateMachine::apply_decision_at`]
    pub fn apply_decision<T: Reviewable + ?Sized>(
        &self,
        item: &T,
        decision: &LevelDecision,
    ) -> Result<ReviewPatch, ReviewError> {
        self.apply_decision_at(item, decision, Utc::now())
    }

    /// Decide a level at an explicit time
    ///
    /// The level entry is created when the review block exists but lacks
    /// it. `reviewed_at` is stamped even when the status does not change.
    ///
    /// # Errors
    /// - [`ReviewError::NoReviewBlock`] if the item never entered review
    /// - [`ReviewError::Model`] if the opinion exceeds the length limit
    /// - [`ReviewError::IllegalTransition`] under [`TransitionPolicy::Enforced`]
    pub fn apply_decision_at<T: Reviewable + ?Sized>(
        &self,
        item: &T,
        decision: &LevelDecision,
        now: DateTime<Utc>,
    ) -> Result<ReviewPatch, ReviewError> {
        let Some(review) = item.scheduled_review() else {
            tracing::debug!(item = %item.id(), "Skipping level decision: no review data");
            return Err(ReviewError::NoReviewBlock {
                id: item.id().clone(),
            });
        };

        if let Some(opinion) = &decision.opinion {
            reqflow_model::validate_opinion(opinion)?;
        }

        let mut entry = review
            .level(decision.level)
            .cloned()
            .unwrap_or_else(|| ReviewLevel::pending(decision.level));

        if self.policy == TransitionPolicy::Enforced {
            validate_transition(decision.level, entry.status, decision.status)?;
        }

        tracing::debug!(
            item = %item.id(),
            level = %decision.level,
            from = %entry.status,
            to = %decision.status,
            "Writing review level"
        );

        entry.status = decision.status;
        entry.reviewed_at = Some(now);
        if let Some(opinion) = &decision.opinion {
            entry.set_opinion(opinion.as_str())?;
        }
        if let Some(reviewer) = &decision.reviewer {
            entry.reviewer = Some(reviewer.clone());
        }

        let mut next = review.clone();
        next.upsert(entry);

        Ok(ReviewPatch {
            id: item.id().clone(),
            review: next,
        })
    }
}

/// Set a level's status under the permissive policy
///
/// # Errors
/// See [`ReviewStateMachine::apply_decision_at`]
pub fn set_level_status<T: Reviewable + ?Sized>(
    item: &T,
    level: LevelNumber,
    status: ReviewStatus,
    opinion: Option<&str>,
) -> Result<ReviewPatch, ReviewError> {
    let mut decision = LevelDecision::new(level, status);
    decision.opinion = opinion.map(str::to_string);
    ReviewStateMachine::default().apply_decision(item, &decision)
}

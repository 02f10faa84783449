//! Overall review status projection

use reqflow_model::{
    Identified, LevelNumber, OverallReviewStatus, Requirement, ReviewLevel, ReviewStatus,
    ScheduledReview,
};

/// Items carrying an optional two-level review block
pub trait Reviewable: Identified {
    /// Review block, absent when the item never entered review
    fn scheduled_review(&self) -> Option<&ScheduledReview>;
}

impl Reviewable for Requirement {
    #[inline]
    fn scheduled_review(&self) -> Option<&ScheduledReview> {
        self.scheduled_review.as_ref()
    }
}

/// Entry for `level`, or `None` when the item has no such level
///
/// `None` is distinct from a present level whose status is
/// [`ReviewStatus::Pending`].
#[must_use]
pub fn get_level<T: Reviewable + ?Sized>(item: &T, level: LevelNumber) -> Option<&ReviewLevel> {
    item.scheduled_review()?.level(level)
}

/// Derive the overall status from the level list
///
/// Recomputed on every call; never stored.
#[must_use]
pub fn compute_overall_status<T: Reviewable + ?Sized>(item: &T) -> OverallReviewStatus {
    let first = get_level(item, LevelNumber::First).map(|l| l.status);
    let second = get_level(item, LevelNumber::Second).map(|l| l.status);

    match (first, second) {
        (None | Some(ReviewStatus::Pending), _) => OverallReviewStatus::Pending,
        (Some(ReviewStatus::Rejected), _) => OverallReviewStatus::Level1Rejected,
        (Some(ReviewStatus::Approved), None | Some(ReviewStatus::Pending)) => {
            OverallReviewStatus::Level1Approved
        }
        (Some(ReviewStatus::Approved), Some(ReviewStatus::Rejected)) => {
            OverallReviewStatus::Level2Rejected
        }
        (Some(ReviewStatus::Approved), Some(ReviewStatus::Approved)) => {
            OverallReviewStatus::Approved
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqflow_model::ScheduledReview;

    fn with_levels(levels: &[(LevelNumber, ReviewStatus)]) -> Requirement {
        let mut review = ScheduledReview::default();
        for (level, status) in levels {
            review.upsert(ReviewLevel::pending(*level).with_status(*status));
        }
        Requirement::new("REQ-1", "t").with_review(review)
    }

    #[test]
    fn no_review_block_is_pending() {
        let req = Requirement::new("REQ-1", "t");
        assert_eq!(compute_overall_status(&req), OverallReviewStatus::Pending);
        assert!(get_level(&req, LevelNumber::First).is_none());
    }

    #[test]
    fn absent_level_differs_from_pending_level() {
        let req = with_levels(&[(LevelNumber::First, ReviewStatus::Pending)]);
        assert!(get_level(&req, LevelNumber::First).is_some());
        assert!(get_level(&req, LevelNumber::Second).is_none());
    }

    #[test]
    fn projection_table() {
        use LevelNumber::{First, Second};
        use OverallReviewStatus as O;
        use ReviewStatus::{Approved, Pending, Rejected};

        let cases = [
            (vec![], O::Pending),
            (vec![(First, Pending)], O::Pending),
            (vec![(First, Rejected)], O::Level1Rejected),
            (vec![(First, Rejected), (Second, Approved)], O::Level1Rejected),
            (vec![(First, Approved)], O::Level1Approved),
            (vec![(First, Approved), (Second, Pending)], O::Level1Approved),
            (vec![(First, Approved), (Second, Rejected)], O::Level2Rejected),
            (vec![(First, Approved), (Second, Approved)], O::Approved),
            (vec![(Second, Approved)], O::Pending),
        ];

        for (levels, expected) in cases {
            let req = with_levels(&levels);
            assert_eq!(compute_overall_status(&req), expected, "levels: {levels:?}");
        }
    }
}

//! Two-level review data attached to items
//!
//! An item carries zero, one or two [`ReviewLevel`] entries inside its
//! [`ScheduledReview`] block. Level numbers are unique within the block.

use crate::error::ModelError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum opinion length, in characters
pub const OPINION_MAX_CHARS: usize = 1000;

/// Check an opinion against [`OPINION_MAX_CHARS`]
///
/// # Errors
/// Returns [`ModelError::OpinionTooLong`] past the limit
pub fn validate_opinion(opinion: &str) -> Result<(), ModelError> {
    let len = opinion.chars().count();
    if len > OPINION_MAX_CHARS {
        return Err(ModelError::OpinionTooLong {
            len,
            max: OPINION_MAX_CHARS,
        });
    }
    Ok(())
}

/// Reference to an application user
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserRef {
    /// User identifier
    pub id: String,
    /// Display name
    pub name: String,
}

impl UserRef {
    /// Create user reference
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Review level number (only 1 and 2 exist)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum LevelNumber {
    /// First-level review
    First,
    /// Second-level review
    Second,
}

impl LevelNumber {
    /// Numeric value
    #[inline]
    #[must_use]
    pub fn value(self) -> u8 {
        match self {
            Self::First => 1,
            Self::Second => 2,
        }
    }
}

impl TryFrom<u8> for LevelNumber {
    type Error = ModelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::First),
            2 => Ok(Self::Second),
            other => Err(ModelError::InvalidLevel(other)),
        }
    }
}

impl From<LevelNumber> for u8 {
    fn from(level: LevelNumber) -> Self {
        level.value()
    }
}

impl fmt::Display for LevelNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Decision state of one review level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    /// Level exists but has not been decided
    #[default]
    Pending,
    /// Level approved
    Approved,
    /// Level rejected
    Rejected,
}

impl ReviewStatus {
    /// All statuses, in declaration order
    pub const ALL: [ReviewStatus; 3] = [Self::Pending, Self::Approved, Self::Rejected];

    /// Lowercase name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(ModelError::UnknownReviewStatus(s.to_string())),
        }
    }
}

/// One level of the two-level review
///
/// The opinion is private so every write goes through the length check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawReviewLevel")]
pub struct ReviewLevel {
    /// Level number
    pub level: LevelNumber,
    /// Reviewer, once assigned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewer: Option<UserRef>,
    /// Current decision
    #[serde(default)]
    pub status: ReviewStatus,
    opinion: String,
    /// When the status was last written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReviewLevel {
    level: LevelNumber,
    #[serde(default)]
    reviewer: Option<UserRef>,
    #[serde(default)]
    status: ReviewStatus,
    #[serde(default)]
    opinion: String,
    #[serde(default)]
    reviewed_at: Option<DateTime<Utc>>,
}

impl TryFrom<RawReviewLevel> for ReviewLevel {
    type Error = ModelError;

    fn try_from(raw: RawReviewLevel) -> Result<Self, Self::Error> {
        validate_opinion(&raw.opinion)?;
        Ok(Self {
            level: raw.level,
            reviewer: raw.reviewer,
            status: raw.status,
            opinion: raw.opinion,
            reviewed_at: raw.reviewed_at,
        })
    }
}

impl ReviewLevel {
    /// Undecided level with no reviewer
    #[inline]
    #[must_use]
    pub fn pending(level: LevelNumber) -> Self {
        Self {
            level,
            reviewer: None,
            status: ReviewStatus::Pending,
            opinion: String::new(),
            reviewed_at: None,
        }
    }

    /// With reviewer
    #[inline]
    #[must_use]
    pub fn with_reviewer(mut self, reviewer: UserRef) -> Self {
        self.reviewer = Some(reviewer);
        self
    }

    /// With status
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: ReviewStatus) -> Self {
        self.status = status;
        self
    }

    /// Reviewer opinion, at most [`OPINION_MAX_CHARS`] characters
    #[inline]
    #[must_use]
    pub fn opinion(&self) -> &str {
        &self.opinion
    }

    /// Replace the opinion
    ///
    /// # Errors
    /// Returns [`ModelError::OpinionTooLong`] and leaves the level unchanged
    pub fn set_opinion(&mut self, opinion: impl Into<String>) -> Result<(), ModelError> {
        let opinion = opinion.into();
        validate_opinion(&opinion)?;
        self.opinion = opinion;
        Ok(())
    }
}

/// Review block of an item
///
/// # Invariants
/// - Level numbers are unique
/// - Levels are kept in ascending order
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawScheduledReview")]
pub struct ScheduledReview {
    levels: Vec<ReviewLevel>,
}

#[derive(Deserialize)]
struct RawScheduledReview {
    #[serde(default)]
    levels: Vec<ReviewLevel>,
}

impl TryFrom<RawScheduledReview> for ScheduledReview {
    type Error = ModelError;

    fn try_from(raw: RawScheduledReview) -> Result<Self, Self::Error> {
        Self::new(raw.levels)
    }
}

impl ScheduledReview {
    /// Build review block
    ///
    /// # Errors
    /// Returns [`ModelError::DuplicateLevel`] if a level number repeats
    pub fn new(mut levels: Vec<ReviewLevel>) -> Result<Self, ModelError> {
        levels.sort_by_key(|l| l.level);
        if let Some(pair) = levels.windows(2).find(|w| w[0].level == w[1].level) {
            return Err(ModelError::DuplicateLevel(pair[0].level.value()));
        }
        Ok(Self { levels })
    }

    /// Block with the given levels all pending
    #[must_use]
    pub fn pending(levels: &[LevelNumber]) -> Self {
        let mut review = Self::default();
        for level in levels {
            review.upsert(ReviewLevel::pending(*level));
        }
        review
    }

    /// All levels, ascending
    #[inline]
    #[must_use]
    pub fn levels(&self) -> &[ReviewLevel] {
        &self.levels
    }

    /// Entry for `level`, if present
    #[must_use]
    pub fn level(&self, level: LevelNumber) -> Option<&ReviewLevel> {
        self.levels.iter().find(|l| l.level == level)
    }

    /// Mutable entry for `level`, if present
    pub fn level_mut(&mut self, level: LevelNumber) -> Option<&mut ReviewLevel> {
        self.levels.iter_mut().find(|l| l.level == level)
    }

    /// Insert or replace the entry for `entry.level`
    pub fn upsert(&mut self, entry: ReviewLevel) {
        match self.levels.binary_search_by_key(&entry.level, |l| l.level) {
            Ok(pos) => self.levels[pos] = entry,
            Err(pos) => self.levels.insert(pos, entry),
        }
    }
}

/// Derived review status of an item (never stored)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OverallReviewStatus {
    /// Nothing decided yet
    Pending,
    /// Level 1 approved, level 2 absent or undecided
    Level1Approved,
    /// Level 1 rejected
    Level1Rejected,
    /// Level 2 rejected
    Level2Rejected,
    /// Both levels approved
    Approved,
}

impl fmt::Display for OverallReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Level1Approved => "level1Approved",
            Self::Level1Rejected => "level1Rejected",
            Self::Level2Rejected => "level2Rejected",
            Self::Approved => "approved",
        };
        f.write_str(s)
    }
}

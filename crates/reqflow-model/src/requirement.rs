//! Product requirement record and its typed patch variants

use crate::error::ModelError;
use crate::id::ItemId;
use crate::item::{Identified, Indexable, Patchable};
use crate::review::{ScheduledReview, UserRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Requirement priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Nice to have
    Low,
    /// Default priority
    #[default]
    Medium,
    /// Important
    High,
    /// Release blocking
    Critical,
}

impl Priority {
    /// Lowercase name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(ModelError::UnknownPriority(s.to_string())),
        }
    }
}

/// Requirement lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequirementStatus {
    /// Being written
    #[default]
    Draft,
    /// Accepted into the backlog
    Open,
    /// Under development
    InProgress,
    /// Delivered
    Done,
    /// Dropped or archived
    Closed,
}

impl RequirementStatus {
    /// Wire name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Open => "open",
            Self::InProgress => "inProgress",
            Self::Done => "done",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for RequirementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequirementStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "open" => Ok(Self::Open),
            "inprogress" | "in_progress" | "in-progress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            "closed" => Ok(Self::Closed),
            _ => Err(ModelError::UnknownRequirementStatus(s.to_string())),
        }
    }
}

/// A product requirement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirement {
    /// Unique identifier
    pub id: ItemId,
    /// Short title
    pub title: String,
    /// Long-form description
    #[serde(default)]
    pub description: String,
    /// Target release, e.g. `v1.0.0`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_version: Option<String>,
    /// Priority
    #[serde(default)]
    pub priority: Priority,
    /// Lifecycle status
    #[serde(default)]
    pub status: RequirementStatus,
    /// Owner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<UserRef>,
    /// Free-form labels
    #[serde(default)]
    pub tags: Vec<String>,
    /// Two-level review block; absent when the item never entered review
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_review: Option<ScheduledReview>,
}

impl Requirement {
    /// Field names understood by [`Indexable::field_values`]
    pub const FIELDS: [&'static str; 8] = [
        "id",
        "title",
        "description",
        "plannedVersion",
        "priority",
        "status",
        "assignee",
        "tags",
    ];

    /// Create draft requirement
    #[must_use]
    pub fn new(id: impl Into<ItemId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            planned_version: None,
            priority: Priority::default(),
            status: RequirementStatus::default(),
            assignee: None,
            tags: Vec::new(),
            scheduled_review: None,
        }
    }

    /// With planned version
    #[inline]
    #[must_use]
    pub fn with_planned_version(mut self, version: impl Into<String>) -> Self {
        self.planned_version = Some(version.into());
        self
    }

    /// With priority
    #[inline]
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// With tags
    #[inline]
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// With review block
    #[inline]
    #[must_use]
    pub fn with_review(mut self, review: ScheduledReview) -> Self {
        self.scheduled_review = Some(review);
        self
    }
}

impl Identified for Requirement {
    #[inline]
    fn id(&self) -> &ItemId {
        &self.id
    }
}

impl Indexable for Requirement {
    fn field_values(&self, field: &str) -> Vec<String> {
        match field {
            "id" => vec![self.id.to_string()],
            "title" => vec![self.title.clone()],
            "description" => vec![self.description.clone()],
            "plannedVersion" => self.planned_version.iter().cloned().collect(),
            "priority" => vec![self.priority.to_string()],
            "status" => vec![self.status.to_string()],
            "assignee" => self.assignee.iter().map(|u| u.name.clone()).collect(),
            "tags" => self.tags.clone(),
            _ => Vec::new(),
        }
    }
}

/// Typed partial update of a [`Requirement`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum RequirementPatch {
    /// Replace title
    Title(String),
    /// Replace description
    Description(String),
    /// Set or clear planned version
    PlannedVersion(Option<String>),
    /// Replace priority
    Priority(Priority),
    /// Replace lifecycle status
    Status(RequirementStatus),
    /// Set or clear assignee
    Assignee(Option<UserRef>),
    /// Replace tags
    Tags(Vec<String>),
    /// Set or clear review block
    Review(Option<ScheduledReview>),
    /// Several patches applied in order
    Batch(Vec<RequirementPatch>),
}

impl Patchable for Requirement {
    type Patch = RequirementPatch;

    fn apply(&mut self, patch: &RequirementPatch) {
        match patch {
            RequirementPatch::Title(v) => self.title.clone_from(v),
            RequirementPatch::Description(v) => self.description.clone_from(v),
            RequirementPatch::PlannedVersion(v) => self.planned_version.clone_from(v),
            RequirementPatch::Priority(v) => self.priority = *v,
            RequirementPatch::Status(v) => self.status = *v,
            RequirementPatch::Assignee(v) => self.assignee.clone_from(v),
            RequirementPatch::Tags(v) => self.tags.clone_from(v),
            RequirementPatch::Review(v) => self.scheduled_review.clone_from(v),
            RequirementPatch::Batch(patches) => {
                for p in patches {
                    self.apply(p);
                }
            }
        }
    }

    fn inverse(&self, patch: &RequirementPatch) -> RequirementPatch {
        match patch {
            RequirementPatch::Title(_) => RequirementPatch::Title(self.title.clone()),
            RequirementPatch::Description(_) => {
                RequirementPatch::Description(self.description.clone())
            }
            RequirementPatch::PlannedVersion(_) => {
                RequirementPatch::PlannedVersion(self.planned_version.clone())
            }
            RequirementPatch::Priority(_) => RequirementPatch::Priority(self.priority),
            RequirementPatch::Status(_) => RequirementPatch::Status(self.status),
            RequirementPatch::Assignee(_) => RequirementPatch::Assignee(self.assignee.clone()),
            RequirementPatch::Tags(_) => RequirementPatch::Tags(self.tags.clone()),
            RequirementPatch::Review(_) => {
                RequirementPatch::Review(self.scheduled_review.clone())
            }
            RequirementPatch::Batch(patches) => {
                // Each step is inverted against the state it was applied to.
                let mut state = self.clone();
                let mut inverses = Vec::with_capacity(patches.len());
                for p in patches {
                    inverses.push(state.inverse(p));
                    state.apply(p);
                }
                inverses.reverse();
                RequirementPatch::Batch(inverses)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::{LevelNumber, ReviewStatus};
    use pretty_assertions::assert_eq;

    fn sample() -> Requirement {
        Requirement::new("REQ-1", "Export to CSV")
            .with_planned_version("v1.0.0")
            .with_tags(["export", "reporting"])
    }

    #[test]
    fn inverse_restores_single_field() {
        let original = sample();
        let patch = RequirementPatch::Status(RequirementStatus::Done);

        let undo = original.inverse(&patch);
        let restored = original.patched(&patch).patched(&undo);

        assert_eq!(undo, RequirementPatch::Status(RequirementStatus::Draft));
        assert_eq!(restored, original);
    }

    #[test]
    fn inverse_of_batch_touching_same_field_twice() {
        let original = sample();
        let patch = RequirementPatch::Batch(vec![
            RequirementPatch::Title("first".into()),
            RequirementPatch::PlannedVersion(None),
            RequirementPatch::Title("second".into()),
        ]);

        let patched = original.patched(&patch);
        assert_eq!(patched.title, "second");
        assert_eq!(patched.planned_version, None);

        let restored = patched.patched(&original.inverse(&patch));
        assert_eq!(restored, original);
    }

    #[test]
    fn review_patch_replaces_block() {
        let original = sample();
        let review = ScheduledReview::pending(&[LevelNumber::First]);
        let patched = original.patched(&RequirementPatch::Review(Some(review)));

        let level = patched
            .scheduled_review
            .as_ref()
            .and_then(|r| r.level(LevelNumber::First))
            .unwrap();
        assert_eq!(level.status, ReviewStatus::Pending);
    }

    #[test]
    fn field_values_cover_multi_valued_fields() {
        let req = sample();
        assert_eq!(req.field_values("tags"), vec!["export", "reporting"]);
        assert_eq!(req.field_values("plannedVersion"), vec!["v1.0.0"]);
        assert!(req.field_values("assignee").is_empty());
        assert!(req.field_values("nope").is_empty());
    }

    #[test]
    fn requirement_json_uses_camel_case() {
        let json = r#"{
            "id": "REQ-9",
            "title": "Dark mode",
            "plannedVersion": "v2.0.0",
            "status": "inProgress",
            "scheduledReview": {"levels": [{"level": 1, "status": "pending"}]}
        }"#;
        let req: Requirement = serde_json::from_str(json).unwrap();
        assert_eq!(req.status, RequirementStatus::InProgress);
        assert_eq!(req.priority, Priority::Medium);
        assert!(req.scheduled_review.is_some());
    }

    #[test]
    fn patch_json_is_tagged() {
        let patch = RequirementPatch::Priority(Priority::High);
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({"field": "priority", "value": "high"}));
    }
}

//! Course model for the category approval workflow.
//!
//! # Invariants
//! - Every course belongs to exactly one category.
//! - Only `Pending` courses can transition, and only to `Approved` or `Rejected`.

use crate::model::category::CategoryId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable course identifier.
pub type CourseId = Uuid;

/// Review state of a course submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseStatus {
    /// Submitted, awaiting review.
    Pending,
    /// Published in its category.
    Approved,
    /// Sent back with a review note.
    Rejected,
}

impl CourseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns whether a review may move a course from `self` to `next`.
    pub fn can_transition_to(self, next: CourseStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Approved) | (Self::Pending, Self::Rejected)
        )
    }
}

/// Course row filed under one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub category_id: CategoryId,
    pub title: String,
    pub status: CourseStatus,
    /// Reviewer note, set on rejection.
    pub review_note: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[cfg(test)]
mod tests {
    use super::CourseStatus;

    #[test]
    fn only_pending_courses_can_be_reviewed() {
        assert!(CourseStatus::Pending.can_transition_to(CourseStatus::Approved));
        assert!(CourseStatus::Pending.can_transition_to(CourseStatus::Rejected));
        assert!(!CourseStatus::Approved.can_transition_to(CourseStatus::Rejected));
        assert!(!CourseStatus::Rejected.can_transition_to(CourseStatus::Approved));
        assert!(!CourseStatus::Pending.can_transition_to(CourseStatus::Pending));
    }

    #[test]
    fn status_strings_roundtrip() {
        for status in [
            CourseStatus::Pending,
            CourseStatus::Approved,
            CourseStatus::Rejected,
        ] {
            assert_eq!(CourseStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(CourseStatus::parse("draft"), None);
    }
}

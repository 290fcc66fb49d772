//! Course submission and approval use cases.
//!
//! # Invariants
//! - Titles are trimmed and must not be blank.
//! - Only pending courses can be approved or rejected.

use crate::model::category::CategoryId;
use crate::model::course::{Course, CourseId, CourseStatus};
use crate::repo::course_repo::{CourseListQuery, CourseRepoError, CourseRepository};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum CourseServiceError {
    BlankTitle,
    NotFound(CourseId),
    InvalidTransition {
        id: CourseId,
        from: CourseStatus,
        to: CourseStatus,
    },
    Repo(CourseRepoError),
}

impl Display for CourseServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "course title must not be blank"),
            Self::NotFound(id) => write!(f, "course not found: {id}"),
            Self::InvalidTransition { id, from, to } => write!(
                f,
                "course {id} cannot go from {} to {}",
                from.as_str(),
                to.as_str()
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CourseServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CourseRepoError> for CourseServiceError {
    fn from(value: CourseRepoError) -> Self {
        match value {
            CourseRepoError::NotFound(id) => Self::NotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Use-case wrapper for the course review workflow.
pub struct CourseService<R: CourseRepository> {
    repo: R,
}

impl<R: CourseRepository> CourseService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Files a new pending course under `category_id`.
    pub fn submit(
        &self,
        category_id: CategoryId,
        title: impl Into<String>,
    ) -> Result<Course, CourseServiceError> {
        let title = title.into();
        let title = title.trim();
        if title.is_empty() {
            return Err(CourseServiceError::BlankTitle);
        }
        Ok(self.repo.create_course(category_id, title)?)
    }

    pub fn approve(&self, id: CourseId) -> Result<Course, CourseServiceError> {
        self.review(id, CourseStatus::Approved, None)
    }

    /// Rejects a pending course, keeping the trimmed note when non-blank.
    pub fn reject(&self, id: CourseId, note: Option<&str>) -> Result<Course, CourseServiceError> {
        let note = note.map(str::trim).filter(|value| !value.is_empty());
        self.review(id, CourseStatus::Rejected, note)
    }

    pub fn pending_review(&self) -> Result<Vec<Course>, CourseServiceError> {
        Ok(self.repo.list_courses(&CourseListQuery {
            status: Some(CourseStatus::Pending),
            ..CourseListQuery::default()
        })?)
    }

    pub fn list_in_category(&self, category_id: CategoryId) -> Result<Vec<Course>, CourseServiceError> {
        Ok(self.repo.list_courses(&CourseListQuery {
            category_id: Some(category_id),
            ..CourseListQuery::default()
        })?)
    }

    fn review(
        &self,
        id: CourseId,
        next: CourseStatus,
        note: Option<&str>,
    ) -> Result<Course, CourseServiceError> {
        let course = self
            .repo
            .get_course(id)?
            .ok_or(CourseServiceError::NotFound(id))?;
        if !course.status.can_transition_to(next) {
            return Err(CourseServiceError::InvalidTransition {
                id,
                from: course.status,
                to: next,
            });
        }

        self.repo.set_status(id, course.status, next, note)?;
        info!(
            "event=course_review module=service status=ok from={} to={}",
            course.status.as_str(),
            next.as_str()
        );
        self.repo
            .get_course(id)?
            .ok_or(CourseServiceError::NotFound(id))
    }
}

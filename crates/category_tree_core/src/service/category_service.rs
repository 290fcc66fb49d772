//! Category mutation façade.
//!
//! # Responsibility
//! - Validate create/update/move/delete requests before any store call.
//! - Convert every store failure into a `MutationOutcome` with a toast.
//!
//! # Invariants
//! - Parent must exist and sit exactly one level above the child.
//! - Delete is refused locally for categories with children or courses.
//! - Every call is independent: no batching across calls, no compensation.

use crate::model::category::{
    validate_placement, CategoryId, CategoryLevel, CategoryNode, CategoryPatch, CategoryRecord,
    CategoryValidationError, NewCategory,
};
use crate::repo::category_repo::{CategoryRepoError, CategoryStore, OrderUpdate};
use crate::service::notice::{MutationAction, MutationOutcome, Notice};
use crate::tree::reorder::ReorderReport;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Errors raised by the façade before or while calling the store.
#[derive(Debug)]
pub enum CategoryServiceError {
    /// Request failed local validation.
    Validation(CategoryValidationError),
    /// Parent category does not exist.
    ParentNotFound(CategoryId),
    /// Parent exists at a level that cannot hold the child.
    ParentLevelMismatch {
        parent_id: CategoryId,
        expected: CategoryLevel,
        actual: CategoryLevel,
    },
    /// Delete refused locally: category has child categories.
    HasChildren(CategoryId),
    /// Delete refused locally: category has courses.
    HasCourses { id: CategoryId, course_count: u32 },
    /// Store-level failure.
    Store(CategoryRepoError),
}

impl Display for CategoryServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::ParentNotFound(id) => write!(f, "parent category not found: {id}"),
            Self::ParentLevelMismatch {
                parent_id,
                expected,
                actual,
            } => write!(
                f,
                "parent category {parent_id} must be level {expected}, found level {actual}"
            ),
            Self::HasChildren(_) => write!(f, "remove its subcategories first"),
            Self::HasCourses { course_count, .. } => {
                write!(f, "{course_count} course(s) still use this category")
            }
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CategoryServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CategoryValidationError> for CategoryServiceError {
    fn from(value: CategoryValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<CategoryRepoError> for CategoryServiceError {
    fn from(value: CategoryRepoError) -> Self {
        match value {
            CategoryRepoError::Validation(err) => Self::Validation(err),
            CategoryRepoError::ParentNotFound(id) => Self::ParentNotFound(id),
            CategoryRepoError::ParentLevelMismatch {
                parent_id,
                expected,
                actual,
            } => Self::ParentLevelMismatch {
                parent_id,
                expected,
                actual,
            },
            CategoryRepoError::HasChildren(id) => Self::HasChildren(id),
            CategoryRepoError::HasCourses { id, course_count } => {
                Self::HasCourses { id, course_count }
            }
            other => Self::Store(other),
        }
    }
}

/// Returns why `node` cannot be deleted, if anything blocks it.
pub fn delete_blocker(node: &CategoryNode) -> Option<CategoryServiceError> {
    if node.has_children() {
        return Some(CategoryServiceError::HasChildren(node.id));
    }
    if node.course_count > 0 {
        return Some(CategoryServiceError::HasCourses {
            id: node.id,
            course_count: node.course_count,
        });
    }
    None
}

/// Façade over a `CategoryStore`.
pub struct CategoryService<S: CategoryStore> {
    store: S,
}

impl<S: CategoryStore> CategoryService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates one category.
    pub fn create(&self, request: &NewCategory) -> MutationOutcome<CategoryRecord> {
        report(MutationAction::Create, self.try_create(request))
    }

    /// Updates name/description/order of one category.
    pub fn update(&self, id: CategoryId, patch: &CategoryPatch) -> MutationOutcome<()> {
        let result = patch
            .validate()
            .map_err(CategoryServiceError::from)
            .and_then(|()| Ok(self.store.update_category(id, patch)?));
        report(MutationAction::Update, result)
    }

    /// Changes level and parent; the store shifts descendants.
    pub fn move_category(
        &self,
        id: CategoryId,
        level: CategoryLevel,
        parent_id: Option<CategoryId>,
    ) -> MutationOutcome<()> {
        report(
            MutationAction::Move,
            self.try_move(id, level, parent_id),
        )
    }

    /// Deletes `node` unless it still has children or courses.
    ///
    /// Blocked deletes never reach the store.
    pub fn delete(&self, node: &CategoryNode) -> MutationOutcome<()> {
        let result = match delete_blocker(node) {
            Some(blocker) => Err(blocker),
            None => self
                .store
                .delete_category(node.id)
                .map_err(CategoryServiceError::from),
        };
        report(MutationAction::Delete, result)
    }

    /// Stores one sibling order batch and reports every item.
    ///
    /// The batch notice is an error if any single item failed.
    pub fn persist_order(&self, plan: &[OrderUpdate]) -> (ReorderReport, Notice) {
        let action = MutationAction::Reorder;
        let started_at = Instant::now();
        let report = ReorderReport {
            outcomes: self.store.apply_orders(plan),
        };
        let failed = report.failed().count();
        let notice = if failed == 0 {
            info!(
                "event=category_mutation module=service action={} status=ok items={} duration_ms={}",
                action.as_str(),
                plan.len(),
                started_at.elapsed().as_millis()
            );
            Notice::success(action.success_message())
        } else {
            warn!(
                "event=category_mutation module=service action={} status=error items={} failed={} duration_ms={}",
                action.as_str(),
                plan.len(),
                failed,
                started_at.elapsed().as_millis()
            );
            Notice::error(format!(
                "{} ({failed} of {} not saved)",
                action.failure_prefix(),
                plan.len()
            ))
        };
        (report, notice)
    }

    fn try_create(&self, request: &NewCategory) -> Result<CategoryRecord, CategoryServiceError> {
        request.validate()?;
        if let Some(parent_id) = request.parent_id {
            self.ensure_parent_level(parent_id, request.level)?;
        }
        Ok(self.store.create_category(request)?)
    }

    fn try_move(
        &self,
        id: CategoryId,
        level: CategoryLevel,
        parent_id: Option<CategoryId>,
    ) -> Result<(), CategoryServiceError> {
        validate_placement(level, parent_id)?;
        if let Some(parent_id) = parent_id {
            self.ensure_parent_level(parent_id, level)?;
        }
        Ok(self.store.move_category(id, level, parent_id)?)
    }

    fn ensure_parent_level(
        &self,
        parent_id: CategoryId,
        child_level: CategoryLevel,
    ) -> Result<(), CategoryServiceError> {
        let parent = self
            .store
            .get_category(parent_id)?
            .ok_or(CategoryServiceError::ParentNotFound(parent_id))?;
        let expected = child_level
            .parent()
            .ok_or(CategoryValidationError::RootWithParent)?;
        if parent.level != expected {
            return Err(CategoryServiceError::ParentLevelMismatch {
                parent_id,
                expected,
                actual: parent.level,
            });
        }
        Ok(())
    }
}

fn report<T>(
    action: MutationAction,
    result: Result<T, CategoryServiceError>,
) -> MutationOutcome<T> {
    match result {
        Ok(value) => {
            info!(
                "event=category_mutation module=service action={} status=ok",
                action.as_str()
            );
            MutationOutcome::succeeded(action, value)
        }
        Err(err) => {
            warn!(
                "event=category_mutation module=service action={} status=error error={}",
                action.as_str(),
                err
            );
            MutationOutcome::failed(action, err.to_string())
        }
    }
}

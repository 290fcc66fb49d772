//! User-facing notifications and the uniform mutation result shape.

use serde::Serialize;

/// Severity of a toast shown after a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Error,
}

/// One toast message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Error
    }
}

/// Mutation kinds reported through the façade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationAction {
    Create,
    Update,
    Move,
    Delete,
    Reorder,
}

impl MutationAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Move => "move",
            Self::Delete => "delete",
            Self::Reorder => "reorder",
        }
    }

    pub fn success_message(self) -> &'static str {
        match self {
            Self::Create => "Category created",
            Self::Update => "Category updated",
            Self::Move => "Category moved",
            Self::Delete => "Category deleted",
            Self::Reorder => "Category order saved",
        }
    }

    pub fn failure_prefix(self) -> &'static str {
        match self {
            Self::Create => "Failed to create category",
            Self::Update => "Failed to update category",
            Self::Move => "Failed to move category",
            Self::Delete => "Failed to delete category",
            Self::Reorder => "Failed to save category order",
        }
    }
}

/// Uniform `{success, error}` result so callers can branch without
/// matching on error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationOutcome<T = ()> {
    pub success: bool,
    pub error: Option<String>,
    pub value: Option<T>,
    pub notice: Notice,
}

impl<T> MutationOutcome<T> {
    pub fn succeeded(action: MutationAction, value: T) -> Self {
        Self {
            success: true,
            error: None,
            value: Some(value),
            notice: Notice::success(action.success_message()),
        }
    }

    pub fn failed(action: MutationAction, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            success: false,
            notice: Notice::error(format!("{}: {error}", action.failure_prefix())),
            error: Some(error),
            value: None,
        }
    }

    pub fn into_result(self) -> Result<T, String> {
        match (self.value, self.error) {
            (Some(value), None) => Ok(value),
            (_, Some(error)) => Err(error),
            (None, None) => Err("mutation returned no value".to_string()),
        }
    }
}

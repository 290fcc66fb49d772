//! Category domain model.
//!
//! # Responsibility
//! - Define the flat `CategoryRecord` returned by the store and the nested
//!   `CategoryNode` built by the normalizer.
//! - Provide validation for create/update/move requests.
//!
//! # Invariants
//! - `level` is always 1, 2 or 3.
//! - `parent_id.is_some()` iff `level > 1`.
//! - `order` is non-negative.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable category identifier.
pub type CategoryId = Uuid;

/// Depth of a category in the fixed three-level hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum CategoryLevel {
    One,
    Two,
    Three,
}

impl CategoryLevel {
    pub const ALL: [CategoryLevel; 3] = [Self::One, Self::Two, Self::Three];

    pub fn as_i64(self) -> i64 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
        }
    }

    /// Level one step deeper, or `None` below level 3.
    pub fn child(self) -> Option<Self> {
        match self {
            Self::One => Some(Self::Two),
            Self::Two => Some(Self::Three),
            Self::Three => None,
        }
    }

    /// Level one step shallower, or `None` above level 1.
    pub fn parent(self) -> Option<Self> {
        match self {
            Self::One => None,
            Self::Two => Some(Self::One),
            Self::Three => Some(Self::Two),
        }
    }

    /// Shifts the level by `delta`, returning `None` when the result leaves 1..=3.
    pub fn offset(self, delta: i64) -> Option<Self> {
        Self::try_from(self.as_i64() + delta).ok()
    }
}

impl TryFrom<i64> for CategoryLevel {
    type Error = CategoryValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            3 => Ok(Self::Three),
            other => Err(CategoryValidationError::LevelOutOfRange(other)),
        }
    }
}

impl From<CategoryLevel> for i64 {
    fn from(value: CategoryLevel) -> Self {
        value.as_i64()
    }
}

impl Display for CategoryLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_i64())
    }
}

/// Flat category row as served by a `CategoryStore`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    pub level: CategoryLevel,
    /// `None` for level-1 categories.
    pub parent_id: Option<CategoryId>,
    /// Position among siblings. Gaps and duplicates are tolerated on read.
    pub order: i64,
    /// Number of courses filed under this category. Supplied by the store.
    pub course_count: u32,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

/// Nested tree node produced by `tree::normalize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryNode {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    pub level: CategoryLevel,
    pub parent_id: Option<CategoryId>,
    pub order: i64,
    pub course_count: u32,
    pub created_at: i64,
    pub updated_at: i64,
    pub children: Vec<CategoryNode>,
}

impl CategoryNode {
    /// Builds a childless node from a flat record.
    pub fn from_record(record: &CategoryRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            description: record.description.clone(),
            level: record.level,
            parent_id: record.parent_id,
            order: record.order,
            course_count: record.course_count,
            created_at: record.created_at,
            updated_at: record.updated_at,
            children: Vec::new(),
        }
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Delete is only offered for empty leaves without courses.
    pub fn is_deletable(&self) -> bool {
        !self.has_children() && self.course_count == 0
    }
}

/// Create request for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub level: CategoryLevel,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
    /// Appended after existing siblings when omitted.
    #[serde(default)]
    pub order: Option<i64>,
}

impl NewCategory {
    /// Root-level create request.
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            level: CategoryLevel::One,
            parent_id: None,
            order: None,
        }
    }

    /// Create request nested below `parent` at `level`.
    pub fn child(name: impl Into<String>, level: CategoryLevel, parent: CategoryId) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            level,
            parent_id: Some(parent),
            order: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_order(mut self, order: i64) -> Self {
        self.order = Some(order);
        self
    }

    /// Checks request-local invariants (no store access).
    pub fn validate(&self) -> Result<(), CategoryValidationError> {
        validate_name(&self.name)?;
        validate_placement(self.level, self.parent_id)?;
        if let Some(order) = self.order {
            validate_order(order)?;
        }
        Ok(())
    }
}

/// Partial update for name/description/order. Level and parent change only
/// through `move`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub order: Option<i64>,
}

impl CategoryPatch {
    pub fn order(order: i64) -> Self {
        Self {
            order: Some(order),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.order.is_none()
    }

    pub fn validate(&self) -> Result<(), CategoryValidationError> {
        if self.is_empty() {
            return Err(CategoryValidationError::EmptyPatch);
        }
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(order) = self.order {
            validate_order(order)?;
        }
        Ok(())
    }
}

/// Request-level validation failures caught before any store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryValidationError {
    /// Name is blank after trim.
    BlankName,
    /// Level is outside 1..=3.
    LevelOutOfRange(i64),
    /// Level 1 was given a parent.
    RootWithParent,
    /// Level 2/3 lacks a parent.
    MissingParent(CategoryLevel),
    /// Sibling order is negative.
    NegativeOrder(i64),
    /// Update carries no fields.
    EmptyPatch,
}

impl Display for CategoryValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "category name must not be blank"),
            Self::LevelOutOfRange(level) => {
                write!(f, "category level must be 1, 2 or 3, got {level}")
            }
            Self::RootWithParent => write!(f, "level 1 categories cannot have a parent"),
            Self::MissingParent(level) => {
                write!(f, "level {level} categories require a parent")
            }
            Self::NegativeOrder(order) => {
                write!(f, "category order must be non-negative, got {order}")
            }
            Self::EmptyPatch => write!(f, "category update has no fields"),
        }
    }
}

impl Error for CategoryValidationError {}

/// Checks the level/parent pairing rule.
pub fn validate_placement(
    level: CategoryLevel,
    parent_id: Option<CategoryId>,
) -> Result<(), CategoryValidationError> {
    match (level, parent_id) {
        (CategoryLevel::One, Some(_)) => Err(CategoryValidationError::RootWithParent),
        (CategoryLevel::One, None) => Ok(()),
        (level, None) => Err(CategoryValidationError::MissingParent(level)),
        (_, Some(_)) => Ok(()),
    }
}

fn validate_name(name: &str) -> Result<(), CategoryValidationError> {
    if name.trim().is_empty() {
        return Err(CategoryValidationError::BlankName);
    }
    Ok(())
}

fn validate_order(order: i64) -> Result<(), CategoryValidationError> {
    if order < 0 {
        return Err(CategoryValidationError::NegativeOrder(order));
    }
    Ok(())
}

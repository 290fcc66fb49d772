//! Category store contract and SQLite implementation.
//!
//! # Responsibility
//! - Define the data-service contract the tree organizer calls into.
//! - Keep SQL details, the move cascade and delete guards inside the store.
//!
//! # Invariants
//! - Listing is deterministic: `level ASC, sort_order ASC, category_uuid ASC`.
//! - `move_category` shifts every descendant by the same level delta and
//!   rejects moves that would push any descendant below level 3.
//! - `delete_category` rejects categories with children or courses.

use crate::db::DbError;
use crate::model::category::{
    validate_placement, CategoryId, CategoryLevel, CategoryPatch, CategoryRecord,
    CategoryValidationError, NewCategory,
};
use crate::repo::schema::{ensure_schema, SchemaIssue};
use log::{debug, warn};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const CATEGORY_SELECT_SQL: &str = "SELECT
    c.category_uuid AS category_uuid,
    c.name AS name,
    c.description AS description,
    c.level AS level,
    c.parent_uuid AS parent_uuid,
    c.sort_order AS sort_order,
    (SELECT COUNT(*) FROM courses co WHERE co.category_uuid = c.category_uuid) AS course_count,
    c.created_at AS created_at,
    c.updated_at AS updated_at
FROM categories c";

const REQUIRED_COLUMNS: &[&str] = &[
    "category_uuid",
    "name",
    "description",
    "level",
    "parent_uuid",
    "sort_order",
    "created_at",
    "updated_at",
];

/// Result type used by category store operations.
pub type CategoryRepoResult<T> = Result<T, CategoryRepoError>;

/// Errors from category store operations.
#[derive(Debug)]
pub enum CategoryRepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Request failed local validation.
    Validation(CategoryValidationError),
    /// Target category does not exist.
    NotFound(CategoryId),
    /// Referenced parent does not exist.
    ParentNotFound(CategoryId),
    /// Parent exists but sits at the wrong level for the child.
    ParentLevelMismatch {
        parent_id: CategoryId,
        expected: CategoryLevel,
        actual: CategoryLevel,
    },
    /// Delete refused: category still has child categories.
    HasChildren(CategoryId),
    /// Delete refused: courses are filed under the category.
    HasCourses { id: CategoryId, course_count: u32 },
    /// Move would put a category under itself or its own descendant.
    WouldCreateCycle {
        id: CategoryId,
        parent_id: CategoryId,
    },
    /// Move would push a descendant outside levels 1..=3.
    DepthExceeded { id: CategoryId, deepest_level: i64 },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid record.
    InvalidData(String),
}

impl Display for CategoryRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "category not found: {id}"),
            Self::ParentNotFound(id) => write!(f, "parent category not found: {id}"),
            Self::ParentLevelMismatch {
                parent_id,
                expected,
                actual,
            } => write!(
                f,
                "parent category {parent_id} must be level {expected}, found level {actual}"
            ),
            Self::HasChildren(id) => write!(f, "category {id} still has child categories"),
            Self::HasCourses { id, course_count } => write!(
                f,
                "category {id} still has {course_count} course(s) assigned"
            ),
            Self::WouldCreateCycle { id, parent_id } => write!(
                f,
                "cannot move category {id} under its own descendant {parent_id}"
            ),
            Self::DepthExceeded { id, deepest_level } => write!(
                f,
                "moving category {id} would place a descendant at level {deepest_level}"
            ),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "category store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "category store requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "category store requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid category data: {message}"),
        }
    }
}

impl Error for CategoryRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for CategoryRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for CategoryRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<CategoryValidationError> for CategoryRepoError {
    fn from(value: CategoryValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<SchemaIssue> for CategoryRepoError {
    fn from(value: SchemaIssue) -> Self {
        match value {
            SchemaIssue::Sqlite(err) => err.into(),
            SchemaIssue::Version {
                expected_version,
                actual_version,
            } => Self::UninitializedConnection {
                expected_version,
                actual_version,
            },
            SchemaIssue::MissingTable(table) => Self::MissingRequiredTable(table),
            SchemaIssue::MissingColumn { table, column } => {
                Self::MissingRequiredColumn { table, column }
            }
        }
    }
}

/// One sibling order assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderUpdate {
    pub id: CategoryId,
    pub order: i64,
}

/// Per-item result of applying one `OrderUpdate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderOutcome {
    pub id: CategoryId,
    pub order: i64,
    /// Store error message, `None` on success.
    pub error: Option<String>,
}

impl OrderOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Data-service contract consumed by the tree organizer.
pub trait CategoryStore {
    /// Returns the full flat category list.
    fn list_categories(&self) -> CategoryRepoResult<Vec<CategoryRecord>>;
    /// Loads one category by id.
    fn get_category(&self, id: CategoryId) -> CategoryRepoResult<Option<CategoryRecord>>;
    /// Creates one category and returns the stored row.
    fn create_category(&self, request: &NewCategory) -> CategoryRepoResult<CategoryRecord>;
    /// Updates name/description/order.
    fn update_category(&self, id: CategoryId, patch: &CategoryPatch) -> CategoryRepoResult<()>;
    /// Changes level and parent, shifting descendants by the same delta.
    fn move_category(
        &self,
        id: CategoryId,
        level: CategoryLevel,
        parent_id: Option<CategoryId>,
    ) -> CategoryRepoResult<()>;
    /// Deletes one empty category.
    fn delete_category(&self, id: CategoryId) -> CategoryRepoResult<()>;

    /// Applies sibling order assignments.
    ///
    /// The default issues one independent `update_category` per item and
    /// reports each result; stores with a batch primitive override it.
    fn apply_orders(&self, updates: &[OrderUpdate]) -> Vec<OrderOutcome> {
        updates
            .iter()
            .map(|update| OrderOutcome {
                id: update.id,
                order: update.order,
                error: self
                    .update_category(update.id, &CategoryPatch::order(update.order))
                    .err()
                    .map(|err| err.to_string()),
            })
            .collect()
    }
}

impl<S: CategoryStore + ?Sized> CategoryStore for &S {
    fn list_categories(&self) -> CategoryRepoResult<Vec<CategoryRecord>> {
        (**self).list_categories()
    }

    fn get_category(&self, id: CategoryId) -> CategoryRepoResult<Option<CategoryRecord>> {
        (**self).get_category(id)
    }

    fn create_category(&self, request: &NewCategory) -> CategoryRepoResult<CategoryRecord> {
        (**self).create_category(request)
    }

    fn update_category(&self, id: CategoryId, patch: &CategoryPatch) -> CategoryRepoResult<()> {
        (**self).update_category(id, patch)
    }

    fn move_category(
        &self,
        id: CategoryId,
        level: CategoryLevel,
        parent_id: Option<CategoryId>,
    ) -> CategoryRepoResult<()> {
        (**self).move_category(id, level, parent_id)
    }

    fn delete_category(&self, id: CategoryId) -> CategoryRepoResult<()> {
        (**self).delete_category(id)
    }

    fn apply_orders(&self, updates: &[OrderUpdate]) -> Vec<OrderOutcome> {
        (**self).apply_orders(updates)
    }
}

/// SQLite-backed category store.
pub struct SqliteCategoryStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCategoryStore<'conn> {
    /// Creates store from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> CategoryRepoResult<Self> {
        ensure_schema(
            conn,
            &[
                ("categories", REQUIRED_COLUMNS),
                ("courses", &["course_uuid", "category_uuid"]),
            ],
        )?;
        Ok(Self { conn })
    }
}

impl CategoryStore for SqliteCategoryStore<'_> {
    fn list_categories(&self) -> CategoryRepoResult<Vec<CategoryRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CATEGORY_SELECT_SQL}
             ORDER BY c.level ASC, c.sort_order ASC, c.category_uuid ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_category_row(row)?);
        }
        Ok(records)
    }

    fn get_category(&self, id: CategoryId) -> CategoryRepoResult<Option<CategoryRecord>> {
        load_category(self.conn, id)
    }

    fn create_category(&self, request: &NewCategory) -> CategoryRepoResult<CategoryRecord> {
        request.validate()?;
        if let Some(parent_id) = request.parent_id {
            ensure_parent_level(self.conn, parent_id, request.level)?;
        }

        let id = Uuid::new_v4();
        let order = match request.order {
            Some(order) => order,
            None => next_sort_order(self.conn, request.parent_id, None)?,
        };
        self.conn.execute(
            "INSERT INTO categories (
                category_uuid,
                name,
                description,
                level,
                parent_uuid,
                sort_order
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                id.to_string(),
                request.name.trim(),
                request.description.trim(),
                request.level.as_i64(),
                request.parent_id.map(|value| value.to_string()),
                order,
            ],
        )?;
        debug!(
            "event=category_create module=repo status=ok level={} order={}",
            request.level, order
        );
        load_category(self.conn, id)?.ok_or(CategoryRepoError::NotFound(id))
    }

    fn update_category(&self, id: CategoryId, patch: &CategoryPatch) -> CategoryRepoResult<()> {
        patch.validate()?;
        let changed = self.conn.execute(
            "UPDATE categories
             SET name = COALESCE(?2, name),
                 description = COALESCE(?3, description),
                 sort_order = COALESCE(?4, sort_order),
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE category_uuid = ?1;",
            params![
                id.to_string(),
                patch.name.as_deref().map(str::trim),
                patch.description.as_deref().map(str::trim),
                patch.order,
            ],
        )?;
        if changed == 0 {
            return Err(CategoryRepoError::NotFound(id));
        }
        Ok(())
    }

    fn move_category(
        &self,
        id: CategoryId,
        level: CategoryLevel,
        parent_id: Option<CategoryId>,
    ) -> CategoryRepoResult<()> {
        validate_placement(level, parent_id)?;
        let node = load_category(self.conn, id)?.ok_or(CategoryRepoError::NotFound(id))?;
        let subtree = list_subtree(self.conn, id)?;

        if let Some(parent_id) = parent_id {
            if subtree.iter().any(|(member, _)| *member == parent_id) {
                return Err(CategoryRepoError::WouldCreateCycle { id, parent_id });
            }
            ensure_parent_level(self.conn, parent_id, level)?;
        }

        let delta = level.as_i64() - node.level.as_i64();
        if let Some((_, member_level)) = subtree
            .iter()
            .find(|(_, member_level)| member_level.offset(delta).is_none())
        {
            return Err(CategoryRepoError::DepthExceeded {
                id,
                deepest_level: member_level.as_i64() + delta,
            });
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let order = next_sort_order(&tx, parent_id, Some(id))?;
        tx.execute(
            "UPDATE categories
             SET level = ?2,
                 parent_uuid = ?3,
                 sort_order = ?4,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE category_uuid = ?1;",
            params![
                id.to_string(),
                level.as_i64(),
                parent_id.map(|value| value.to_string()),
                order,
            ],
        )?;
        if delta != 0 {
            tx.execute(
                "WITH RECURSIVE subtree(category_uuid) AS (
                    SELECT category_uuid FROM categories WHERE parent_uuid = ?1
                    UNION ALL
                    SELECT child.category_uuid
                    FROM categories child
                    INNER JOIN subtree parent ON child.parent_uuid = parent.category_uuid
                )
                UPDATE categories
                SET level = level + ?2,
                    updated_at = (strftime('%s', 'now') * 1000)
                WHERE category_uuid IN (SELECT category_uuid FROM subtree);",
                params![id.to_string(), delta],
            )?;
        }
        if node.parent_id != parent_id {
            compact_sibling_orders(&tx, node.parent_id)?;
        }
        tx.commit()?;

        debug!(
            "event=category_move module=repo status=ok from_level={} to_level={} descendants={}",
            node.level,
            level,
            subtree.len().saturating_sub(1)
        );
        Ok(())
    }

    fn delete_category(&self, id: CategoryId) -> CategoryRepoResult<()> {
        let node = load_category(self.conn, id)?.ok_or(CategoryRepoError::NotFound(id))?;
        let child_count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM categories WHERE parent_uuid = ?1;",
            [id.to_string()],
            |row| row.get(0),
        )?;
        if child_count > 0 {
            return Err(CategoryRepoError::HasChildren(id));
        }
        if node.course_count > 0 {
            return Err(CategoryRepoError::HasCourses {
                id,
                course_count: node.course_count,
            });
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "DELETE FROM categories WHERE category_uuid = ?1;",
            [id.to_string()],
        )?;
        compact_sibling_orders(&tx, node.parent_id)?;
        tx.commit()?;
        Ok(())
    }

    /// Applies all assignments in one transaction; any failure rolls back the
    /// whole batch and every item reports it.
    fn apply_orders(&self, updates: &[OrderUpdate]) -> Vec<OrderOutcome> {
        match apply_orders_atomically(self.conn, updates) {
            Ok(()) => updates
                .iter()
                .map(|update| OrderOutcome {
                    id: update.id,
                    order: update.order,
                    error: None,
                })
                .collect(),
            Err((failed_id, err)) => {
                warn!(
                    "event=category_reorder module=repo status=error items={} error={}",
                    updates.len(),
                    err
                );
                updates
                    .iter()
                    .map(|update| OrderOutcome {
                        id: update.id,
                        order: update.order,
                        error: Some(if Some(update.id) == failed_id {
                            err.to_string()
                        } else {
                            format!("batch rolled back: {err}")
                        }),
                    })
                    .collect()
            }
        }
    }
}

fn apply_orders_atomically(
    conn: &Connection,
    updates: &[OrderUpdate],
) -> Result<(), (Option<CategoryId>, CategoryRepoError)> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
        .map_err(|err| (None, CategoryRepoError::from(err)))?;
    for update in updates {
        if update.order < 0 {
            return Err((
                Some(update.id),
                CategoryValidationError::NegativeOrder(update.order).into(),
            ));
        }
        let changed = tx
            .execute(
                "UPDATE categories
                 SET sort_order = ?2,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE category_uuid = ?1;",
                params![update.id.to_string(), update.order],
            )
            .map_err(|err| (Some(update.id), CategoryRepoError::from(err)))?;
        if changed == 0 {
            return Err((Some(update.id), CategoryRepoError::NotFound(update.id)));
        }
    }
    tx.commit().map_err(|err| (None, CategoryRepoError::from(err)))
}

fn load_category(
    conn: &Connection,
    id: CategoryId,
) -> CategoryRepoResult<Option<CategoryRecord>> {
    let mut stmt = conn.prepare(&format!(
        "{CATEGORY_SELECT_SQL}
         WHERE c.category_uuid = ?1;"
    ))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_category_row(row)?));
    }
    Ok(None)
}

fn ensure_parent_level(
    conn: &Connection,
    parent_id: CategoryId,
    child_level: CategoryLevel,
) -> CategoryRepoResult<()> {
    let parent =
        load_category(conn, parent_id)?.ok_or(CategoryRepoError::ParentNotFound(parent_id))?;
    let expected = child_level
        .parent()
        .ok_or(CategoryValidationError::RootWithParent)?;
    if parent.level != expected {
        return Err(CategoryRepoError::ParentLevelMismatch {
            parent_id,
            expected,
            actual: parent.level,
        });
    }
    Ok(())
}

/// Returns `(id, level)` for `root` and every descendant.
fn list_subtree(
    conn: &Connection,
    root: CategoryId,
) -> CategoryRepoResult<Vec<(CategoryId, CategoryLevel)>> {
    let mut stmt = conn.prepare(
        "WITH RECURSIVE subtree(category_uuid) AS (
            SELECT category_uuid FROM categories WHERE category_uuid = ?1
            UNION ALL
            SELECT child.category_uuid
            FROM categories child
            INNER JOIN subtree parent ON child.parent_uuid = parent.category_uuid
        )
        SELECT c.category_uuid, c.level
        FROM categories c
        INNER JOIN subtree ON subtree.category_uuid = c.category_uuid;",
    )?;
    let mut rows = stmt.query([root.to_string()])?;
    let mut members = Vec::new();
    while let Some(row) = rows.next()? {
        let id_text: String = row.get(0)?;
        let level: i64 = row.get(1)?;
        members.push((
            parse_uuid(&id_text, "categories.category_uuid")?,
            parse_level(level)?,
        ));
    }
    Ok(members)
}

fn next_sort_order(
    conn: &Connection,
    parent_id: Option<CategoryId>,
    exclude: Option<CategoryId>,
) -> CategoryRepoResult<i64> {
    let next = conn.query_row(
        "SELECT COALESCE(MAX(sort_order), -1) + 1
         FROM categories
         WHERE parent_uuid IS ?1
           AND (?2 IS NULL OR category_uuid != ?2);",
        params![
            parent_id.map(|value| value.to_string()),
            exclude.map(|value| value.to_string()),
        ],
        |row| row.get(0),
    )?;
    Ok(next)
}

/// Renumbers one sibling group to `0..n-1`, keeping relative order.
fn compact_sibling_orders(
    conn: &Connection,
    parent_id: Option<CategoryId>,
) -> CategoryRepoResult<()> {
    let mut stmt = conn.prepare(
        "SELECT category_uuid
         FROM categories
         WHERE parent_uuid IS ?1
         ORDER BY sort_order ASC, category_uuid ASC;",
    )?;
    let mut rows = stmt.query([parent_id.map(|value| value.to_string())])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.push(value);
    }

    for (index, id) in ids.into_iter().enumerate() {
        conn.execute(
            "UPDATE categories
             SET sort_order = ?2
             WHERE category_uuid = ?1
               AND sort_order != ?2;",
            params![id, index as i64],
        )?;
    }
    Ok(())
}

fn parse_category_row(row: &Row<'_>) -> CategoryRepoResult<CategoryRecord> {
    let id_text: String = row.get("category_uuid")?;
    let parent_id = row
        .get::<_, Option<String>>("parent_uuid")?
        .map(|value| parse_uuid(&value, "categories.parent_uuid"))
        .transpose()?;
    let course_count: i64 = row.get("course_count")?;

    Ok(CategoryRecord {
        id: parse_uuid(&id_text, "categories.category_uuid")?,
        name: row.get("name")?,
        description: row.get("description")?,
        level: parse_level(row.get("level")?)?,
        parent_id,
        order: row.get("sort_order")?,
        course_count: u32::try_from(course_count).map_err(|_| {
            CategoryRepoError::InvalidData(format!("invalid course count `{course_count}`"))
        })?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_level(value: i64) -> CategoryRepoResult<CategoryLevel> {
    CategoryLevel::try_from(value).map_err(|_| {
        CategoryRepoError::InvalidData(format!("invalid level `{value}` in categories.level"))
    })
}

fn parse_uuid(value: &str, column: &'static str) -> CategoryRepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| CategoryRepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

//! Course repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist course submissions filed under categories.
//! - Back the `course_count` reported for every category row.
//!
//! # Invariants
//! - Listing is deterministic: `created_at ASC, course_uuid ASC`.
//! - Status writes are conditional on the expected current status.

use crate::db::DbError;
use crate::model::category::CategoryId;
use crate::model::course::{Course, CourseId, CourseStatus};
use crate::repo::schema::{ensure_schema, SchemaIssue};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const COURSE_SELECT_SQL: &str = "SELECT
    course_uuid,
    category_uuid,
    title,
    status,
    review_note,
    created_at,
    updated_at
FROM courses";

pub type CourseRepoResult<T> = Result<T, CourseRepoError>;

/// Errors from course persistence.
#[derive(Debug)]
pub enum CourseRepoError {
    Db(DbError),
    NotFound(CourseId),
    CategoryNotFound(CategoryId),
    /// Status changed concurrently; the conditional write matched nothing.
    StatusConflict {
        id: CourseId,
        expected: CourseStatus,
    },
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    InvalidData(String),
}

impl Display for CourseRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "course not found: {id}"),
            Self::CategoryNotFound(id) => write!(f, "category not found: {id}"),
            Self::StatusConflict { id, expected } => write!(
                f,
                "course {id} is no longer {}",
                expected.as_str()
            ),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "course repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "course repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "course repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid course data: {message}"),
        }
    }
}

impl Error for CourseRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for CourseRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<SchemaIssue> for CourseRepoError {
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

/// Filters for listing courses.
#[derive(Debug, Clone, Default)]
pub struct CourseListQuery {
    pub category_id: Option<CategoryId>,
    pub status: Option<CourseStatus>,
}

/// Repository interface for course operations.
pub trait CourseRepository {
    fn create_course(&self, category_id: CategoryId, title: &str) -> CourseRepoResult<Course>;
    fn get_course(&self, id: CourseId) -> CourseRepoResult<Option<Course>>;
    fn list_courses(&self, query: &CourseListQuery) -> CourseRepoResult<Vec<Course>>;
    /// Moves `id` from `expected` to `next`, storing an optional review note.
    fn set_status(
        &self,
        id: CourseId,
        expected: CourseStatus,
        next: CourseStatus,
        review_note: Option<&str>,
    ) -> CourseRepoResult<()>;
}

/// SQLite-backed course repository.
pub struct SqliteCourseRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCourseRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> CourseRepoResult<Self> {
        ensure_schema(
            conn,
            &[(
                "courses",
                &[
                    "course_uuid",
                    "category_uuid",
                    "title",
                    "status",
                    "review_note",
                    "created_at",
                    "updated_at",
                ],
            )],
        )?;
        Ok(Self { conn })
    }
}

impl CourseRepository for SqliteCourseRepository<'_> {
    fn create_course(&self, category_id: CategoryId, title: &str) -> CourseRepoResult<Course> {
        let category_exists: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM categories WHERE category_uuid = ?1;",
                [category_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        if category_exists.is_none() {
            return Err(CourseRepoError::CategoryNotFound(category_id));
        }

        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO courses (course_uuid, category_uuid, title, status)
             VALUES (?1, ?2, ?3, 'pending');",
            params![id.to_string(), category_id.to_string(), title],
        )?;
        self.get_course(id)?.ok_or(CourseRepoError::NotFound(id))
    }

    fn get_course(&self, id: CourseId) -> CourseRepoResult<Option<Course>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{COURSE_SELECT_SQL} WHERE course_uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_course_row(row)?));
        }
        Ok(None)
    }

    fn list_courses(&self, query: &CourseListQuery) -> CourseRepoResult<Vec<Course>> {
        let mut sql = format!("{COURSE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(category_id) = query.category_id {
            bind_values.push(Value::Text(category_id.to_string()));
            sql.push_str(&format!(" AND category_uuid = ?{}", bind_values.len()));
        }
        if let Some(status) = query.status {
            bind_values.push(Value::Text(status.as_str().to_string()));
            sql.push_str(&format!(" AND status = ?{}", bind_values.len()));
        }
        sql.push_str(" ORDER BY created_at ASC, course_uuid ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut courses = Vec::new();
        while let Some(row) = rows.next()? {
            courses.push(parse_course_row(row)?);
        }
        Ok(courses)
    }

    fn set_status(
        &self,
        id: CourseId,
        expected: CourseStatus,
        next: CourseStatus,
        review_note: Option<&str>,
    ) -> CourseRepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE courses
             SET status = ?3,
                 review_note = ?4,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE course_uuid = ?1
               AND status = ?2;",
            params![id.to_string(), expected.as_str(), next.as_str(), review_note],
        )?;
        if changed == 0 {
            return match self.get_course(id)? {
                None => Err(CourseRepoError::NotFound(id)),
                Some(_) => Err(CourseRepoError::StatusConflict { id, expected }),
            };
        }
        Ok(())
    }
}

fn parse_course_row(row: &Row<'_>) -> CourseRepoResult<Course> {
    let status_text: String = row.get("status")?;
    let status = CourseStatus::parse(&status_text).ok_or_else(|| {
        CourseRepoError::InvalidData(format!("invalid status `{status_text}` in courses.status"))
    })?;

    Ok(Course {
        id: parse_uuid(row.get::<_, String>("course_uuid")?, "courses.course_uuid")?,
        category_id: parse_uuid(row.get::<_, String>("category_uuid")?, "courses.category_uuid")?,
        title: row.get("title")?,
        status,
        review_note: row.get("review_note")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_uuid(value: String, column: &'static str) -> CourseRepoResult<Uuid> {
    Uuid::parse_str(&value)
        .map_err(|_| CourseRepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

//! Database helpers for accounts and courses.
//!
//! Every operation here is a single-statement read or write; there are no
//! multi-row transactions in this service. Failures that handlers translate
//! (the email uniqueness constraint) surface as outcome enums, everything
//! else bubbles up as an error.

use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tracing::Instrument;

use crate::api::validate::CourseFields;

/// Account fields needed to verify credentials.
pub(crate) struct UserRecord {
    pub(crate) id: i32,
    pub(crate) email_address: String,
    pub(crate) password_hash: String,
}

/// Public account projection: no hash, no timestamps.
pub(crate) struct ProfileRecord {
    pub(crate) id: i32,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) email_address: String,
}

/// Candidate account row, password already hashed.
pub(crate) struct NewUser {
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) email_address: String,
    pub(crate) password_hash: String,
}

/// Outcome when attempting to persist a new account.
#[derive(Debug)]
pub(crate) enum CreateUserOutcome {
    Created,
    EmailTaken,
}

/// Outcome of a write keyed on an id that may have vanished between the
/// ownership fetch and the statement.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum MutateOutcome {
    Applied,
    Missing,
}

/// Raw course row used for ownership checks and update merging.
#[derive(Debug, Clone)]
pub struct CourseRow {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub estimated_time: Option<String>,
    pub materials_needed: Option<String>,
    pub owner_id: i32,
}

/// Course row joined with its owner's public fields.
pub(crate) struct CourseWithOwner {
    pub(crate) row: CourseRow,
    pub(crate) owner: ProfileRecord,
}

/// Look up an account by exact email match (credential verification).
pub(crate) async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRecord>> {
    let query = "SELECT id, email_address, password_hash FROM users WHERE email_address = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to look up account by email")?;

    Ok(row.map(|row| UserRecord {
        id: row.get("id"),
        email_address: row.get("email_address"),
        password_hash: row.get("password_hash"),
    }))
}

/// Fetch the public projection of a single account.
pub(crate) async fn fetch_user_profile(pool: &PgPool, id: i32) -> Result<Option<ProfileRecord>> {
    let query = "SELECT id, first_name, last_name, email_address FROM users WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to fetch account profile")?;

    Ok(row.map(profile_from_row))
}

/// Persist a new account; uniqueness violations on the email column are an
/// outcome, not an error.
pub(crate) async fn insert_user(pool: &PgPool, user: &NewUser) -> Result<CreateUserOutcome> {
    let query = r"
        INSERT INTO users
            (first_name, last_name, email_address, password_hash)
        VALUES ($1, $2, $3, $4)
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email_address)
        .bind(&user.password_hash)
        .execute(pool)
        .instrument(span)
        .await;

    match result {
        Ok(_) => Ok(CreateUserOutcome::Created),
        Err(err) if is_unique_violation(&err) => Ok(CreateUserOutcome::EmailTaken),
        Err(err) => Err(err).context("failed to insert account"),
    }
}

const COURSE_WITH_OWNER_COLUMNS: &str = r"
    c.id, c.title, c.description, c.estimated_time, c.materials_needed, c.owner_id,
    u.first_name AS owner_first_name,
    u.last_name AS owner_last_name,
    u.email_address AS owner_email_address
";

/// List every course with its owner embedded.
pub(crate) async fn list_courses(pool: &PgPool) -> Result<Vec<CourseWithOwner>> {
    let query = format!(
        "SELECT {COURSE_WITH_OWNER_COLUMNS} FROM courses c JOIN users u ON u.id = c.owner_id ORDER BY c.id"
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let rows = sqlx::query(&query)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to list courses")?;

    Ok(rows.into_iter().map(course_with_owner_from_row).collect())
}

/// Fetch one course with its owner embedded.
pub(crate) async fn fetch_course(pool: &PgPool, id: i32) -> Result<Option<CourseWithOwner>> {
    let query = format!(
        "SELECT {COURSE_WITH_OWNER_COLUMNS} FROM courses c JOIN users u ON u.id = c.owner_id WHERE c.id = $1"
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to fetch course")?;

    Ok(row.map(course_with_owner_from_row))
}

/// Fetch the raw course row (ownership checks, update merging).
pub(crate) async fn fetch_course_row(pool: &PgPool, id: i32) -> Result<Option<CourseRow>> {
    let query = r"
        SELECT id, title, description, estimated_time, materials_needed, owner_id
        FROM courses WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to fetch course row")?;

    Ok(row.map(|row| CourseRow {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        estimated_time: row.get("estimated_time"),
        materials_needed: row.get("materials_needed"),
        owner_id: row.get("owner_id"),
    }))
}

/// Persist a new course and return its generated id.
pub(crate) async fn insert_course(pool: &PgPool, course: &CourseFields) -> Result<i32> {
    let query = r"
        INSERT INTO courses
            (title, description, estimated_time, materials_needed, owner_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(&course.title)
        .bind(&course.description)
        .bind(&course.estimated_time)
        .bind(&course.materials_needed)
        .bind(course.owner_id)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to insert course")?;

    Ok(row.get("id"))
}

/// Overwrite a course row with the merged, re-validated fields.
pub(crate) async fn update_course(
    pool: &PgPool,
    id: i32,
    course: &CourseFields,
) -> Result<MutateOutcome> {
    let query = r"
        UPDATE courses
        SET title = $1, description = $2, estimated_time = $3, materials_needed = $4,
            owner_id = $5, updated_at = now()
        WHERE id = $6
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(&course.title)
        .bind(&course.description)
        .bind(&course.estimated_time)
        .bind(&course.materials_needed)
        .bind(course.owner_id)
        .bind(id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to update course")?;

    Ok(mutate_outcome(result.rows_affected()))
}

/// Remove a course row.
pub(crate) async fn delete_course(pool: &PgPool, id: i32) -> Result<MutateOutcome> {
    let query = "DELETE FROM courses WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete course")?;

    Ok(mutate_outcome(result.rows_affected()))
}

fn mutate_outcome(rows_affected: u64) -> MutateOutcome {
    if rows_affected == 0 {
        MutateOutcome::Missing
    } else {
        MutateOutcome::Applied
    }
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

fn profile_from_row(row: sqlx::postgres::PgRow) -> ProfileRecord {
    ProfileRecord {
        id: row.get("id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        email_address: row.get("email_address"),
    }
}

fn course_with_owner_from_row(row: sqlx::postgres::PgRow) -> CourseWithOwner {
    CourseWithOwner {
        row: CourseRow {
            id: row.get("id"),
            title: row.get("title"),
            description: row.get("description"),
            estimated_time: row.get("estimated_time"),
            materials_needed: row.get("materials_needed"),
            owner_id: row.get("owner_id"),
        },
        owner: ProfileRecord {
            id: row.get("owner_id"),
            first_name: row.get("owner_first_name"),
            last_name: row.get("owner_last_name"),
            email_address: row.get("owner_email_address"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct TestDbError {
        code: Option<&'static str>,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test database error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &'static str {
            "test database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn is_unique_violation_matches_sqlstate() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23505"),
        }));
        assert!(is_unique_violation(&err));

        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23503"),
        }));
        assert!(!is_unique_violation(&err));

        let err = sqlx::Error::RowNotFound;
        assert!(!is_unique_violation(&err));
    }

    #[test]
    fn write_touching_no_rows_is_missing() {
        assert_eq!(mutate_outcome(0), MutateOutcome::Missing);
        assert_eq!(mutate_outcome(1), MutateOutcome::Applied);
    }
}

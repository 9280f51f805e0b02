//! Course endpoints.
//!
//! Reads are open to everyone; writes require verified credentials, and
//! update/delete additionally require that the principal owns the course.

use axum::{
    extract::{Extension, Path},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::api::{
    auth::{self, AuthError},
    error, storage, validate, ApiConfig,
};

const COURSE_NOT_FOUND: &str = "Course not found";
const NOT_COURSE_UPDATER: &str = "You are not authorized to update this course";
const NOT_COURSE_DELETER: &str = "You are not authorized to delete this course";

/// Course payload for create and update. On update, absent fields keep the
/// stored values.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CoursePayload {
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) estimated_time: Option<String>,
    pub(crate) materials_needed: Option<String>,
    pub(crate) owner_id: Option<i32>,
}

/// Owner fields embedded in course responses. Never includes the hash.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseOwner {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
}

/// Full course projection with its owner embedded, no timestamps.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetail {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub estimated_time: Option<String>,
    pub materials_needed: Option<String>,
    pub owner_id: i32,
    pub owner: CourseOwner,
}

impl From<storage::CourseWithOwner> for CourseDetail {
    fn from(course: storage::CourseWithOwner) -> Self {
        Self {
            id: course.row.id,
            title: course.row.title,
            description: course.row.description,
            estimated_time: course.row.estimated_time,
            materials_needed: course.row.materials_needed,
            owner_id: course.row.owner_id,
            owner: CourseOwner {
                id: course.owner.id,
                first_name: course.owner.first_name,
                last_name: course.owner.last_name,
                email_address: course.owner.email_address,
            },
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/courses",
    responses(
        (status = 200, description = "All courses with their owners; an empty array when there are none", body = [CourseDetail]),
    ),
    tag = "courses"
)]
pub async fn list(config: Extension<Arc<ApiConfig>>, pool: Extension<PgPool>) -> Response {
    match storage::list_courses(&pool).await {
        Ok(courses) => {
            let courses: Vec<CourseDetail> = courses.into_iter().map(CourseDetail::from).collect();
            (StatusCode::OK, Json(courses)).into_response()
        }
        Err(err) => error::unhandled(&config, err),
    }
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}",
    params(("id" = i32, Path, description = "Course id")),
    responses(
        (status = 200, description = "The course with its owner", body = CourseDetail),
        (status = 404, description = "No course with that id"),
    ),
    tag = "courses"
)]
pub async fn show(
    config: Extension<Arc<ApiConfig>>,
    pool: Extension<PgPool>,
    Path(id): Path<i32>,
) -> Response {
    match storage::fetch_course(&pool, id).await {
        Ok(Some(course)) => (StatusCode::OK, Json(CourseDetail::from(course))).into_response(),
        Ok(None) => error::message(StatusCode::NOT_FOUND, COURSE_NOT_FOUND),
        Err(err) => error::unhandled(&config, err),
    }
}

#[utoipa::path(
    post,
    path = "/api/courses",
    request_body = CoursePayload,
    responses(
        (status = 201, description = "Course created; Location references the new course"),
        (status = 400, description = "Validation messages"),
        (status = 401, description = "Missing or invalid credentials"),
    ),
    tag = "courses"
)]
pub async fn create(
    headers: HeaderMap,
    config: Extension<Arc<ApiConfig>>,
    pool: Extension<PgPool>,
    payload: Option<Json<CoursePayload>>,
) -> Response {
    // Any verified principal may create; ownership comes from the payload.
    if let Err(denied) = auth::verify(&headers, &pool).await {
        return denied_response(&config, denied);
    }

    // A missing or unreadable body fails every required-field rule.
    let payload = payload.map(|Json(payload)| payload).unwrap_or_default();

    let fields = match validate::course_fields(payload) {
        Ok(fields) => fields,
        Err(errors) => return error::validation(errors),
    };

    match storage::insert_course(&pool, &fields).await {
        Ok(id) => (
            StatusCode::CREATED,
            [(header::LOCATION, format!("/api/courses/{id}"))],
        )
            .into_response(),
        Err(err) => error::unhandled(&config, err),
    }
}

#[utoipa::path(
    put,
    path = "/api/courses/{id}",
    params(("id" = i32, Path, description = "Course id")),
    request_body = CoursePayload,
    responses(
        (status = 204, description = "Course updated"),
        (status = 400, description = "Validation messages"),
        (status = 401, description = "Missing or invalid credentials"),
        (status = 403, description = "The principal does not own this course"),
        (status = 404, description = "No course with that id"),
    ),
    tag = "courses"
)]
pub async fn update(
    headers: HeaderMap,
    config: Extension<Arc<ApiConfig>>,
    pool: Extension<PgPool>,
    Path(id): Path<i32>,
    payload: Option<Json<CoursePayload>>,
) -> Response {
    let principal = match auth::verify(&headers, &pool).await {
        Ok(principal) => principal,
        Err(denied) => return denied_response(&config, denied),
    };

    let row = match storage::fetch_course_row(&pool, id).await {
        Ok(Some(row)) => row,
        Ok(None) => return error::message(StatusCode::NOT_FOUND, COURSE_NOT_FOUND),
        Err(err) => return error::unhandled(&config, err),
    };

    if !principal.owns(&row) {
        return error::message(StatusCode::FORBIDDEN, NOT_COURSE_UPDATER);
    }

    let payload = payload.map(|Json(payload)| payload).unwrap_or_default();

    // Overlay the submitted fields on the stored row, then re-run every rule.
    let fields = match validate::course_fields(merged(payload, row)) {
        Ok(fields) => fields,
        Err(errors) => return error::validation(errors),
    };

    // The row can vanish between the ownership fetch and the write.
    match storage::update_course(&pool, id, &fields).await {
        Ok(storage::MutateOutcome::Applied) => StatusCode::NO_CONTENT.into_response(),
        Ok(storage::MutateOutcome::Missing) => {
            error::message(StatusCode::NOT_FOUND, COURSE_NOT_FOUND)
        }
        Err(err) => error::unhandled(&config, err),
    }
}

#[utoipa::path(
    delete,
    path = "/api/courses/{id}",
    params(("id" = i32, Path, description = "Course id")),
    responses(
        (status = 204, description = "Course deleted"),
        (status = 401, description = "Missing or invalid credentials"),
        (status = 403, description = "The principal does not own this course"),
        (status = 404, description = "No course with that id"),
    ),
    tag = "courses"
)]
pub async fn remove(
    headers: HeaderMap,
    config: Extension<Arc<ApiConfig>>,
    pool: Extension<PgPool>,
    Path(id): Path<i32>,
) -> Response {
    let principal = match auth::verify(&headers, &pool).await {
        Ok(principal) => principal,
        Err(denied) => return denied_response(&config, denied),
    };

    let row = match storage::fetch_course_row(&pool, id).await {
        Ok(Some(row)) => row,
        Ok(None) => return error::message(StatusCode::NOT_FOUND, COURSE_NOT_FOUND),
        Err(err) => return error::unhandled(&config, err),
    };

    if !principal.owns(&row) {
        return error::message(StatusCode::FORBIDDEN, NOT_COURSE_DELETER);
    }

    match storage::delete_course(&pool, id).await {
        Ok(storage::MutateOutcome::Applied) => StatusCode::NO_CONTENT.into_response(),
        Ok(storage::MutateOutcome::Missing) => {
            error::message(StatusCode::NOT_FOUND, COURSE_NOT_FOUND)
        }
        Err(err) => error::unhandled(&config, err),
    }
}

fn denied_response(config: &ApiConfig, err: AuthError) -> Response {
    match err {
        AuthError::Denied(_) => error::access_denied(),
        AuthError::Store(err) => error::unhandled(config, err),
    }
}

fn merged(payload: CoursePayload, row: storage::CourseRow) -> CoursePayload {
    CoursePayload {
        title: payload.title.or(Some(row.title)),
        description: payload.description.or(Some(row.description)),
        estimated_time: payload.estimated_time.or(row.estimated_time),
        materials_needed: payload.materials_needed.or(row.materials_needed),
        owner_id: payload.owner_id.or(Some(row.owner_id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    fn course_row() -> storage::CourseRow {
        storage::CourseRow {
            id: 1,
            title: "Build a Basement Recording Studio".to_string(),
            description: "Improve acoustics with panels.".to_string(),
            estimated_time: Some("12 hours".to_string()),
            materials_needed: None,
            owner_id: 7,
        }
    }

    #[test]
    fn merged_keeps_stored_values_for_absent_fields() {
        let payload = CoursePayload {
            title: Some("New title".to_string()),
            ..CoursePayload::default()
        };

        let merged = merged(payload, course_row());
        assert_eq!(merged.title.as_deref(), Some("New title"));
        assert_eq!(
            merged.description.as_deref(),
            Some("Improve acoustics with panels.")
        );
        assert_eq!(merged.estimated_time.as_deref(), Some("12 hours"));
        assert_eq!(merged.owner_id, Some(7));
    }

    #[test]
    fn merged_lets_submitted_fields_win() {
        let payload = CoursePayload {
            title: Some(String::new()),
            estimated_time: Some("3 hours".to_string()),
            owner_id: Some(8),
            ..CoursePayload::default()
        };

        let merged = merged(payload, course_row());
        // An explicitly empty title must still fail validation downstream.
        assert_eq!(merged.title.as_deref(), Some(""));
        assert_eq!(merged.estimated_time.as_deref(), Some("3 hours"));
        assert_eq!(merged.owner_id, Some(8));
    }

    #[test]
    fn course_detail_serializes_camel_case_without_secrets() {
        let detail = CourseDetail {
            id: 1,
            title: "Build a Basement Recording Studio".to_string(),
            description: "Improve acoustics with panels.".to_string(),
            estimated_time: Some("12 hours".to_string()),
            materials_needed: None,
            owner_id: 7,
            owner: CourseOwner {
                id: 7,
                first_name: "Joe".to_string(),
                last_name: "Smith".to_string(),
                email_address: "joe@smith.com".to_string(),
            },
        };

        let value = serde_json::to_value(&detail).expect("serializable");
        assert_eq!(value["estimatedTime"], "12 hours");
        assert_eq!(value["materialsNeeded"], serde_json::Value::Null);
        assert_eq!(value["ownerId"], 7);
        assert_eq!(value["owner"]["firstName"], "Joe");
        assert!(value["owner"].get("password").is_none());
        assert!(value["owner"].get("passwordHash").is_none());
        assert!(value.get("createdAt").is_none());
    }

    #[tokio::test]
    async fn non_owner_mutation_answers_resource_specific_403() {
        let response = error::message(StatusCode::FORBIDDEN, NOT_COURSE_UPDATER);
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "message": "You are not authorized to update this course" })
        );

        let response = error::message(StatusCode::FORBIDDEN, NOT_COURSE_DELETER);
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "message": "You are not authorized to delete this course" })
        );
    }

    #[tokio::test]
    async fn missing_course_answers_404_message() {
        let response = error::message(StatusCode::NOT_FOUND, COURSE_NOT_FOUND);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "message": "Course not found" })
        );
    }
}

//! Account endpoints.
//!
//! Flow Overview:
//! 1) `GET /api/users` verifies credentials and returns the caller's own
//!    public projection.
//! 2) `POST /api/users` validates the candidate account, hashes the
//!    password, and persists it; a duplicate email answers a specific 400.

use axum::{
    extract::Extension,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::api::{
    auth::{self, AuthError},
    error, storage,
    storage::CreateUserOutcome,
    validate, ApiConfig,
};

const EMAIL_IN_USE: &str =
    "The email address is already in use. Please use a different email address.";

/// Candidate account payload. Deserialization only; the password is never
/// serialized back out.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    pub(crate) first_name: Option<String>,
    pub(crate) last_name: Option<String>,
    pub(crate) email_address: Option<String>,
    #[schema(value_type = String)]
    pub(crate) password: Option<SecretString>,
}

/// Public account projection: everything except the hash and timestamps.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
}

impl From<storage::ProfileRecord> for UserProfile {
    fn from(record: storage::ProfileRecord) -> Self {
        Self {
            id: record.id,
            first_name: record.first_name,
            last_name: record.last_name,
            email_address: record.email_address,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "The authenticated account's public projection", body = UserProfile),
        (status = 401, description = "Missing or invalid credentials"),
    ),
    tag = "users"
)]
pub async fn show_current(
    headers: HeaderMap,
    config: Extension<Arc<ApiConfig>>,
    pool: Extension<PgPool>,
) -> Response {
    let principal = match auth::verify(&headers, &pool).await {
        Ok(principal) => principal,
        Err(AuthError::Denied(_)) => return error::access_denied(),
        Err(AuthError::Store(err)) => return error::unhandled(&config, err),
    };

    match storage::fetch_user_profile(&pool, principal.id).await {
        Ok(Some(profile)) => (StatusCode::OK, Json(UserProfile::from(profile))).into_response(),
        Ok(None) => error::message(StatusCode::NOT_FOUND, "User not found"),
        Err(err) => error::unhandled(&config, err),
    }
}

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = UserPayload,
    responses(
        (status = 201, description = "Account created; Location references the root collection"),
        (status = 400, description = "Validation messages or duplicate email"),
    ),
    tag = "users"
)]
pub async fn create(
    config: Extension<Arc<ApiConfig>>,
    pool: Extension<PgPool>,
    payload: Option<Json<UserPayload>>,
) -> Response {
    // A missing or unreadable body fails every required-field rule.
    let payload = payload.map(|Json(payload)| payload).unwrap_or_default();

    let fields = match validate::user_fields(payload) {
        Ok(fields) => fields,
        Err(errors) => return error::validation(errors),
    };

    let password_hash = match auth::hash_password(fields.password.expose_secret()) {
        Ok(hash) => hash,
        Err(err) => return error::unhandled(&config, err),
    };

    let user = storage::NewUser {
        first_name: fields.first_name,
        last_name: fields.last_name,
        email_address: fields.email_address,
        password_hash,
    };

    match storage::insert_user(&pool, &user).await {
        Ok(CreateUserOutcome::Created) => {
            (StatusCode::CREATED, [(header::LOCATION, "/")]).into_response()
        }
        Ok(CreateUserOutcome::EmailTaken) => error::message(StatusCode::BAD_REQUEST, EMAIL_IN_USE),
        Err(err) => error::unhandled(&config, err),
    }
}

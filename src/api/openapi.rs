//! OpenAPI document for the HTTP surface.

use axum::response::{IntoResponse, Json};
use utoipa::OpenApi;

use crate::api::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "kursoj",
        description = "Users & Courses REST API",
        license(name = "BSD-3-Clause")
    ),
    paths(
        handlers::health::health,
        handlers::users::show_current,
        handlers::users::create,
        handlers::courses::list,
        handlers::courses::show,
        handlers::courses::create,
        handlers::courses::update,
        handlers::courses::remove,
    ),
    components(schemas(
        handlers::users::UserPayload,
        handlers::users::UserProfile,
        handlers::courses::CoursePayload,
        handlers::courses::CourseOwner,
        handlers::courses::CourseDetail,
    )),
    tags(
        (name = "health", description = "Service metadata"),
        (name = "users", description = "Account creation and self-lookup"),
        (name = "courses", description = "Course catalogue and ownership-gated mutation"),
    )
)]
pub struct ApiDoc;

// axum handler serving the generated document
pub async fn serve() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

pub mod courses;
pub mod health;
pub mod users;

use axum::response::IntoResponse;

// axum handler for the root greeting
pub async fn root() -> impl IntoResponse {
    "Welcome to the REST API project!"
}

use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    routing::get,
    Extension, Router,
};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;

pub mod auth;
pub mod error;
pub mod handlers;
pub mod openapi;
pub(crate) mod storage;
pub(crate) mod validate;

/// Immutable server configuration, injected at construction.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Log uncaught failures with full detail at the terminal error boundary.
    pub log_errors: bool,
}

/// Start the server
/// # Errors
/// Return error if failed to connect to the database or to bind the port
pub async fn new(port: u16, dsn: String, config: ApiConfig) -> Result<()> {
    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    let app = router(pool, Arc::new(config));

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

/// Build the full application router.
#[must_use]
pub fn router(pool: PgPool, config: Arc<ApiConfig>) -> Router {
    let resources = Router::new()
        .route(
            "/users",
            get(handlers::users::show_current).post(handlers::users::create),
        )
        .route(
            "/courses",
            get(handlers::courses::list).post(handlers::courses::create),
        )
        .route(
            "/courses/:id",
            get(handlers::courses::show)
                .put(handlers::courses::update)
                .delete(handlers::courses::remove),
        );

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health::health))
        .route("/api-docs/openapi.json", get(openapi::serve))
        .nest("/api", resources)
        .fallback(error::route_not_found)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(config))
                .layer(Extension(pool)),
        )
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

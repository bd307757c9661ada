pub mod api;
pub mod middleware;
pub mod web;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::common::di::AppState;
use api::routes::create_api_routes;
use web::create_web_routes;

/// Liveness probe; checks the database when one is configured
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool.as_ref()).await {
            tracing::error!("Health check failed: {}", e);
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable", "error": e.to_string() })),
            );
        }
    }

    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

/// Builds the complete router: API, health probe, static client
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .nest("/api", create_api_routes(state.clone()))
        .route("/health", get(health))
        .merge(create_web_routes(&state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(state.config.timeouts.request_timeout())),
        )
        .with_state(state)
}

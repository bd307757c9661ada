use axum::Router;
use tower_http::services::ServeDir;

use crate::common::di::AppState;

/// Serves the built web client for everything outside `/api`
pub fn create_web_routes(state: &AppState) -> Router<AppState> {
    Router::new().fallback_service(ServeDir::new(&state.config.server.static_dir))
}

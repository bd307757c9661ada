use axum::{extract::State, response::IntoResponse, Json};

use crate::common::di::AppState;
use crate::interfaces::api::handlers::ApiResult;
use crate::interfaces::middleware::auth::AuthUser;

/// Storage meter of the caller
pub async fn get_storage_usage(State(state): State<AppState>, user: AuthUser) -> ApiResult<impl IntoResponse> {
    let usage = state.applications.storage_usage_service.usage(&user.id).await?;
    Ok(Json(usage))
}

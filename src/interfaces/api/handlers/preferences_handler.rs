use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::application::dtos::preferences_dto::UpdatePreferencesDto;
use crate::common::di::AppState;
use crate::interfaces::api::handlers::ApiResult;
use crate::interfaces::middleware::auth::AuthUser;

/// `{"preferences": null}` until the user saves something
pub async fn get_preferences(State(state): State<AppState>, user: AuthUser) -> ApiResult<impl IntoResponse> {
    let preferences = state.applications.preferences_service.get(&user.id).await?;
    Ok(Json(json!({ "preferences": preferences })))
}

pub async fn update_preferences(
    State(state): State<AppState>,
    user: AuthUser,
    Json(dto): Json<UpdatePreferencesDto>,
) -> ApiResult<impl IntoResponse> {
    let preferences = state.applications.preferences_service.update(&user.id, dto).await?;
    Ok(Json(json!({ "success": true, "preferences": preferences })))
}

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::application::dtos::share_dto::CreateShareDto;
use crate::common::di::AppState;
use crate::interfaces::api::handlers::file_handler::attachment_response;
use crate::interfaces::api::handlers::ApiResult;
use crate::interfaces::middleware::auth::AuthUser;

/// Creates a public link for one of the caller's files
pub async fn create_share(
    State(state): State<AppState>,
    user: AuthUser,
    Json(dto): Json<CreateShareDto>,
) -> ApiResult<impl IntoResponse> {
    let link = state.applications.share_service.create_link(dto, &user.id).await?;
    Ok(Json(link))
}

pub async fn get_file_share(
    State(state): State<AppState>,
    user: AuthUser,
    Path(file_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let link = state.applications.share_service.link_for_file(&file_id, &user.id).await?;
    Ok(Json(link))
}

pub async fn revoke_share(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.applications.share_service.revoke_link(&id, &user.id).await?;
    Ok(Json(json!({ "success": true })))
}

/// Public: no session needed, the token is the credential
pub async fn get_shared_file(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let shared = state.applications.share_service.shared_file(&token).await?;
    Ok(Json(shared))
}

/// Public download; counts one download per call
pub async fn download_shared_file(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<Response> {
    let (file, stream) = state.applications.share_service.download_shared(&token).await?;
    Ok(attachment_response(&file, stream))
}

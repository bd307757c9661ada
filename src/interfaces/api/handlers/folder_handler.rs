use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::application::dtos::folder_dto::CreateFolderDto;
use crate::common::di::AppState;
use crate::interfaces::api::handlers::{ApiError, ApiResult};
use crate::interfaces::middleware::auth::AuthUser;

/// Handler for folder-related API endpoints
pub struct FolderHandler;

impl FolderHandler {
    /// Creates a new folder
    pub async fn create_folder(
        State(state): State<AppState>,
        user: AuthUser,
        Json(dto): Json<CreateFolderDto>,
    ) -> ApiResult<impl IntoResponse> {
        if dto.name.trim().is_empty() {
            return Err(ApiError::bad_request("Folder name is required"));
        }

        let folder = state.applications.folder_service.create_folder(dto, &user.id).await?;
        Ok(Json(json!({ "folder": folder })))
    }

    /// Path from the root down to the folder
    pub async fn breadcrumbs(
        State(state): State<AppState>,
        user: AuthUser,
        Path(id): Path<String>,
    ) -> ApiResult<impl IntoResponse> {
        let crumbs = state.applications.folder_service.breadcrumbs(&id, &user.id).await?;
        Ok(Json(crumbs))
    }
}

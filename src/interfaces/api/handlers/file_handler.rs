use axum::{
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::application::dtos::batch_dto::{FavoriteRequest, RenameRequest};
use crate::application::services::file_service::UploadFileDto;
use crate::common::di::AppState;
use crate::domain::entities::file::File;
use crate::domain::repositories::blob_repository::BlobStream;
use crate::interfaces::api::handlers::{ApiError, ApiResult};
use crate::interfaces::middleware::auth::AuthUser;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub folder_id: Option<String>,
}

/// Streams a stored file back as an attachment
pub(crate) fn attachment_response(file: &File, stream: BlobStream) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", file.name().replace('"', "'"));
    let headers = [
        (header::CONTENT_TYPE, file.content_type().to_string()),
        (header::CONTENT_DISPOSITION, disposition),
        (header::CONTENT_LENGTH, file.size().to_string()),
    ];

    (StatusCode::OK, headers, Body::from_stream(stream)).into_response()
}

/// Handler for file-related API endpoints
pub struct FileHandler;

impl FileHandler {
    /// Lists the files and folders inside a folder (root when absent)
    pub async fn list_files(
        State(state): State<AppState>,
        user: AuthUser,
        Query(query): Query<ListQuery>,
    ) -> ApiResult<impl IntoResponse> {
        let folder_id = query.folder_id.as_deref().filter(|id| !id.is_empty());
        let contents = state
            .applications
            .file_service
            .list_contents(folder_id, &user.id)
            .await?;
        Ok(Json(contents))
    }

    pub async fn list_trash(State(state): State<AppState>, user: AuthUser) -> ApiResult<impl IntoResponse> {
        let contents = state.applications.file_service.list_trash(&user.id).await?;
        Ok(Json(contents))
    }

    pub async fn list_favorites(State(state): State<AppState>, user: AuthUser) -> ApiResult<impl IntoResponse> {
        let contents = state.applications.file_service.list_favorites(&user.id).await?;
        Ok(Json(contents))
    }

    /// Uploads a file from a multipart form (`file`, optional `folder_id`)
    pub async fn upload_file(
        State(state): State<AppState>,
        user: AuthUser,
        mut multipart: Multipart,
    ) -> ApiResult<impl IntoResponse> {
        let mut file_part = None;
        let mut folder_id = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::new(e.status(), e.body_text()))?
        {
            match field.name().unwrap_or("") {
                "file" => {
                    let name = field.file_name().unwrap_or("unnamed").to_string();
                    let content_type = field.content_type().map(str::to_string);
                    let content = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::new(e.status(), e.body_text()))?;
                    file_part = Some((name, content_type, content));
                }
                "folder_id" => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| ApiError::bad_request(e.body_text()))?;
                    if !value.is_empty() && value != "null" {
                        folder_id = Some(value);
                    }
                }
                _ => {}
            }
        }

        let (name, content_type, content) = file_part.ok_or_else(|| ApiError::bad_request("No file provided"))?;

        let file = state
            .applications
            .file_service
            .upload(UploadFileDto { name, folder_id, content_type, content }, &user.id)
            .await?;

        Ok(Json(json!({ "file": file })))
    }

    pub async fn download_file(
        State(state): State<AppState>,
        user: AuthUser,
        Path(id): Path<String>,
    ) -> ApiResult<Response> {
        let (file, stream) = state.applications.file_service.download(&id, &user.id).await?;
        Ok(attachment_response(&file, stream))
    }

    /// Deletes a single file permanently
    pub async fn delete_file(
        State(state): State<AppState>,
        user: AuthUser,
        Path(id): Path<String>,
    ) -> ApiResult<impl IntoResponse> {
        state.applications.file_service.delete_file(&id, &user.id).await?;
        Ok(Json(json!({ "success": true })))
    }

    /// Renames a file or a folder
    pub async fn rename(
        State(state): State<AppState>,
        user: AuthUser,
        Json(request): Json<RenameRequest>,
    ) -> ApiResult<impl IntoResponse> {
        match (request.target_file_id.as_deref(), request.target_folder_id.as_deref()) {
            (Some(file_id), _) => {
                state
                    .applications
                    .file_service
                    .rename_file(file_id, &request.name, &user.id)
                    .await?;
            }
            (None, Some(folder_id)) => {
                state
                    .applications
                    .folder_service
                    .rename_folder(folder_id, &request.name, &user.id)
                    .await?;
            }
            (None, None) => return Err(ApiError::bad_request("Nothing to rename")),
        }

        Ok(Json(json!({ "success": true })))
    }

    /// Marks a file or a folder as favorite
    pub async fn set_favorite(
        State(state): State<AppState>,
        user: AuthUser,
        Json(request): Json<FavoriteRequest>,
    ) -> ApiResult<impl IntoResponse> {
        if request.file_id.is_none() && request.folder_id.is_none() {
            return Err(ApiError::bad_request("Either fileId or folderId is required"));
        }

        if let Some(file_id) = &request.file_id {
            state
                .applications
                .file_service
                .set_favorite(file_id, request.is_favorite, &user.id)
                .await?;
        }
        if let Some(folder_id) = &request.folder_id {
            state
                .applications
                .folder_service
                .set_favorite(folder_id, request.is_favorite, &user.id)
                .await?;
        }

        Ok(Json(json!({ "success": true })))
    }
}

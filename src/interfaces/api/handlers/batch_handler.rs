use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::instrument;

use crate::application::dtos::batch_dto::{BatchItemsRequest, BatchOperationResponse, MoveItemsRequest};
use crate::application::services::batch_operations::BatchResult;
use crate::common::di::AppState;
use crate::interfaces::api::handlers::ApiResult;
use crate::interfaces::middleware::auth::AuthUser;

/// 200 when every item succeeded, 207 Multi-Status otherwise
fn batch_response(result: BatchResult) -> impl IntoResponse {
    let status = if result.is_complete() {
        StatusCode::OK
    } else {
        StatusCode::MULTI_STATUS
    };

    (status, Json(BatchOperationResponse::from(result)))
}

/// Handler para mover archivos y carpetas en lote
#[instrument(skip(state, request), fields(user = %user.id))]
pub async fn move_items(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<MoveItemsRequest>,
) -> ApiResult<impl IntoResponse> {
    let result = state.applications.batch_service.move_items(&request, &user.id).await?;
    Ok(batch_response(result))
}

/// Handler para enviar elementos a la papelera
#[instrument(skip(state, request), fields(user = %user.id))]
pub async fn trash_items(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<BatchItemsRequest>,
) -> ApiResult<impl IntoResponse> {
    let result = state.applications.batch_service.trash_items(&request, &user.id).await?;
    Ok(batch_response(result))
}

/// Handler para restaurar elementos de la papelera
#[instrument(skip(state, request), fields(user = %user.id))]
pub async fn restore_items(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<BatchItemsRequest>,
) -> ApiResult<impl IntoResponse> {
    let result = state.applications.batch_service.restore_items(&request, &user.id).await?;
    Ok(batch_response(result))
}

/// Handler para el borrado definitivo
#[instrument(skip(state, request), fields(user = %user.id))]
pub async fn delete_permanently(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<BatchItemsRequest>,
) -> ApiResult<impl IntoResponse> {
    let result = state.applications.batch_service.delete_permanently(&request, &user.id).await?;
    Ok(batch_response(result))
}

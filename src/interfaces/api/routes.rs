use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
    Router,
};

use crate::common::di::AppState;
use crate::interfaces::api::handlers::file_handler::FileHandler;
use crate::interfaces::api::handlers::folder_handler::FolderHandler;
use crate::interfaces::api::handlers::{
    batch_handler, preferences_handler, share_handler, storage_handler,
};
use crate::interfaces::middleware::auth::auth_middleware;

/// Creates API routes for the application
///
/// Everything requires a bearer token except `/shared/*`, which is
/// reachable by anyone holding a share token.
pub fn create_api_routes(state: AppState) -> Router<AppState> {
    let max_upload = state.config.server.max_upload_bytes;

    let files_router = Router::new()
        .route("/", get(FileHandler::list_files))
        .route("/trash", get(FileHandler::list_trash))
        .route("/favorites", get(FileHandler::list_favorites))
        .route(
            "/upload",
            post(FileHandler::upload_file).layer(DefaultBodyLimit::max(max_upload)),
        )
        .route("/download/{id}", get(FileHandler::download_file))
        .route("/{id}", delete(FileHandler::delete_file))
        .route("/rename", post(FileHandler::rename))
        .route("/favorite", post(FileHandler::set_favorite))
        .route("/move", post(batch_handler::move_items))
        .route("/bulk-delete", post(batch_handler::trash_items))
        .route("/restore", post(batch_handler::restore_items))
        .route("/permanent-delete", post(batch_handler::delete_permanently));

    let folders_router = Router::new()
        .route("/", post(FolderHandler::create_folder))
        .route("/{id}/breadcrumbs", get(FolderHandler::breadcrumbs));

    let share_router = Router::new()
        .route("/", post(share_handler::create_share))
        .route("/file/{file_id}", get(share_handler::get_file_share))
        .route("/{id}", delete(share_handler::revoke_share));

    let protected = Router::new()
        .nest("/files", files_router)
        .nest("/folders", folders_router)
        .nest("/share", share_router)
        .route("/storage", get(storage_handler::get_storage_usage))
        .route(
            "/preferences",
            get(preferences_handler::get_preferences).post(preferences_handler::update_preferences),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    let public = Router::new()
        .route("/shared/{token}", get(share_handler::get_shared_file))
        .route("/shared/download/{token}", get(share_handler::download_shared_file));

    protected.merge(public)
}

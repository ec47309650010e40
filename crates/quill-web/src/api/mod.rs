mod auth_handlers;
mod content;
mod status;
mod upload;

use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;

use crate::auth::middleware::require_auth;
use crate::state::AppState;

/// Routes reachable without a session, mounted under `/api`.
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(auth_handlers::login))
        .route("/auth/vcode", get(auth_handlers::vcode))
        .route("/auth/logout", post(auth_handlers::logout))
        .route("/global/get", get(content::global_get))
}

/// Admin routes, mounted under `/adm`. Every route requires a session token.
pub fn admin_router(state: AppState) -> Router<AppState> {
    let upload_limit = state.config.upload.max_size_mb * 1024 * 1024 + 64 * 1024;

    let uploads = Router::new()
        .route("/upload/file", post(upload::upload_file))
        .route("/upload/image", post(upload::upload_image))
        .layer(DefaultBodyLimit::max(upload_limit));

    Router::new()
        .route("/auth/get", get(auth_handlers::auth_get))
        .route("/auth/edit", post(auth_handlers::auth_edit))
        .route("/auth/passwd", post(auth_handlers::auth_passwd))
        .route("/status/goinfo", get(status::runtime_info))
        .route("/status/appinfo", get(status::app_info))
        .route("/global/edit", post(content::global_edit))
        .route("/dict/all", get(content::dict_all))
        .route("/dict/add", post(content::dict_add))
        .route("/dict/edit", post(content::dict_edit))
        .route("/dict/drop", post(content::dict_drop))
        .route("/cate/all", get(content::cate_all))
        .route("/cate/add", post(content::cate_add))
        .route("/cate/edit", post(content::cate_edit))
        .route("/cate/drop", post(content::cate_drop))
        .route("/tag/all", get(content::tag_all))
        .route("/tag/add", post(content::tag_add))
        .route("/tag/edit", post(content::tag_edit))
        .route("/tag/drop", post(content::tag_drop))
        .route("/post/all", get(content::post_all))
        .route("/post/add", post(content::post_add))
        .route("/post/edit", post(content::post_edit))
        .route("/post/drop", post(content::post_drop))
        .route("/page/all", get(content::page_all))
        .route("/page/add", post(content::page_add))
        .route("/page/edit", post(content::page_edit))
        .route("/page/drop", post(content::page_drop))
        .merge(uploads)
        .route_layer(from_fn_with_state(state, require_auth))
}

/// The full application router without the outer tower layers.
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api", public_router())
        .nest("/adm", admin_router(state.clone()))
        .with_state(state)
}

#[cfg(test)]
mod tests;

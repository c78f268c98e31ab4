// ============================
// polifinder-backend-lib/src/router.rs
// ============================
//! Route table and the layers wrapped around it.
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::backend::ATTACHMENTS_DIR;
use crate::config::BackendSettings;
use crate::handlers::{self, auth, moderation, posts, user};
use crate::middleware::global_rate_limit;
use crate::AppState;

/// Room for multipart boundaries and headers on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Mount point for a path-only base URL such as `/files`
fn local_mount(public_base_url: &str) -> Option<&str> {
    let mount = public_base_url.trim_end_matches('/');
    (mount.starts_with('/') && mount.len() > 1).then_some(mount)
}

/// Create the HTTP router
pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit = state
        .settings
        .upload
        .max_bytes
        .saturating_add(MULTIPART_OVERHEAD);

    let mut router = Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/profile", get(auth::profile))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/reset-password", post(auth::reset_password))
        .route("/auth/update-password", post(auth::update_password))
        .route(
            "/user/profile",
            get(user::get_profile).patch(user::update_profile),
        )
        .route("/user/delete", delete(user::delete_account))
        .route("/posts/attachments", post(posts::upload_attachment))
        .route("/moderation/check", post(moderation::check))
        .fallback(handlers::route_not_found)
        .method_not_allowed_fallback(handlers::method_not_allowed);

    // Locally stored attachments are served straight from disk, unless the
    // public URL points somewhere else entirely.
    if matches!(state.settings.backend, BackendSettings::Memory { .. }) {
        if let Some(mount) = local_mount(&state.settings.upload.public_base_url) {
            let dir = state.settings.data_dir.join(ATTACHMENTS_DIR);
            router = router.nest_service(mount, ServeDir::new(dir));
        }
    }

    router
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn_with_state(state.clone(), global_rate_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

pub mod auth;
pub mod health;
pub mod items;
pub mod media;
pub mod portfolio;
pub mod sections;


use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;

use crate::state::AppState;

/// Assemble the full router with all route groups.
pub fn build_router(state: AppState) -> Router {
    let media_dir = ServeDir::new(&state.config().media_dir);
    let body_limit = state.config().body_limit();

    Router::new()
        .merge(health::routes())
        .merge(portfolio::routes())
        .merge(auth::routes())
        .merge(sections::routes())
        .merge(items::routes())
        .merge(media::routes())
        .nest_service("/media", media_dir)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .with_state(state)
}

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use crate::state::AppState;
use super::handlers::{dispatch, health};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/", get(dispatch))
        .route("/{*target}", get(dispatch))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

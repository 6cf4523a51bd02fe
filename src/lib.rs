//! # Project Portal Library
//!
//! Exposes the Axum router and modules so integration tests can create
//! an in-process server without requiring `cargo run` in another terminal.

pub mod availability;
pub mod config;
pub mod error;
pub mod menu;
pub mod models;
pub mod push;
pub mod routes;
pub mod session;
pub mod state;
pub mod store;
pub mod timestamp;

use axum::{Extension, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the Axum router with all route modules and middleware.
///
/// The caller is responsible for providing connected backends in `state`.
/// This function does NOT start a server.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(routes::forms::router())
        .merge(routes::projects::router())
        .merge(routes::tasks::router())
        .merge(routes::teachers::router())
        .merge(routes::users::router())
        .merge(routes::notify::router())
        .merge(routes::availability::router())
        .merge(routes::session::router())
        .merge(routes::views::router())
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

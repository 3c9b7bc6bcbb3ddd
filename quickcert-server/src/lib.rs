//! HTTP server for QuickCert.
//!
//! Client routes:
//! - `POST /api/apply/cert`
//! - `POST /api/apply/temp-permit`
//!
//! Admin routes (IP allowlist, runtime code, admin token):
//! - `POST /api/sn/create`, `POST /api/sn/generate`, `POST /api/sn/update`
//! - `GET /api/sn/get-available`, `GET /api/sn/get-all`

pub mod api;
pub mod auth;
pub mod config;
pub mod middleware;
pub mod startup;
mod state;

pub use config::{Config, ConfigError, ConfigResult, DEFAULT_CONFIG_PATH};
pub use state::AppState;

use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Build the HTTP API router with the given state.
pub fn build_router(state: AppState) -> Router {
    let client = Router::new()
        .route("/api/apply/cert", post(api::apply::apply_certificate))
        .route("/api/apply/temp-permit", post(api::apply::apply_temporary_permit))
        .route_layer(from_fn_with_state(state.clone(), middleware::client_auth));

    let admin = Router::new()
        .route("/api/sn/create", post(api::sn::create))
        .route("/api/sn/generate", post(api::sn::generate))
        .route("/api/sn/update", post(api::sn::update_note))
        .route("/api/sn/get-available", get(api::sn::get_available))
        .route("/api/sn/get-all", get(api::sn::get_all))
        .route_layer(from_fn_with_state(state.clone(), middleware::admin_auth));

    Router::new()
        .merge(client)
        .merge(admin)
        .layer(from_fn(middleware::access_log))
        .with_state(state)
}

/// Serves `state` on `listener` until `shutdown` resolves.
///
/// Peer addresses are attached to every request for the admin IP check.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(state);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown)
        .await
}

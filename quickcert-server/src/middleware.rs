//! Request middleware: access log and route guards.

use crate::api::ApiError;
use crate::auth::{ACCESS_TOKEN_HEADER, RUNTIME_CODE_HEADER};
use crate::state::AppState;
use axum::extract::{ConnectInfo, MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::net::SocketAddr;
use std::time::Instant;
use tracing::{info, warn};

fn header<'a>(req: &'a Request, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

fn peer(req: &Request) -> Option<SocketAddr> {
    req.extensions().get::<ConnectInfo<SocketAddr>>().map(|c| c.0)
}

/// Logs one line per completed request.
pub async fn access_log(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());
    let client = peer(&req).map_or_else(|| "-".to_string(), |addr| addr.ip().to_string());

    let response = next.run(req).await;

    info!(
        %method,
        %path,
        status = response.status().as_u16(),
        latency_ms = start.elapsed().as_millis() as u64,
        %client,
        "request"
    );
    response
}

/// Guards the client routes with the client token list.
pub async fn client_auth(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if !state.policy.client_allowed(header(&req, ACCESS_TOKEN_HEADER)) {
        return ApiError::unauthorized().into_response();
    }
    next.run(req).await
}

/// Guards the admin routes: IP allowlist, then runtime code, then admin token.
pub async fn admin_auth(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let Some(addr) = peer(&req) else {
        warn!("Admin request without peer address");
        return ApiError::internal().into_response();
    };
    let client = addr.ip();

    if !state.policy.ip_allowed(client) {
        warn!(%client, "Admin request from disallowed address");
        return ApiError::unauthorized().into_response();
    }

    if !state.policy.runtime_code_ok(header(&req, RUNTIME_CODE_HEADER)) {
        info!(%client, "Runtime code rejected");
        return ApiError::unauthorized().into_response();
    }

    match state.policy.admin_name(header(&req, ACCESS_TOKEN_HEADER)) {
        Some(admin) => {
            info!(%client, admin, "Admin authenticated");
            next.run(req).await
        }
        None => {
            warn!(%client, "Illegal access detected");
            ApiError::unauthorized().into_response()
        }
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP surface for operators: probes, hub metrics, tenant-scoped server API.

pub mod auth;
pub mod http;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::HubState;

/// Build the axum `Router` with all towerhub routes.
pub fn build_router(state: Arc<HubState>) -> Router {
    Router::new()
        // Probes and hub metrics (no auth)
        .route("/health", get(http::health))
        .route("/ready", get(http::ready))
        .route("/live", get(http::live))
        .route("/metrics", get(http::hub_metrics))
        // Server registry
        .route(
            "/api/v1/tenants/{tenant}/servers",
            get(http::list_servers).post(http::add_server),
        )
        .route("/api/v1/tenants/{tenant}/current", get(http::current_server))
        .route("/api/v1/tenants/{tenant}/switch", post(http::switch_server))
        // Agent operations on the current server
        .route("/api/v1/tenants/{tenant}/update", post(http::trigger_update))
        .route("/api/v1/tenants/{tenant}/jobs", get(http::list_jobs))
        .route("/api/v1/tenants/{tenant}/jobs/{job}", get(http::get_job))
        .route("/api/v1/tenants/{tenant}/metrics", get(http::agent_metrics))
        .route("/api/v1/tenants/{tenant}/status", get(http::agent_status))
        // Middleware
        .layer(middleware::from_fn_with_state(state.clone(), auth::auth_layer))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP handlers for the hub.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::servers::{normalize_url, ServerSummary, TenantId};
use crate::state::HubState;
use crate::telemetry::ServiceState;

/// Jobs returned when the caller does not ask for a count.
const DEFAULT_JOB_LIMIT: u32 = 10;

// -- Request/Response types ---------------------------------------------------

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub bot_status: ServiceState,
}

#[derive(Debug, Serialize)]
pub struct ServerListResponse {
    pub servers: Vec<ServerSummary>,
}

#[derive(Debug, Deserialize)]
pub struct AddServerRequest {
    pub nickname: String,
    pub url: String,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct AddServerResponse {
    pub nickname: String,
    pub url: String,
}

/// Current server as shown to operators. Never carries the token.
#[derive(Debug, Serialize)]
pub struct CurrentServerResponse {
    pub nickname: String,
    pub url: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct SwitchRequest {
    pub nickname: String,
}

#[derive(Debug, Serialize)]
pub struct SwitchResponse {
    pub current: String,
}

#[derive(Debug, Deserialize)]
pub struct JobsQuery {
    #[serde(default)]
    pub limit: Option<u32>,
}

// -- Probes -------------------------------------------------------------------

/// `GET /health`
pub async fn health(State(s): State<Arc<HubState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: s.telemetry.overall_status().to_owned(),
        version: env!("CARGO_PKG_VERSION").to_owned(),
        uptime_secs: s.telemetry.uptime().as_secs(),
        bot_status: s.telemetry.state(),
    })
}

/// `GET /ready`
pub async fn ready() -> &'static str {
    "OK"
}

/// `GET /live`
pub async fn live() -> &'static str {
    "ALIVE"
}

/// `GET /metrics` (Prometheus text for the hub itself)
pub async fn hub_metrics(State(s): State<Arc<HubState>>) -> impl IntoResponse {
    (
        [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        s.telemetry.render_prometheus(),
    )
}

// -- Server registry ----------------------------------------------------------

/// `GET /api/v1/tenants/{tenant}/servers`
pub async fn list_servers(
    State(s): State<Arc<HubState>>,
    Path(tenant): Path<TenantId>,
) -> impl IntoResponse {
    match s.manager.server_summaries(tenant).await {
        Ok(servers) => Json(ServerListResponse { servers }).into_response(),
        Err(e) => e.to_http_response().into_response(),
    }
}

/// `POST /api/v1/tenants/{tenant}/servers`
pub async fn add_server(
    State(s): State<Arc<HubState>>,
    Path(tenant): Path<TenantId>,
    Json(req): Json<AddServerRequest>,
) -> impl IntoResponse {
    if let Err(e) = s.manager.add_server(tenant, &req.nickname, &req.url, &req.token).await {
        return e.to_http_response().into_response();
    }
    // Already validated by the manager.
    let url = normalize_url(&req.url).unwrap_or(req.url);
    (StatusCode::CREATED, Json(AddServerResponse { nickname: req.nickname, url })).into_response()
}

/// `GET /api/v1/tenants/{tenant}/current`
pub async fn current_server(
    State(s): State<Arc<HubState>>,
    Path(tenant): Path<TenantId>,
) -> impl IntoResponse {
    match s.manager.get_current_server(tenant).await {
        Ok(record) => Json(CurrentServerResponse {
            nickname: record.nickname,
            url: record.url,
            created_at: record.created_at,
            is_active: record.is_active,
        })
        .into_response(),
        Err(e) => e.to_http_response().into_response(),
    }
}

/// `POST /api/v1/tenants/{tenant}/switch`
pub async fn switch_server(
    State(s): State<Arc<HubState>>,
    Path(tenant): Path<TenantId>,
    Json(req): Json<SwitchRequest>,
) -> impl IntoResponse {
    match s.manager.switch_server(tenant, &req.nickname).await {
        Ok(()) => Json(SwitchResponse { current: req.nickname }).into_response(),
        Err(e) => e.to_http_response().into_response(),
    }
}

// -- Agent operations ---------------------------------------------------------

/// `POST /api/v1/tenants/{tenant}/update`
pub async fn trigger_update(
    State(s): State<Arc<HubState>>,
    Path(tenant): Path<TenantId>,
) -> impl IntoResponse {
    let client = match s.manager.build_client(tenant).await {
        Ok(c) => c,
        Err(e) => return e.to_http_response().into_response(),
    };
    match client.trigger_update().await {
        Ok(outcome) => {
            s.telemetry.record_update_triggered();
            tracing::info!(
                tenant,
                server = %client.server().nickname,
                updated = outcome.updated.len(),
                failed = outcome.failed.len(),
                optimistic = outcome.is_optimistic(),
                "update triggered"
            );
            Json(outcome).into_response()
        }
        Err(e) => e.to_http_response().into_response(),
    }
}

/// `GET /api/v1/tenants/{tenant}/jobs?limit=N`
pub async fn list_jobs(
    State(s): State<Arc<HubState>>,
    Path(tenant): Path<TenantId>,
    Query(q): Query<JobsQuery>,
) -> impl IntoResponse {
    let client = match s.manager.build_client(tenant).await {
        Ok(c) => c,
        Err(e) => return e.to_http_response().into_response(),
    };
    match client.get_update_jobs(q.limit.unwrap_or(DEFAULT_JOB_LIMIT)).await {
        Ok(jobs) => Json(jobs).into_response(),
        Err(e) => e.to_http_response().into_response(),
    }
}

/// `GET /api/v1/tenants/{tenant}/jobs/{job}`
pub async fn get_job(
    State(s): State<Arc<HubState>>,
    Path((tenant, job)): Path<(TenantId, String)>,
) -> impl IntoResponse {
    let client = match s.manager.build_client(tenant).await {
        Ok(c) => c,
        Err(e) => return e.to_http_response().into_response(),
    };
    match client.get_update_job(&job).await {
        Ok(job) => Json(job).into_response(),
        Err(e) => e.to_http_response().into_response(),
    }
}

/// `GET /api/v1/tenants/{tenant}/metrics`
pub async fn agent_metrics(
    State(s): State<Arc<HubState>>,
    Path(tenant): Path<TenantId>,
) -> impl IntoResponse {
    let client = match s.manager.build_client(tenant).await {
        Ok(c) => c,
        Err(e) => return e.to_http_response().into_response(),
    };
    match client.get_metrics().await {
        Ok(metrics) => Json(metrics).into_response(),
        Err(e) => e.to_http_response().into_response(),
    }
}

/// `GET /api/v1/tenants/{tenant}/status`
pub async fn agent_status(
    State(s): State<Arc<HubState>>,
    Path(tenant): Path<TenantId>,
) -> impl IntoResponse {
    let client = match s.manager.build_client(tenant).await {
        Ok(c) => c,
        Err(e) => return e.to_http_response().into_response(),
    };
    match client.get_status().await {
        Ok(status) => Json(status).into_response(),
        Err(e) => e.to_http_response().into_response(),
    }
}

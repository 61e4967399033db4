// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use axum::extract::{Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use time::OffsetDateTime;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use super::*;

/// Serve `router` on a random local port and return its base URL.
async fn stub_agent(router: Router) -> anyhow::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(format!("http://{addr}"))
}

fn client_for(base_url: String) -> AgentClient {
    let server = ServerRecord {
        nickname: "stub".to_owned(),
        url: base_url,
        token: "tok1".to_owned(),
        created_at: OffsetDateTime::now_utc(),
        is_active: true,
    };
    AgentClient::new(server, http_client(), ClientTimeouts::default())
}

/// Agent whose update endpoint always answers `status` with `body`.
async fn update_stub(status: u16, body: &'static str) -> anyhow::Result<AgentClient> {
    let status = StatusCode::from_u16(status)?;
    let router = Router::new().route("/v1/update", post(move || async move { (status, body) }));
    Ok(client_for(stub_agent(router).await?))
}

// -- Update trigger policy ----------------------------------------------------

#[yare::parameterized(
    ok_empty = { 200, Some(b"".as_slice()), UpdateDisposition::Completed },
    ok_unread = { 200, None, UpdateDisposition::Completed },
    ok_garbage = { 200, Some(b"<html>".as_slice()), UpdateDisposition::Completed },
    no_content = { 204, None, UpdateDisposition::Completed },
    other_2xx = { 201, None, UpdateDisposition::Completed },
    gateway_timeout = { 504, None, UpdateDisposition::Background },
)]
fn empty_success(status: u16, body: Option<&[u8]>, disposition: UpdateDisposition) -> anyhow::Result<()> {
    let outcome = interpret_update(status, body)?;
    assert!(outcome.updated.is_empty());
    assert!(outcome.failed.is_empty());
    assert_eq!(outcome.disposition, disposition);
    assert!(!outcome.message.is_empty());
    Ok(())
}

#[test]
fn accepted_carries_marker() -> anyhow::Result<()> {
    let outcome = interpret_update(202, None)?;
    assert_eq!(outcome.disposition, UpdateDisposition::Accepted);
    assert_eq!(outcome.updated, ["Update accepted and processing"]);
    assert!(outcome.failed.is_empty());
    Ok(())
}

#[test]
fn ok_body_is_decoded() -> anyhow::Result<()> {
    let outcome = interpret_update(200, Some(br#"{"updated":["nginx"],"failed":["redis"]}"#))?;
    assert_eq!(outcome.updated, ["nginx"]);
    assert_eq!(outcome.failed, ["redis"]);
    assert_eq!(outcome.disposition, UpdateDisposition::Completed);
    Ok(())
}

#[yare::parameterized(
    failed_null = { br#"{"updated":["nginx"],"failed":null}"#, &["nginx"], &[] },
    updated_null = { br#"{"updated":null,"failed":["redis"]}"#, &[], &["redis"] },
    both_null = { br#"{"updated":null,"failed":null}"#, &[], &[] },
    failed_missing = { br#"{"updated":["nginx"]}"#, &["nginx"], &[] },
)]
fn ok_body_with_nil_lists(body: &[u8], updated: &[&str], failed: &[&str]) -> anyhow::Result<()> {
    let outcome = interpret_update(200, Some(body))?;
    assert_eq!(outcome.updated, updated);
    assert_eq!(outcome.failed, failed);
    assert_eq!(outcome.disposition, UpdateDisposition::Completed);
    assert!(outcome.message.is_empty());
    Ok(())
}

#[yare::parameterized(
    bad_gateway = { 502, "SERVICE_UNAVAILABLE" },
    unavailable = { 503, "SERVICE_UNAVAILABLE" },
    unauthorized = { 401, "AUTHENTICATION" },
    not_found = { 404, "UNEXPECTED_STATUS" },
    server_error = { 500, "UNEXPECTED_STATUS" },
    redirect = { 302, "UNEXPECTED_STATUS" },
)]
fn hard_failures(status: u16, code: &str) {
    let err = interpret_update(status, None).err();
    assert_eq!(err.map(|e| e.code()), Some(code));
}

#[tokio::test]
async fn trigger_ok_with_empty_body() -> anyhow::Result<()> {
    let client = update_stub(200, "").await?;
    let outcome = client.trigger_update().await?;
    assert!(outcome.updated.is_empty());
    assert!(outcome.failed.is_empty());
    assert!(!outcome.is_optimistic());
    Ok(())
}

#[tokio::test]
async fn trigger_ok_with_lists() -> anyhow::Result<()> {
    let client = update_stub(200, r#"{"updated":["web","db"],"failed":[]}"#).await?;
    let outcome = client.trigger_update().await?;
    assert_eq!(outcome.updated, ["web", "db"]);
    Ok(())
}

#[tokio::test]
async fn trigger_bad_gateway_is_hard_error() -> anyhow::Result<()> {
    let client = update_stub(502, "bad gateway").await?;
    let result = client.trigger_update().await;
    assert!(matches!(result, Err(HubError::ServiceUnavailable { status: 502 })));
    Ok(())
}

#[tokio::test]
async fn trigger_gateway_timeout_is_optimistic() -> anyhow::Result<()> {
    let client = update_stub(504, "").await?;
    let outcome = client.trigger_update().await?;
    assert!(outcome.is_optimistic());
    Ok(())
}

#[tokio::test]
async fn trigger_unauthorized() -> anyhow::Result<()> {
    let client = update_stub(401, "").await?;
    assert!(matches!(client.trigger_update().await, Err(HubError::Authentication)));
    Ok(())
}

#[tokio::test]
async fn trigger_timeout_is_optimistic_success() -> anyhow::Result<()> {
    let router = Router::new().route(
        "/v1/update",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            StatusCode::OK
        }),
    );
    let client = client_for(stub_agent(router).await?);

    let outcome = client.trigger_update_with_timeout(Duration::from_millis(200)).await?;
    assert!(outcome.is_optimistic());
    assert!(outcome.updated.is_empty());
    assert!(outcome.failed.is_empty());
    assert!(outcome.message.contains("background"));
    Ok(())
}

#[tokio::test]
async fn trigger_connection_refused_is_transport_error() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let client = client_for(format!("http://{addr}"));
    assert!(matches!(client.trigger_update().await, Err(HubError::Transport(_))));
    Ok(())
}

#[tokio::test]
async fn every_call_sends_bearer_and_client_id() -> anyhow::Result<()> {
    let seen: Arc<Mutex<Vec<(String, String)>>> = Arc::new(Mutex::new(Vec::new()));
    let record = {
        let seen = Arc::clone(&seen);
        move |headers: HeaderMap| {
            let seen = Arc::clone(&seen);
            async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_owned();
                let agent = headers
                    .get("user-agent")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_owned();
                seen.lock().await.push((auth, agent));
                (StatusCode::OK, r#"{"result":[]}"#)
            }
        }
    };
    let router = Router::new()
        .route("/v1/update", post(record.clone()).get(record.clone()))
        .route("/v1/metrics", get(record));
    let client = client_for(stub_agent(router).await?);

    client.trigger_update().await?;
    client.get_update_jobs(5).await?;
    client.get_metrics().await?;

    let seen = seen.lock().await;
    assert_eq!(seen.len(), 3);
    for (auth, agent) in seen.iter() {
        assert_eq!(auth, "Bearer tok1");
        assert_eq!(agent, USER_AGENT);
    }
    Ok(())
}

// -- Job history --------------------------------------------------------------

const JOBS_BODY: &str = r#"{"result": [
    {"id": "j2", "state": "running", "started": "2025-06-01T10:05:00Z",
     "ended": "0001-01-01T00:00:00Z", "results": []},
    {"id": "j1", "state": "completed", "started": "2025-06-01T10:00:00Z",
     "ended": "2025-06-01T10:01:00Z",
     "results": [{"container": "nginx", "status": "updated"}]}
]}"#;

#[tokio::test]
async fn jobs_are_decoded_and_limit_forwarded() -> anyhow::Result<()> {
    let limits: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let router = {
        let limits = Arc::clone(&limits);
        Router::new().route(
            "/v1/update",
            get(move |Query(q): Query<HashMap<String, String>>| {
                let limits = Arc::clone(&limits);
                async move {
                    limits.lock().await.push(q.get("limit").cloned().unwrap_or_default());
                    (StatusCode::OK, JOBS_BODY)
                }
            }),
        )
    };
    let client = client_for(stub_agent(router).await?);

    let jobs = client.get_update_jobs(7).await?;
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].id, "j2");
    assert!(!jobs[0].is_finished());
    assert!(jobs[1].is_finished());
    assert_eq!(jobs[1].results[0].container, "nginx");
    assert_eq!(*limits.lock().await, ["7"]);
    Ok(())
}

#[tokio::test]
async fn single_job_by_id() -> anyhow::Result<()> {
    let router = Router::new().route(
        "/v1/update/{id}",
        get(|Path(id): Path<String>| async move {
            (StatusCode::OK, format!(r#"{{"id": "{id}", "state": "failed"}}"#))
        }),
    );
    let client = client_for(stub_agent(router).await?);

    let job = client.get_update_job("abc-123").await?;
    assert_eq!(job.id, "abc-123");
    assert_eq!(job.state, crate::agent::JobState::Failed);
    Ok(())
}

#[tokio::test]
async fn job_id_with_path_characters_is_rejected() -> anyhow::Result<()> {
    let client = client_for("http://127.0.0.1:9".to_owned());
    assert!(matches!(client.get_update_job("../metrics").await, Err(HubError::InvalidInput(_))));
    assert!(matches!(client.get_update_job("").await, Err(HubError::InvalidInput(_))));
    Ok(())
}

#[tokio::test]
async fn jobs_error_status_is_not_optimistic() -> anyhow::Result<()> {
    let router = Router::new()
        .route("/v1/update", get(|| async { (StatusCode::GATEWAY_TIMEOUT, "") }));
    let client = client_for(stub_agent(router).await?);
    assert!(matches!(
        client.get_update_jobs(10).await,
        Err(HubError::UnexpectedStatus { status: 504 })
    ));
    Ok(())
}

#[tokio::test]
async fn jobs_with_null_results_decode_as_empty() -> anyhow::Result<()> {
    let router = Router::new().route(
        "/v1/update",
        get(|| async {
            (
                StatusCode::OK,
                r#"{"result":[{"id":"j1","state":"running","started":"2025-06-01T10:00:00Z","ended":"0001-01-01T00:00:00Z","results":null}]}"#,
            )
        }),
    );
    let client = client_for(stub_agent(router).await?);

    let jobs = client.get_update_jobs(10).await?;
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].id, "j1");
    assert!(jobs[0].results.is_empty());
    assert!(!jobs[0].is_finished());
    Ok(())
}

#[tokio::test]
async fn null_job_history_is_empty() -> anyhow::Result<()> {
    let router =
        Router::new().route("/v1/update", get(|| async { (StatusCode::OK, r#"{"result":null}"#) }));
    let client = client_for(stub_agent(router).await?);
    assert!(client.get_update_jobs(10).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn single_job_with_null_results() -> anyhow::Result<()> {
    let router = Router::new().route(
        "/v1/update/{id}",
        get(|| async { (StatusCode::OK, r#"{"id":"j2","state":"completed","results":null}"#) }),
    );
    let client = client_for(stub_agent(router).await?);

    let job = client.get_update_job("j2").await?;
    assert!(job.state.is_success());
    assert!(job.results.is_empty());
    Ok(())
}

#[tokio::test]
async fn jobs_undecodable_body_is_surfaced() -> anyhow::Result<()> {
    let router =
        Router::new().route("/v1/update", get(|| async { (StatusCode::OK, "not json") }));
    let client = client_for(stub_agent(router).await?);
    assert!(matches!(client.get_update_jobs(10).await, Err(HubError::InvalidResponse(_))));
    Ok(())
}

// -- Metrics, status, connection ----------------------------------------------

#[tokio::test]
async fn metrics_are_parsed() -> anyhow::Result<()> {
    let router = Router::new().route(
        "/v1/metrics",
        get(|| async {
            "# HELP watchtower_scans_total Scans\n# TYPE watchtower_scans_total counter\nwatchtower_scans_total 9\nwatchtower_containers_failed 1\nbroken\n"
        }),
    );
    let client = client_for(stub_agent(router).await?);

    let metrics = client.get_metrics().await?;
    assert_eq!(metrics.len(), 2);
    assert_eq!(metrics["watchtower_scans_total"], "9");
    assert_eq!(metrics["watchtower_containers_failed"], "1");
    Ok(())
}

#[tokio::test]
async fn metrics_unauthorized() -> anyhow::Result<()> {
    let router =
        Router::new().route("/v1/metrics", get(|| async { StatusCode::UNAUTHORIZED }));
    let client = client_for(stub_agent(router).await?);
    assert!(matches!(client.get_metrics().await, Err(HubError::Authentication)));
    Ok(())
}

#[tokio::test]
async fn status_is_static() -> anyhow::Result<()> {
    let client = client_for("http://127.0.0.1:9".to_owned());
    let status = client.get_status().await?;
    assert_eq!(status.version, "1.7.1");
    assert_eq!(status.status, "running");
    Ok(())
}

#[tokio::test]
async fn connection_test_tolerates_client_errors() -> anyhow::Result<()> {
    let router = Router::new().route("/v1/update", get(|| async { StatusCode::NOT_FOUND }));
    let client = client_for(stub_agent(router).await?);
    client.test_connection().await?;
    Ok(())
}

#[tokio::test]
async fn connection_test_fails_on_server_error() -> anyhow::Result<()> {
    let router =
        Router::new().route("/v1/update", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }));
    let client = client_for(stub_agent(router).await?);
    assert!(matches!(
        client.test_connection().await,
        Err(HubError::UnexpectedStatus { status: 500 })
    ));
    Ok(())
}

#[tokio::test]
async fn debug_output_omits_token() {
    let client = client_for("http://127.0.0.1:9".to_owned());
    let shown = format!("{client:?}");
    assert!(!shown.contains("tok1"));
    assert!(shown.contains("stub"));
}

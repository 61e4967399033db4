// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for one update-agent instance.
//!
//! The agent is inconsistent about how it reports a triggered update: it may
//! answer 200 with no body, 202, 204, 504, or simply not answer before the
//! deadline while the update keeps running. [`AgentClient::trigger_update`]
//! folds all of that into [`UpdateOutcome`] and only errors on answers that
//! really mean failure.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};

use crate::agent::metrics::parse_exposition;
use crate::agent::{
    ensure_crypto_provider, AgentStatus, JobList, UpdateDisposition, UpdateJob, UpdateOutcome,
};
use crate::error::HubError;
use crate::servers::ServerRecord;

/// Client identifier sent with every request.
pub const USER_AGENT: &str = concat!("towerhub/", env!("CARGO_PKG_VERSION"));

/// Version reported by the status stub.
const STUB_AGENT_VERSION: &str = "1.7.1";

/// Per-call deadlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientTimeouts {
    /// History, metrics, and connection checks.
    pub request: Duration,
    /// Triggering an update, which runs for as long as the pulls take.
    pub update: Duration,
}

impl Default for ClientTimeouts {
    fn default() -> Self {
        Self { request: Duration::from_secs(60), update: Duration::from_secs(300) }
    }
}

/// Build the shared HTTP client. Connections are pooled and certificates are
/// always verified.
pub fn http_client() -> Client {
    ensure_crypto_provider();
    Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(30))
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(30))
        .build()
        .unwrap_or_default()
}

/// HTTP client bound to one server record.
///
/// Holds the plaintext token for the lifetime of the client only.
pub struct AgentClient {
    server: ServerRecord,
    timeouts: ClientTimeouts,
    http: Client,
}

impl AgentClient {
    pub fn new(server: ServerRecord, http: Client, timeouts: ClientTimeouts) -> Self {
        Self { server, timeouts, http }
    }

    pub fn server(&self) -> &ServerRecord {
        &self.server
    }

    pub fn base_url(&self) -> &str {
        &self.server.url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.server.url, path)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        req.bearer_auth(&self.server.token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
    }

    async fn get(&self, path: &str) -> Result<Response, HubError> {
        let req = self.http.get(self.url(path)).timeout(self.timeouts.request);
        let resp = self.authorized(req).send().await?;
        match resp.status().as_u16() {
            200 => Ok(resp),
            401 => Err(HubError::Authentication),
            status => Err(HubError::UnexpectedStatus { status }),
        }
    }

    /// Trigger an update with the configured update timeout.
    pub async fn trigger_update(&self) -> Result<UpdateOutcome, HubError> {
        self.trigger_update_with_timeout(self.timeouts.update).await
    }

    /// Trigger an update, giving up on an answer after `timeout`.
    ///
    /// A deadline is reported as success: the agent keeps working after we
    /// stop waiting.
    pub async fn trigger_update_with_timeout(
        &self,
        timeout: Duration,
    ) -> Result<UpdateOutcome, HubError> {
        let req = self.http.post(self.url("/v1/update")).timeout(timeout);
        let resp = match self.authorized(req).send().await {
            Ok(resp) => resp,
            Err(e) if e.is_timeout() => {
                tracing::info!(server = %self.server.nickname, "update trigger timed out, assuming it runs in background");
                return Ok(UpdateOutcome::empty(
                    UpdateDisposition::Background,
                    "Update triggered successfully (processing in background)",
                ));
            }
            Err(e) => return Err(HubError::Transport(e)),
        };

        let status = resp.status().as_u16();
        let body = if status == 200 { resp.bytes().await.ok().map(|b| b.to_vec()) } else { None };
        let outcome = interpret_update(status, body.as_deref());
        match &outcome {
            Ok(o) => tracing::debug!(server = %self.server.nickname, status, disposition = ?o.disposition, "update triggered"),
            Err(e) => tracing::warn!(server = %self.server.nickname, status, err = %e, "update trigger rejected"),
        }
        outcome
    }

    /// Static status. The agent exposes no status endpoint, so this reports
    /// fixed placeholder values.
    pub async fn get_status(&self) -> Result<AgentStatus, HubError> {
        Ok(AgentStatus {
            version: STUB_AGENT_VERSION.to_owned(),
            status: "running".to_owned(),
            last_update: None,
            containers_count: 0,
        })
    }

    /// Check that the agent answers at all. Client errors (4xx) still count
    /// as reachable.
    pub async fn test_connection(&self) -> Result<(), HubError> {
        let req = self.http.get(self.url("/v1/update")).timeout(self.timeouts.request);
        let resp = self.authorized(req).send().await?;
        let status = resp.status().as_u16();
        if status >= 500 {
            return Err(HubError::UnexpectedStatus { status });
        }
        Ok(())
    }

    /// Recent update jobs, newest first as the agent orders them.
    pub async fn get_update_jobs(&self, limit: u32) -> Result<Vec<UpdateJob>, HubError> {
        let resp = self.get(&format!("/v1/update?limit={limit}")).await?;
        let bytes = resp.bytes().await?;
        let list: JobList = serde_json::from_slice(&bytes)
            .map_err(|e| HubError::InvalidResponse(e.to_string()))?;
        Ok(list.result)
    }

    /// A single update job by ID.
    pub async fn get_update_job(&self, id: &str) -> Result<UpdateJob, HubError> {
        if id.is_empty() || id.contains(['/', '?', '#']) {
            return Err(HubError::InvalidInput(format!("invalid job id {id:?}")));
        }
        let resp = self.get(&format!("/v1/update/{id}")).await?;
        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| HubError::InvalidResponse(e.to_string()))
    }

    /// Agent metrics as raw `name -> value` strings.
    pub async fn get_metrics(&self) -> Result<HashMap<String, String>, HubError> {
        let resp = self.get("/v1/metrics").await?;
        let body = resp.text().await?;
        Ok(parse_exposition(&body))
    }
}

impl std::fmt::Debug for AgentClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentClient")
            .field("server", &self.server.nickname)
            .field("url", &self.server.url)
            .field("timeouts", &self.timeouts)
            .finish_non_exhaustive()
    }
}

/// Map an update-trigger answer to an outcome.
///
/// `body` is the response body for a 200, or `None` when it was not read or
/// could not be read.
pub fn interpret_update(status: u16, body: Option<&[u8]>) -> Result<UpdateOutcome, HubError> {
    match status {
        200 => Ok(match body {
            None => UpdateOutcome::empty(
                UpdateDisposition::Completed,
                "Update triggered successfully (empty response)",
            ),
            Some([]) => {
                UpdateOutcome::empty(UpdateDisposition::Completed, "Update triggered successfully")
            }
            Some(bytes) => match serde_json::from_slice::<UpdateOutcome>(bytes) {
                Ok(outcome) => UpdateOutcome { disposition: UpdateDisposition::Completed, ..outcome },
                Err(_) => UpdateOutcome::empty(
                    UpdateDisposition::Completed,
                    "Update triggered successfully (invalid JSON response)",
                ),
            },
        }),
        202 => Ok(UpdateOutcome {
            updated: vec!["Update accepted and processing".to_owned()],
            failed: vec![],
            message: "Update queued and processing in background".to_owned(),
            disposition: UpdateDisposition::Accepted,
        }),
        204 => Ok(UpdateOutcome::empty(
            UpdateDisposition::Completed,
            "Update triggered successfully (no content)",
        )),
        502 | 503 => Err(HubError::ServiceUnavailable { status }),
        504 => Ok(UpdateOutcome::empty(
            UpdateDisposition::Background,
            "Update triggered (gateway timeout but likely processing)",
        )),
        401 => Err(HubError::Authentication),
        200..=299 => Ok(UpdateOutcome::empty(
            UpdateDisposition::Completed,
            format!("Update triggered successfully (status {status})"),
        )),
        _ => Err(HubError::UnexpectedStatus { status }),
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

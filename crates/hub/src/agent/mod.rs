// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Update-agent communication: HTTP client, response types, metrics parsing.

pub mod client;
pub mod metrics;

use std::sync::Once;

use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

static CRYPTO_PROVIDER: Once = Once::new();

/// Install the rustls crypto provider once per process (reqwest needs it).
pub fn ensure_crypto_provider() {
    CRYPTO_PROVIDER.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Decode a field the agent may send as `null` (a nil Go slice) as its default.
fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(d).map(Option::unwrap_or_default)
}

/// How an update trigger was resolved.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateDisposition {
    /// The agent answered with a success status.
    #[default]
    Completed,
    /// The agent queued the update (202).
    Accepted,
    /// No definite answer (timeout or 504); the update is assumed to be running.
    Background,
}

/// Result of triggering an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOutcome {
    #[serde(default, deserialize_with = "null_as_default")]
    pub updated: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub failed: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default)]
    pub disposition: UpdateDisposition,
}

impl UpdateOutcome {
    pub fn empty(disposition: UpdateDisposition, message: impl Into<String>) -> Self {
        Self { updated: vec![], failed: vec![], message: message.into(), disposition }
    }

    /// True when success was assumed rather than confirmed.
    pub fn is_optimistic(&self) -> bool {
        self.disposition == UpdateDisposition::Background
    }
}

/// Lifecycle state of an update job. Anything other than `running` or
/// `failed` counts as success; the raw value is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobState {
    Running,
    Failed,
    Succeeded(String),
}

impl JobState {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }
}

impl From<String> for JobState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "running" => Self::Running,
            "failed" => Self::Failed,
            _ => Self::Succeeded(s),
        }
    }
}

impl From<JobState> for String {
    fn from(state: JobState) -> Self {
        match state {
            JobState::Running => "running".to_owned(),
            JobState::Failed => "failed".to_owned(),
            JobState::Succeeded(s) => s,
        }
    }
}

/// Outcome for one container within a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerResult {
    pub container: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One entry of the agent's update history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateJob {
    pub id: String,
    pub state: JobState,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub started: Option<OffsetDateTime>,
    /// Absent or the zero time while the job is still running.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub ended: Option<OffsetDateTime>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<ContainerResult>,
}

impl UpdateJob {
    /// End time, or `None` while the job has not finished.
    pub fn finished_at(&self) -> Option<OffsetDateTime> {
        self.ended.filter(|t| *t > OffsetDateTime::UNIX_EPOCH)
    }

    pub fn is_finished(&self) -> bool {
        self.finished_at().is_some()
    }
}

/// Envelope for `GET /v1/update`.
#[derive(Debug, Deserialize)]
pub(crate) struct JobList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub result: Vec<UpdateJob>,
}

/// Agent status. The agent has no status endpoint; see
/// [`client::AgentClient::get_status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentStatus {
    pub version: String,
    pub status: String,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_update: Option<OffsetDateTime>,
    pub containers_count: usize,
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

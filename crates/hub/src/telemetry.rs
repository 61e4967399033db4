// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process telemetry: uptime, update counters, and health state.
//!
//! Created once at startup and shared by `Arc`; nothing here is global.

use std::fmt::Write as _;
use std::sync::atomic::{AtomicI64, AtomicU64, AtomicU8, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;
use time::OffsetDateTime;

/// Lifecycle of the process as reported by `/health`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    Initializing,
    Running,
    Failed,
}

impl ServiceState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Running,
            2 => Self::Failed,
            _ => Self::Initializing,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::Initializing => 0,
            Self::Running => 1,
            Self::Failed => 2,
        }
    }
}

/// Counters and timestamps for the hub itself (not for the agents).
pub struct Telemetry {
    started: Instant,
    updates_triggered: AtomicU64,
    /// Unix seconds of the last trigger, 0 if none yet.
    last_update: AtomicI64,
    state: AtomicU8,
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl Telemetry {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            updates_triggered: AtomicU64::new(0),
            last_update: AtomicI64::new(0),
            state: AtomicU8::new(ServiceState::Initializing.as_u8()),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn record_update_triggered(&self) {
        self.updates_triggered.fetch_add(1, Ordering::Relaxed);
        self.last_update.store(OffsetDateTime::now_utc().unix_timestamp(), Ordering::Relaxed);
    }

    pub fn updates_triggered(&self) -> u64 {
        self.updates_triggered.load(Ordering::Relaxed)
    }

    pub fn last_update_unix(&self) -> i64 {
        self.last_update.load(Ordering::Relaxed)
    }

    pub fn set_state(&self, state: ServiceState) {
        self.state.store(state.as_u8(), Ordering::Relaxed);
    }

    pub fn state(&self) -> ServiceState {
        ServiceState::from_u8(self.state.load(Ordering::Relaxed))
    }

    /// `healthy`, or `degraded` once the service is marked failed.
    pub fn overall_status(&self) -> &'static str {
        match self.state() {
            ServiceState::Failed => "degraded",
            _ => "healthy",
        }
    }

    /// Prometheus text exposition of the hub counters.
    pub fn render_prometheus(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# HELP towerhub_updates_total Total number of updates triggered");
        let _ = writeln!(out, "# TYPE towerhub_updates_total counter");
        let _ = writeln!(out, "towerhub_updates_total {}", self.updates_triggered());
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "# HELP towerhub_last_update_time_seconds Timestamp of last update"
        );
        let _ = writeln!(out, "# TYPE towerhub_last_update_time_seconds gauge");
        let _ = writeln!(out, "towerhub_last_update_time_seconds {}", self.last_update_unix());
        let _ = writeln!(out);
        let _ = writeln!(out, "# HELP towerhub_uptime_seconds Process uptime in seconds");
        let _ = writeln!(out, "# TYPE towerhub_uptime_seconds gauge");
        let _ = writeln!(out, "towerhub_uptime_seconds {}", self.uptime().as_secs());
        out
    }
}

#[cfg(test)]
#[path = "telemetry_tests.rs"]
mod tests;

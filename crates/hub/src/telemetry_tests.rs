// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::agent::metrics::parse_exposition;

#[test]
fn starts_initializing_and_healthy() {
    let telemetry = Telemetry::new();
    assert_eq!(telemetry.state(), ServiceState::Initializing);
    assert_eq!(telemetry.overall_status(), "healthy");
    assert_eq!(telemetry.updates_triggered(), 0);
    assert_eq!(telemetry.last_update_unix(), 0);
}

#[test]
fn failed_state_is_degraded() {
    let telemetry = Telemetry::new();
    telemetry.set_state(ServiceState::Running);
    assert_eq!(telemetry.overall_status(), "healthy");
    telemetry.set_state(ServiceState::Failed);
    assert_eq!(telemetry.state(), ServiceState::Failed);
    assert_eq!(telemetry.overall_status(), "degraded");
}

#[test]
fn records_updates() {
    let telemetry = Telemetry::new();
    telemetry.record_update_triggered();
    telemetry.record_update_triggered();
    assert_eq!(telemetry.updates_triggered(), 2);
    assert!(telemetry.last_update_unix() > 0);
}

#[test]
fn exposition_reads_back() {
    let telemetry = Telemetry::new();
    telemetry.record_update_triggered();

    let text = telemetry.render_prometheus();
    assert!(text.contains("# TYPE towerhub_updates_total counter"));

    let metrics = parse_exposition(&text);
    assert_eq!(metrics["towerhub_updates_total"], "1");
    assert_eq!(metrics.len(), 3);
    assert!(metrics.contains_key("towerhub_uptime_seconds"));
}

#[test]
fn instances_are_independent() {
    let a = Telemetry::new();
    let b = Telemetry::new();
    a.record_update_triggered();
    assert_eq!(b.updates_triggered(), 0);
}

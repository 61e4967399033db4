// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::HubConfig;
use crate::servers::manager::ServerManager;
use crate::telemetry::Telemetry;

/// Shared state handed to the HTTP layer.
pub struct HubState {
    pub manager: Arc<ServerManager>,
    pub telemetry: Arc<Telemetry>,
    pub config: HubConfig,
    pub shutdown: CancellationToken,
}

impl HubState {
    pub fn new(
        config: HubConfig,
        manager: Arc<ServerManager>,
        telemetry: Arc<Telemetry>,
        shutdown: CancellationToken,
    ) -> Self {
        Self { manager, telemetry, config, shutdown }
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Towerhub: multi-tenant credential store and client for update agents.

pub mod agent;
pub mod config;
pub mod error;
pub mod servers;
pub mod state;
pub mod telemetry;
pub mod transport;

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::agent::client::ClientTimeouts;
use crate::config::HubConfig;
use crate::servers::manager::ServerManager;
use crate::state::HubState;
use crate::telemetry::{ServiceState, Telemetry};
use crate::transport::build_router;

/// Run the hub until shutdown (Ctrl-C or cancellation).
pub async fn run(config: HubConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let shutdown = CancellationToken::new();
    let telemetry = Arc::new(Telemetry::new());

    if config.uses_default_key() {
        tracing::warn!("using the default encryption key; set TOWERHUB_ENCRYPTION_KEY");
    }

    let timeouts =
        ClientTimeouts { request: config.request_timeout(), update: config.update_timeout() };
    let manager = ServerManager::open(&config.encryption_key, config.data_file(), timeouts)
        .await
        .context("loading server snapshot")?;

    let state = Arc::new(HubState::new(
        config,
        Arc::new(manager),
        Arc::clone(&telemetry),
        shutdown.clone(),
    ));
    let router = build_router(state);

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received, shutting down");
            }
            shutdown.cancel();
        });
    }

    let listener = TcpListener::bind(&addr).await?;
    telemetry.set_state(ServiceState::Running);
    tracing::info!("towerhub listening on {addr}");
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

    Ok(())
}

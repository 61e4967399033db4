// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

/// Passphrase used when none is configured. Startup warns about it.
pub const DEFAULT_ENCRYPTION_KEY: &str = "default-key-change-in-production";

/// Configuration for the towerhub process.
#[derive(Debug, Clone, clap::Parser)]
#[command(name = "towerhub", version, about)]
pub struct HubConfig {
    /// Host to bind on.
    #[arg(long, default_value = "127.0.0.1", env = "TOWERHUB_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8080, env = "TOWERHUB_PORT")]
    pub port: u16,

    /// Bearer token for the operator API. If unset, auth is disabled.
    #[arg(long, env = "TOWERHUB_AUTH_TOKEN")]
    pub auth_token: Option<String>,

    /// Passphrase that seals server tokens in the snapshot.
    #[arg(long, default_value = DEFAULT_ENCRYPTION_KEY, env = "TOWERHUB_ENCRYPTION_KEY", hide_env_values = true)]
    pub encryption_key: String,

    /// Snapshot file. Defaults to `servers.json` in the state directory.
    #[arg(long, env = "TOWERHUB_DATA_FILE")]
    pub data_file: Option<PathBuf>,

    /// Timeout for read calls against an update agent, in milliseconds.
    #[arg(long, default_value_t = 60_000, env = "TOWERHUB_REQUEST_TIMEOUT_MS")]
    pub request_timeout_ms: u64,

    /// Timeout for triggering an update, in milliseconds.
    #[arg(long, default_value_t = 300_000, env = "TOWERHUB_UPDATE_TIMEOUT_MS")]
    pub update_timeout_ms: u64,

    /// Log filter directive (e.g. `info`, `towerhub=debug`).
    #[arg(long, default_value = "info", env = "TOWERHUB_LOG_LEVEL")]
    pub log_level: String,

    /// Log output format: `text` or `json`.
    #[arg(long, default_value = "text", env = "TOWERHUB_LOG_FORMAT")]
    pub log_format: String,
}

impl HubConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn update_timeout(&self) -> Duration {
        Duration::from_millis(self.update_timeout_ms)
    }

    pub fn data_file(&self) -> PathBuf {
        self.data_file.clone().unwrap_or_else(|| state_dir().join("servers.json"))
    }

    pub fn uses_default_key(&self) -> bool {
        self.encryption_key == DEFAULT_ENCRYPTION_KEY
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.encryption_key.is_empty() {
            anyhow::bail!("--encryption-key must not be empty");
        }
        match self.log_format.as_str() {
            "text" | "json" => {}
            other => anyhow::bail!("invalid log format: {other}"),
        }
        if self.update_timeout_ms == 0 || self.request_timeout_ms == 0 {
            anyhow::bail!("timeouts must be greater than zero");
        }
        Ok(())
    }
}

/// Resolve the state directory for towerhub data.
///
/// Checks `TOWERHUB_STATE_DIR`, then `$XDG_STATE_HOME/towerhub`,
/// then `$HOME/.local/state/towerhub`.
pub fn state_dir() -> PathBuf {
    state_dir_with(|name| std::env::var(name).ok())
}

fn state_dir_with(env: impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(dir) = env("TOWERHUB_STATE_DIR") {
        return PathBuf::from(dir);
    }
    if let Some(xdg) = env("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("towerhub");
    }
    if let Some(home) = env("HOME") {
        return PathBuf::from(home).join(".local/state/towerhub");
    }
    PathBuf::from(".towerhub")
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

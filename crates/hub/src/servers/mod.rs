// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-tenant server records: encrypted at rest, snapshotted to JSON.
//!
//! A tenant is one operator account (a numeric chat/account ID). Each tenant
//! owns a set of update-agent servers keyed by nickname and a "current"
//! selection that operational commands act on.

pub mod cipher;
pub mod manager;
pub mod persist;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::HubError;

/// Numeric tenant identifier.
pub type TenantId = i64;

/// One managed update-agent instance.
///
/// Inside the store `token` is always ciphertext. Records handed out by
/// [`manager::ServerManager::get_current_server`] carry the plaintext and must
/// not be written back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerRecord {
    pub nickname: String,
    #[serde(rename = "watchtower_url")]
    pub url: String,
    pub token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Informational only.
    pub is_active: bool,
}

/// One operator account and its servers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    #[serde(rename = "telegram_id")]
    pub id: TenantId,
    #[serde(default)]
    pub servers: HashMap<String, ServerRecord>,
    /// Empty when nothing is selected.
    #[serde(default)]
    pub current_server: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Tenant {
    pub fn new(id: TenantId) -> Self {
        Self {
            id,
            servers: HashMap::new(),
            current_server: String::new(),
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Listing entry for a tenant's server, without the credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerSummary {
    pub nickname: String,
    pub url: String,
    pub is_current: bool,
}

/// Normalize an agent base URL: default to `https://` and drop trailing `/`.
pub fn normalize_url(raw: &str) -> Result<String, HubError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(HubError::InvalidInput("url must not be empty".to_owned()));
    }
    if trimmed.starts_with("http") {
        Ok(trimmed.to_owned())
    } else {
        Ok(format!("https://{trimmed}"))
    }
}

/// Nicknames are opaque keys but must be a single non-empty word.
pub fn validate_nickname(nickname: &str) -> Result<(), HubError> {
    if nickname.is_empty() {
        return Err(HubError::InvalidInput("nickname must not be empty".to_owned()));
    }
    if nickname.chars().any(char::is_whitespace) {
        return Err(HubError::InvalidInput(format!("nickname {nickname:?} contains whitespace")));
    }
    Ok(())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

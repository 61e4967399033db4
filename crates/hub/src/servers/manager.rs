// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server manager: owns the tenant map and the cipher, persists on mutation.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::agent::client::{http_client, AgentClient, ClientTimeouts};
use crate::error::HubError;
use crate::servers::cipher::TokenCipher;
use crate::servers::persist::{self, Snapshot};
use crate::servers::{
    normalize_url, validate_nickname, ServerRecord, ServerSummary, Tenant, TenantId,
};

/// Tenant-scoped access to server records.
///
/// One reader/writer lock covers the whole map. Mutations write the full
/// snapshot before releasing it, so snapshots serialize with mutations. No
/// network I/O happens under the lock.
pub struct ServerManager {
    tenants: RwLock<Snapshot>,
    cipher: TokenCipher,
    data_file: PathBuf,
    timeouts: ClientTimeouts,
    http: reqwest::Client,
}

impl ServerManager {
    /// Create an empty manager. Nothing is read from `data_file` yet.
    pub fn new(passphrase: &str, data_file: impl Into<PathBuf>, timeouts: ClientTimeouts) -> Self {
        Self {
            tenants: RwLock::new(Snapshot::new()),
            cipher: TokenCipher::new(passphrase),
            data_file: data_file.into(),
            timeouts,
            http: http_client(),
        }
    }

    /// Create a manager and load the snapshot at `data_file`.
    pub async fn open(
        passphrase: &str,
        data_file: impl Into<PathBuf>,
        timeouts: ClientTimeouts,
    ) -> Result<Self, HubError> {
        let manager = Self::new(passphrase, data_file, timeouts);
        manager.load().await?;
        Ok(manager)
    }

    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    /// Replace in-memory state with the snapshot on disk. Returns the tenant count.
    pub async fn load(&self) -> Result<usize, HubError> {
        let snapshot = persist::load(&self.data_file)?;
        let count = snapshot.len();
        *self.tenants.write().await = snapshot;
        tracing::info!(path = %self.data_file.display(), tenants = count, "server snapshot loaded");
        Ok(count)
    }

    /// Write the full snapshot.
    pub async fn persist(&self) -> Result<(), HubError> {
        let tenants = self.tenants.write().await;
        self.save(&tenants)
    }

    fn save(&self, tenants: &Snapshot) -> Result<(), HubError> {
        persist::save(&self.data_file, tenants).inspect_err(|e| {
            tracing::warn!(path = %self.data_file.display(), err = %e, "failed to persist servers");
        })
    }

    /// Register a server for a tenant, creating the tenant on first use.
    ///
    /// The first server a tenant adds becomes its current server. If the
    /// snapshot cannot be written the addition is undone and the error returned.
    pub async fn add_server(
        &self,
        tenant_id: TenantId,
        nickname: &str,
        url: &str,
        token: &str,
    ) -> Result<(), HubError> {
        validate_nickname(nickname)?;
        let url = normalize_url(url)?;
        if token.is_empty() {
            return Err(HubError::InvalidInput("token must not be empty".to_owned()));
        }

        let mut tenants = self.tenants.write().await;
        let created_tenant = !tenants.contains_key(&tenant_id);
        let tenant = tenants.entry(tenant_id).or_insert_with(|| Tenant::new(tenant_id));

        if tenant.servers.contains_key(nickname) {
            return Err(HubError::AlreadyExists { nickname: nickname.to_owned() });
        }

        tenant.servers.insert(
            nickname.to_owned(),
            ServerRecord {
                nickname: nickname.to_owned(),
                url,
                token: self.cipher.encrypt(token),
                created_at: OffsetDateTime::now_utc(),
                is_active: true,
            },
        );
        let selected = tenant.current_server.is_empty();
        if selected {
            tenant.current_server = nickname.to_owned();
        }

        if let Err(e) = self.save(&tenants) {
            if created_tenant {
                tenants.remove(&tenant_id);
            } else if let Some(tenant) = tenants.get_mut(&tenant_id) {
                tenant.servers.remove(nickname);
                if selected {
                    tenant.current_server.clear();
                }
            }
            return Err(e);
        }

        tracing::info!(tenant = tenant_id, server = %nickname, selected, "server added");
        Ok(())
    }

    /// Resolve the tenant's current server with its token decrypted.
    pub async fn get_current_server(&self, tenant_id: TenantId) -> Result<ServerRecord, HubError> {
        let tenants = self.tenants.read().await;
        let tenant = tenants.get(&tenant_id).ok_or(HubError::NoServers)?;
        if tenant.current_server.is_empty() {
            return Err(HubError::NoServers);
        }
        let record = tenant.servers.get(&tenant.current_server).ok_or(HubError::NoCurrentServer)?;
        let token = self.cipher.decrypt(&record.token).inspect_err(|e| {
            tracing::error!(tenant = tenant_id, server = %record.nickname, err = %e, "stored token unreadable");
        })?;
        Ok(ServerRecord { token, ..record.clone() })
    }

    /// Select a different server. The selection is unchanged on any error.
    pub async fn switch_server(&self, tenant_id: TenantId, nickname: &str) -> Result<(), HubError> {
        let mut tenants = self.tenants.write().await;
        let tenant = tenants.get_mut(&tenant_id).ok_or(HubError::UnknownTenant)?;
        if !tenant.servers.contains_key(nickname) {
            return Err(HubError::UnknownServer { nickname: nickname.to_owned() });
        }

        let previous = std::mem::replace(&mut tenant.current_server, nickname.to_owned());
        if let Err(e) = self.save(&tenants) {
            if let Some(tenant) = tenants.get_mut(&tenant_id) {
                tenant.current_server = previous;
            }
            return Err(e);
        }

        tracing::info!(tenant = tenant_id, server = %nickname, "current server switched");
        Ok(())
    }

    /// All nicknames registered for a tenant.
    pub async fn list_servers(&self, tenant_id: TenantId) -> Result<BTreeSet<String>, HubError> {
        let tenants = self.tenants.read().await;
        let tenant = tenants.get(&tenant_id).ok_or(HubError::NoServers)?;
        Ok(tenant.servers.keys().cloned().collect())
    }

    /// Server listing with the current selection flagged, sorted by nickname.
    pub async fn server_summaries(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<ServerSummary>, HubError> {
        let tenants = self.tenants.read().await;
        let tenant = tenants.get(&tenant_id).ok_or(HubError::NoServers)?;
        let mut summaries: Vec<_> = tenant
            .servers
            .values()
            .map(|r| ServerSummary {
                nickname: r.nickname.clone(),
                url: r.url.clone(),
                is_current: r.nickname == tenant.current_server,
            })
            .collect();
        summaries.sort_by(|a, b| a.nickname.cmp(&b.nickname));
        Ok(summaries)
    }

    /// Build an agent client for the tenant's current server.
    ///
    /// The store lock is released before this returns; callers make the
    /// network call on their own time.
    pub async fn build_client(&self, tenant_id: TenantId) -> Result<AgentClient, HubError> {
        let record = self.get_current_server(tenant_id).await?;
        Ok(AgentClient::new(record, self.http.clone(), self.timeouts))
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;

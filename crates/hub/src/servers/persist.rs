// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot persistence: load/save the tenant map to JSON with atomic writes.

use std::collections::HashMap;
use std::path::Path;

use crate::error::HubError;
use crate::servers::{Tenant, TenantId};

/// The whole store as written to disk, keyed by tenant ID.
pub type Snapshot = HashMap<TenantId, Tenant>;

/// Load a snapshot. A missing file is an empty store.
pub fn load(path: &Path) -> Result<Snapshot, HubError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Snapshot::new()),
        Err(e) => return Err(e.into()),
    };
    let snapshot: Snapshot = serde_json::from_str(&contents)?;
    Ok(snapshot)
}

/// Save a snapshot atomically (write tmp + rename), creating the parent dir.
///
/// Uses a unique temp filename (PID + counter) so two saves never share a
/// `.tmp` file.
pub fn save(path: &Path, snapshot: &Snapshot) -> Result<(), HubError> {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(snapshot)?;
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let tmp_name = format!(
        "{}.{}.{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy(),
        std::process::id(),
        seq,
    );
    let tmp_path = path.with_file_name(tmp_name);
    std::fs::write(&tmp_path, json)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

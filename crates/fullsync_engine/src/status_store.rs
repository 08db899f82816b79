//! Persistence for full-sync progress.
//!
//! A status store keeps three things per target:
//! - one [`SyncStatus`] per module
//! - the [`PlanState`] of a multi-module full sync
//! - the [`ChecksumRegistry`] of snapshots already sent
//!
//! The file-backed store lays its directory out as:
//!
//! ```text
//! <state_dir>/
//! ├─ LOCK              # Advisory lock, one driver per target
//! ├─ PLAN.json         # Start/end markers of the current plan
//! ├─ CHECKSUMS.json    # Snapshot checksums
//! └─ status/
//!    └─ <module>.json  # {"last_sent":..,"sent":..,"finished":..}
//! ```

use crate::error::{SyncError, SyncResult};
use fs2::FileExt;
use fullsync_core::{Checksum, ChecksumRegistry, SyncStatus};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const LOCK_FILE: &str = "LOCK";
const PLAN_FILE: &str = "PLAN.json";
const CHECKSUMS_FILE: &str = "CHECKSUMS.json";
const STATUS_DIR: &str = "status";

/// Progress of a multi-module full sync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanState {
    /// The start marker was delivered.
    pub started: bool,
    /// The end marker was delivered.
    pub ended: bool,
    /// Configuration checksum sent with the start marker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_checksum: Option<Checksum>,
}

/// Where full-sync progress is persisted.
///
/// Implementations need not serialize concurrent drivers for the same
/// module; callers run at most one per module per target.
pub trait StatusStore: Send + Sync {
    /// Loads a module's status, `None` if it never started.
    fn load(&self, module: &str) -> SyncResult<Option<SyncStatus>>;

    /// Persists a module's status.
    fn save(&self, module: &str, status: &SyncStatus) -> SyncResult<()>;

    /// Forgets a module's status so its next run starts over.
    fn clear(&self, module: &str) -> SyncResult<()>;

    /// Modules with a persisted status, sorted.
    fn modules(&self) -> SyncResult<Vec<String>>;

    /// Loads the plan state.
    fn load_plan(&self) -> SyncResult<Option<PlanState>>;

    /// Persists the plan state.
    fn save_plan(&self, state: &PlanState) -> SyncResult<()>;

    /// Forgets the plan state.
    fn clear_plan(&self) -> SyncResult<()>;

    /// Loads the snapshot checksums.
    fn load_checksums(&self) -> SyncResult<ChecksumRegistry>;

    /// Persists the snapshot checksums.
    fn save_checksums(&self, registry: &ChecksumRegistry) -> SyncResult<()>;
}

impl<S: StatusStore + ?Sized> StatusStore for Arc<S> {
    fn load(&self, module: &str) -> SyncResult<Option<SyncStatus>> {
        (**self).load(module)
    }

    fn save(&self, module: &str, status: &SyncStatus) -> SyncResult<()> {
        (**self).save(module, status)
    }

    fn clear(&self, module: &str) -> SyncResult<()> {
        (**self).clear(module)
    }

    fn modules(&self) -> SyncResult<Vec<String>> {
        (**self).modules()
    }

    fn load_plan(&self) -> SyncResult<Option<PlanState>> {
        (**self).load_plan()
    }

    fn save_plan(&self, state: &PlanState) -> SyncResult<()> {
        (**self).save_plan(state)
    }

    fn clear_plan(&self) -> SyncResult<()> {
        (**self).clear_plan()
    }

    fn load_checksums(&self) -> SyncResult<ChecksumRegistry> {
        (**self).load_checksums()
    }

    fn save_checksums(&self, registry: &ChecksumRegistry) -> SyncResult<()> {
        (**self).save_checksums(registry)
    }
}

/// Rejects module names that cannot double as file names.
pub fn validate_module_name(module: &str) -> SyncResult<()> {
    if module.is_empty() {
        return Err(SyncError::invalid_module(module, "name is empty"));
    }
    if module.starts_with('.') {
        return Err(SyncError::invalid_module(module, "name starts with '.'"));
    }
    if !module
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(SyncError::invalid_module(
            module,
            "only ASCII letters, digits, '_', '-' and '.' are allowed",
        ));
    }
    Ok(())
}

/// An in-memory status store for testing.
#[derive(Debug, Default)]
pub struct MemoryStatusStore {
    statuses: RwLock<BTreeMap<String, SyncStatus>>,
    plan: RwLock<Option<PlanState>>,
    checksums: RwLock<ChecksumRegistry>,
}

impl MemoryStatusStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a module's status.
    pub fn with_status(self, module: impl Into<String>, status: SyncStatus) -> Self {
        self.statuses.write().insert(module.into(), status);
        self
    }
}

impl StatusStore for MemoryStatusStore {
    fn load(&self, module: &str) -> SyncResult<Option<SyncStatus>> {
        Ok(self.statuses.read().get(module).cloned())
    }

    fn save(&self, module: &str, status: &SyncStatus) -> SyncResult<()> {
        self.statuses
            .write()
            .insert(module.to_string(), status.clone());
        Ok(())
    }

    fn clear(&self, module: &str) -> SyncResult<()> {
        self.statuses.write().remove(module);
        Ok(())
    }

    fn modules(&self) -> SyncResult<Vec<String>> {
        Ok(self.statuses.read().keys().cloned().collect())
    }

    fn load_plan(&self) -> SyncResult<Option<PlanState>> {
        Ok(self.plan.read().clone())
    }

    fn save_plan(&self, state: &PlanState) -> SyncResult<()> {
        *self.plan.write() = Some(state.clone());
        Ok(())
    }

    fn clear_plan(&self) -> SyncResult<()> {
        *self.plan.write() = None;
        Ok(())
    }

    fn load_checksums(&self) -> SyncResult<ChecksumRegistry> {
        Ok(self.checksums.read().clone())
    }

    fn save_checksums(&self, registry: &ChecksumRegistry) -> SyncResult<()> {
        *self.checksums.write() = registry.clone();
        Ok(())
    }
}

/// A directory of JSON files guarded by an exclusive advisory lock.
///
/// Only one `FileStatusStore` can hold a directory at a time, across
/// processes. Writes go to a temporary file that is synced and renamed
/// over the target.
#[derive(Debug)]
pub struct FileStatusStore {
    path: PathBuf,
    _lock_file: File,
}

impl FileStatusStore {
    /// Opens or creates a status directory and locks it.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Locked`] if another store holds the directory.
    pub fn open(path: &Path) -> SyncResult<Self> {
        fs::create_dir_all(path.join(STATUS_DIR))?;

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.join(LOCK_FILE))?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(SyncError::Locked {
                path: path.to_path_buf(),
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            _lock_file: lock_file,
        })
    }

    /// Returns the directory path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn status_path(&self, module: &str) -> SyncResult<PathBuf> {
        validate_module_name(module)?;
        Ok(self.path.join(STATUS_DIR).join(format!("{module}.json")))
    }

    fn read_json<T: DeserializeOwned>(path: &Path) -> SyncResult<Option<T>> {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&data)
            .map(Some)
            .map_err(|e| SyncError::status(format!("{}: {e}", path.display())))
    }

    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> SyncResult<()> {
        let temp_path = path.with_extension("json.tmp");

        let data = serde_json::to_vec_pretty(value)?;
        let mut file = File::create(&temp_path)?;
        file.write_all(&data)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, path)?;
        Self::sync_directory(path.parent().unwrap_or(&self.path))
    }

    fn remove(path: &Path) -> SyncResult<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    #[cfg(unix)]
    fn sync_directory(dir: &Path) -> SyncResult<()> {
        File::open(dir)?.sync_all()?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn sync_directory(_dir: &Path) -> SyncResult<()> {
        Ok(())
    }
}

impl StatusStore for FileStatusStore {
    fn load(&self, module: &str) -> SyncResult<Option<SyncStatus>> {
        Self::read_json(&self.status_path(module)?)
    }

    fn save(&self, module: &str, status: &SyncStatus) -> SyncResult<()> {
        self.write_json(&self.status_path(module)?, status)
    }

    fn clear(&self, module: &str) -> SyncResult<()> {
        Self::remove(&self.status_path(module)?)
    }

    fn modules(&self) -> SyncResult<Vec<String>> {
        let mut modules = Vec::new();
        for entry in fs::read_dir(self.path.join(STATUS_DIR))? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                modules.push(stem.to_string());
            }
        }
        modules.sort();
        Ok(modules)
    }

    fn load_plan(&self) -> SyncResult<Option<PlanState>> {
        Self::read_json(&self.path.join(PLAN_FILE))
    }

    fn save_plan(&self, state: &PlanState) -> SyncResult<()> {
        self.write_json(&self.path.join(PLAN_FILE), state)
    }

    fn clear_plan(&self) -> SyncResult<()> {
        Self::remove(&self.path.join(PLAN_FILE))
    }

    fn load_checksums(&self) -> SyncResult<ChecksumRegistry> {
        Ok(Self::read_json(&self.path.join(CHECKSUMS_FILE))?.unwrap_or_default())
    }

    fn save_checksums(&self, registry: &ChecksumRegistry) -> SyncResult<()> {
        self.write_json(&self.path.join(CHECKSUMS_FILE), registry)
    }
}

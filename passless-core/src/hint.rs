//! Advisory "passwordless worked here before" hint.
//!
//! After a ceremony completes, the client records a hint so the UI can offer
//! passkey sign-in first next time. The hint is never used for an access
//! decision: cleared storage or a new device simply means it is absent.
//!
//! ## Storage strategies
//!
//! - **Memory** - process-local, lost on exit (default)
//! - **File** - long-lived JSON record with per-entry expiry
//! - anything implementing [`HintStore`] (the browser binding uses a cookie)

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{PasswordlessError, Result};

/// Key under which the hint is stored.
pub const HINT_NAME: &str = "hint-passwordless";

/// How long a written hint stays valid (one year).
pub const HINT_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Key-value store for advisory hints, with optional expiry.
pub trait HintStore {
    fn set(&self, name: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    /// Current value, or `None` if absent or expired.
    fn get(&self, name: &str) -> Result<Option<String>>;
}

/// Record that a ceremony completed on this device. Best effort.
pub fn record_success(store: &dyn HintStore) {
    match store.set(HINT_NAME, "true", Some(HINT_TTL)) {
        Ok(()) => debug!(name = HINT_NAME, "Passwordless hint written"),
        Err(e) => warn!(error = %e, "Failed to write passwordless hint"),
    }
}

/// Whether the hint is present. Storage failures read as "absent".
pub fn has_hint(store: &dyn HintStore) -> bool {
    match store.get(HINT_NAME) {
        Ok(value) => value.as_deref() == Some("true"),
        Err(e) => {
            warn!(error = %e, "Failed to read passwordless hint");
            false
        }
    }
}

/// Hint storage strategy selected in the client configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HintStorage {
    /// Process-local map.
    #[default]
    Memory,
    /// JSON file at `path`.
    File { path: PathBuf },
}

impl HintStorage {
    /// Build the store for this strategy.
    pub fn create(&self) -> Box<dyn HintStore> {
        match self {
            Self::Memory => Box::new(MemoryHintStore::new()),
            Self::File { path } => Box::new(FileHintStore::new(path.clone())),
        }
    }
}

struct MemoryEntry {
    value: String,
    expires_at: Option<Instant>,
}

/// In-memory hint store.
#[derive(Default)]
pub struct MemoryHintStore {
    entries: DashMap<String, MemoryEntry>,
}

impl MemoryHintStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HintStore for MemoryHintStore {
    fn set(&self, name: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        self.entries.insert(
            name.to_string(),
            MemoryEntry {
                value: value.to_string(),
                expires_at: ttl.map(|ttl| Instant::now() + ttl),
            },
        );
        Ok(())
    }

    fn get(&self, name: &str) -> Result<Option<String>> {
        match self.entries.get(name) {
            None => return Ok(None),
            Some(entry) if entry.expires_at.map_or(true, |at| at > Instant::now()) => {
                return Ok(Some(entry.value.clone()))
            }
            Some(_) => {}
        }
        self.entries.remove(name);
        Ok(None)
    }
}

impl std::fmt::Debug for MemoryHintStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryHintStore")
            .field("entries", &self.entries.len())
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct FileEntry {
    value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
}

/// Hint store persisted as a small JSON document.
///
/// The whole file is rewritten on every `set`; hints are tiny and written at
/// most once per ceremony.
#[derive(Debug, Clone)]
pub struct FileHintStore {
    path: PathBuf,
}

impl FileHintStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw file contents; `None` when the file does not exist yet.
    fn read(&self) -> Result<Option<Vec<u8>>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PasswordlessError::HintStorage(format!(
                "Failed to read {}: {e}",
                self.path.display()
            ))),
        }
    }

    fn parse(&self, bytes: &[u8]) -> Result<BTreeMap<String, FileEntry>> {
        serde_json::from_slice(bytes).map_err(|e| {
            PasswordlessError::HintStorage(format!("Corrupt hint file {}: {e}", self.path.display()))
        })
    }

    fn load(&self) -> Result<BTreeMap<String, FileEntry>> {
        match self.read()? {
            Some(bytes) => self.parse(&bytes),
            None => Ok(BTreeMap::new()),
        }
    }

    /// Like `load`, but a corrupt document is replaced rather than blocking
    /// every later write.
    fn load_for_write(&self) -> Result<BTreeMap<String, FileEntry>> {
        let Some(bytes) = self.read()? else {
            return Ok(BTreeMap::new());
        };
        match self.parse(&bytes) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable hint file");
                Ok(BTreeMap::new())
            }
        }
    }

    fn save(&self, entries: &BTreeMap<String, FileEntry>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                PasswordlessError::HintStorage(format!(
                    "Failed to create {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let json = serde_json::to_vec_pretty(entries)
            .map_err(|e| PasswordlessError::HintStorage(format!("Failed to serialize hints: {e}")))?;

        std::fs::write(&self.path, json).map_err(|e| {
            PasswordlessError::HintStorage(format!(
                "Failed to write {}: {e}",
                self.path.display()
            ))
        })
    }
}

impl HintStore for FileHintStore {
    fn set(&self, name: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let mut entries = self.load_for_write()?;
        let now = Utc::now();
        entries.retain(|_, entry| entry.expires_at.map_or(true, |at| at > now));

        let expires_at = ttl
            .map(|ttl| {
                chrono::Duration::from_std(ttl)
                    .map(|ttl| now + ttl)
                    .map_err(|e| PasswordlessError::HintStorage(format!("Invalid hint TTL: {e}")))
            })
            .transpose()?;

        entries.insert(
            name.to_string(),
            FileEntry {
                value: value.to_string(),
                expires_at,
            },
        );
        self.save(&entries)
    }

    fn get(&self, name: &str) -> Result<Option<String>> {
        let entries = self.load()?;
        Ok(entries
            .get(name)
            .filter(|entry| entry.expires_at.map_or(true, |at| at > Utc::now()))
            .map(|entry| entry.value.clone()))
    }
}

//! Processed-set registry — identifiers of messages that already have a
//! draft (or a sent reply).
//!
//! File format: a pretty-printed JSON array of strings, e.g.
//! `~/.maildraft/processed_ids.json`:
//!
//! ```json
//! [
//!   "3857529045:101",
//!   "3857529045:102"
//! ]
//! ```
//!
//! Writes go to a sibling temp file which is then renamed over the target,
//! so a concurrent or later `load` sees either the old or the new set.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::RegistryError;

/// The set of message identifiers already handled, bound to its backing file.
#[derive(Debug, Clone)]
pub struct ProcessedRegistry {
    /// Backing file. `None` for in-memory registries (tests, dry runs).
    path: Option<PathBuf>,
    ids: BTreeSet<String>,
}

impl ProcessedRegistry {
    /// Load the registry from `path`.
    ///
    /// A missing file yields an empty registry (first run). An unreadable or
    /// unparsable file is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref().to_path_buf();

        // Only a file that is genuinely absent means "first run"; any other
        // failure to reach it must not be mistaken for an empty registry.
        let data = match std::fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no processed registry yet, starting empty");
                return Ok(Self {
                    path: Some(path),
                    ids: BTreeSet::new(),
                });
            }
            Err(source) => return Err(RegistryError::Read { path, source }),
        };
        let ids: BTreeSet<String> =
            serde_json::from_str(&data).map_err(|source| RegistryError::Parse {
                path: path.clone(),
                source,
            })?;

        info!(path = %path.display(), entries = ids.len(), "loaded processed registry");
        Ok(Self {
            path: Some(path),
            ids,
        })
    }

    /// A registry with no backing file. `save` is a no-op.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            ids: BTreeSet::new(),
        }
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Record `id` as handled. Returns `false` if it was already present.
    ///
    /// Callers must only do this after the draft/reply was delivered.
    pub fn mark_processed(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Identifiers in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Write the full set back, replacing the previous file atomically.
    pub fn save(&self) -> Result<(), RegistryError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let write_err = |source: std::io::Error| RegistryError::Write {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }

        let json = serde_json::to_string_pretty(&self.ids)
            .map_err(|e| write_err(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;

        let tmp_path = temp_path_for(path);
        {
            let mut file = std::fs::File::create(&tmp_path).map_err(write_err)?;
            file.write_all(json.as_bytes()).map_err(write_err)?;
            file.sync_all().map_err(write_err)?;
        }
        std::fs::rename(&tmp_path, path).map_err(write_err)?;

        debug!(path = %path.display(), entries = self.ids.len(), "saved processed registry");
        Ok(())
    }
}

/// `processed_ids.json` → `processed_ids.json.tmp` in the same directory,
/// so the final rename never crosses filesystems.
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "processed_ids.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

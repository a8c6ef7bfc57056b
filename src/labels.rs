//! Persistent space labels.
//!
//! The label store is the single source of truth for space names.  Neither
//! backend is trusted to remember labels: yabai can, but the native backend
//! cannot, so both overlay the store onto every query.  A backend's own label
//! is only used to seed the store the first time a space is seen.
//!
//! Backends never share keys.  Each one gets a [`ScopedLabels`] view that
//! prefixes ids with the backend name, so yabai's space `3` and the display
//! server's managed space `3` are different entries.

use log::{debug, warn};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// A key → label mapping with durable backing.
///
/// Implementations absorb their own persistence failures (logging them);
/// callers only ever see the in-memory view.
pub trait LabelStore: Send + Sync {
    fn get(&self, id: &str) -> Option<String>;

    /// Store `label` for `id`.  An empty label removes the entry.
    fn set(&self, id: &str, label: &str);

    fn remove(&self, id: &str);
}

/// Errors from reading or writing the label file.
#[derive(Debug, thiserror::Error)]
pub enum LabelStoreError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed label file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

//  In-memory store

/// Volatile store.
#[derive(Debug, Default)]
pub struct MemoryLabelStore {
    labels: Mutex<HashMap<String, String>>,
}

impl MemoryLabelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock(&self.labels).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LabelStore for MemoryLabelStore {
    fn get(&self, id: &str) -> Option<String> {
        lock(&self.labels).get(id).cloned()
    }

    fn set(&self, id: &str, label: &str) {
        if label.is_empty() {
            self.remove(id);
            return;
        }
        lock(&self.labels).insert(id.to_string(), label.to_string());
    }

    fn remove(&self, id: &str) {
        lock(&self.labels).remove(id);
    }
}

//  JSON file store

/// Labels persisted as a flat JSON object (`{"yabai/3": "Work"}`).
///
/// The whole file is rewritten on every change, through a sibling temp file
/// that is renamed into place.  A missing or unreadable file is treated as an
/// empty store.
#[derive(Debug)]
pub struct JsonLabelStore {
    path: PathBuf,
    labels: Mutex<BTreeMap<String, String>>,
}

impl JsonLabelStore {
    /// Open the store at `path`, loading whatever is there.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let labels = match Self::load(&path) {
            Ok(labels) => {
                debug!("loaded {} label(s) from {}", labels.len(), path.display());
                labels
            }
            Err(LabelStoreError::Io { ref source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                BTreeMap::new()
            }
            Err(e) => {
                warn!("{}; starting with no labels", e);
                BTreeMap::new()
            }
        };
        Self {
            path,
            labels: Mutex::new(labels),
        }
    }

    fn load(path: &Path) -> Result<BTreeMap<String, String>, LabelStoreError> {
        let contents = std::fs::read_to_string(path).map_err(|source| LabelStoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&contents).map_err(|source| LabelStoreError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    fn persist(&self, labels: &BTreeMap<String, String>) -> Result<(), LabelStoreError> {
        let io_err = |source| LabelStoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(labels).map_err(|source| LabelStoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)
    }

    fn mutate(&self, f: impl FnOnce(&mut BTreeMap<String, String>) -> bool) {
        let mut labels = lock(&self.labels);
        if !f(&mut labels) {
            return;
        }
        if let Err(e) = self.persist(&labels) {
            warn!("failed to save labels: {}", e);
        }
    }
}

impl LabelStore for JsonLabelStore {
    fn get(&self, id: &str) -> Option<String> {
        lock(&self.labels).get(id).cloned()
    }

    fn set(&self, id: &str, label: &str) {
        if label.is_empty() {
            self.remove(id);
            return;
        }
        self.mutate(|labels| {
            if labels.get(id).map(String::as_str) == Some(label) {
                return false;
            }
            labels.insert(id.to_string(), label.to_string());
            true
        });
    }

    fn remove(&self, id: &str) {
        self.mutate(|labels| labels.remove(id).is_some());
    }
}

//  Backend-scoped view

/// A view of a [`LabelStore`] restricted to one backend's id space.
#[derive(Clone)]
pub struct ScopedLabels {
    store: Arc<dyn LabelStore>,
    scope: &'static str,
}

impl ScopedLabels {
    pub fn new(store: Arc<dyn LabelStore>, scope: &'static str) -> Self {
        Self { store, scope }
    }

    fn key(&self, id: &str) -> String {
        format!("{}/{}", self.scope, id)
    }

    pub fn get(&self, id: &str) -> Option<String> {
        self.store.get(&self.key(id))
    }

    pub fn set(&self, id: &str, label: &str) {
        self.store.set(&self.key(id), label);
    }

    pub fn remove(&self, id: &str) {
        self.store.remove(&self.key(id));
    }

    /// Resolve the label for `id`, seeding the store from `native` when no
    /// entry exists yet.
    pub fn resolve(&self, id: &str, native: Option<&str>) -> Option<String> {
        if let Some(stored) = self.get(id) {
            return Some(stored);
        }
        let native = native.filter(|l| !l.is_empty())?;
        debug!("seeding label {:?} for {} space {}", native, self.scope, id);
        self.set(id, native);
        Some(native.to_string())
    }
}

impl std::fmt::Debug for ScopedLabels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedLabels").field("scope", &self.scope).finish()
    }
}

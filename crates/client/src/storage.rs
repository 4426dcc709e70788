//! Durable key-value storage.
//!
//! One JSON document holds everything the client persists: cart lines,
//! session token, profile id, and the presentation layer's theme/language
//! slots. The document is read once at startup and rewritten on every
//! mutating operation. In-memory state stays authoritative: a failed write
//! is logged and the next successful write catches the file up.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use green_mango_core::ProfileId;

use crate::models::CartLine;

/// Errors from the storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored document could not be (de)serialized.
    #[error("storage encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// The persisted document.
///
/// Unknown fields are ignored and missing fields default, so documents
/// written by older builds keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StoredState {
    #[serde(default)]
    pub cart_lines: Vec<CartLine>,
    #[serde(default)]
    pub session_token: Option<String>,
    #[serde(default)]
    pub profile_id: Option<ProfileId>,
    #[serde(default)]
    pub theme_mode: Option<String>,
    #[serde(default)]
    pub language_code: Option<String>,
}

/// A place the state document can be read from and written to.
pub trait StateStore: Send + Sync {
    /// Read the whole document. A missing document is the default state.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the document exists but cannot be read
    /// or decoded.
    fn read(&self) -> Result<StoredState, StorageError>;

    /// Replace the whole document.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the document cannot be encoded or
    /// written.
    fn write(&self, state: &StoredState) -> Result<(), StorageError>;
}

/// File-backed store keeping the document as pretty-printed JSON.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store at `path`. The file is created on first write.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl StateStore for JsonFileStore {
    fn read(&self) -> Result<StoredState, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StoredState::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, state: &StoredState) -> Result<(), StorageError> {
        let contents = serde_json::to_string_pretty(state)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}

/// In-memory store for tests and embedders without a filesystem.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<StoredState>,
}

impl StateStore for MemoryStore {
    fn read(&self) -> Result<StoredState, StorageError> {
        Ok(self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn write(&self, state: &StoredState) -> Result<(), StorageError> {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state.clone();
        Ok(())
    }
}

/// Write-through handle over a [`StateStore`].
///
/// Holds the authoritative copy of the document in memory and pushes every
/// mutation to the backing store. Cheaply cloneable; clones share the
/// document.
#[derive(Clone)]
pub struct Storage {
    inner: Arc<StorageInner>,
}

struct StorageInner {
    store: Box<dyn StateStore>,
    state: Mutex<StoredState>,
}

impl Storage {
    /// Open storage over `store`, reading the document once.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the initial read fails.
    pub fn open(store: impl StateStore + 'static) -> Result<Self, StorageError> {
        let state = store.read()?;
        Ok(Self {
            inner: Arc::new(StorageInner {
                store: Box::new(store),
                state: Mutex::new(state),
            }),
        })
    }

    fn locked(&self) -> MutexGuard<'_, StoredState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// A copy of the current document.
    #[must_use]
    pub fn snapshot(&self) -> StoredState {
        self.locked().clone()
    }

    /// Replace the persisted cart lines.
    pub fn set_cart_lines(&self, lines: Vec<CartLine>) {
        self.mutate(|state| state.cart_lines = lines);
    }

    /// Replace the persisted session slots.
    pub fn set_session(&self, token: Option<String>, profile_id: Option<ProfileId>) {
        self.mutate(|state| {
            state.session_token = token;
            state.profile_id = profile_id;
        });
    }

    /// Replace the persisted theme mode.
    pub fn set_theme_mode(&self, mode: Option<String>) {
        self.mutate(|state| state.theme_mode = mode);
    }

    /// Replace the persisted language code.
    pub fn set_language_code(&self, code: Option<String>) {
        self.mutate(|state| state.language_code = code);
    }

    fn mutate(&self, apply: impl FnOnce(&mut StoredState)) {
        let snapshot = {
            let mut state = self.locked();
            apply(&mut state);
            state.clone()
        };
        if let Err(e) = self.inner.store.write(&snapshot) {
            tracing::warn!(error = %e, "state not persisted; in-memory state is ahead of storage");
        }
    }
}

//! Auxiliary store implementations.
//!
//! - [`MemoryAuxStore`]: a shared in-process map
//! - [`FileAuxStore`]: one pickle file per key under a root directory

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use segrun_engine::{AuxError, AuxStore};
use segrun_foundation::Value;
use segrun_store::{pickle_value, unpickle_value};

// =============================================================================
// Memory Store
// =============================================================================

/// An auxiliary store held in memory.
///
/// Clones of the `Arc` it is shared through see the same keys.
#[derive(Debug, Default)]
pub struct MemoryAuxStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryAuxStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if no key is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }
}

impl AuxStore for MemoryAuxStore {
    fn get(&self, key: &str) -> Result<Option<Value>, AuxError> {
        Ok(self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn put(&self, key: &str, value: Value) -> Result<(), AuxError> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
        Ok(())
    }
}

// =============================================================================
// File Store
// =============================================================================

/// An auxiliary store backed by a directory.
///
/// The key `dest/name` lives at `<root>/dest/name.pickle`. Empty segments
/// and `.`/`..` are rejected so keys cannot escape the root.
#[derive(Clone, Debug)]
pub struct FileAuxStore {
    root: PathBuf,
}

impl FileAuxStore {
    /// Extension of stored files.
    pub const EXTENSION: &'static str = "pickle";

    /// Creates a store rooted at `root`. The directory is created lazily on
    /// the first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a key to its file.
    ///
    /// # Errors
    ///
    /// Returns an [`AuxError`] for keys with empty, `.` or `..` segments.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, AuxError> {
        let mut path = self.root.clone();
        for segment in key.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\\') {
                return Err(AuxError(format!("invalid key: {key:?}")));
            }
            path.push(segment);
        }
        let mut file = path.into_os_string();
        file.push(".");
        file.push(Self::EXTENSION);
        Ok(PathBuf::from(file))
    }
}

impl AuxStore for FileAuxStore {
    fn get(&self, key: &str) -> Result<Option<Value>, AuxError> {
        let path = self.path_for(key)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AuxError(format!("{}: {e}", path.display()))),
        };
        unpickle_value(&bytes)
            .map(Some)
            .map_err(|e| AuxError(format!("{}: {e}", path.display())))
    }

    fn put(&self, key: &str, value: Value) -> Result<(), AuxError> {
        let path = self.path_for(key)?;
        let bytes = pickle_value(&value).map_err(|e| AuxError(e.to_string()))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AuxError(format!("{}: {e}", parent.display())))?;
        }
        fs::write(&path, bytes).map_err(|e| AuxError(format!("{}: {e}", path.display())))
    }
}

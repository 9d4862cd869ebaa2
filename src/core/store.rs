//! Single-record persistence for the queue and the estimate.
//!
//! A store holds exactly one value of `T` and replaces it whole on save.
//! There is no log and no partial update.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tempfile::NamedTempFile;

use crate::error::StoreError;

pub trait Store<T>: Send + Sync {
    fn read(&self) -> Result<T, StoreError>;
    fn save(&self, value: &T) -> Result<(), StoreError>;
}

/// JSON file store. A missing file reads as `T::default()`.
pub struct JsonFileStore<T> {
    path: PathBuf,
    _record: PhantomData<fn() -> T>,
}

impl<T> JsonFileStore<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T> Store<T> for JsonFileStore<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    fn read(&self) -> Result<T, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, value: &T) -> Result<(), StoreError> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        if !parent.exists() {
            fs::create_dir_all(parent)?;
            tracing::debug!("Created store directory: {}", parent.display());
        }

        let bytes = serde_json::to_vec_pretty(value)?;
        let mut tmp = NamedTempFile::new_in(parent)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// In-process store, mainly for tests. Can be told to fail every call,
/// or only saves.
pub struct MemoryStore<T> {
    value: Mutex<T>,
    failing: AtomicBool,
    failing_saves: AtomicBool,
}

impl<T: Default> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> MemoryStore<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Mutex::new(value),
            failing: AtomicBool::new(false),
            failing_saves: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Reads keep working; every save fails.
    pub fn set_failing_saves(&self, failing: bool) {
        self.failing_saves.store(failing, Ordering::SeqCst);
    }

    fn check(&self, saving: bool) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst)
            || (saving && self.failing_saves.load(Ordering::SeqCst))
        {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "store unavailable",
            )));
        }
        Ok(())
    }
}

impl<T: Clone + Send> Store<T> for MemoryStore<T> {
    fn read(&self) -> Result<T, StoreError> {
        self.check(false)?;
        Ok(self.value.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, value: &T) -> Result<(), StoreError> {
        self.check(true)?;
        *self.value.lock().unwrap_or_else(|e| e.into_inner()) = value.clone();
        Ok(())
    }
}

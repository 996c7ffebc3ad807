//! Small key-value persistence for the fallback cart and the countdown.
//!
//! Values are JSON. The file backend keeps every key in one JSON object and
//! rewrites it whole on each change.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use cartmirror_core::{CartItem, ItemSource};
use cartmirror_extract::{CartSourceReader, ExtractError, PageState, SourceRead};
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::WidgetError;

/// Key holding the fallback cart list.
pub const CART_KEY: &str = "cartmirror.cart";
/// Key holding the countdown start timestamp.
pub const COUNTDOWN_START_KEY: &str = "cartmirror.countdown_start";

#[derive(Debug)]
enum Backend {
    Memory,
    File(PathBuf),
}

#[derive(Debug)]
struct Inner {
    backend: Backend,
    entries: Map<String, Value>,
}

/// Shared handle to the store. Clones see the same entries.
#[derive(Debug, Clone)]
pub struct LocalStore {
    inner: Arc<Mutex<Inner>>,
}

impl LocalStore {
    /// A store that lives only as long as the process.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_inner(Backend::Memory, Map::new())
    }

    /// Opens the JSON file at `path`. A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::StorageIo`] if the file exists but cannot be
    /// read, or [`WidgetError::StorageFormat`] if it is not a JSON object.
    pub fn open(path: &Path) -> Result<Self, WidgetError> {
        let entries = match std::fs::read_to_string(path) {
            Ok(content) if content.trim().is_empty() => Map::new(),
            Ok(content) => serde_json::from_str(&content).map_err(|source| {
                WidgetError::StorageFormat {
                    key: path.display().to_string(),
                    source,
                }
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(source) => {
                return Err(WidgetError::StorageIo {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        tracing::debug!(path = %path.display(), keys = entries.len(), "local store opened");
        Ok(Self::from_inner(Backend::File(path.to_path_buf()), entries))
    }

    fn from_inner(backend: Backend, entries: Map<String, Value>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner { backend, entries })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock leaves the map itself consistent.
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Reads and decodes `key`. A missing key is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::StorageFormat`] if the stored value does not
    /// decode as `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, WidgetError> {
        let inner = self.lock();
        let Some(value) = inner.entries.get(key) else {
            return Ok(None);
        };
        serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|source| WidgetError::StorageFormat {
                key: key.to_string(),
                source,
            })
    }

    /// Encodes and stores `value` under `key`, then persists. On a failed
    /// write the previous value stays in place.
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::StorageFormat`] if `value` cannot be encoded
    /// or [`WidgetError::StorageIo`] if the file cannot be written.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), WidgetError> {
        let encoded = serde_json::to_value(value).map_err(|source| WidgetError::StorageFormat {
            key: key.to_string(),
            source,
        })?;
        let mut inner = self.lock();
        let mut next = inner.entries.clone();
        next.insert(key.to_string(), encoded);
        inner.commit(next)
    }

    /// Deletes `key`, then persists. On a failed write the key stays.
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::StorageIo`] if the file cannot be written.
    pub fn remove(&self, key: &str) -> Result<(), WidgetError> {
        let mut inner = self.lock();
        if !inner.entries.contains_key(key) {
            return Ok(());
        }
        let mut next = inner.entries.clone();
        next.remove(key);
        inner.commit(next)
    }

    /// The fallback cart list, or `None` if none was ever stored.
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::StorageFormat`] if the stored list is invalid.
    pub fn cart(&self) -> Result<Option<Vec<CartItem>>, WidgetError> {
        self.get(CART_KEY)
    }

    /// Replaces the fallback cart list.
    ///
    /// # Errors
    ///
    /// See [`LocalStore::set`].
    pub fn set_cart(&self, items: &[CartItem]) -> Result<(), WidgetError> {
        self.set(CART_KEY, &items)
    }
}

impl Inner {
    /// Writes `next` out and only then makes it the live map.
    fn commit(&mut self, next: Map<String, Value>) -> Result<(), WidgetError> {
        persist(&self.backend, &next)?;
        self.entries = next;
        Ok(())
    }
}

fn persist(backend: &Backend, entries: &Map<String, Value>) -> Result<(), WidgetError> {
    let Backend::File(path) = backend else {
        return Ok(());
    };
    let io_err = |source| WidgetError::StorageIo {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let content = serde_json::to_string_pretty(entries).map_err(|source| {
        WidgetError::StorageFormat {
            key: path.display().to_string(),
            source,
        }
    })?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, content).map_err(io_err)?;
    std::fs::rename(&tmp, path).map_err(io_err)?;
    Ok(())
}

/// Reads the fallback cart list kept in the [`LocalStore`].
pub struct LocalCartReader {
    store: LocalStore,
}

impl LocalCartReader {
    #[must_use]
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn read_store(&self) -> SourceRead {
        match self.store.cart() {
            Ok(None) => SourceRead::Absent,
            Ok(Some(items)) if items.is_empty() => SourceRead::Empty,
            Ok(Some(items)) => SourceRead::Items(
                items
                    .into_iter()
                    .map(|mut item| {
                        item.source = ItemSource::LocalFallback;
                        item
                    })
                    .collect(),
            ),
            Err(e) => {
                tracing::warn!(error = %e, "fallback cart unreadable");
                SourceRead::Absent
            }
        }
    }
}

impl CartSourceReader for LocalCartReader {
    fn source(&self) -> ItemSource {
        ItemSource::LocalFallback
    }

    fn read<'a>(&'a self, _page: &'a PageState) -> BoxFuture<'a, Result<SourceRead, ExtractError>> {
        Box::pin(std::future::ready(Ok(self.read_store())))
    }
}

//! # Lazily computed persistent store
//!
//! [AutoComputedStore] gives dictionary-like access to an on-disk key-value store (sled). When a
//! key is missing, the value is produced by a compute function supplied at construction, written
//! back and flushed before it is returned, so the next lookup (in this process or a later one) is a
//! plain read.
//!
//! Keys and values are normalized by trimming surrounding whitespace before they are used.
//!
//! The store owns its sled handle exclusively. Writes take `&mut self`; sharing one backing
//! directory between processes is not supported.

use std::path::{Path, PathBuf};

use anyhow::Result;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use sled::{Db, IVec};

use crate::cache::errors::KeyNotFound;

pub mod perplexity;

/// Trait for computing the value of a missing key.
pub trait ComputeValue {
    fn compute_value(&self, key: &str) -> Result<String>;
}

/// Blanket impl of ComputeValue for Fn(&str) -> Result<String>.
impl<F> ComputeValue for F where F: Fn(&str) -> Result<String> {
    fn compute_value(&self, key: &str) -> Result<String> {
        self(key)
    }
}

/// Trim surrounding whitespace. Idempotent.
#[inline]
pub fn normalize(string: &str) -> &str {
    string.trim()
}

/// Where a persistent store lives and how eagerly it is synced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
    /// Flush to disk before every write returns.
    pub sync_on_write: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("auto_computed_store"),
            sync_on_write: true,
        }
    }
}

impl StoreConfig {
    pub fn at(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    pub(crate) fn open_db(&self) -> Result<Db> {
        debug!("Opening store at {}", self.path.display());
        Ok(sled::Config::new().path(&self.path).open()?)
    }
}

/// A persistent string-to-string store that computes missing values on demand.
pub struct AutoComputedStore<F: ComputeValue> {
    db: Db,
    compute: F,
    sync_on_write: bool,
}

impl<F: ComputeValue> AutoComputedStore<F> {
    /// Open the store at `path`, creating it if absent.
    pub fn open(path: impl AsRef<Path>, compute: F) -> Result<Self> {
        Self::open_with_config(&StoreConfig::at(path), compute)
    }

    pub fn open_with_config(config: &StoreConfig, compute: F) -> Result<Self> {
        Ok(Self {
            db: config.open_db()?,
            compute,
            sync_on_write: config.sync_on_write,
        })
    }

    fn decode(bytes: IVec) -> Result<String> {
        Ok(String::from_utf8(bytes.to_vec())?)
    }

    fn read(&self, key: &str) -> Result<Option<String>> {
        self.db.get(key)?.map(Self::decode).transpose()
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        self.db.insert(key, value.as_bytes())?;
        if self.sync_on_write {
            let flushed = self.db.flush()?;
            trace!("Flushed {} bytes after writing {:?}", flushed, key);
        }
        Ok(())
    }

    fn sync_removal(&self, what: &str) -> Result<()> {
        if self.sync_on_write {
            let flushed = self.db.flush()?;
            trace!("Flushed {} bytes after removing {}", flushed, what);
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<Option<IVec>> {
        let removed = self.db.remove(key)?;
        if removed.is_some() {
            self.sync_removal(&format!("{:?}", key))?;
        }
        Ok(removed)
    }

    /// Look up a key, computing and persisting its value on a miss.
    ///
    /// A failing computation is returned unchanged and nothing is written.
    pub fn get_or_compute(&mut self, key: &str) -> Result<String> {
        self.get_with_fallback(key, None)
    }

    /// Like [AutoComputedStore::get_or_compute], but a supplied fallback is stored instead of
    /// calling the compute function.
    ///
    /// The fallback is persisted, so later lookups of the key return it rather than a computed value.
    pub fn get_with_fallback(&mut self, key: &str, fallback: Option<&str>) -> Result<String> {
        let key = normalize(key);
        if let Some(value) = self.read(key)? {
            debug!("Store hit for {:?}", key);
            return Ok(value);
        }
        debug!("Store miss for {:?}", key);
        let value = match fallback {
            Some(fallback) => fallback.to_string(),
            None => self.compute.compute_value(key)?,
        };
        let value = normalize(&value).to_string();
        self.write(key, &value)?;
        Ok(value)
    }

    /// Store a value, replacing any previous one.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.write(normalize(key), normalize(value))
    }

    /// Remove a key. Fails with [KeyNotFound] if it is absent.
    pub fn delete(&mut self, key: &str) -> Result<()> {
        let key = normalize(key);
        match self.remove(key)? {
            Some(_) => {
                debug!("Deleted {:?}", key);
                Ok(())
            }
            None => Err(KeyNotFound::key(key).into()),
        }
    }

    /// Remove a key and return its value, or `default` if the key is absent.
    pub fn pop(&mut self, key: &str, default: Option<&str>) -> Result<String> {
        let key = normalize(key);
        match self.remove(key)? {
            Some(value) => Self::decode(value),
            None => default
                .map(|d| normalize(d).to_string())
                .ok_or_else(|| KeyNotFound::key(key).into()),
        }
    }

    /// Remove and return some entry. Fails with [KeyNotFound] when the store is empty.
    pub fn pop_arbitrary(&mut self) -> Result<(String, String)> {
        match self.db.pop_min()? {
            Some((key, value)) => {
                let key = Self::decode(key)?;
                self.sync_removal(&format!("{:?}", key))?;
                Ok((key, Self::decode(value)?))
            }
            None => Err(KeyNotFound::empty().into()),
        }
    }

    pub fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.db.contains_key(normalize(key))?)
    }

    pub fn len(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    /// All keys in byte order.
    pub fn keys(&self) -> Result<Vec<String>> {
        self.db.iter()
            .keys()
            .map(|key| Self::decode(key?))
            .collect()
    }

    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    /// Flush and release the backing store.
    pub fn close(self) -> Result<()> {
        self.flush()
    }
}

pub mod errors {
    use std::error::Error;
    use std::fmt;
    use std::fmt::Formatter;

    /// Error when a key to remove is absent, or when popping from an empty store.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct KeyNotFound {
        /// `None` when the store was empty.
        pub key: Option<String>,
    }

    impl KeyNotFound {
        pub(crate) fn key(key: impl Into<String>) -> Self {
            Self { key: Some(key.into()) }
        }

        pub(crate) fn empty() -> Self {
            Self { key: None }
        }
    }

    impl fmt::Display for KeyNotFound {
        fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
            match &self.key {
                Some(key) => write!(f, "KeyNotFound: {:?} is not in the store", key),
                None => write!(f, "KeyNotFound: the store is empty"),
            }
        }
    }

    impl Error for KeyNotFound {}
}

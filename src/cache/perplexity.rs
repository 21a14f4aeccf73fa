//! Persistent record of answer perplexities.
//!
//! Each answer identifier maps to the list of perplexities measured for it so far. Lists are
//! stored as JSON arrays and every update writes the whole list back.

use std::path::Path;

use anyhow::Result;
use log::{debug, trace};

use crate::cache::{normalize, StoreConfig};

pub struct PerplexityStore {
    db: sled::Db,
    sync_on_write: bool,
}

impl PerplexityStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(&StoreConfig::at(path))
    }

    pub fn open_with_config(config: &StoreConfig) -> Result<Self> {
        Ok(Self {
            db: config.open_db()?,
            sync_on_write: config.sync_on_write,
        })
    }

    pub fn get(&self, key: &str) -> Result<Option<Vec<f64>>> {
        match self.db.get(normalize(key))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Replace the perplexities recorded for `key`.
    pub fn record(&mut self, key: &str, perplexities: &[f64]) -> Result<()> {
        let key = normalize(key);
        self.db.insert(key, serde_json::to_vec(perplexities)?)?;
        if self.sync_on_write {
            self.db.flush()?;
        }
        Ok(())
    }

    /// Append one perplexity to the list for `key` and return the new list length.
    pub fn append(&mut self, key: &str, perplexity: f64) -> Result<usize> {
        let mut perplexities = self.get(key)?.unwrap_or_default();
        perplexities.push(perplexity);
        self.record(key, &perplexities)?;
        debug!("{} perplexities recorded for {:?}", perplexities.len(), normalize(key));
        Ok(perplexities.len())
    }

    pub fn remove(&mut self, key: &str) -> Result<Option<Vec<f64>>> {
        let key = normalize(key);
        match self.db.remove(key)? {
            Some(bytes) => {
                if self.sync_on_write {
                    let flushed = self.db.flush()?;
                    trace!("Flushed {} bytes after removing {:?}", flushed, key);
                }
                Ok(Some(serde_json::from_slice(&bytes)?))
            }
            None => Ok(None),
        }
    }

    pub fn len(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;
    use crate::config::Settings;
    use super::PerplexityStore;

    #[test]
    fn test_append_and_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("answer_perplexities");
        {
            let mut store = PerplexityStore::open(&path).unwrap();
            assert_eq!(None, store.get("GSM1:12").unwrap());
            assert_eq!(1, store.append("GSM1:12", 1.5).unwrap());
            assert_eq!(2, store.append(" GSM1:12 ", 2.25).unwrap());
            store.flush().unwrap();
        }
        let mut store = PerplexityStore::open(&path).unwrap();
        assert_eq!(Some(vec![1.5, 2.25]), store.get("GSM1:12").unwrap());

        store.record("GSM1:12", &[3.0]).unwrap();
        assert_eq!(Some(vec![3.0]), store.remove("GSM1:12").unwrap());
        assert!(store.is_empty());
        assert_eq!(None, store.remove("GSM1:12").unwrap());
    }

    #[test]
    fn test_open_from_settings() {
        let dir = tempdir().unwrap();
        let mut settings = Settings::default();
        settings.answer_perplexities.path = dir.path().join("perplexities");
        settings.answer_perplexities.sync_on_write = false;
        let mut store = PerplexityStore::open_with_config(&settings.answer_perplexities).unwrap();
        assert!(!store.sync_on_write);
        store.record("GSM2:1", &[0.5]).unwrap();
        store.flush().unwrap();
        assert_eq!(Some(vec![0.5]), store.remove("GSM2:1").unwrap());
        assert_eq!(0, store.len());
    }
}

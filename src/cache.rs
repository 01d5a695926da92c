//! On-disk cache store, one file per url

use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{Arc, Mutex},
};

use bytes::Bytes;
use tokio::{
    fs,
    sync::{Mutex as AsyncMutex, OwnedMutexGuard},
};

use crate::CacheResult;

pub const CACHE_SUFFIX: &str = ".cachefile";

/// A flat directory of cache entries. An entry always holds a complete,
/// previously validated raw response and lives until it is overwritten.
#[derive(Debug)]
pub struct CacheStore {
    dir: PathBuf,
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl CacheStore {
    /// Open the store, creating the directory if it does not exist yet.
    pub async fn open(dir: impl Into<PathBuf>) -> CacheResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;

        Ok(Self {
            dir,
            locks: Mutex::new(HashMap::new()),
        })
    }

    /// Filesystem-safe key for a request url: `/` becomes `-`, `:` becomes
    /// `.`. The key is a pure function of the url, so two origins serving
    /// the same path share an entry.
    pub fn key(url: &str) -> String {
        let mut key = url.replace('/', "-").replace(':', ".");
        key.push_str(CACHE_SUFFIX);
        key
    }

    /// Exclusive guard for one key, held across a read-revalidate-write
    /// window so sessions for the same url cannot interleave.
    pub async fn guard(&self, key: &str) -> KeyGuard {
        let lock = {
            let mut locks = self.locks.lock().expect("lock map poisoned");
            Arc::clone(locks.entry(key.to_string()).or_default())
        };

        KeyGuard {
            _guard: lock.lock_owned().await,
        }
    }

    pub async fn has(&self, key: &str) -> bool {
        fs::try_exists(self.dir.join(key)).await.unwrap_or(false)
    }

    pub async fn read(&self, key: &str) -> CacheResult<Bytes> {
        Ok(Bytes::from(fs::read(self.dir.join(key)).await?))
    }

    /// Overwrite (or create) an entry. Goes through a sibling temp file and
    /// a rename so readers never observe a partial entry.
    pub async fn write(&self, key: &str, data: &[u8]) -> CacheResult<()> {
        let tmp = self.dir.join(format!("{}.tmp", key));
        fs::write(&tmp, data).await?;
        fs::rename(&tmp, self.dir.join(key)).await?;

        Ok(())
    }
}

#[derive(Debug)]
pub struct KeyGuard {
    _guard: OwnedMutexGuard<()>,
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    async fn temp_store() -> CacheStore {
        let dir = std::env::temp_dir().join(format!("cachew-cache-{}", Uuid::new_v4()));
        CacheStore::open(dir).await.unwrap()
    }

    #[test]
    fn test_key_derivation() {
        assert_eq!(CacheStore::key("/a/b"), "-a-b.cachefile");
        assert_eq!(CacheStore::key("/x:y"), "-x.y.cachefile");
    }

    #[tokio::test]
    async fn test_write_read_has() {
        let store = temp_store().await;
        let key = CacheStore::key("/a");

        assert!(!store.has(&key).await);

        store.write(&key, b"HTTP/1.1 200 OK\r\n\r\nhello").await.unwrap();

        assert!(store.has(&key).await);
        assert_eq!(
            &store.read(&key).await.unwrap()[..],
            b"HTTP/1.1 200 OK\r\n\r\nhello"
        );
    }

    #[tokio::test]
    async fn test_write_overwrites() {
        let store = temp_store().await;
        let key = CacheStore::key("/a");

        store.write(&key, b"old").await.unwrap();
        store.write(&key, b"new").await.unwrap();

        assert_eq!(&store.read(&key).await.unwrap()[..], b"new");
    }

    #[tokio::test]
    async fn test_guard_is_exclusive_per_key() {
        let store = temp_store().await;

        let held = store.guard("-a.cachefile").await;

        let lock = {
            let locks = store.locks.lock().unwrap();
            Arc::clone(locks.get("-a.cachefile").unwrap())
        };
        assert!(lock.try_lock().is_err());

        drop(held);
        assert!(lock.try_lock().is_ok());
    }
}

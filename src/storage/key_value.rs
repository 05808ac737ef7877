use std::{future::Future, ops::Deref, path::PathBuf};

use tracing::warn;

use crate::fs::operations::{read_locked, update_locked, write_locked};

use super::error::StorageError;

/// Interface for abstracting durable storage. Values are opaque string blobs addressed by a fixed
/// key.
pub trait KeyValueStore {
    /// Returns [None] when nothing was ever written under `key`.
    fn read(&self, key: &str) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    fn write(&self, key: &str, value: &str) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Read-modify-write of one key with no other writer in between. `update` returns the new
    /// value, or [None] to keep the stored one, next to a result handed back to the caller.
    fn update<T, F>(&self, key: &str, update: F) -> impl Future<Output = Result<T, StorageError>> + Send
    where
        T: Send,
        F: FnOnce(Option<String>) -> Result<(Option<String>, T), StorageError> + Send;
}

impl<T: Deref + Sync> KeyValueStore for T
where
    T::Target: KeyValueStore,
{
    fn read(&self, key: &str) -> impl Future<Output = Result<Option<String>, StorageError>> + Send {
        self.deref().read(key)
    }

    fn write(&self, key: &str, value: &str) -> impl Future<Output = Result<(), StorageError>> + Send {
        self.deref().write(key, value)
    }

    fn update<U, F>(&self, key: &str, update: F) -> impl Future<Output = Result<U, StorageError>> + Send
    where
        U: Send,
        F: FnOnce(Option<String>) -> Result<(Option<String>, U), StorageError> + Send,
    {
        self.deref().update(key, update)
    }
}

/// Keeps every key in its own json file inside a directory.
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&dir)?;

        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileKeyValueStore {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(read_locked(&self.path_for(key)).await?)
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        Ok(write_locked(&self.path_for(key), value.as_bytes()).await?)
    }

    async fn update<T, F>(&self, key: &str, update: F) -> Result<T, StorageError>
    where
        T: Send,
        F: FnOnce(Option<String>) -> Result<(Option<String>, T), StorageError> + Send,
    {
        update_locked(&self.path_for(key), |current| {
            let (next, value) = update(current)?;
            Ok((next.map(String::into_bytes), value))
        })
        .await
    }
}

/// Stand-in for environments without durable storage. Nothing is ever stored and every write
/// reports [StorageError::Unavailable].
pub struct UnavailableStore;

impl KeyValueStore for UnavailableStore {
    async fn read(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    async fn write(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable)
    }

    async fn update<T, F>(&self, _key: &str, update: F) -> Result<T, StorageError>
    where
        T: Send,
        F: FnOnce(Option<String>) -> Result<(Option<String>, T), StorageError> + Send,
    {
        match update(None)? {
            (Some(_), _) => Err(StorageError::Unavailable),
            (None, value) => Ok(value),
        }
    }
}

/// The storage picked at startup.
pub enum StorageBackend {
    File(FileKeyValueStore),
    Unavailable(UnavailableStore),
}

impl StorageBackend {
    /// Opens file storage in `dir`, degrading to [UnavailableStore] when the directory can't be
    /// used.
    pub fn open(dir: Option<PathBuf>) -> Self {
        match dir.map(FileKeyValueStore::new) {
            Some(Ok(store)) => StorageBackend::File(store),
            Some(Err(e)) => {
                warn!("Storage directory is not usable, records won't be saved: {e}");
                StorageBackend::Unavailable(UnavailableStore)
            }
            None => {
                warn!("No storage directory, records won't be saved");
                StorageBackend::Unavailable(UnavailableStore)
            }
        }
    }
}

impl KeyValueStore for StorageBackend {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self {
            StorageBackend::File(store) => store.read(key).await,
            StorageBackend::Unavailable(store) => store.read(key).await,
        }
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        match self {
            StorageBackend::File(store) => store.write(key, value).await,
            StorageBackend::Unavailable(store) => store.write(key, value).await,
        }
    }

    async fn update<T, F>(&self, key: &str, update: F) -> Result<T, StorageError>
    where
        T: Send,
        F: FnOnce(Option<String>) -> Result<(Option<String>, T), StorageError> + Send,
    {
        match self {
            StorageBackend::File(store) => store.update(key, update).await,
            StorageBackend::Unavailable(store) => store.update(key, update).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;
    use tempfile::tempdir;

    use super::{FileKeyValueStore, KeyValueStore, StorageBackend, UnavailableStore};

    #[tokio::test]
    async fn test_file_store_keys_are_separate() -> Result<()> {
        let dir = tempdir()?;
        let store = FileKeyValueStore::new(dir.path().join("nested"))?;

        store.write("a", "first").await?;
        store.write("b", "second").await?;

        assert_eq!(store.read("a").await?.as_deref(), Some("first"));
        assert_eq!(store.read("b").await?.as_deref(), Some("second"));
        assert_eq!(store.read("c").await?, None);
        assert!(dir.path().join("nested").join("a.json").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_store_behind_pointer() -> Result<()> {
        let dir = tempdir()?;
        let store = Arc::new(FileKeyValueStore::new(dir.path().to_owned())?);

        store.write("key", "value").await?;

        assert_eq!(store.read("key").await?.as_deref(), Some("value"));
        Ok(())
    }

    #[tokio::test]
    async fn test_unavailable_store() -> Result<()> {
        let store = UnavailableStore;
        assert_eq!(store.read("key").await?, None);
        assert!(store.write("key", "value").await.unwrap_err().is_unavailable());
        Ok(())
    }

    #[tokio::test]
    async fn test_backend_degrades_when_directory_is_unusable() -> Result<()> {
        let dir = tempdir()?;
        // A regular file where the directory should be.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory")?;

        let backend = StorageBackend::open(Some(blocker.join("inner")));

        assert!(matches!(backend, StorageBackend::Unavailable(_)));
        assert!(backend.write("key", "value").await.unwrap_err().is_unavailable());
        Ok(())
    }
}

use std::{io::ErrorKind, path::Path};

use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{self, AsyncReadExt, AsyncSeekExt, AsyncWriteExt},
};
use tracing::debug;

/// Reads the whole file under a shared lock. A missing file is not an error, it just means
/// nothing was written yet.
pub async fn read_locked(path: &Path) -> Result<Option<String>, io::Error> {
    async fn extract(path: &Path) -> Result<String, io::Error> {
        debug!("Reading {path:?}");
        let mut file = File::open(path).await?;
        file.lock_shared()?;
        let mut contents = String::new();
        let result = file.read_to_string(&mut contents).await;
        file.unlock_async().await?;
        result.map(|_| contents)
    }

    match extract(path).await {
        Ok(s) => Ok(Some(s)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Replaces the contents of a file under an exclusive lock, creating it when needed.
pub async fn write_locked(path: &Path, contents: &[u8]) -> Result<(), io::Error> {
    debug!("Writing {} bytes to {path:?}", contents.len());
    // Not truncating on open, the lock has to be held before the old contents go away.
    let mut file = File::options()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .await?;

    // Semi-safe acquire-release for a file
    file.lock_exclusive()?;
    let result = replace_contents(&mut file, contents).await;
    file.unlock_async().await?;
    result
}

/// Reads and conditionally rewrites a file while holding one exclusive lock, so that no other
/// writer can slip in between. `update` sees the current contents ([None] for a missing or empty
/// file) and returns the new contents, or [None] to leave the file alone.
pub async fn update_locked<T, E, F>(path: &Path, update: F) -> Result<T, E>
where
    F: FnOnce(Option<String>) -> Result<(Option<Vec<u8>>, T), E>,
    E: From<io::Error>,
{
    debug!("Updating {path:?}");
    let mut file = File::options()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .await?;

    file.lock_exclusive()?;
    let result = read_and_replace(&mut file, update).await;
    file.unlock_async().await?;
    result
}

async fn read_and_replace<T, E, F>(file: &mut File, update: F) -> Result<T, E>
where
    F: FnOnce(Option<String>) -> Result<(Option<Vec<u8>>, T), E>,
    E: From<io::Error>,
{
    let mut current = String::new();
    file.read_to_string(&mut current).await?;
    let current = (!current.is_empty()).then_some(current);

    let (next, value) = update(current)?;
    if let Some(next) = next {
        replace_contents(file, &next).await?;
    }
    Ok(value)
}

async fn replace_contents(file: &mut File, contents: &[u8]) -> Result<(), io::Error> {
    file.set_len(0).await?;
    file.rewind().await?;
    file.write_all(contents).await?;
    file.flush().await?;
    file.sync_data().await
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use crate::fs::operations::{read_locked, update_locked, write_locked};

    #[tokio::test]
    async fn test_read_missing_file() -> Result<()> {
        let dir = tempdir()?;
        assert_eq!(read_locked(&dir.path().join("absent")).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_write_then_read() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("blob");

        write_locked(&path, b"first").await?;
        assert_eq!(read_locked(&path).await?.as_deref(), Some("first"));

        Ok(())
    }

    #[tokio::test]
    async fn test_shorter_write_replaces_everything() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("blob");

        write_locked(&path, b"a rather long first value").await?;
        write_locked(&path, b"short").await?;

        assert_eq!(read_locked(&path).await?.as_deref(), Some("short"));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_sees_current_contents() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("blob");

        let seen = update_locked(&path, |current| {
            Ok::<_, std::io::Error>((Some(b"created".to_vec()), current))
        })
        .await?;
        assert_eq!(seen, None);

        let seen = update_locked(&path, |current| {
            Ok::<_, std::io::Error>((Some(b"new".to_vec()), current))
        })
        .await?;
        assert_eq!(seen.as_deref(), Some("created"));
        assert_eq!(read_locked(&path).await?.as_deref(), Some("new"));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_can_leave_file_alone() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("blob");
        write_locked(&path, b"keep me").await?;

        update_locked(&path, |_| Ok::<_, std::io::Error>((None, ()))).await?;

        assert_eq!(read_locked(&path).await?.as_deref(), Some("keep me"));
        Ok(())
    }
}

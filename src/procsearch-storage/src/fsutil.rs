//! Durable file replacement.
//!
//! Content goes to a sibling temp file which is fsynced and renamed over the
//! target, so readers see either the old file or the new one.

use std::io::Write;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{Result, StorageError};

fn temp_path(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| StorageError::InvalidPath(path.to_path_buf()))?;
    let mut temp = name.to_os_string();
    temp.push(format!(".{}.tmp", uuid::Uuid::new_v4().simple()));
    Ok(path.with_file_name(temp))
}

/// Atomically replaces `path` with `content`.
pub async fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let temp = temp_path(path)?;
    let written = async {
        let mut file = fs::File::create(&temp).await?;
        file.write_all(content).await?;
        file.flush().await?;
        file.sync_all().await?;
        fs::rename(&temp, path).await
    }
    .await;
    if let Err(e) = written {
        let _ = fs::remove_file(&temp).await;
        return Err(e.into());
    }

    // Persist the directory entry on Unix.
    #[cfg(unix)]
    if let Some(parent) = path.parent()
        && let Ok(dir) = fs::File::open(parent).await
    {
        let _ = dir.sync_all().await;
    }

    debug!(path = %path.display(), bytes = content.len(), "file written");
    Ok(())
}

/// Blocking form of [`write_atomic`].
pub fn write_atomic_sync(path: &Path, content: &[u8]) -> Result<()> {
    let temp = temp_path(path)?;
    let written = (|| {
        let mut file = std::fs::File::create(&temp)?;
        file.write_all(content)?;
        file.flush()?;
        file.sync_all()?;
        std::fs::rename(&temp, path)
    })();
    if let Err(e) = written {
        let _ = std::fs::remove_file(&temp);
        return Err(e.into());
    }

    #[cfg(unix)]
    if let Some(parent) = path.parent()
        && let Ok(dir) = std::fs::File::open(parent)
    {
        let _ = dir.sync_all();
    }

    debug!(path = %path.display(), bytes = content.len(), "file written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_atomic_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");

        write_atomic(&path, b"first").await.unwrap();
        write_atomic(&path, b"second").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");

        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_write_atomic_sync() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("value.json");
        write_atomic_sync(&path, b"{}").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn test_missing_parent_fails_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("value.json");
        assert!(matches!(
            write_atomic_sync(&path, b"x"),
            Err(StorageError::Io(_))
        ));
        assert!(!dir.path().join("missing").exists());
    }
}

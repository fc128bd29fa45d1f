use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::{IndexerError, Result};

/// Exclusive advisory lock guarding writes to a file-backed index.
///
/// Held for the duration of a save; released on drop. Protects against
/// two indexer processes rebuilding the same index file at once.
pub(crate) struct IndexWriteLock {
    #[allow(dead_code)]
    file: std::fs::File,
}

impl Drop for IndexWriteLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

fn lock_path_for(index_path: &Path) -> PathBuf {
    let mut name = index_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| std::ffi::OsString::from("index"));
    name.push(".lock");
    index_path.with_file_name(name)
}

pub(crate) async fn acquire_index_write_lock(index_path: &Path) -> Result<IndexWriteLock> {
    let path = lock_path_for(index_path);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let lock = tokio::task::spawn_blocking(move || -> Result<IndexWriteLock> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|err| {
                IndexerError::Other(format!("open index lock {}: {err}", path.display()))
            })?;

        file.lock_exclusive().map_err(|err| {
            IndexerError::Other(format!("acquire index lock {}: {err}", path.display()))
        })?;

        Ok(IndexWriteLock { file })
    })
    .await
    .map_err(|err| IndexerError::Other(format!("join index lock task: {err}")))??;

    Ok(lock)
}

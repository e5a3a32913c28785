//! Local filesystem object store.
//!
//! Objects live at `{root}/{path}`, so a snapshot for user `alice` ends up at
//! `{root}/files/alice/__long-memories/data.json`. Uploads write a sibling
//! temp file and rename it into place, so readers never see a half-written
//! snapshot.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use longmem_core::storage::object_store::ObjectStore;
use longmem_types::error::StorageError;

pub struct FilesystemObjectStore {
    root: PathBuf,
}

impl FilesystemObjectStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Map an object path onto disk, refusing anything that escapes the root.
    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if path.is_empty() || escapes {
            return Err(StorageError::Backend(format!("invalid object path '{path}'")));
        }
        Ok(self.root.join(relative))
    }
}

fn io_error(path: &str, err: std::io::Error) -> StorageError {
    if err.kind() == ErrorKind::NotFound {
        StorageError::NotFound(path.to_string())
    } else {
        StorageError::Backend(format!("{path}: {err}"))
    }
}

impl ObjectStore for FilesystemObjectStore {
    async fn download(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let file = self.resolve(path)?;
        tokio::fs::read(&file).await.map_err(|e| io_error(path, e))
    }

    async fn upload(&self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        let file = self.resolve(path)?;
        if let Some(parent) = file.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(path, e))?;
        }

        let mut tmp = file.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, data)
            .await
            .map_err(|e| io_error(path, e))?;
        tokio::fs::rename(&tmp, &file)
            .await
            .map_err(|e| io_error(path, e))?;

        tracing::debug!(path = %file.display(), bytes = data.len(), "object written");
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        let file = self.resolve(path)?;
        tokio::fs::remove_file(&file)
            .await
            .map_err(|e| io_error(path, e))
    }
}

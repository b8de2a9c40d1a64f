//! File-backed snapshot store.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::instrument;
use uuid::Uuid;

use super::{SnapshotError, SnapshotStore};

/// Stores each key as `<dir>/<percent-encoded key>.json`.
///
/// Saves write a temporary sibling file, flush it to disk, then rename it over
/// the old snapshot, so readers see either the old or the new blob.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    /// Create a store rooted at `dir`. The directory is created on first save.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File a key is stored in.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", urlencoding::encode(key)))
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    #[instrument(skip(self))]
    async fn load(&self, key: &str) -> Result<Option<String>, SnapshotError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, value), fields(bytes = value.len()))]
    async fn save(&self, key: &str, value: &str) -> Result<(), SnapshotError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        // Unique per call so concurrent writers never share a temp file
        let tmp = self.dir.join(format!(
            "{}.json.{}.tmp",
            urlencoding::encode(key),
            Uuid::new_v4().simple()
        ));

        let result = write_and_replace(&tmp, &self.path_for(key), value).await;
        if result.is_err() {
            let _ = tokio::fs::remove_file(&tmp).await;
        }
        result.map_err(SnapshotError::from)
    }
}

/// Write `value` to `tmp`, flush it to disk and move it over `path`.
async fn write_and_replace(tmp: &Path, path: &Path, value: &str) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(tmp).await?;
    file.write_all(value.as_bytes()).await?;
    file.sync_all().await?;
    drop(file);

    tokio::fs::rename(tmp, path).await
}

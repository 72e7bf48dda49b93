//! BlobStore — durable byte-blob placement beneath a configured root.
//!
//! Locators are opaque path-like strings relative to the root, generated
//! from a nanosecond timestamp plus a random suffix plus the original file
//! extension, sharded per owner. A successful `put` is committed to disk
//! (fsync + atomic rename); a failed `put` leaves no partial file behind.

use crate::services::error::{MediaError, MediaResult};
use chrono::Utc;
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use uuid::Uuid;

const RANDOM_SUFFIX_LEN: usize = 8;

#[derive(Clone, Debug)]
pub struct BlobStore {
    /// Base directory on disk where blobs are stored.
    root: PathBuf,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Reject locators that could escape the root.
    ///
    /// Locators are generated internally, but deletes and reads take values
    /// read back from the database, so the same guard applies everywhere.
    fn ensure_locator_safe(&self, locator: &str) -> MediaResult<()> {
        if locator.is_empty()
            || locator.starts_with('/')
            || locator.contains("..")
            || locator
                .bytes()
                .any(|b| b.is_ascii_control() || b == b'\\' || b == b'\0')
        {
            return Err(MediaError::InvalidInput("invalid blob locator".into()));
        }
        Ok(())
    }

    /// Generate a collision-resistant locator for an upload.
    ///
    /// Shape: `{owner}/{unix_nanos}_{random8}{ext}`. The extension is taken
    /// from the original filename so downloads keep a recognizable suffix.
    pub fn generate_locator(owner_id: Uuid, original_name: &str) -> String {
        let ext = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();
        let stamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let suffix: String = Uuid::new_v4()
            .simple()
            .to_string()
            .chars()
            .take(RANDOM_SUFFIX_LEN)
            .collect();
        format!("{}/{}_{}{}", owner_id, stamp, suffix, ext)
    }

    /// Absolute path of a locator beneath the root.
    pub fn resolve(&self, locator: &str) -> PathBuf {
        self.root.join(locator)
    }

    /// Store `bytes` under a freshly generated locator.
    pub async fn put(
        &self,
        owner_id: Uuid,
        original_name: &str,
        bytes: &[u8],
    ) -> MediaResult<String> {
        let locator = Self::generate_locator(owner_id, original_name);
        self.write(&locator, bytes).await?;
        Ok(locator)
    }

    /// Durably write `bytes` at an explicit locator.
    ///
    /// Writes to a temp file in the final directory, fsyncs, then renames
    /// into place. Any error removes the temp file before propagating.
    pub async fn write(&self, locator: &str, bytes: &[u8]) -> MediaResult<()> {
        self.ensure_locator_safe(locator)?;
        let file_path = self.resolve(locator);
        let parent = file_path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| MediaError::InvalidInput("blob locator has no parent".into()))?;
        fs::create_dir_all(&parent).await?;

        let tmp_path = parent.join(format!(".tmp-{}", Uuid::new_v4()));
        let mut file = File::create(&tmp_path).await?;
        if let Err(err) = write_durably(&mut file, bytes).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(MediaError::Io(err));
        }
        drop(file);

        if let Err(err) = fs::rename(&tmp_path, &file_path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(MediaError::Io(err));
        }
        Ok(())
    }

    /// Open a blob for streaming reads.
    ///
    /// A missing file maps to `NotFoundOrDenied`: the catalog row may exist
    /// while the payload is gone, and callers must not learn which.
    pub async fn open(&self, locator: &str) -> MediaResult<File> {
        self.ensure_locator_safe(locator)?;
        File::open(self.resolve(locator)).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                MediaError::NotFoundOrDenied
            } else {
                MediaError::Io(err)
            }
        })
    }

    /// Remove a blob. Idempotent: a missing file is not an error, so
    /// crash-recovery retries of cleanup always succeed.
    pub async fn delete(&self, locator: &str) -> MediaResult<()> {
        self.ensure_locator_safe(locator)?;
        match fs::remove_file(self.resolve(locator)).await {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(MediaError::Io(err)),
        }
    }
}

async fn write_durably(file: &mut File, bytes: &[u8]) -> std::io::Result<()> {
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_all().await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, BlobStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn put_writes_bytes_and_keeps_extension() {
        let (_dir, store) = store();
        let owner = Uuid::new_v4();

        let locator = store.put(owner, "cat.jpg", b"hello").await.unwrap();

        assert!(locator.starts_with(&format!("{}/", owner)));
        assert!(locator.ends_with(".jpg"));
        let written = tokio::fs::read(store.resolve(&locator)).await.unwrap();
        assert_eq!(written, b"hello");
    }

    #[tokio::test]
    async fn put_leaves_no_temp_files() {
        let (_dir, store) = store();
        let owner = Uuid::new_v4();

        let locator = store.put(owner, "a.png", b"data").await.unwrap();

        let parent = store.resolve(&locator);
        let mut entries = tokio::fs::read_dir(parent.parent().unwrap()).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert!(names.iter().all(|n| !n.starts_with(".tmp-")));
        assert_eq!(names.len(), 1);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (_dir, store) = store();
        let owner = Uuid::new_v4();
        let locator = store.put(owner, "b.mp4", b"video").await.unwrap();

        store.delete(&locator).await.unwrap();
        store.delete(&locator).await.unwrap();
        assert!(!store.resolve(&locator).exists());
    }

    #[tokio::test]
    async fn rejects_traversal_locators() {
        let (_dir, store) = store();
        assert!(matches!(
            store.delete("../outside").await,
            Err(MediaError::InvalidInput(_))
        ));
        assert!(matches!(
            store.open("/etc/passwd").await,
            Err(MediaError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn open_missing_blob_is_not_found() {
        let (_dir, store) = store();
        let locator = format!("{}/123_abc.jpg", Uuid::new_v4());
        assert!(matches!(
            store.open(&locator).await,
            Err(MediaError::NotFoundOrDenied)
        ));
    }
}

//! Filesystem image store.
//!
//! Uploads land under `<root>/posts/` and are referenced as `posts/<name>`.
//! A name that is already taken gets a short random suffix before the
//! extension, so an existing file is never overwritten.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use yatube_core::ports::{ImageStore, StorageError};

const UPLOAD_DIR: &str = "posts";
const MAX_ATTEMPTS: usize = 16;

pub struct LocalImageStore {
    /// Directory all uploads live under (e.g. `./media`).
    root: PathBuf,
    /// Public URL prefix (e.g. `/media`).
    url_prefix: String,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Keep only the final path component, so uploads cannot escape the upload dir.
fn base_name(file_name: &str) -> String {
    let name = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    match name {
        "" | "." | ".." => "upload".to_string(),
        other => other.to_string(),
    }
}

fn with_suffix(name: &str) -> String {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(7).collect();
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}_{suffix}.{ext}"),
        _ => format!("{name}_{suffix}"),
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn save(&self, file_name: &str, data: Vec<u8>) -> Result<String, StorageError> {
        let dir = self.root.join(UPLOAD_DIR);
        fs::create_dir_all(&dir).await?;

        let original = base_name(file_name);
        let mut candidate = original.clone();

        for _ in 0..MAX_ATTEMPTS {
            let path = dir.join(&candidate);
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(mut file) => {
                    let written = match file.write_all(&data).await {
                        Ok(()) => file.flush().await,
                        Err(e) => Err(e),
                    };
                    if let Err(e) = written {
                        drop(file);
                        if let Err(cleanup) = fs::remove_file(&path).await {
                            tracing::warn!(path = %path.display(), error = %cleanup, "Failed to remove partial upload");
                        }
                        return Err(e.into());
                    }
                    tracing::debug!(path = %path.display(), bytes = data.len(), "Stored image");
                    return Ok(format!("{UPLOAD_DIR}/{candidate}"));
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    candidate = with_suffix(&original);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(StorageError::Io(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("no free name for {original}"),
        )))
    }

    async fn delete(&self, reference: &str) -> Result<(), StorageError> {
        let Some(name) = reference.strip_prefix(&format!("{UPLOAD_DIR}/")) else {
            return Ok(());
        };
        if base_name(name) != name {
            return Ok(());
        }
        let path = self.root.join(UPLOAD_DIR).join(name);
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "Removed image");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn url(&self, reference: &str) -> String {
        format!("{}/{}", self.url_prefix, reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> LocalImageStore {
        let root = std::env::temp_dir().join(format!("yatube-media-{}", Uuid::new_v4()));
        LocalImageStore::new(root, "/media/")
    }

    #[test]
    fn test_base_name_strips_directories() {
        assert_eq!(base_name("../../etc/passwd"), "passwd");
        assert_eq!(base_name("C:\\pics\\small.gif"), "small.gif");
        assert_eq!(base_name(".."), "upload");
    }

    #[tokio::test]
    async fn test_save_under_posts() {
        let store = temp_store();
        let reference = store.save("small.gif", vec![1, 2, 3]).await.unwrap();

        assert_eq!(reference, "posts/small.gif");
        assert_eq!(store.url(&reference), "/media/posts/small.gif");
        let written = tokio::fs::read(store.root().join(&reference)).await.unwrap();
        assert_eq!(written, vec![1, 2, 3]);

        let _ = tokio::fs::remove_dir_all(store.root()).await;
    }

    #[tokio::test]
    async fn test_name_collision_keeps_both_files() {
        let store = temp_store();
        let first = store.save("small.gif", vec![1]).await.unwrap();
        let second = store.save("small.gif", vec![2]).await.unwrap();

        assert_ne!(first, second);
        assert!(second.starts_with("posts/small_"));
        assert!(second.ends_with(".gif"));
        let kept = tokio::fs::read(store.root().join(&first)).await.unwrap();
        assert_eq!(kept, vec![1]);

        let _ = tokio::fs::remove_dir_all(store.root()).await;
    }

    #[tokio::test]
    async fn test_delete_removes_stored_file() {
        let store = temp_store();
        let reference = store.save("small.gif", vec![1]).await.unwrap();

        store.delete(&reference).await.unwrap();
        assert!(!store.root().join(&reference).exists());
        // Already gone, and references outside the upload dir, are no-ops.
        store.delete(&reference).await.unwrap();
        store.delete("posts/../secret").await.unwrap();
        store.delete("elsewhere.gif").await.unwrap();

        let _ = tokio::fs::remove_dir_all(store.root()).await;
    }
}

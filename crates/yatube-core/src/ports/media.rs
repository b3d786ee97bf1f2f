//! Image storage port.

use async_trait::async_trait;

/// Storage for images attached to posts.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist an upload and return its reference, e.g. `posts/small.gif`.
    async fn save(&self, file_name: &str, data: Vec<u8>) -> Result<String, StorageError>;

    /// Remove a stored image. Removing a missing reference is not an error.
    async fn delete(&self, reference: &str) -> Result<(), StorageError>;

    /// Public URL for a stored reference.
    fn url(&self, reference: &str) -> String;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

use std::io::Cursor;

use async_trait::async_trait;
use tokio::io::AsyncRead;

use super::error::StorageError;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// A file accepted by a [`FileStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Public path the file is served under, e.g. `/uploads/images/…`.
    pub path: String,
    pub size: u64,
}

/// Storage for uploaded product media.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Store bytes under `folder`, returning the public path.
    async fn store(
        &self,
        folder: &str,
        file_name: &str,
        data: &[u8],
    ) -> Result<StoredFile, StorageError> {
        let reader: BoxReader = Box::new(Cursor::new(data.to_vec()));
        self.store_stream(folder, file_name, reader).await
    }

    /// Store data from an async reader under `folder`, returning the public path.
    async fn store_stream(
        &self,
        folder: &str,
        file_name: &str,
        reader: BoxReader,
    ) -> Result<StoredFile, StorageError>;

    /// Remove a file by the public path [`store`](Self::store) returned.
    ///
    /// Returns `true` if the file was removed, `false` if it did not exist.
    async fn remove(&self, path: &str) -> Result<bool, StorageError>;
}

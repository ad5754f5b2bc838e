/// Errors that can occur while storing or removing uploaded files.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The referenced file does not exist.
    #[error("file not found: {0}")]
    NotFound(String),
    /// An I/O error occurred.
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The path does not point inside the store.
    #[error("invalid storage path: {0}")]
    InvalidPath(String),
    /// The file exceeds the configured size limit.
    #[error("file exceeds size limit ({actual} > {limit} bytes)")]
    SizeLimitExceeded { actual: u64, limit: u64 },
}

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::error::StorageError;
use super::traits::{BoxReader, FileStore, StoredFile};
use crate::config::StorageConfig;

/// Longest sanitized file name kept in a stored file name.
const MAX_NAME_LEN: usize = 100;

/// Filesystem-backed upload store.
///
/// Files land at `{upload_dir}/{folder}/{uuid}-{sanitized name}` and are
/// addressed publicly as `{public_prefix}/{folder}/{uuid}-{sanitized name}`.
pub struct FilesystemFileStore {
    base_path: PathBuf,
    public_prefix: String,
    max_size: u64,
}

impl FilesystemFileStore {
    /// Create a new filesystem store, creating the upload directory if needed.
    pub async fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        fs::create_dir_all(&config.upload_dir).await?;
        fs::create_dir_all(config.upload_dir.join(".tmp")).await?;
        Ok(Self {
            base_path: config.upload_dir.clone(),
            public_prefix: config.public_prefix.trim_end_matches('/').to_string(),
            max_size: config.max_file_size,
        })
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }

    /// Map a public path back onto the upload directory.
    fn resolve_public_path(&self, path: &str) -> Result<PathBuf, StorageError> {
        let relative = path
            .strip_prefix(&self.public_prefix)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| StorageError::InvalidPath(path.to_string()))?;

        let mut resolved = self.base_path.clone();
        for segment in relative.split('/') {
            if segment.is_empty() || segment.starts_with('.') || segment.contains('\\') {
                return Err(StorageError::InvalidPath(path.to_string()));
            }
            resolved.push(segment);
        }
        Ok(resolved)
    }
}

/// Reduce an uploaded file name to `[A-Za-z0-9._-]`, dropping any directory part.
pub fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name)
        .trim();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        return "file".to_string();
    }

    // Keep the tail so the extension survives truncation.
    let skip = cleaned.len().saturating_sub(MAX_NAME_LEN);
    cleaned[skip..].to_string()
}

fn validate_folder(folder: &str) -> Result<(), StorageError> {
    if folder.is_empty()
        || !folder
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(StorageError::InvalidPath(folder.to_string()));
    }
    Ok(())
}

#[async_trait]
impl FileStore for FilesystemFileStore {
    async fn store_stream(
        &self,
        folder: &str,
        file_name: &str,
        mut reader: BoxReader,
    ) -> Result<StoredFile, StorageError> {
        validate_folder(folder)?;

        let stored_name = format!("{}-{}", uuid::Uuid::now_v7(), sanitize_file_name(file_name));
        let temp_path = self.temp_path();
        let mut total_bytes: u64 = 0;

        let mut buf = vec![0u8; 64 * 1024]; // 64KB read buffer
        let mut temp_file = fs::File::create(&temp_path).await?;

        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }

            total_bytes += n as u64;
            if total_bytes > self.max_size {
                drop(temp_file);
                let _ = fs::remove_file(&temp_path).await;
                return Err(StorageError::SizeLimitExceeded {
                    actual: total_bytes,
                    limit: self.max_size,
                });
            }

            temp_file.write_all(&buf[..n]).await?;
        }

        temp_file.flush().await?;
        drop(temp_file);

        let dir = self.base_path.join(folder);
        fs::create_dir_all(&dir).await?;

        if let Err(e) = fs::rename(&temp_path, dir.join(&stored_name)).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        tracing::debug!(folder, stored_name = %stored_name, size = total_bytes, "Stored upload");

        Ok(StoredFile {
            path: format!("{}/{}/{}", self.public_prefix, folder, stored_name),
            size: total_bytes,
        })
    }

    async fn remove(&self, path: &str) -> Result<bool, StorageError> {
        let file_path = self.resolve_public_path(path)?;
        match fs::remove_file(&file_path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

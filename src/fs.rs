//! File system abstraction for testability.

use async_trait::async_trait;
use std::path::Path;

/// Abstraction over file system operations for testability.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Creates all directories in the given path.
    async fn create_dir_all(&self, path: &Path) -> std::io::Result<()>;

    /// Creates (truncating) a file at the given path.
    async fn create_file(&self, path: &Path) -> std::io::Result<tokio::fs::File>;

    /// Renames a file.
    async fn rename_file(&self, from: &Path, to: &Path) -> std::io::Result<()>;

    /// Removes a file.
    async fn remove_file(&self, path: &Path) -> std::io::Result<()>;
}

/// Default file system implementation using `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFileSystem;

impl TokioFileSystem {
    /// Creates a new `TokioFileSystem` instance.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FileSystem for TokioFileSystem {
    async fn create_dir_all(&self, path: &Path) -> std::io::Result<()> {
        tokio::fs::create_dir_all(path).await
    }

    async fn create_file(&self, path: &Path) -> std::io::Result<tokio::fs::File> {
        tokio::fs::File::create(path).await
    }

    async fn rename_file(&self, from: &Path, to: &Path) -> std::io::Result<()> {
        tokio::fs::rename(from, to).await
    }

    async fn remove_file(&self, path: &Path) -> std::io::Result<()> {
        tokio::fs::remove_file(path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn tokio_fs_create_dir_all() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a/b/c");

        let fs = TokioFileSystem::new();
        fs.create_dir_all(&nested).await.unwrap();
        assert!(nested.exists());
    }

    #[tokio::test]
    async fn tokio_fs_rename_file() {
        let dir = TempDir::new().unwrap();
        let from = dir.path().join("a.part");
        let to = dir.path().join("a");
        std::fs::File::create(&from).unwrap();

        let fs = TokioFileSystem::new();
        fs.rename_file(&from, &to).await.unwrap();
        assert!(!from.exists());
        assert!(to.exists());
    }
}

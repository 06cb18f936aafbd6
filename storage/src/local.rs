//! Local-disk storage provider.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;

use crate::error::Result;
use crate::provider::StorageProvider;

/// Storage provider backed by the local filesystem via `tokio::fs`.
///
/// Paths are plain [`PathBuf`]s. A path is considered hidden when its final
/// segment starts with a dot.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

impl LocalStorage {
    /// Create a new local-disk provider.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StorageProvider for LocalStorage {
    type Path = PathBuf;

    async fn exists(&self, path: &PathBuf) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }

    async fn is_directory(&self, path: &PathBuf) -> bool {
        fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false)
    }

    async fn modified(&self, path: &PathBuf) -> Option<DateTime<Utc>> {
        let metadata = fs::metadata(path).await.ok()?;
        metadata.modified().ok().map(DateTime::<Utc>::from)
    }

    async fn size(&self, path: &PathBuf) -> Option<u64> {
        fs::metadata(path).await.ok().map(|m| m.len())
    }

    async fn list_children(&self, path: &PathBuf) -> Result<Vec<PathBuf>> {
        let mut entries = fs::read_dir(path).await?;
        let mut children = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            children.push(entry.path());
        }
        Ok(children)
    }

    fn file_name(&self, path: &PathBuf) -> Option<String> {
        path.file_name().map(|name| name.to_string_lossy().into_owned())
    }

    fn is_hidden(&self, path: &PathBuf) -> bool {
        self.file_name(path)
            .map_or(false, |name| name.starts_with('.'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::PathMeta;
    use std::path::Path;
    use tempfile::TempDir;
    use tokio::io::AsyncWriteExt;

    async fn write_file(path: &Path, contents: &[u8]) {
        let mut file = fs::File::create(path).await.unwrap();
        file.write_all(contents).await.unwrap();
        file.flush().await.unwrap();
    }

    #[tokio::test]
    async fn reports_existence_and_type() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new();

        let file = temp_dir.path().join("a.txt");
        write_file(&file, b"hello").await;

        assert!(storage.exists(&temp_dir.path().to_path_buf()).await);
        assert!(storage.is_directory(&temp_dir.path().to_path_buf()).await);
        assert!(storage.exists(&file).await);
        assert!(!storage.is_directory(&file).await);
        assert!(!storage.exists(&temp_dir.path().join("missing")).await);
    }

    #[tokio::test]
    async fn reports_size_and_mtime() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new();

        let file = temp_dir.path().join("sized.bin");
        write_file(&file, &[0u8; 128]).await;

        assert_eq!(storage.size(&file).await, Some(128));
        assert!(storage.modified(&file).await.is_some());
        assert!(storage.modified(&temp_dir.path().join("missing")).await.is_none());
    }

    #[tokio::test]
    async fn lists_direct_children() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new();

        write_file(&temp_dir.path().join("a.txt"), b"a").await;
        write_file(&temp_dir.path().join("b.txt"), b"b").await;
        fs::create_dir(temp_dir.path().join("sub")).await.unwrap();
        write_file(&temp_dir.path().join("sub").join("nested.txt"), b"n").await;

        let mut children = storage
            .list_children(&temp_dir.path().to_path_buf())
            .await
            .unwrap();
        children.sort();

        let names: Vec<_> = children
            .iter()
            .map(|c| storage.file_name(c).unwrap())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "sub"]);
    }

    #[tokio::test]
    async fn listing_a_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new();

        let result = storage
            .list_children(&temp_dir.path().join("missing"))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn stat_degrades_for_missing_paths() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new();

        let meta = storage.stat(&temp_dir.path().join("missing")).await;
        assert_eq!(meta, PathMeta::missing());

        let dir = storage.stat(&temp_dir.path().to_path_buf()).await;
        assert!(dir.exists);
        assert!(dir.is_directory);
        assert_eq!(dir.size, 0);
    }

    #[test]
    fn dot_files_are_hidden() {
        let storage = LocalStorage::new();
        assert!(storage.is_hidden(&PathBuf::from("/watch/.git")));
        assert!(!storage.is_hidden(&PathBuf::from("/watch/src")));
        assert_eq!(storage.file_name(&PathBuf::from("/")), None);
    }
}

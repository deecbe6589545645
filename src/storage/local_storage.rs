// ==========================================
// 学籍管理系统 - 本地目录存储实现
// ==========================================

use crate::storage::{FileStorage, StorageError, StorageResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 只保留最后一级文件名，去除路径穿越
    fn sanitize_file_name(file_name: &str) -> StorageResult<String> {
        let base = file_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or("")
            .trim();

        if base.is_empty() || base == "." || base == ".." {
            return Err(StorageError::InvalidFileName(file_name.to_string()));
        }

        Ok(base.to_string())
    }

    /// 生成带随机后缀的候选文件名: stem_xxxxxxx.ext
    fn suffixed_name(base: &str) -> String {
        let suffix: String = Uuid::new_v4().simple().to_string().chars().take(7).collect();
        let path = Path::new(base);
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(base);
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{}_{}.{}", stem, suffix, ext),
            None => format!("{}_{}", stem, suffix),
        }
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn store_uploaded_file(&self, bytes: &[u8], file_name: &str) -> StorageResult<String> {
        let base = Self::sanitize_file_name(file_name)?;

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StorageError::RootUnavailable(format!("{}: {}", self.root.display(), e)))?;

        let mut candidate = self.root.join(&base);
        // create_new 保证并发上传同名文件时不会互相覆盖
        loop {
            let open = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
                .await;

            match open {
                Ok(mut file) => {
                    use tokio::io::AsyncWriteExt;
                    file.write_all(bytes).await?;
                    file.flush().await?;
                    break;
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    candidate = self.root.join(Self::suffixed_name(&base));
                }
                Err(e) => return Err(e.into()),
            }
        }

        let location = candidate.display().to_string();
        debug!(file_name = %file_name, location = %location, "上传文件已保存");
        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name_strips_directories() {
        assert_eq!(
            LocalFileStorage::sanitize_file_name("../../etc/students.csv").unwrap(),
            "students.csv"
        );
        assert_eq!(
            LocalFileStorage::sanitize_file_name("C:\\uploads\\batch.xlsx").unwrap(),
            "batch.xlsx"
        );
        assert!(LocalFileStorage::sanitize_file_name("uploads/").is_err());
        assert!(LocalFileStorage::sanitize_file_name("..").is_err());
    }

    #[tokio::test]
    async fn test_store_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path());

        let first = storage.store_uploaded_file(b"one", "students.csv").await.unwrap();
        let second = storage.store_uploaded_file(b"two", "students.csv").await.unwrap();

        assert_ne!(first, second);
        assert!(second.ends_with(".csv"));
        assert_eq!(std::fs::read(&first).unwrap(), b"one");
        assert_eq!(std::fs::read(&second).unwrap(), b"two");
    }
}

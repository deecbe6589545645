// ==========================================
// 学籍管理系统 - 上传文件存储层
// ==========================================
// 职责: 以文件名为键保存上传的原始文件（不透明 blob 存储）
// 约束: 不覆盖已有文件，重名时追加随机后缀
// ==========================================

pub mod local_storage;

pub use local_storage::LocalFileStorage;

use async_trait::async_trait;
use thiserror::Error;

/// 存储层错误类型
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("文件名无效: {0}")]
    InvalidFileName(String),

    #[error("文件写入失败: {0}")]
    WriteError(String),

    #[error("存储目录不可用: {0}")]
    RootUnavailable(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::WriteError(err.to_string())
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

// ==========================================
// FileStorage Trait
// ==========================================
// 实现者: LocalFileStorage
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// 保存上传文件
    ///
    /// # 参数
    /// - bytes: 文件内容
    /// - file_name: 原始文件名
    ///
    /// # 返回
    /// - Ok(String): 存储位置（调用方视为不透明字符串）
    /// - Err: 写入失败
    async fn store_uploaded_file(&self, bytes: &[u8], file_name: &str) -> StorageResult<String>;
}

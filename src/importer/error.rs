// ==========================================
// 学籍管理系统 - 导入模块错误类型
// ==========================================
// 范围: 批次级失败（整批中止，仅保留上传文件审计记录）
// 行级问题不走错误通道，见 domain::import::RowIssue
// 工具: thiserror 派生宏
// ==========================================

use crate::domain::types::ReasonCode;
use crate::repository::error::RepositoryError;
use crate::storage::StorageError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件结构错误 =====
    #[error("文件为空: 未找到表头行")]
    EmptyFile,

    #[error("表头不匹配: 期望 [{}]，实际 [{}]", .expected.join(", "), .found.join(", "))]
    HeaderMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("文件过大: 数据行数超过上限 {limit}")]
    FileTooLarge { limit: usize },

    #[error("文件格式不支持: {0}（仅支持 .csv/.xlsx/.xls/.ods）")]
    UnsupportedFormat(String),

    #[error("文件解析失败: {0}")]
    MalformedFile(String),

    // ===== 存储错误 =====
    #[error("上传文件存储失败: {0}")]
    StorageFailure(String),
}

impl ImportError {
    /// 映射为导入报告中的原因码
    pub fn reason_code(&self) -> ReasonCode {
        match self {
            ImportError::EmptyFile => ReasonCode::EmptyFile,
            ImportError::HeaderMismatch { .. } => ReasonCode::HeaderMismatch,
            ImportError::FileTooLarge { .. } => ReasonCode::FileTooLarge,
            ImportError::UnsupportedFormat(_) => ReasonCode::UnsupportedFormat,
            ImportError::MalformedFile(_) => ReasonCode::MalformedFile,
            ImportError::StorageFailure(_) => ReasonCode::StorageFailure,
        }
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::MalformedFile(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::MalformedFile(err.to_string())
    }
}

// 上传文件落盘失败
impl From<StorageError> for ImportError {
    fn from(err: StorageError) -> Self {
        ImportError::StorageFailure(err.to_string())
    }
}

// 审计记录写库失败（此时尚未处理任何数据行）
impl From<RepositoryError> for ImportError {
    fn from(err: RepositoryError) -> Self {
        ImportError::StorageFailure(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_mismatch_message_names_both_sides() {
        let err = ImportError::HeaderMismatch {
            expected: vec!["Name".to_string(), "Gender".to_string()],
            found: vec!["Gender".to_string(), "Name".to_string()],
        };

        let msg = err.to_string();
        assert!(msg.contains("Name, Gender"));
        assert!(msg.contains("Gender, Name"));
        assert_eq!(err.reason_code(), ReasonCode::HeaderMismatch);
    }

    #[test]
    fn test_storage_errors_map_to_storage_failure() {
        let err: ImportError = StorageError::WriteError("disk full".to_string()).into();
        assert_eq!(err.reason_code(), ReasonCode::StorageFailure);

        let err: ImportError = RepositoryError::LockError("poisoned".to_string()).into();
        assert_eq!(err.reason_code(), ReasonCode::StorageFailure);
    }
}

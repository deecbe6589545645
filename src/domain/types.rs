// ==========================================
// 学籍管理系统 - 领域类型定义
// ==========================================
// 职责: 导入管道共享的枚举类型（字段类型/原因码/文件格式）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

// ==========================================
// 字段类型 (Field Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Date,    // 日期（DD-MM-YYYY）
    Text,    // 文本（TRIM）
    Boolean, // 布尔（"yes" → true）
    EnumRef, // 外部引用（如专业代码）
}

// ==========================================
// 原因码 (Reason Code)
// ==========================================
// 批次级: EmptyFile / HeaderMismatch / FileTooLarge / MalformedFile / UnsupportedFormat / StorageFailure
// 行级拒绝: MissingField / InvalidDate / PersistenceConflict
// 行级警告: UnresolvedReference（行仍被接收）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReasonCode {
    EmptyFile,
    HeaderMismatch,
    FileTooLarge,
    MalformedFile,
    UnsupportedFormat,
    StorageFailure,
    MissingField,
    InvalidDate,
    UnresolvedReference,
    PersistenceConflict,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::EmptyFile => "EmptyFile",
            ReasonCode::HeaderMismatch => "HeaderMismatch",
            ReasonCode::FileTooLarge => "FileTooLarge",
            ReasonCode::MalformedFile => "MalformedFile",
            ReasonCode::UnsupportedFormat => "UnsupportedFormat",
            ReasonCode::StorageFailure => "StorageFailure",
            ReasonCode::MissingField => "MissingField",
            ReasonCode::InvalidDate => "InvalidDate",
            ReasonCode::UnresolvedReference => "UnresolvedReference",
            ReasonCode::PersistenceConflict => "PersistenceConflict",
        }
    }

    /// 是否为批次级原因（整批中止）
    pub fn is_batch_level(&self) -> bool {
        matches!(
            self,
            ReasonCode::EmptyFile
                | ReasonCode::HeaderMismatch
                | ReasonCode::FileTooLarge
                | ReasonCode::MalformedFile
                | ReasonCode::UnsupportedFormat
                | ReasonCode::StorageFailure
        )
    }

    pub const ALL: [ReasonCode; 10] = [
        ReasonCode::EmptyFile,
        ReasonCode::HeaderMismatch,
        ReasonCode::FileTooLarge,
        ReasonCode::MalformedFile,
        ReasonCode::UnsupportedFormat,
        ReasonCode::StorageFailure,
        ReasonCode::MissingField,
        ReasonCode::InvalidDate,
        ReasonCode::UnresolvedReference,
        ReasonCode::PersistenceConflict,
    ];

    /// 从数据库字符串解析（未知值 → None）
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|code| code.as_str() == raw.trim())
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 上传文件声明格式 (Declared Format)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeclaredFormat {
    Csv,         // 分隔文本（固定表头行）
    Spreadsheet, // 电子表格（xlsx/xls/ods，首个工作表）
}

impl DeclaredFormat {
    /// 根据文件扩展名推断格式
    ///
    /// # 返回
    /// - Some(format): 支持的扩展名
    /// - None: 不支持的扩展名
    pub fn from_file_name<P: AsRef<Path>>(file_name: P) -> Option<Self> {
        let ext = file_name
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" | "txt" => Some(DeclaredFormat::Csv),
            "xlsx" | "xlsm" | "xls" | "ods" => Some(DeclaredFormat::Spreadsheet),
            _ => None,
        }
    }
}

impl fmt::Display for DeclaredFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclaredFormat::Csv => write!(f, "CSV"),
            DeclaredFormat::Spreadsheet => write!(f, "SPREADSHEET"),
        }
    }
}

// ==========================================
// 引用类型 (Reference Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferenceKind {
    Department, // 专业/系别代码
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceKind::Department => write!(f, "DEPARTMENT"),
        }
    }
}

// ==========================================
// 学生列表过滤 (Student Status Filter)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StudentStatusFilter {
    #[default]
    All,                 // 全部学生
    PendingVerification, // 在籍且未核验
    Verified,            // 在籍且已核验
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_format_from_file_name() {
        assert_eq!(
            DeclaredFormat::from_file_name("students.CSV"),
            Some(DeclaredFormat::Csv)
        );
        assert_eq!(
            DeclaredFormat::from_file_name("/tmp/2024 batch.xlsx"),
            Some(DeclaredFormat::Spreadsheet)
        );
        assert_eq!(DeclaredFormat::from_file_name("notes.pdf"), None);
        assert_eq!(DeclaredFormat::from_file_name("no_extension"), None);
    }

    #[test]
    fn test_reason_code_levels() {
        assert!(ReasonCode::HeaderMismatch.is_batch_level());
        assert!(ReasonCode::StorageFailure.is_batch_level());
        assert!(!ReasonCode::MissingField.is_batch_level());
        assert!(!ReasonCode::UnresolvedReference.is_batch_level());
        assert_eq!(ReasonCode::InvalidDate.to_string(), "InvalidDate");
    }
}

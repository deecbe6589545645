// ==========================================
// 学籍管理系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含导入流程逻辑
// ==========================================

pub mod import;
pub mod student;
pub mod types;

// 重导出核心类型
pub use import::{
    AcceptedRow, BatchFailure, ColumnSpec, ImportBatch, ImportReport, ImportRequest,
    ImportSchema, ImportedStudent, ParsedTable, RawRow, RowIssue, RowOutcome, RowRejection,
    RowWarning, UploadedFileRecord,
};
pub use student::{DepartmentRef, NormalizedRecord, Student, StudentPage, StudentQuery};
pub use types::{DeclaredFormat, FieldKind, ReasonCode, ReferenceKind, StudentStatusFilter};

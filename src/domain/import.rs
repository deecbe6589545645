// ==========================================
// 学籍管理系统 - 导入领域模型
// ==========================================
// 用途: 导入管道中间产物与导入结果
// 流程: RawRow → RowOutcome → ImportReport
// ==========================================

use crate::domain::student::NormalizedRecord;
use crate::domain::types::{DeclaredFormat, FieldKind, ReasonCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// ImportRequest - 一次上传
// ==========================================
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub format: DeclaredFormat,
}

impl ImportRequest {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>, format: DeclaredFormat) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            format,
        }
    }
}

// ==========================================
// ColumnSpec / ImportSchema - 导入模式
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSpec {
    pub header: &'static str,     // 文件表头
    pub field_name: &'static str, // 报告中使用的字段名
    pub required: bool,
    pub kind: FieldKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportSchema {
    pub name: &'static str,
    pub columns: Vec<ColumnSpec>,
}

impl ImportSchema {
    /// 按表头顺序返回期望列名
    pub fn headers(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.header).collect()
    }
}

// ==========================================
// RawRow - 原始数据行
// ==========================================
// 生命周期: 仅在解析/规范化阶段存在
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    pub row_number: usize,             // 数据行号（从 1 开始，不含表头）
    pub cells: Vec<(String, String)>,  // (列名, 原始值)，保持文件列顺序
}

impl RawRow {
    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v.as_str())
    }

    /// 所有单元格均为空白
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, v)| v.trim().is_empty())
    }
}

// ==========================================
// ParsedTable - 文件解析结果
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ParsedTable {
    pub headers: Vec<String>, // 已规范化表头
    pub rows: Vec<RawRow>,    // 非空数据行（行号保留文件位置）
}

// ==========================================
// RowRejection / RowWarning - 行级问题
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowIssue {
    pub row_number: usize,
    pub reason: ReasonCode,
    pub field: Option<String>, // 出错字段（schema 字段名）
    pub value: Option<String>, // 出错原始值
    pub detail: String,        // 可读描述
}

pub type RowRejection = RowIssue;
pub type RowWarning = RowIssue;

// ==========================================
// RowOutcome - 行结果
// ==========================================
// Accepted 携带引用解析产生的警告
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Accepted(AcceptedRow),
    Rejected(RowRejection),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedRow {
    pub row_number: usize,
    pub record: NormalizedRecord,
    pub warnings: Vec<RowWarning>,
}

// ==========================================
// UploadedFileRecord - 上传文件审计记录
// ==========================================
// 每次上传写入一次，不修改、不删除
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFileRecord {
    pub upload_id: String,        // UUID
    pub file_name: String,        // 原始文件名
    pub storage_location: String, // 存储位置（由存储协作方返回）
    pub uploaded_at: DateTime<Utc>,
}

// ==========================================
// BatchFailure - 批次级失败
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFailure {
    pub reason: ReasonCode,
    pub detail: String,
}

// ==========================================
// ImportedStudent - 已落库行
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedStudent {
    pub row_number: usize,
    pub student_id: i64,
    pub admission_number: String,
}

// ==========================================
// ImportReport - 导入报告
// ==========================================
// 不变式: accepted_count + rejected_count == total_rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub batch_id: String,
    pub upload: Option<UploadedFileRecord>,
    pub failure: Option<BatchFailure>,
    pub total_rows: usize,
    pub accepted_count: usize,
    pub rejected_count: usize,
    pub accepted: Vec<ImportedStudent>,
    pub rejections: Vec<RowRejection>,
    pub warnings: Vec<RowWarning>,
    pub elapsed_ms: u64,
}

impl ImportReport {
    /// 批次级失败报告（零接收，单一顶层原因）
    pub fn batch_failed(
        batch_id: String,
        upload: Option<UploadedFileRecord>,
        failure: BatchFailure,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            batch_id,
            upload,
            failure: Some(failure),
            total_rows: 0,
            accepted_count: 0,
            rejected_count: 0,
            accepted: Vec::new(),
            rejections: Vec::new(),
            warnings: Vec::new(),
            elapsed_ms,
        }
    }

    pub fn is_batch_failure(&self) -> bool {
        self.failure.is_some()
    }

    /// 已落库学生 ID 列表（按行号顺序）
    pub fn persisted_ids(&self) -> Vec<i64> {
        self.accepted.iter().map(|a| a.student_id).collect()
    }
}

// ==========================================
// ImportBatch - 导入批次审计记录
// ==========================================
// 对齐: db.rs import_batch 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportBatch {
    pub batch_id: String,
    pub upload_id: Option<String>,
    pub total_rows: i64,
    pub accepted_rows: i64,
    pub rejected_rows: i64,
    pub warning_rows: i64,
    pub failure_reason: Option<ReasonCode>,
    pub imported_at: DateTime<Utc>,
    pub elapsed_ms: i64,
    pub report_json: Option<String>,
}

impl ImportBatch {
    pub fn from_report(report: &ImportReport, imported_at: DateTime<Utc>) -> Self {
        Self {
            batch_id: report.batch_id.clone(),
            upload_id: report.upload.as_ref().map(|u| u.upload_id.clone()),
            total_rows: report.total_rows as i64,
            accepted_rows: report.accepted_count as i64,
            rejected_rows: report.rejected_count as i64,
            warning_rows: report.warnings.len() as i64,
            failure_reason: report.failure.as_ref().map(|f| f.reason),
            imported_at,
            elapsed_ms: report.elapsed_ms as i64,
            report_json: serde_json::to_string(report).ok(),
        }
    }
}

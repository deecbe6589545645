// ==========================================
// 学籍管理系统 - 学生导入 Trait
// ==========================================
// 职责: 定义学生导入接口（不包含实现）
// 管道: 文件解析 → 表头校验 → 行规范化 → 引用解析 → 逐行落库
// ==========================================

use crate::domain::import::{ImportReport, ImportRequest, ImportSchema, ParsedTable};
use crate::importer::error::ImportResult;
use async_trait::async_trait;
use chrono::NaiveDate;

// ==========================================
// StudentImporter Trait
// ==========================================
// 用途: 学生导入主接口
// 实现者: StudentImporterImpl
#[async_trait]
pub trait StudentImporter: Send + Sync {
    /// 导入单个上传文件
    ///
    /// # 参数
    /// - request: 文件名 + 文件字节 + 声明格式
    ///
    /// # 返回
    /// - ImportReport: 总是返回报告；批次级失败记录在 report.failure 中
    ///
    /// # 导入流程
    /// 0. 保存上传文件并写入审计记录（失败 → StorageFailure）
    /// 1. 文件解析 + 表头校验（EmptyFile / HeaderMismatch / FileTooLarge）
    /// 2. 逐行规范化（MissingField / InvalidDate）
    /// 3. 专业代码解析（UnresolvedReference 仅警告）
    /// 4. 逐行独立事务落库（PersistenceConflict 不影响其他行）
    async fn import_file(&self, request: ImportRequest) -> ImportReport;

    /// 批量导入多个文件（并发执行）
    ///
    /// # 说明
    /// - 每个文件的导入是独立的，互不影响
    /// - 返回顺序与入参顺序一致
    async fn batch_import(&self, requests: Vec<ImportRequest>) -> Vec<ImportReport>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件字节为表头 + 原始数据行
    ///
    /// # 参数
    /// - bytes: 文件内容
    /// - schema: 期望表头；不符时在读取任何数据行之前返回
    /// - max_rows: 允许的最大数据行数（超出 → FileTooLarge）
    ///
    /// # 返回
    /// - Ok(ParsedTable): 规范化表头 + 非空数据行
    /// - Err: EmptyFile / HeaderMismatch / FileTooLarge / MalformedFile
    fn parse_table(
        &self,
        bytes: &[u8],
        schema: &ImportSchema,
        max_rows: usize,
    ) -> ImportResult<ParsedTable>;
}

// ==========================================
// DataCleaner Trait
// ==========================================
// 用途: 单元格清洗接口
// 实现者: DataCleanerImpl
pub trait DataCleaner: Send + Sync {
    /// 清洗文本字段（TRIM）
    fn clean_text(&self, value: &str) -> String;

    /// 标准化 NULL 值（空字符串/空白 → None）
    fn normalize_null(&self, value: Option<&str>) -> Option<String>;

    /// 清洗引用代码（TRIM + UPPER，空白 → None）
    fn clean_code(&self, value: Option<&str>) -> Option<String>;

    /// 解析日期（DD-MM-YYYY → NaiveDate）
    fn parse_date_dmy(&self, value: &str) -> Result<NaiveDate, chrono::ParseError>;

    /// 解析是/否标志（TRIM 后不区分大小写等于 "yes" → true，其余 → false）
    fn parse_yes_flag(&self, value: Option<&str>) -> bool;
}

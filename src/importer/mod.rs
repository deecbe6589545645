// ==========================================
// 学籍管理系统 - 导入层
// ==========================================
// 职责: 上传文件 → 学生记录
// 阶段: 模式注册表 → 行规范化 → 引用解析 → 批量导入
// 支持: CSV, 电子表格（xlsx/xls/ods）
// ==========================================

// 模块声明
pub mod data_cleaner;
pub mod error;
pub mod file_parser;
pub mod reference_resolver;
pub mod row_normalizer;
pub mod schema;
pub mod student_importer_impl;
pub mod student_importer_trait;

// 重导出核心类型
pub use data_cleaner::DataCleaner as DataCleanerImpl;
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use reference_resolver::{ReferenceResolver, Resolution};
pub use row_normalizer::RowNormalizer;
pub use schema::{expected_columns, student_schema};
pub use student_importer_impl::StudentImporterImpl;

// 重导出 Trait 接口
pub use student_importer_trait::{DataCleaner, FileParser, StudentImporter};

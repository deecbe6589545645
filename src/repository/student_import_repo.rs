// ==========================================
// 学籍管理系统 - 学生导入 Repository Trait
// ==========================================
// 职责: 定义导入相关数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::import::{ImportBatch, UploadedFileRecord};
use crate::domain::student::NormalizedRecord;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// StudentImportRepository Trait
// ==========================================
// 用途: 学生导入相关数据访问
// 实现者: StudentImportRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait StudentImportRepository: Send + Sync {
    // ===== 学生记录写入（逐条事务）=====

    /// 持久化单条学生记录（独立事务）
    ///
    /// # 参数
    /// - record: 规范化学生记录
    /// - batch_id: 来源导入批次
    ///
    /// # 返回
    /// - Ok(i64): 新学生 ID
    /// - Err(UniqueConstraintViolation): 入学编号已存在（仅该条回滚）
    async fn persist_student_record(
        &self,
        record: &NormalizedRecord,
        batch_id: &str,
    ) -> RepositoryResult<i64>;

    // ===== 审计记录 =====

    /// 写入上传文件审计记录（只增不改）
    async fn insert_uploaded_file(&self, upload: &UploadedFileRecord) -> RepositoryResult<()>;

    /// 写入导入批次记录
    async fn insert_import_batch(&self, batch: &ImportBatch) -> RepositoryResult<()>;

    /// 上传文件列表（按上传时间倒序）
    async fn list_uploaded_files(&self) -> RepositoryResult<Vec<UploadedFileRecord>>;

    /// 最近导入批次（按导入时间倒序）
    async fn get_recent_batches(&self, limit: usize) -> RepositoryResult<Vec<ImportBatch>>;

    // ===== 查询 =====

    /// 入学编号是否已存在
    async fn exists_admission_number(&self, admission_number: &str) -> RepositoryResult<bool>;

    /// 学生总数
    async fn count_students(&self) -> RepositoryResult<usize>;
}

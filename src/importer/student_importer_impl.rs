// ==========================================
// 学籍管理系统 - 学生导入器实现
// ==========================================
// 职责: 整合导入流程，从上传文件到数据库
// 流程: 存档 → 表头校验 → 解析 → 规范化 → 引用解析 → 暂存 → 逐行落库 → 报告
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::import::{
    AcceptedRow, BatchFailure, ImportBatch, ImportReport, ImportRequest, ImportedStudent,
    ParsedTable, RowOutcome, RowRejection, RowWarning, UploadedFileRecord,
};
use crate::domain::types::{ReasonCode, ReferenceKind};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::reference_resolver::{ReferenceResolver, Resolution};
use crate::importer::row_normalizer::RowNormalizer;
use crate::importer::schema::fields;
use crate::importer::student_importer_trait::StudentImporter;
use crate::repository::StudentImportRepository;
use crate::storage::FileStorage;
use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// 配置读取失败时的最大行数
const FALLBACK_MAX_ROWS: usize = 5000;

// ==========================================
// StudentImporterImpl - 学生导入器实现
// ==========================================
pub struct StudentImporterImpl<R, S, C>
where
    R: StudentImportRepository,
    S: FileStorage,
    C: ImportConfigReader,
{
    // 数据访问层
    import_repo: R,

    // 上传文件存储
    storage: S,

    // 配置读取器
    config: C,

    // 导入组件
    file_parser: UniversalFileParser,
    normalizer: RowNormalizer,
    resolver: Arc<ReferenceResolver>,
}

impl<R, S, C> StudentImporterImpl<R, S, C>
where
    R: StudentImportRepository,
    S: FileStorage,
    C: ImportConfigReader,
{
    /// 创建新的 StudentImporter 实例
    ///
    /// # 参数
    /// - import_repo: 导入数据仓储
    /// - storage: 上传文件存储
    /// - config: 配置读取器
    /// - resolver: 专业引用解析器（可在多个导入器间共享缓存）
    pub fn new(import_repo: R, storage: S, config: C, resolver: Arc<ReferenceResolver>) -> Self {
        Self {
            import_repo,
            storage,
            config,
            file_parser: UniversalFileParser,
            normalizer: RowNormalizer::default(),
            resolver,
        }
    }

    // ===== 步骤 0: 上传文件存档 =====
    async fn archive_upload(&self, request: &ImportRequest) -> ImportResult<UploadedFileRecord> {
        let storage_location = self
            .storage
            .store_uploaded_file(&request.bytes, &request.file_name)
            .await?;

        let upload = UploadedFileRecord {
            upload_id: Uuid::new_v4().to_string(),
            file_name: request.file_name.clone(),
            storage_location,
            uploaded_at: Utc::now(),
        };
        self.import_repo.insert_uploaded_file(&upload).await?;

        Ok(upload)
    }

    async fn max_rows(&self) -> usize {
        match self.config.get_max_import_rows().await {
            Ok(limit) => limit,
            Err(e) => {
                warn!(error = %e, default = FALLBACK_MAX_ROWS, "读取最大导入行数失败，使用默认值");
                FALLBACK_MAX_ROWS
            }
        }
    }

    // ===== 步骤 1: 表头校验 + 解析（表头不符时不读取任何数据行）=====
    fn parse_and_validate(&self, request: &ImportRequest, max_rows: usize) -> ImportResult<ParsedTable> {
        self.file_parser
            .parse(&request.bytes, request.format, self.normalizer.schema(), max_rows)
    }

    // ===== 步骤 2 + 3: 规范化 + 引用解析（仅暂存，不落库）=====
    async fn stage_rows(&self, table: &ParsedTable) -> (Vec<AcceptedRow>, Vec<RowRejection>) {
        let mut staged = Vec::new();
        let mut rejections = Vec::new();

        for row in &table.rows {
            let mut accepted = match self.normalizer.normalize(row) {
                RowOutcome::Accepted(accepted) => accepted,
                RowOutcome::Rejected(rejection) => {
                    warn!(
                        row_number = rejection.row_number,
                        reason = %rejection.reason,
                        field = rejection.field.as_deref().unwrap_or(""),
                        "行被拒绝"
                    );
                    rejections.push(rejection);
                    continue;
                }
            };

            if let Some(code) = accepted.record.department_code.clone() {
                match self.resolver.resolve(&code, ReferenceKind::Department).await {
                    Some(Resolution::Resolved(department)) => {
                        accepted.record.department_ref = Some(department);
                    }
                    Some(Resolution::Unresolved) => {
                        warn!(row_number = row.row_number, code = %code, "专业代码无法解析");
                        accepted.warnings.push(RowWarning {
                            row_number: row.row_number,
                            reason: ReasonCode::UnresolvedReference,
                            field: Some(fields::DEPARTMENT_REF.to_string()),
                            value: Some(code.clone()),
                            detail: format!("未知专业代码: {}", code),
                        });
                    }
                    None => {}
                }
            }

            staged.push(accepted);
        }

        (staged, rejections)
    }

    // ===== 步骤 4: 逐行独立事务落库 =====
    async fn persist_rows(
        &self,
        batch_id: &str,
        staged: Vec<AcceptedRow>,
    ) -> (Vec<ImportedStudent>, Vec<RowWarning>, Vec<RowRejection>) {
        let mut accepted = Vec::new();
        let mut warnings = Vec::new();
        let mut conflicts = Vec::new();

        for row in staged {
            match self
                .import_repo
                .persist_student_record(&row.record, batch_id)
                .await
            {
                Ok(student_id) => {
                    accepted.push(ImportedStudent {
                        row_number: row.row_number,
                        student_id,
                        admission_number: row.record.admission_number,
                    });
                    warnings.extend(row.warnings);
                }
                Err(e) => {
                    warn!(
                        row_number = row.row_number,
                        admission_number = %row.record.admission_number,
                        error = %e,
                        "行落库失败"
                    );
                    conflicts.push(RowRejection {
                        row_number: row.row_number,
                        reason: ReasonCode::PersistenceConflict,
                        field: Some(fields::ADMISSION_NUMBER.to_string()),
                        value: Some(row.record.admission_number),
                        detail: e.to_string(),
                    });
                }
            }
        }

        (accepted, warnings, conflicts)
    }

    // ===== 步骤 5: 批次审计（尽力而为）=====
    async fn record_batch(&self, report: &ImportReport) {
        let batch = ImportBatch::from_report(report, Utc::now());
        if let Err(e) = self.import_repo.insert_import_batch(&batch).await {
            warn!(batch_id = %report.batch_id, error = %e, "导入批次记录写入失败");
        }
    }

    async fn fail_batch(
        &self,
        batch_id: String,
        upload: Option<UploadedFileRecord>,
        err: ImportError,
        started: Instant,
    ) -> ImportReport {
        error!(batch_id = %batch_id, reason = %err.reason_code(), error = %err, "导入批次失败");

        let report = ImportReport::batch_failed(
            batch_id,
            upload,
            BatchFailure {
                reason: err.reason_code(),
                detail: err.to_string(),
            },
            started.elapsed().as_millis() as u64,
        );
        self.record_batch(&report).await;
        report
    }
}

#[async_trait]
impl<R, S, C> StudentImporter for StudentImporterImpl<R, S, C>
where
    R: StudentImportRepository + Send + Sync,
    S: FileStorage + Send + Sync,
    C: ImportConfigReader + Send + Sync,
{
    #[instrument(skip(self, request), fields(batch_id))]
    async fn import_file(&self, request: ImportRequest) -> ImportReport {
        let started = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());

        info!(
            batch_id = %batch_id,
            file_name = %request.file_name,
            format = %request.format,
            bytes = request.bytes.len(),
            "开始导入学生数据"
        );

        // === 步骤 0: 上传文件存档 ===
        debug!("步骤 0: 上传文件存档");
        let upload = match self.archive_upload(&request).await {
            Ok(upload) => upload,
            Err(e) => return self.fail_batch(batch_id, None, e, started).await,
        };

        // === 步骤 1: 解析 + 表头校验 ===
        debug!("步骤 1: 解析文件");
        let max_rows = self.max_rows().await;
        let table = match self.parse_and_validate(&request, max_rows) {
            Ok(table) => table,
            Err(e) => return self.fail_batch(batch_id, Some(upload), e, started).await,
        };
        let total_rows = table.rows.len();
        info!(total_rows = total_rows, "文件解析完成");

        // === 步骤 2 + 3: 规范化 + 引用解析 ===
        debug!("步骤 2: 行规范化与引用解析");
        let (staged, mut rejections) = self.stage_rows(&table).await;
        info!(staged = staged.len(), rejected = rejections.len(), "行规范化完成");

        // === 步骤 4: 逐行落库 ===
        debug!("步骤 4: 逐行落库");
        let (accepted, warnings, conflicts) = self.persist_rows(&batch_id, staged).await;
        rejections.extend(conflicts);
        rejections.sort_by_key(|r| r.row_number);

        let report = ImportReport {
            batch_id,
            upload: Some(upload),
            failure: None,
            total_rows,
            accepted_count: accepted.len(),
            rejected_count: rejections.len(),
            accepted,
            rejections,
            warnings,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        self.record_batch(&report).await;

        info!(
            batch_id = %report.batch_id,
            total = report.total_rows,
            accepted = report.accepted_count,
            rejected = report.rejected_count,
            warnings = report.warnings.len(),
            elapsed_ms = report.elapsed_ms,
            "学生数据导入完成"
        );

        report
    }

    async fn batch_import(&self, requests: Vec<ImportRequest>) -> Vec<ImportReport> {
        info!(files = requests.len(), "开始批量导入");
        join_all(requests.into_iter().map(|request| self.import_file(request))).await
    }
}

// ==========================================
// 学生导入API
// ==========================================
// 职责: 封装学生导入相关功能（导入、上传记录、批次记录、专业维护）
// 说明: 所有导入共享同一个数据库连接与专业解析缓存
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, ImportConfigReader};
use crate::db::open_and_init;
use crate::domain::import::{ImportBatch, ImportReport, ImportRequest, UploadedFileRecord};
use crate::domain::types::DeclaredFormat;
use crate::importer::{ImportError, ReferenceResolver, StudentImporter, StudentImporterImpl};
use crate::repository::{
    DepartmentEntity, DepartmentRepositoryImpl, StudentImportRepository,
    StudentImportRepositoryImpl,
};
use crate::storage::LocalFileStorage;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

type DefaultImporter = StudentImporterImpl<StudentImportRepositoryImpl, LocalFileStorage, ConfigManager>;

/// 导入API
pub struct ImportApi {
    db_path: String,
    conn: Arc<Mutex<Connection>>,
    resolver: Arc<ReferenceResolver>,
}

impl ImportApi {
    /// 创建新的ImportApi实例（确保 schema 存在）
    pub fn new(db_path: &str) -> ApiResult<Self> {
        let conn = open_and_init(db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(format!("{}: {}", db_path, e)))?;
        let conn = Arc::new(Mutex::new(conn));

        let departments = DepartmentRepositoryImpl::from_connection(conn.clone());
        let resolver = Arc::new(ReferenceResolver::new(Arc::new(departments)));

        Ok(Self {
            db_path: db_path.to_string(),
            conn,
            resolver,
        })
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// 共享连接（供 StudentApi 复用）
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        self.conn.clone()
    }

    /// 配置管理器（共享连接）
    pub fn config(&self) -> ApiResult<ConfigManager> {
        Ok(ConfigManager::from_connection(self.conn.clone())?)
    }

    /// 从文件路径导入学生数据（格式由扩展名决定）
    ///
    /// # 返回
    /// - Ok(ImportReport): 导入报告（批次级失败也以报告形式返回）
    /// - Err(ApiError): 文件不可读 / 格式不支持
    pub async fn import_students(&self, file_path: &str) -> ApiResult<ImportReport> {
        let request = Self::read_request(file_path).await?;
        let importer = self.create_importer().await?;
        Ok(importer.import_file(request).await)
    }

    /// 并发导入多个文件（报告顺序与入参一致）
    pub async fn import_many(&self, file_paths: &[String]) -> ApiResult<Vec<ImportReport>> {
        let mut requests = Vec::with_capacity(file_paths.len());
        for path in file_paths {
            requests.push(Self::read_request(path).await?);
        }

        let importer = self.create_importer().await?;
        Ok(importer.batch_import(requests).await)
    }

    /// 从内存字节导入（上传场景）
    pub async fn import_bytes(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        format: DeclaredFormat,
    ) -> ApiResult<ImportReport> {
        let importer = self.create_importer().await?;
        Ok(importer
            .import_file(ImportRequest::new(file_name, bytes, format))
            .await)
    }

    /// 上传文件列表
    pub async fn list_uploaded_files(&self) -> ApiResult<Vec<UploadedFileRecord>> {
        let repo = StudentImportRepositoryImpl::from_connection(self.conn.clone());
        Ok(repo.list_uploaded_files().await?)
    }

    /// 最近导入批次（limit 限制在 1-100 之间）
    pub async fn recent_batches(&self, limit: usize) -> ApiResult<Vec<ImportBatch>> {
        let repo = StudentImportRepositoryImpl::from_connection(self.conn.clone());
        Ok(repo.get_recent_batches(limit.clamp(1, 100)).await?)
    }

    /// 新增或更新专业
    pub fn upsert_department(&self, code: &str, name: &str) -> ApiResult<i64> {
        let repo = DepartmentRepositoryImpl::from_connection(self.conn.clone());
        let id = repo.upsert_department(code, name)?;
        info!(code = %code, department_id = id, "专业已保存");
        Ok(id)
    }

    pub fn list_departments(&self) -> ApiResult<Vec<DepartmentEntity>> {
        let repo = DepartmentRepositoryImpl::from_connection(self.conn.clone());
        Ok(repo.list_departments()?)
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    async fn read_request(file_path: &str) -> ApiResult<ImportRequest> {
        let path = Path::new(file_path);
        let format = DeclaredFormat::from_file_name(path).ok_or_else(|| {
            let ext = path
                .extension()
                .map(|e| e.to_string_lossy().to_string())
                .unwrap_or_default();
            ApiError::from(ImportError::UnsupportedFormat(ext))
        })?;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ApiError::FileError(format!("{}: {}", file_path, e)))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file_path.to_string());

        Ok(ImportRequest::new(file_name, bytes, format))
    }

    /// 创建导入器
    async fn create_importer(&self) -> ApiResult<DefaultImporter> {
        let import_repo = StudentImportRepositoryImpl::from_connection(self.conn.clone());
        let config = ConfigManager::from_connection(self.conn.clone())?;
        let media_root = config.get_media_root().await?;
        let storage = LocalFileStorage::new(media_root);

        Ok(StudentImporterImpl::new(
            import_repo,
            storage,
            config,
            self.resolver.clone(),
        ))
    }
}

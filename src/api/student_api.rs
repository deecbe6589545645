// ==========================================
// 学生查询API
// ==========================================
// 职责: 学生列表（全部/待核验/已核验）、详情、核验
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, ImportConfigReader};
use crate::db::open_and_init;
use crate::domain::student::{Student, StudentPage, StudentQuery};
use crate::domain::types::StudentStatusFilter;
use crate::repository::{StudentRepository, StudentRepositoryImpl};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tracing::info;

/// 学生API
pub struct StudentApi {
    repo: StudentRepositoryImpl,
    config: ConfigManager,
}

impl StudentApi {
    pub fn new(db_path: &str) -> ApiResult<Self> {
        let conn = open_and_init(db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(format!("{}: {}", db_path, e)))?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ApiResult<Self> {
        Ok(Self {
            repo: StudentRepositoryImpl::from_connection(conn.clone()),
            config: ConfigManager::from_connection(conn)?,
        })
    }

    /// 查询学生列表
    ///
    /// # 参数
    /// - search: 搜索词（All: 姓名/入学编号模糊；其余: 入学编号精确）
    /// - status: 核验状态过滤
    /// - page: 页码（越界自动修正）
    /// - page_size: 每页条数（None → 配置 student_page_size）
    pub async fn list_students(
        &self,
        search: Option<&str>,
        status: StudentStatusFilter,
        page: usize,
        page_size: Option<usize>,
    ) -> ApiResult<StudentPage> {
        let page_size = match page_size {
            Some(size) => size.clamp(1, 100),
            None => self.config.get_student_page_size().await?,
        };

        let query = StudentQuery {
            search: search.map(str::to_string),
            status,
            page,
            page_size,
        };
        Ok(self.repo.list_students(&query).await?)
    }

    /// 学生详情
    pub async fn get_student(&self, student_id: i64) -> ApiResult<Student> {
        self.repo
            .get_student(student_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Student(id={})不存在", student_id)))
    }

    /// 标记学生信息已核验
    pub async fn verify_student(&self, student_id: i64) -> ApiResult<Student> {
        self.repo.mark_data_verified(student_id).await?;
        info!(student_id = student_id, "学生信息已核验");
        self.get_student(student_id).await
    }
}

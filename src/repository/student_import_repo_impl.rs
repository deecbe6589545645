// ==========================================
// 学籍管理系统 - 学生导入 Repository 实现
// ==========================================
// 职责: 实现导入相关数据访问（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// 事务: 每条学生记录独立事务，失败仅回滚该条
// ==========================================

use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::import::{ImportBatch, UploadedFileRecord};
use crate::domain::student::NormalizedRecord;
use crate::domain::types::ReasonCode;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::student_import_repo::StudentImportRepository;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, Transaction};
use std::sync::{Arc, Mutex};

// ==========================================
// StudentImportRepositoryImpl
// ==========================================
pub struct StudentImportRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl StudentImportRepositoryImpl {
    /// 创建新的 Repository 实例（确保 schema 存在）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path).map_err(|e| {
            RepositoryError::DatabaseConnectionError(format!("{}: {}", db_path, e))
        })?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        Ok(self.conn.lock()?)
    }

    /// 在事务中插入单条学生记录
    fn insert_student_tx(
        tx: &Transaction,
        record: &NormalizedRecord,
        batch_id: &str,
    ) -> RepositoryResult<i64> {
        let now = Utc::now();
        tx.execute(
            r#"
            INSERT INTO student (
                admission_number, registration_number, name, gender,
                date_of_birth, date_of_join, guardian, guardian_relation, address,
                department_id, department_code, religion, community, category,
                fee_concession, mobile, active, data_verified,
                source_batch_id, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
                ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21
            )
            "#,
            params![
                record.admission_number,
                record.registration_number,
                record.name,
                record.gender,
                record.date_of_birth,
                record.date_of_join,
                record.guardian,
                record.guardian_relation,
                record.address,
                record.department_ref.as_ref().map(|d| d.department_id),
                record.department_code,
                record.religion,
                record.community,
                record.category,
                record.fee_concession,
                record.mobile,
                record.active,
                record.data_verified,
                batch_id,
                now,
                now,
            ],
        )?;

        Ok(tx.last_insert_rowid())
    }
}

#[async_trait]
impl StudentImportRepository for StudentImportRepositoryImpl {
    async fn persist_student_record(
        &self,
        record: &NormalizedRecord,
        batch_id: &str,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        // 出错时 tx 被 drop，自动回滚
        let student_id = Self::insert_student_tx(&tx, record, batch_id)?;
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(student_id)
    }

    async fn insert_uploaded_file(&self, upload: &UploadedFileRecord) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO uploaded_file (upload_id, file_name, storage_location, uploaded_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                upload.upload_id,
                upload.file_name,
                upload.storage_location,
                upload.uploaded_at,
            ],
        )?;
        Ok(())
    }

    async fn insert_import_batch(&self, batch: &ImportBatch) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO import_batch (
                batch_id, upload_id, total_rows, accepted_rows, rejected_rows,
                warning_rows, failure_reason, imported_at, elapsed_ms, report_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                batch.batch_id,
                batch.upload_id,
                batch.total_rows,
                batch.accepted_rows,
                batch.rejected_rows,
                batch.warning_rows,
                batch.failure_reason.map(|r| r.as_str()),
                batch.imported_at,
                batch.elapsed_ms,
                batch.report_json,
            ],
        )?;
        Ok(())
    }

    async fn list_uploaded_files(&self) -> RepositoryResult<Vec<UploadedFileRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT upload_id, file_name, storage_location, uploaded_at
            FROM uploaded_file
            ORDER BY uploaded_at DESC, rowid DESC
            "#,
        )?;

        let files = stmt
            .query_map([], |row| {
                Ok(UploadedFileRecord {
                    upload_id: row.get(0)?,
                    file_name: row.get(1)?,
                    storage_location: row.get(2)?,
                    uploaded_at: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(files)
    }

    async fn get_recent_batches(&self, limit: usize) -> RepositoryResult<Vec<ImportBatch>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT batch_id, upload_id, total_rows, accepted_rows, rejected_rows,
                   warning_rows, failure_reason, imported_at, elapsed_ms, report_json
            FROM import_batch
            ORDER BY imported_at DESC, rowid DESC
            LIMIT ?1
            "#,
        )?;

        let batches = stmt
            .query_map(params![limit as i64], |row| {
                let failure_reason: Option<String> = row.get(6)?;
                Ok(ImportBatch {
                    batch_id: row.get(0)?,
                    upload_id: row.get(1)?,
                    total_rows: row.get(2)?,
                    accepted_rows: row.get(3)?,
                    rejected_rows: row.get(4)?,
                    warning_rows: row.get(5)?,
                    failure_reason: failure_reason.as_deref().and_then(ReasonCode::parse),
                    imported_at: row.get(7)?,
                    elapsed_ms: row.get(8)?,
                    report_json: row.get(9)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(batches)
    }

    async fn exists_admission_number(&self, admission_number: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM student WHERE admission_number = ?1",
            params![admission_number],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    async fn count_students(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM student", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

// ==========================================
// 学籍管理系统 - 专业（Department）仓储
// ==========================================
// 职责: 管理 department 表；为导入管道提供专业代码查找
// 说明: code 列 COLLATE NOCASE，查找不区分大小写
// ==========================================

use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::student::DepartmentRef;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

// ==========================================
// DepartmentLookup Trait
// ==========================================
// 用途: 导入管道的专业代码查找协作方
// 实现者: DepartmentRepositoryImpl（rusqlite）；测试中可替换为内存实现
#[async_trait]
pub trait DepartmentLookup: Send + Sync {
    /// 按代码查找专业
    ///
    /// # 参数
    /// - code: 已 TRIM 的专业代码
    ///
    /// # 返回
    /// - Ok(Some): 找到
    /// - Ok(None): 不存在
    async fn lookup_department(&self, code: &str) -> RepositoryResult<Option<DepartmentRef>>;
}

/// 专业实体
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentEntity {
    pub department_id: i64,
    pub code: String,
    pub name: String,
}

pub struct DepartmentRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl DepartmentRepositoryImpl {
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

    /// 新增或更新专业（按 code 不区分大小写）
    ///
    /// # 返回
    /// - Ok(i64): department_id
    pub fn upsert_department(&self, code: &str, name: &str) -> RepositoryResult<i64> {
        let code = code.trim();
        if code.is_empty() {
            return Err(RepositoryError::FieldValueError {
                field: "code".to_string(),
                message: "专业代码不能为空".to_string(),
            });
        }

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO department (code, name) VALUES (?1, ?2)
            ON CONFLICT(code) DO UPDATE SET name = excluded.name
            "#,
            params![code, name.trim()],
        )?;

        let id = conn.query_row(
            "SELECT department_id FROM department WHERE code = ?1",
            params![code],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// 列出全部专业（按代码排序）
    pub fn list_departments(&self) -> RepositoryResult<Vec<DepartmentEntity>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT department_id, code, name FROM department ORDER BY code")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(DepartmentEntity {
                    department_id: row.get(0)?,
                    code: row.get(1)?,
                    name: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[async_trait]
impl DepartmentLookup for DepartmentRepositoryImpl {
    async fn lookup_department(&self, code: &str) -> RepositoryResult<Option<DepartmentRef>> {
        let conn = self.get_conn()?;
        let found = conn
            .query_row(
                "SELECT department_id, code FROM department WHERE code = ?1",
                params![code.trim()],
                |row| {
                    Ok(DepartmentRef {
                        department_id: row.get(0)?,
                        code: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> DepartmentRepositoryImpl {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        DepartmentRepositoryImpl::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[tokio::test]
    async fn test_lookup_is_case_insensitive() {
        let repo = repo();
        let id = repo.upsert_department("CSE", "Computer Science").unwrap();

        let found = repo.lookup_department(" cse ").await.unwrap().unwrap();
        assert_eq!(found.department_id, id);
        assert_eq!(found.code, "CSE");

        assert!(repo.lookup_department("MECH").await.unwrap().is_none());
    }

    #[test]
    fn test_upsert_keeps_id() {
        let repo = repo();
        let first = repo.upsert_department("ECE", "Electronics").unwrap();
        let second = repo.upsert_department("ece", "Electronics & Comm").unwrap();

        assert_eq!(first, second);
        let all = repo.list_departments().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Electronics & Comm");
    }

    #[test]
    fn test_blank_code_rejected() {
        let repo = repo();
        assert!(matches!(
            repo.upsert_department("  ", "x"),
            Err(RepositoryError::FieldValueError { .. })
        ));
    }
}

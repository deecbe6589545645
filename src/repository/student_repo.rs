// ==========================================
// 学籍管理系统 - 学生查询 Repository
// ==========================================
// 职责: 学生列表（过滤/搜索/分页）、详情、核验标记
// 分页: 页码越界自动修正（< 1 → 1，超出末页 → 末页）
// ==========================================

use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::student::{DepartmentRef, NormalizedRecord, Student, StudentPage, StudentQuery};
use crate::domain::types::StudentStatusFilter;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// StudentRepository Trait
// ==========================================
#[async_trait]
pub trait StudentRepository: Send + Sync {
    /// 分页查询学生列表（按入学编号排序）
    async fn list_students(&self, query: &StudentQuery) -> RepositoryResult<StudentPage>;

    /// 按 ID 查询学生
    async fn get_student(&self, student_id: i64) -> RepositoryResult<Option<Student>>;

    /// 标记为已核验
    ///
    /// # 返回
    /// - Err(NotFound): 学生不存在
    async fn mark_data_verified(&self, student_id: i64) -> RepositoryResult<()>;
}

const STUDENT_COLUMNS: &str = r#"
    student_id, admission_number, registration_number, name, gender,
    date_of_birth, date_of_join, guardian, guardian_relation, address,
    department_id, department_code, religion, community, category,
    fee_concession, mobile, active, data_verified,
    source_batch_id, created_at, updated_at
"#;

fn map_student_row(row: &Row) -> rusqlite::Result<Student> {
    let department_id: Option<i64> = row.get(10)?;
    let department_code: Option<String> = row.get(11)?;

    Ok(Student {
        student_id: row.get(0)?,
        record: NormalizedRecord {
            admission_number: row.get(1)?,
            registration_number: row.get(2)?,
            name: row.get(3)?,
            gender: row.get(4)?,
            date_of_birth: row.get(5)?,
            date_of_join: row.get(6)?,
            guardian: row.get(7)?,
            guardian_relation: row.get(8)?,
            address: row.get(9)?,
            department_ref: department_id.map(|id| DepartmentRef {
                department_id: id,
                code: department_code.clone().unwrap_or_default(),
            }),
            department_code,
            religion: row.get(12)?,
            community: row.get(13)?,
            category: row.get(14)?,
            fee_concession: row.get(15)?,
            mobile: row.get(16)?,
            active: row.get(17)?,
            data_verified: row.get(18)?,
        },
        source_batch_id: row.get(19)?,
        created_at: row.get(20)?,
        updated_at: row.get(21)?,
    })
}

/// 计算分页（total_pages 至少为 1，页码修正到 [1, total_pages]）
///
/// # 返回
/// - (page, page_size, total_pages)
pub fn clamp_page(page: usize, page_size: usize, total: usize) -> (usize, usize, usize) {
    let page_size = page_size.max(1);
    let total_pages = total.div_ceil(page_size).max(1);
    let page = page.clamp(1, total_pages);
    (page, page_size, total_pages)
}

/// 转义 LIKE 通配符（% _ 及转义符本身按字面匹配）
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// 构造过滤条件
fn build_filter(query: &StudentQuery) -> (String, Vec<String>) {
    let mut clauses: Vec<&str> = Vec::new();
    let mut args: Vec<String> = Vec::new();
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    match query.status {
        StudentStatusFilter::All => {
            if let Some(s) = search {
                // LIKE 对 ASCII 不区分大小写
                clauses.push("(name LIKE ?1 ESCAPE '\\' OR admission_number LIKE ?1 ESCAPE '\\')");
                args.push(format!("%{}%", escape_like(s)));
            }
        }
        StudentStatusFilter::PendingVerification | StudentStatusFilter::Verified => {
            clauses.push("active = 1");
            clauses.push(if query.status == StudentStatusFilter::Verified {
                "data_verified = 1"
            } else {
                "data_verified = 0"
            });
            if let Some(s) = search {
                clauses.push("admission_number = ?1");
                args.push(s.to_string());
            }
        }
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    (where_sql, args)
}

pub struct StudentRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl StudentRepositoryImpl {
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
}

#[async_trait]
impl StudentRepository for StudentRepositoryImpl {
    async fn list_students(&self, query: &StudentQuery) -> RepositoryResult<StudentPage> {
        let (where_sql, args) = build_filter(query);
        let conn = self.get_conn()?;

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM student {}", where_sql),
            params_from_iter(args.iter()),
            |row| row.get(0),
        )?;
        let total = total as usize;
        let (page, page_size, total_pages) = clamp_page(query.page, query.page_size, total);

        let sql = format!(
            "SELECT {} FROM student {} ORDER BY admission_number LIMIT {} OFFSET {}",
            STUDENT_COLUMNS,
            where_sql,
            page_size,
            (page - 1) * page_size
        );
        let mut stmt = conn.prepare(&sql)?;
        let students = stmt
            .query_map(params_from_iter(args.iter()), map_student_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(StudentPage {
            students,
            total,
            page,
            page_size,
            total_pages,
        })
    }

    async fn get_student(&self, student_id: i64) -> RepositoryResult<Option<Student>> {
        let conn = self.get_conn()?;
        let student = conn
            .query_row(
                &format!("SELECT {} FROM student WHERE student_id = ?1", STUDENT_COLUMNS),
                params![student_id],
                map_student_row,
            )
            .optional()?;
        Ok(student)
    }

    async fn mark_data_verified(&self, student_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let updated = conn.execute(
            "UPDATE student SET data_verified = 1, updated_at = ?2 WHERE student_id = ?1",
            params![student_id, Utc::now()],
        )?;

        if updated == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Student".to_string(),
                id: student_id.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_page() {
        assert_eq!(clamp_page(1, 10, 0), (1, 10, 1));
        assert_eq!(clamp_page(0, 10, 25), (1, 10, 3));
        assert_eq!(clamp_page(9, 10, 25), (3, 10, 3));
        assert_eq!(clamp_page(2, 0, 3), (2, 1, 3));
    }

    #[test]
    fn test_build_filter_all_with_search() {
        let query = StudentQuery {
            search: Some(" anj ".to_string()),
            ..Default::default()
        };
        let (sql, args) = build_filter(&query);
        assert!(sql.contains("LIKE"));
        assert_eq!(args, vec!["%anj%".to_string()]);
    }

    #[test]
    fn test_build_filter_pending_exact_match() {
        let query = StudentQuery {
            search: Some("A001".to_string()),
            status: StudentStatusFilter::PendingVerification,
            ..Default::default()
        };
        let (sql, args) = build_filter(&query);
        assert!(sql.contains("data_verified = 0"));
        assert!(sql.contains("admission_number = ?1"));
        assert_eq!(args, vec!["A001".to_string()]);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b\\c"), "a\\_b\\\\c");
        assert_eq!(escape_like("Anjali"), "Anjali");
    }

    #[tokio::test]
    async fn test_search_wildcards_match_literally() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        let now = Utc::now();
        for (adm, name) in [("A_01", "Anjali"), ("AB01", "Rahul"), ("C001", "100% Kumar")] {
            conn.execute(
                "INSERT INTO student (admission_number, name, date_of_birth, created_at, updated_at)
                 VALUES (?1, ?2, '2005-12-31', ?3, ?3)",
                params![adm, name, now],
            )
            .unwrap();
        }
        let repo = StudentRepositoryImpl::from_connection(Arc::new(Mutex::new(conn)));

        let search = |text: &str| StudentQuery {
            search: Some(text.to_string()),
            ..Default::default()
        };

        // "_" 不再匹配任意单字符
        let page = repo.list_students(&search("A_")).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.students[0].record.admission_number, "A_01");

        // "%" 不再匹配任意字符串
        let page = repo.list_students(&search("0%")).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.students[0].record.name, "100% Kumar");

        // 普通子串仍不区分大小写
        let page = repo.list_students(&search("rAhU")).await.unwrap();
        assert_eq!(page.total, 1);
    }
}

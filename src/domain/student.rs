// ==========================================
// 学籍管理系统 - 学生领域模型
// ==========================================
// 用途: 导入层写入（NormalizedRecord），查询层读取（Student）
// 对齐: db.rs student / department 表
// ==========================================

use crate::domain::types::StudentStatusFilter;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// DepartmentRef - 已解析的专业标识
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentRef {
    pub department_id: i64, // department 表主键
    pub code: String,       // 规范化后的专业代码
}

// ==========================================
// NormalizedRecord - 规范化学生记录
// ==========================================
// 生命周期: 导入管道独占，落库后所有权交给仓储层
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    // ===== 主键候选 =====
    pub admission_number: String,    // 入学编号（唯一）
    pub registration_number: String, // 报名/注册编号（APPN NO）

    // ===== 基础信息 =====
    pub name: String,
    pub gender: String,
    pub date_of_birth: NaiveDate,
    pub date_of_join: Option<NaiveDate>,

    // ===== 监护人 =====
    pub guardian: String,
    pub guardian_relation: String,
    pub address: String,

    // ===== 专业引用 =====
    pub department_ref: Option<DepartmentRef>, // 解析失败时为 None
    pub department_code: Option<String>,       // 文件中的原始专业代码（便于事后修复）

    // ===== 社会信息 =====
    pub religion: String,
    pub community: String, // Caste
    pub category: String,
    pub fee_concession: bool,
    pub mobile: String,

    // ===== 状态标志 =====
    pub active: bool,        // 默认 true
    pub data_verified: bool, // 默认 false
}

// ==========================================
// Student - 已落库学生记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub student_id: i64,
    #[serde(flatten)]
    pub record: NormalizedRecord,
    pub source_batch_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ==========================================
// StudentQuery - 学生列表查询条件
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentQuery {
    pub search: Option<String>,      // All: 姓名/入学编号模糊匹配；其余: 入学编号精确匹配
    pub status: StudentStatusFilter, // 核验状态过滤
    pub page: usize,                 // 页码（从 1 开始）
    pub page_size: usize,            // 每页条数
}

impl Default for StudentQuery {
    fn default() -> Self {
        Self {
            search: None,
            status: StudentStatusFilter::All,
            page: 1,
            page_size: 10,
        }
    }
}

// ==========================================
// StudentPage - 分页结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentPage {
    pub students: Vec<Student>,
    pub total: usize,       // 满足条件的总记录数
    pub page: usize,        // 实际返回的页码（已修正越界）
    pub page_size: usize,
    pub total_pages: usize, // 至少为 1
}

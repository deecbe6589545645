// ==========================================
// 学籍管理系统 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use std::path::PathBuf;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 获取单次导入允许的最大数据行数
    ///
    /// # 默认值
    /// - 5000
    ///
    /// # 用途
    /// - 超出即判定 FileTooLarge，限制异常大文件的处理时间
    async fn get_max_import_rows(&self) -> RepositoryResult<usize>;

    /// 获取上传文件存储根目录
    ///
    /// # 默认值
    /// - <data_dir>/student-records/media
    async fn get_media_root(&self) -> RepositoryResult<PathBuf>;

    /// 获取学生列表每页条数
    ///
    /// # 默认值
    /// - 10
    async fn get_student_page_size(&self) -> RepositoryResult<usize>;
}

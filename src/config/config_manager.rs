// ==========================================
// 学籍管理系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::config::paths::get_default_media_root;
use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path).map_err(|e| {
            RepositoryError::DatabaseConnectionError(format!("{}: {}", db_path, e))
        })?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let conn_guard = conn.lock()?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.conn.lock()?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(value)
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.conn.lock()?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;

        Ok(())
    }

    /// 获取所有 global 配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let conn = self.conn.lock()?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let config_map = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        serde_json::to_string(&config_map).map_err(|e| anyhow::Error::from(e).into())
    }

    /// 读取并解析数值配置，非法值回退默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> RepositoryResult<T>
    where
        T: FromStr + Copy + std::fmt::Display,
    {
        match self.get_config_value(key)? {
            None => Ok(default),
            Some(raw) => match raw.trim().parse::<T>() {
                Ok(v) => Ok(v),
                Err(_) => {
                    tracing::warn!(
                        config_key = key,
                        raw_value = %raw,
                        default = %default,
                        "配置值格式错误，使用默认值"
                    );
                    Ok(default)
                }
            },
        }
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_max_import_rows(&self) -> RepositoryResult<usize> {
        let value =
            self.get_parsed_or_default(config_keys::IMPORT_MAX_ROWS, defaults::IMPORT_MAX_ROWS)?;
        // 0 视为非法，避免所有文件都被判定过大
        Ok(if value == 0 { defaults::IMPORT_MAX_ROWS } else { value })
    }

    async fn get_media_root(&self) -> RepositoryResult<PathBuf> {
        let value = self
            .get_config_value(config_keys::MEDIA_ROOT)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        Ok(value.map(PathBuf::from).unwrap_or_else(get_default_media_root))
    }

    async fn get_student_page_size(&self) -> RepositoryResult<usize> {
        let value = self
            .get_parsed_or_default(config_keys::STUDENT_PAGE_SIZE, defaults::STUDENT_PAGE_SIZE)?;
        Ok(value.clamp(1, 100))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    pub const IMPORT_MAX_ROWS: &str = "import_max_rows";
    pub const MEDIA_ROOT: &str = "media_root";
    pub const STUDENT_PAGE_SIZE: &str = "student_page_size";
}

pub mod defaults {
    pub const IMPORT_MAX_ROWS: usize = 5_000;
    pub const STUDENT_PAGE_SIZE: usize = 10;
}

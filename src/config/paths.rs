// ==========================================
// 学籍管理系统 - 默认路径
// ==========================================
// 优先级: 环境变量 > 用户数据目录 > 当前目录
// ==========================================

use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "STUDENT_RECORDS_DB_PATH";
pub const MEDIA_ROOT_ENV: &str = "STUDENT_RECORDS_MEDIA_ROOT";

const APP_DIR_NAME: &str = "student-records";

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn app_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join(APP_DIR_NAME))
}

/// 获取默认数据库路径
pub fn get_default_db_path() -> String {
    if let Some(path) = env_path(DB_PATH_ENV) {
        return path.display().to_string();
    }

    let mut path = PathBuf::from("./student_records.db");
    if let Some(dir) = app_data_dir() {
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("student_records.db");
        }
    }

    path.display().to_string()
}

/// 获取默认上传文件存储目录
pub fn get_default_media_root() -> PathBuf {
    if let Some(path) = env_path(MEDIA_ROOT_ENV) {
        return path;
    }

    app_data_dir()
        .map(|d| d.join("media"))
        .unwrap_or_else(|| PathBuf::from("./media"))
}

// ==========================================
// 学籍管理系统 - 日志系统初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// 日志级别: RUST_LOG 优先，其次为调用方给定的默认值
// 输出格式: STUDENT_RECORDS_LOG_FORMAT=json 时输出 JSON 行
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// CLI 默认过滤器: 本 crate 输出 info，依赖库仅输出 warn
pub const DEFAULT_FILTER: &str = "warn,student_records=info";

/// 详细模式过滤器（导入每一行的 debug 日志）
pub const VERBOSE_FILTER: &str = "warn,student_records=debug";

/// 日志格式环境变量
pub const LOG_FORMAT_ENV: &str = "STUDENT_RECORDS_LOG_FORMAT";

fn build_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 日志级别过滤器
///   例如: RUST_LOG=student_records::importer=trace
///
/// # 示例
/// ```no_run
/// use student_records::logging;
/// logging::init();
/// ```
pub fn init() {
    init_with_filter(DEFAULT_FILTER);
}

/// 以指定默认过滤器初始化（日志写入 stderr，stdout 留给 JSON 输出）
pub fn init_with_filter(default_filter: &str) {
    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = fmt()
        .with_env_filter(build_filter(default_filter))
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// 初始化测试环境的日志系统
///
/// 重复调用安全（try_init）
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

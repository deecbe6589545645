// ==========================================
// 学籍管理系统 - 命令行入口
// ==========================================
// 用法:
//   student-records [--db <path>] [-v] <command> [args...]
//
// 命令:
//   import <file>...                 导入一个或多个 CSV/电子表格文件
//   list [search] [page]             全部学生（姓名/入学编号模糊搜索）
//   pending [admission_no] [page]    待核验学生
//   verified [admission_no] [page]   已核验学生
//   show <student_id>                学生详情
//   verify <student_id>              标记已核验
//   uploads                          上传文件列表
//   batches [limit]                  最近导入批次
//   seed-department <code> <name>    新增或更新专业
//   departments                      专业列表
//
// 输出: JSON（stdout）；日志写入 stderr
// ==========================================

use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use student_records::api::{ImportApi, StudentApi};
use student_records::config::get_default_db_path;
use student_records::domain::StudentStatusFilter;
use student_records::logging;

struct CliArgs {
    db_path: String,
    verbose: bool,
    command: String,
    rest: Vec<String>,
}

fn parse_args() -> Result<CliArgs> {
    let mut db_path = None;
    let mut verbose = false;
    let mut positional = Vec::new();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--db" => {
                db_path = Some(args.next().ok_or_else(|| anyhow!("--db 缺少路径参数"))?);
            }
            "-v" | "--verbose" => verbose = true,
            _ => positional.push(arg),
        }
    }

    if positional.is_empty() {
        bail!("缺少命令；可用命令: import, list, pending, verified, show, verify, uploads, batches, seed-department, departments");
    }
    let command = positional.remove(0);

    Ok(CliArgs {
        db_path: db_path.unwrap_or_else(get_default_db_path),
        verbose,
        command,
        rest: positional,
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn page_arg(rest: &[String], idx: usize) -> Result<usize> {
    match rest.get(idx) {
        Some(raw) => raw
            .parse::<usize>()
            .with_context(|| format!("页码必须为正整数: {}", raw)),
        None => Ok(1),
    }
}

fn id_arg(rest: &[String]) -> Result<i64> {
    let raw = rest.first().ok_or_else(|| anyhow!("缺少 student_id"))?;
    raw.parse::<i64>()
        .with_context(|| format!("student_id 必须为整数: {}", raw))
}

async fn list(api: &StudentApi, rest: &[String], status: StudentStatusFilter) -> Result<()> {
    let search = rest.first().map(String::as_str);
    let page = page_arg(rest, 1)?;
    print_json(&api.list_students(search, status, page, None).await?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args()?;
    logging::init_with_filter(if args.verbose {
        logging::VERBOSE_FILTER
    } else {
        logging::DEFAULT_FILTER
    });

    tracing::info!(
        version = student_records::VERSION,
        db_path = %args.db_path,
        command = %args.command,
        "{}",
        student_records::APP_NAME
    );

    let import_api = ImportApi::new(&args.db_path)?;
    let student_api = StudentApi::from_connection(import_api.connection())?;

    match args.command.as_str() {
        "import" => {
            if args.rest.is_empty() {
                bail!("import 需要至少一个文件路径");
            }
            let reports = import_api.import_many(&args.rest).await?;
            print_json(&reports)?;
        }
        "list" => list(&student_api, &args.rest, StudentStatusFilter::All).await?,
        "pending" => {
            list(&student_api, &args.rest, StudentStatusFilter::PendingVerification).await?
        }
        "verified" => list(&student_api, &args.rest, StudentStatusFilter::Verified).await?,
        "show" => print_json(&student_api.get_student(id_arg(&args.rest)?).await?)?,
        "verify" => print_json(&student_api.verify_student(id_arg(&args.rest)?).await?)?,
        "uploads" => print_json(&import_api.list_uploaded_files().await?)?,
        "batches" => {
            let limit = match args.rest.first() {
                Some(raw) => raw.parse::<usize>().context("limit 必须为正整数")?,
                None => 20,
            };
            print_json(&import_api.recent_batches(limit).await?)?;
        }
        "seed-department" => {
            let (code, name) = match args.rest.as_slice() {
                [code, name, ..] => (code, name),
                _ => bail!("用法: seed-department <code> <name>"),
            };
            let id = import_api.upsert_department(code, name)?;
            print_json(&serde_json::json!({ "department_id": id, "code": code, "name": name }))?;
        }
        "departments" => {
            let departments: Vec<_> = import_api
                .list_departments()?
                .into_iter()
                .map(|d| serde_json::json!({ "department_id": d.department_id, "code": d.code, "name": d.name }))
                .collect();
            print_json(&departments)?;
        }
        other => bail!("未知命令: {}", other),
    }

    Ok(())
}

// ==========================================
// 资源负荷报表 - 命令行入口
// ==========================================
// 用法:
//   resource-report [--db <path>] <calendar> <start> <end> [csv|json]
//
//   calendar: bucket_detail.bucket_id, 例如 week
//   start/end: YYYY-MM-DD, 窗口为 [start, end)
//   输出格式默认 csv, 写到 stdout; 日志写到 stderr
//
// 数据库路径: --db 参数 → 环境变量 RESOURCE_REPORT_DB_PATH → 用户数据目录
// ==========================================

use anyhow::{bail, Context};
use chrono::NaiveDate;
use resource_report::api::ResourceReportApi;
use resource_report::db::{
    get_default_db_path, init_report_schema, open_sqlite_connection, read_schema_version,
    CURRENT_SCHEMA_VERSION,
};
use resource_report::domain::{DateRange, ReportRequest};
use std::sync::{Arc, Mutex};

const USAGE: &str =
    "用法: resource-report [--db <path>] <calendar> <start YYYY-MM-DD> <end YYYY-MM-DD> [csv|json]";

fn parse_date(value: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .with_context(|| format!("无法解析日期: {}", value))
}

fn main() -> anyhow::Result<()> {
    resource_report::logging::init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();

    let db_path = match args.iter().position(|a| a == "--db") {
        Some(idx) => {
            if idx + 1 >= args.len() {
                bail!(USAGE);
            }
            let path = args.remove(idx + 1);
            args.remove(idx);
            path
        }
        None => get_default_db_path(),
    };

    if args.len() < 3 {
        bail!(USAGE);
    }

    let calendar = args[0].clone();
    let range = DateRange::from_dates(parse_date(&args[1])?, parse_date(&args[2])?);
    let format = args.get(3).map(|s| s.as_str()).unwrap_or("csv");

    tracing::info!("使用数据库: {}", db_path);

    let conn = open_sqlite_connection(&db_path)?;
    match read_schema_version(&conn)? {
        Some(v) if v != CURRENT_SCHEMA_VERSION => {
            tracing::warn!(
                "schema_version 不一致: 数据库={}, 期望={}",
                v,
                CURRENT_SCHEMA_VERSION
            );
        }
        Some(_) => {}
        None => {
            tracing::info!("数据库未初始化, 创建报表表结构");
            init_report_schema(&conn)?;
        }
    }

    let api = ResourceReportApi::new(Arc::new(Mutex::new(conn)))?;
    let request = ReportRequest::new(calendar, range);

    let stdout = std::io::stdout();
    let count = match format {
        "csv" => api.export_csv(&request, stdout.lock())?,
        "json" => api.export_json_lines(&request, stdout.lock())?,
        other => bail!("未知输出格式: {} ({})", other, USAGE),
    };

    tracing::info!(
        "报表输出 {} 条记录 (单位: {})",
        count,
        api.units().label()
    );
    Ok(())
}

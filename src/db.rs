// ==========================================
// 资源负荷报表 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout, 报表与上游计划写入并发时减少 busy 错误
// - 提供报表所需表结构的幂等初始化
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
///
/// 说明：版本号只用于提示/告警（不做自动迁移）
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 RESOURCE_REPORT_DB_PATH → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("RESOURCE_REPORT_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./resource_report.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("resource-report");
        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("resource_report.db");
        }
    }

    path.to_string_lossy().to_string()
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 初始化报表所需表结构（幂等）
///
/// 表:
/// - config_kv: 全局配置 (loading_time_units)
/// - location / resource: 报表基础投影
/// - bucket_detail: 日历时段
/// - resource_plan: 产能计划事实
/// - attribute_definition: 扩展属性定义
pub fn init_report_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS location (
            name TEXT PRIMARY KEY,
            description TEXT,
            category TEXT,
            subcategory TEXT,
            available_id TEXT
        );

        CREATE TABLE IF NOT EXISTS resource (
            name TEXT PRIMARY KEY,
            description TEXT,
            category TEXT,
            subcategory TEXT,
            type TEXT NOT NULL DEFAULT 'continuous',
            maximum REAL,
            maximum_calendar_id TEXT,
            cost REAL,
            maxearly REAL,
            setupmatrix_id TEXT,
            setup TEXT,
            location_id TEXT REFERENCES location(name),
            available_id TEXT,
            owner_id TEXT REFERENCES resource(name)
        );

        CREATE TABLE IF NOT EXISTS bucket_detail (
            bucket_id TEXT NOT NULL,
            name TEXT NOT NULL,
            startdate TEXT NOT NULL,
            enddate TEXT NOT NULL,
            PRIMARY KEY (bucket_id, startdate)
        );

        CREATE TABLE IF NOT EXISTS resource_plan (
            resource TEXT NOT NULL,
            startdate TEXT NOT NULL,
            available REAL NOT NULL DEFAULT 0,
            unavailable REAL NOT NULL DEFAULT 0,
            load REAL NOT NULL DEFAULT 0,
            setup REAL NOT NULL DEFAULT 0,
            PRIMARY KEY (resource, startdate)
        );

        CREATE INDEX IF NOT EXISTS idx_resource_plan_startdate
            ON resource_plan (startdate);

        CREATE TABLE IF NOT EXISTS attribute_definition (
            model TEXT NOT NULL,
            name TEXT NOT NULL,
            label TEXT,
            field_type TEXT NOT NULL DEFAULT 'string',
            sequence INTEGER NOT NULL DEFAULT 0
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
    }

    #[test]
    fn test_init_report_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);

        init_report_schema(&conn).unwrap();
        init_report_schema(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }
}

// ==========================================
// 资源负荷报表 - 日历时段仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::report::DateRange;
use crate::domain::resource::CalendarBucket;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::resource_report_repo::{bucket_overlap_filter, sql_datetime};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// BucketRepository - 日历时段仓储
// ==========================================

/// 日历时段仓储
/// 职责: 读写 bucket_detail 表
pub struct BucketRepository {
    conn: Arc<Mutex<Connection>>,
}

impl BucketRepository {
    /// 创建新的日历时段仓储实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(format!("{}: {}", db_path, e)))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询与时间窗口重叠的时段
    ///
    /// # 参数
    /// - calendar: 日历 (bucket_id)
    /// - range: 报表窗口 [start, end)
    ///
    /// # 返回
    /// - 满足 enddate > start AND startdate < end 的时段, 按 startdate 升序
    /// - 空窗口或倒置窗口返回空列表
    pub fn buckets_for(
        &self,
        calendar: &str,
        range: DateRange,
    ) -> RepositoryResult<Vec<CalendarBucket>> {
        if range.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT bucket_id, name, startdate, enddate
            FROM bucket_detail
            WHERE {}
            ORDER BY startdate
            "#,
            bucket_overlap_filter("?1", "?2", "?3")
        );
        let mut stmt = conn.prepare(&sql)?;

        let buckets = stmt
            .query_map(
                params![calendar, sql_datetime(range.start), sql_datetime(range.end)],
                |row| {
                    Ok(CalendarBucket {
                        calendar: row.get(0)?,
                        name: row.get(1)?,
                        startdate: row.get(2)?,
                        enddate: row.get(3)?,
                    })
                },
            )?
            .collect::<SqliteResult<Vec<CalendarBucket>>>()?;

        Ok(buckets)
    }

    /// 插入或更新单个时段
    pub fn upsert_single(&self, bucket: &CalendarBucket) -> RepositoryResult<()> {
        if bucket.enddate <= bucket.startdate {
            return Err(RepositoryError::ValidationError(format!(
                "时段 {} 的结束时间不晚于开始时间",
                bucket.name
            )));
        }

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO bucket_detail (bucket_id, name, startdate, enddate)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                bucket.calendar,
                bucket.name,
                sql_datetime(bucket.startdate),
                sql_datetime(bucket.enddate),
            ],
        )?;

        Ok(())
    }

    /// 批量插入或更新时段
    pub fn upsert_batch(&self, buckets: &[CalendarBucket]) -> RepositoryResult<usize> {
        for bucket in buckets {
            self.upsert_single(bucket)?;
        }
        Ok(buckets.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn setup_repo() -> BucketRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_report_schema(&conn).unwrap();
        let repo = BucketRepository::from_connection(Arc::new(Mutex::new(conn)));

        // 周日历: 1-8, 8-15, 15-22, 22-29
        for (i, start) in [1, 8, 15, 22].iter().enumerate() {
            repo.upsert_single(&CalendarBucket {
                calendar: "week".to_string(),
                name: format!("W{:02}", i + 1),
                startdate: day(*start),
                enddate: day(start + 7),
            })
            .unwrap();
        }
        // 另一日历不应混入
        repo.upsert_single(&CalendarBucket {
            calendar: "day".to_string(),
            name: "D01".to_string(),
            startdate: day(1),
            enddate: day(2),
        })
        .unwrap();

        repo
    }

    #[test]
    fn test_buckets_overlapping_range() {
        let repo = setup_repo();

        // 窗口 [3, 16) 与 W01, W02, W03 重叠
        let buckets = repo
            .buckets_for("week", DateRange::new(day(3), day(16)))
            .unwrap();
        let names: Vec<&str> = buckets.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["W01", "W02", "W03"]);
        assert!(buckets.windows(2).all(|w| w[0].startdate < w[1].startdate));
    }

    #[test]
    fn test_bucket_boundaries_are_exclusive() {
        let repo = setup_repo();

        // enddate == start 与 startdate == end 的时段都不出现
        let buckets = repo
            .buckets_for("week", DateRange::new(day(8), day(15)))
            .unwrap();
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].name, "W02");
    }

    #[test]
    fn test_empty_and_inverted_range() {
        let repo = setup_repo();

        assert!(repo.buckets_for("week", DateRange::new(day(8), day(8))).unwrap().is_empty());
        assert!(repo.buckets_for("week", DateRange::new(day(15), day(1))).unwrap().is_empty());
        assert!(repo.buckets_for("month", DateRange::new(day(1), day(29))).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_inverted_bucket() {
        let repo = setup_repo();
        let result = repo.upsert_single(&CalendarBucket {
            calendar: "week".to_string(),
            name: "bad".to_string(),
            startdate: day(8),
            enddate: day(1),
        });
        assert!(matches!(result, Err(RepositoryError::ValidationError(_))));
    }
}

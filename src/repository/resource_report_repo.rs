// ==========================================
// 资源负荷报表 - 报表聚合仓储
// ==========================================
// 职责: 资源 × 库位 × 日历时段 的产能汇总
// 流程: 构建参数化查询 → 执行一次 → 游标逐行解码
// 失败: 不做恢复, 存储错误原样上抛; 出错后迭代立即结束
// ==========================================

mod mapper;
mod query;

pub use mapper::{round_to, utilization_pct, RowLayout};

use crate::config::attribute_registry::AttributeRegistry;
use crate::config::units::UnitScale;
use crate::domain::report::{ReportRequest, UtilizationRecord};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::hierarchy::HierarchyMaintainer;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Rows, Statement};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, instrument};

pub(crate) use query::{bucket_overlap_filter, sql_datetime};

// ==========================================
// Aggregator - 报表聚合器
// ==========================================
/// 时间单位与属性注册表在构造时给定, 之后每次查询都使用同一组列
#[derive(Debug, Clone, Copy)]
pub struct Aggregator<'r> {
    registry: &'r AttributeRegistry,
    units: UnitScale,
}

impl<'r> Aggregator<'r> {
    pub fn new(registry: &'r AttributeRegistry, units: UnitScale) -> Self {
        Self { registry, units }
    }

    pub fn units(&self) -> UnitScale {
        self.units
    }

    pub fn registry(&self) -> &'r AttributeRegistry {
        self.registry
    }

    /// 准备报表查询
    ///
    /// 返回的 PreparedReport 持有语句, 调用 `records()` 才真正执行
    #[instrument(skip(self, conn, request), fields(
        calendar = %request.calendar,
        start = %request.range.start,
        end = %request.range.end,
        attributes = self.registry.len()
    ))]
    pub fn prepare<'c>(
        &self,
        conn: &'c Connection,
        request: &ReportRequest,
    ) -> RepositoryResult<PreparedReport<'c, 'r>> {
        if request.range.is_empty() {
            debug!("报表窗口为空, 结果为空");
        }

        let query = query::build_report_query(self.registry, &self.units, request);
        let stmt = conn.prepare(&query.sql)?;

        Ok(PreparedReport {
            stmt,
            params: query.params,
            layout: RowLayout::new(self.registry),
        })
    }

    /// 执行并收集全部记录 (小报表/测试使用)
    pub fn collect(
        &self,
        conn: &Connection,
        request: &ReportRequest,
    ) -> RepositoryResult<Vec<UtilizationRecord>> {
        let mut prepared = self.prepare(conn, request)?;
        let records = prepared.records()?;
        records.collect()
    }
}

// ==========================================
// PreparedReport - 已准备的报表查询
// ==========================================
pub struct PreparedReport<'c, 'r> {
    stmt: Statement<'c>,
    params: Vec<Value>,
    layout: RowLayout<'r>,
}

impl<'c, 'r> PreparedReport<'c, 'r> {
    /// 执行查询, 返回单次、只进的记录迭代器
    pub fn records(&mut self) -> RepositoryResult<UtilizationRecords<'_>> {
        let PreparedReport {
            stmt,
            params,
            layout,
        } = self;
        let rows = stmt.query(params_from_iter(params.iter()))?;

        Ok(UtilizationRecords {
            rows,
            layout: *layout,
            finished: false,
            yielded: 0,
        })
    }
}

// ==========================================
// UtilizationRecords - 游标迭代器
// ==========================================
/// 由数据库游标驱动, 不预先物化结果; 调用方可随时停止迭代
pub struct UtilizationRecords<'s> {
    rows: Rows<'s>,
    layout: RowLayout<'s>,
    finished: bool,
    yielded: usize,
}

impl<'s> UtilizationRecords<'s> {
    /// 已产出的记录数
    pub fn yielded(&self) -> usize {
        self.yielded
    }
}

impl<'s> Iterator for UtilizationRecords<'s> {
    type Item = RepositoryResult<UtilizationRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let result = match self.rows.next() {
            Ok(Some(row)) => self.layout.decode(row),
            Ok(None) => {
                self.finished = true;
                debug!(records = self.yielded, "报表游标读取完毕");
                return None;
            }
            Err(e) => Err(RepositoryError::from(e)),
        };

        match result {
            Ok(record) => {
                self.yielded += 1;
                Some(Ok(record))
            }
            Err(e) => {
                // 致命错误之后不再产出任何记录
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

// ==========================================
// ResourceReportRepository - 报表仓储
// ==========================================
pub struct ResourceReportRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ResourceReportRepository {
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

    /// 执行资源层级一致性维护 (外部协作方)
    pub fn rebuild_hierarchy(&self, maintainer: &dyn HierarchyMaintainer) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        maintainer.rebuild(&conn)
    }

    /// 执行报表并把记录迭代器交给调用方
    ///
    /// 连接锁在 `f` 返回前一直持有; `f` 提前返回即释放游标
    pub fn with_records<T, F>(
        &self,
        aggregator: &Aggregator<'_>,
        request: &ReportRequest,
        f: F,
    ) -> RepositoryResult<T>
    where
        F: FnOnce(&mut UtilizationRecords<'_>) -> RepositoryResult<T>,
    {
        let conn = self.get_conn()?;
        let mut prepared = aggregator.prepare(&conn, request)?;
        let mut records = prepared.records()?;
        f(&mut records)
    }
}

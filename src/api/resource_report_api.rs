// ==========================================
// 资源负荷报表 - 报表 API
// ==========================================
// 职责: 编排一次报表查询
//   1. 解析时间单位 (失败时默认 days)
//   2. 取扩展属性注册表 (进程内只初始化一次)
//   3. 调用外部层级维护
//   4. 聚合查询, 逐条交给调用方
// 架构: API 层 → Repository 层 (ResourceReportRepository)
// ==========================================

use std::io::Write;
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info};

use crate::api::error::{ApiError, ApiResult};
use crate::api::report_export;
use crate::config::attribute_registry::{AttributeColumn, AttributeRegistry, AttributeSource};
use crate::config::config_manager::ConfigManager;
use crate::config::units::UnitScale;
use crate::domain::report::{ReportRequest, UtilizationRecord};
use crate::repository::attribute_repo::SqliteAttributeSource;
use crate::repository::hierarchy::{AssumeConsistent, HierarchyMaintainer};
use crate::repository::resource_report_repo::{
    Aggregator, ResourceReportRepository, UtilizationRecords,
};

/// 完整报表 (已物化)
#[derive(Debug, Clone, Serialize)]
pub struct ResourceReport {
    pub units: UnitScale,
    pub columns: Vec<AttributeColumn>,
    pub records: Vec<UtilizationRecord>,
}

/// 扩展属性注册表的来源
enum RegistrySource {
    /// 进程级注册表, 首次使用时从 source 发现
    Global(Arc<dyn AttributeSource>),
    /// 调用方显式给定的注册表
    Pinned(Arc<AttributeRegistry>),
}

// ==========================================
// ResourceReportApi - 资源负荷报表 API
// ==========================================
pub struct ResourceReportApi {
    config: ConfigManager,
    report_repo: ResourceReportRepository,
    registry: RegistrySource,
    hierarchy: Arc<dyn HierarchyMaintainer>,
}

impl ResourceReportApi {
    /// 创建报表 API
    ///
    /// 扩展属性取自同库的 attribute_definition 表, 使用进程级注册表
    pub fn new(conn: Arc<Mutex<Connection>>) -> ApiResult<Self> {
        let source: Arc<dyn AttributeSource> =
            Arc::new(SqliteAttributeSource::from_connection(conn.clone()));
        Self::build(conn, RegistrySource::Global(source))
    }

    /// 使用显式给定的注册表创建报表 API
    pub fn with_registry(
        conn: Arc<Mutex<Connection>>,
        registry: Arc<AttributeRegistry>,
    ) -> ApiResult<Self> {
        Self::build(conn, RegistrySource::Pinned(registry))
    }

    fn build(conn: Arc<Mutex<Connection>>, registry: RegistrySource) -> ApiResult<Self> {
        let config = ConfigManager::from_connection(conn.clone())?;
        Ok(Self {
            config,
            report_repo: ResourceReportRepository::from_connection(conn),
            registry,
            hierarchy: Arc::new(AssumeConsistent),
        })
    }

    /// 替换资源层级维护实现
    pub fn with_hierarchy(mut self, hierarchy: Arc<dyn HierarchyMaintainer>) -> Self {
        self.hierarchy = hierarchy;
        self
    }

    /// 当前配置的时间单位
    pub fn units(&self) -> UnitScale {
        UnitScale::resolve(&self.config)
    }

    /// 扩展属性注册表
    pub fn registry(&self) -> ApiResult<&AttributeRegistry> {
        match &self.registry {
            RegistrySource::Global(source) => Ok(AttributeRegistry::global(source.as_ref())?),
            RegistrySource::Pinned(registry) => Ok(registry.as_ref()),
        }
    }

    fn validate(request: &ReportRequest) -> ApiResult<()> {
        if request.calendar.trim().is_empty() {
            return Err(ApiError::InvalidInput("日历不能为空".to_string()));
        }
        Ok(())
    }

    /// 执行报表并把记录迭代器交给调用方
    ///
    /// 迭代器由数据库游标驱动; `f` 返回即释放游标与连接
    pub fn with_records<T, F>(&self, request: &ReportRequest, f: F) -> ApiResult<T>
    where
        F: FnOnce(&Aggregator<'_>, &mut UtilizationRecords<'_>) -> ApiResult<T>,
    {
        Self::validate(request)?;

        let units = self.units();
        let registry = self.registry()?;
        self.report_repo.rebuild_hierarchy(self.hierarchy.as_ref())?;

        debug!(
            units = units.label(),
            attributes = registry.len(),
            calendar = %request.calendar,
            "执行资源负荷报表"
        );

        let aggregator = Aggregator::new(registry, units);
        let mut outcome: Option<ApiResult<T>> = None;
        self.report_repo
            .with_records(&aggregator, request, |records| {
                outcome = Some(f(&aggregator, records));
                Ok(())
            })?;

        outcome.unwrap_or_else(|| Err(ApiError::InternalError("报表回调未执行".to_string())))
    }

    /// 逐条处理记录, 回调返回 Break 时提前停止
    ///
    /// # 返回
    /// - Ok(usize): 交给回调的记录数
    pub fn for_each_record<F>(&self, request: &ReportRequest, mut f: F) -> ApiResult<usize>
    where
        F: FnMut(UtilizationRecord) -> ControlFlow<()>,
    {
        self.with_records(request, |_, records| {
            let mut count = 0;
            for record in records {
                count += 1;
                if f(record?).is_break() {
                    break;
                }
            }
            Ok(count)
        })
    }

    /// 执行报表并物化全部记录
    pub fn run_report(&self, request: &ReportRequest) -> ApiResult<ResourceReport> {
        let report = self.with_records(request, |aggregator, records| {
            let records = records.collect::<Result<Vec<_>, _>>()?;
            Ok(ResourceReport {
                units: aggregator.units(),
                columns: aggregator.registry().columns().cloned().collect(),
                records,
            })
        })?;

        info!(
            records = report.records.len(),
            calendar = %request.calendar,
            "资源负荷报表完成"
        );
        Ok(report)
    }

    /// 导出 CSV
    pub fn export_csv<W: Write>(&self, request: &ReportRequest, writer: W) -> ApiResult<usize> {
        self.with_records(request, |aggregator, records| {
            report_export::write_csv(writer, aggregator.registry(), records)
        })
    }

    /// 导出 JSON Lines
    pub fn export_json_lines<W: Write>(
        &self,
        request: &ReportRequest,
        writer: W,
    ) -> ApiResult<usize> {
        self.with_records(request, |_, records| {
            report_export::write_json_lines(writer, records)
        })
    }
}

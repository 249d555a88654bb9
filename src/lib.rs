// ==========================================
// 资源负荷报表 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 职责: 按日历时段汇总每个资源的可用/不可用/负荷/换型产能,
//       并给出利用率
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 配置层 - 时间单位、扩展属性
pub mod config;

// 数据仓储层 - 数据访问 (唯一拼 SQL 的地方)
pub mod repository;

// 数据库基础设施（连接初始化/PRAGMA 统一/报表表结构）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 报表接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

pub use domain::{
    CalendarBucket, CapacityPlanFact, DateRange, EntityKind, Location, ReportRequest, Resource,
    ResourceSelection, ResourceType, SortColumn, SortKey, TimeUnit, UtilizationRecord,
};

pub use config::{AttributeColumn, AttributeRegistry, ConfigManager, ParameterReader, UnitScale};

pub use repository::{
    Aggregator, BucketRepository, RepositoryError, RepositoryResult, SqliteAttributeSource,
};

pub use api::{ApiError, ApiResult, ResourceReport, ResourceReportApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "资源负荷报表";

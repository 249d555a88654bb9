// ==========================================
// 资源负荷报表 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod attribute_repo;
pub mod bucket_repo;
pub mod error;
pub mod hierarchy;
pub mod plan_data_repo;
pub mod resource_report_repo;

// 重导出核心仓储
pub use attribute_repo::SqliteAttributeSource;
pub use bucket_repo::BucketRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use hierarchy::{AssumeConsistent, HierarchyMaintainer};
pub use plan_data_repo::PlanDataRepository;
pub use resource_report_repo::{
    Aggregator, PreparedReport, ResourceReportRepository, RowLayout, UtilizationRecords,
};

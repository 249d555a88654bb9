// ==========================================
// 资源负荷报表 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑
// ==========================================

pub mod report;
pub mod resource;
pub mod types;

// 重导出核心类型
pub use report::{
    AttributeValue, DateRange, ReportRequest, ResourceSelection, SortColumn, SortKey,
    UtilizationRecord,
};
pub use resource::{CalendarBucket, CapacityPlanFact, Location, Resource};
pub use types::{EntityKind, ResourceType, TimeUnit};

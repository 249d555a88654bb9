// ==========================================
// 资源负荷报表 - API 层
// ==========================================
// 职责: 报表查询编排与导出
// 架构: API 层 → Repository 层
// ==========================================

pub mod error;
pub mod report_export;
pub mod resource_report_api;

pub use error::{ApiError, ApiResult};
pub use resource_report_api::{ResourceReport, ResourceReportApi};

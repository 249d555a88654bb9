// ==========================================
// 资源负荷报表 - 资源与产能计划领域模型
// ==========================================
// 资源/库位/日历时段/产能计划事实均由上游计划过程维护,
// 本系统只读
// ==========================================

use crate::domain::types::ResourceType;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Resource - 资源
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    // ===== 主键 =====
    pub name: String,

    // ===== 描述 =====
    pub description: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,

    // ===== 产能参数 =====
    pub resource_type: ResourceType,
    pub maximum: Option<f64>,
    pub maximum_calendar: Option<String>, // 最大产能日历
    pub cost: Option<f64>,
    pub maxearly: Option<f64>, // 最大提前量 (秒)

    // ===== 换型 =====
    pub setupmatrix: Option<String>,
    pub setup: Option<String>, // 当前换型状态值

    // ===== 关联 =====
    pub owner: Option<String>,
    pub location: Option<String>,
    pub available: Option<String>, // 可用日历
}

impl Resource {
    /// 以最少字段构造资源, 其余字段为空
    pub fn new(name: impl Into<String>, resource_type: ResourceType) -> Self {
        Self {
            name: name.into(),
            description: None,
            category: None,
            subcategory: None,
            resource_type,
            maximum: None,
            maximum_calendar: None,
            cost: None,
            maxearly: None,
            setupmatrix: None,
            setup: None,
            owner: None,
            location: None,
            available: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

// ==========================================
// Location - 库位
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub available: Option<String>, // 可用日历
}

impl Location {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            category: None,
            subcategory: None,
            available: None,
        }
    }
}

// ==========================================
// CalendarBucket - 日历时段
// ==========================================
// 区间为左闭右开 [startdate, enddate)
// 同一日历内的时段互不重叠, 按时间升序
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarBucket {
    pub calendar: String,
    pub name: String,
    pub startdate: NaiveDateTime,
    pub enddate: NaiveDateTime,
}

// ==========================================
// CapacityPlanFact - 产能计划事实
// ==========================================
// 主键: (resource, startdate)
// 数量均为非负; 连续型资源以小时计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityPlanFact {
    pub resource: String,
    pub startdate: NaiveDateTime,
    pub available: f64,
    pub unavailable: f64,
    pub load: f64,
    pub setup: f64,
}

// ==========================================
// 资源负荷报表 - 领域类型定义
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 资源类型 (Resource Type)
// ==========================================
// 数据库存储值: 'continuous' / 'buckets'
// 只有 buckets 型资源的产能已按报表时段给出, 其余一律按小时计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Continuous, // 连续型 (小时)
    Buckets,    // 时段型 (已按时段给出)
}

impl ResourceType {
    pub const ALL: [ResourceType; 2] = [ResourceType::Continuous, ResourceType::Buckets];

    /// 从数据库字段解析
    ///
    /// 空值或未知值按连续型处理, 与报表 SQL 中
    /// `CASE WHEN res.type = 'buckets'` 的判定口径一致
    pub fn from_db(value: Option<&str>) -> Self {
        match value {
            Some("buckets") => ResourceType::Buckets,
            _ => ResourceType::Continuous,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Continuous => "continuous",
            ResourceType::Buckets => "buckets",
        }
    }

    /// 是否需要按时间单位换算
    pub fn is_scaled(&self) -> bool {
        !matches!(self, ResourceType::Buckets)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 负荷时间单位 (Loading Time Unit)
// ==========================================
// 配置项: loading_time_units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Hours,
    Days,
    Weeks,
}

impl TimeUnit {
    /// 解析配置值, 只认精确取值; 无法识别的值 (含首尾空白) 返回 None
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "hours" => Some(TimeUnit::Hours),
            "days" => Some(TimeUnit::Days),
            "weeks" => Some(TimeUnit::Weeks),
            _ => None,
        }
    }

    /// 每个单位包含的小时数
    pub fn hours_per_unit(&self) -> f64 {
        match self {
            TimeUnit::Hours => 1.0,
            TimeUnit::Days => 24.0,
            TimeUnit::Weeks => 168.0,
        }
    }

    /// 小时 → 本单位的换算系数
    pub fn scale_factor(&self) -> f64 {
        1.0 / self.hours_per_unit()
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeUnit::Hours => "hours",
            TimeUnit::Days => "days",
            TimeUnit::Weeks => "weeks",
        }
    }
}

impl Default for TimeUnit {
    fn default() -> Self {
        TimeUnit::Days
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ==========================================
// 扩展属性所属实体 (Entity Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Resource,
    Location,
}

impl EntityKind {
    /// attribute_definition.model 字段取值
    pub fn model_name(&self) -> &'static str {
        match self {
            EntityKind::Resource => "resource",
            EntityKind::Location => "location",
        }
    }

    /// 报表查询中的表别名
    pub fn sql_alias(&self) -> &'static str {
        match self {
            EntityKind::Resource => "res",
            EntityKind::Location => "location",
        }
    }

    /// 输出字段名前缀 (location 属性输出为 location__<attr>)
    pub fn field_prefix(&self) -> &'static str {
        match self {
            EntityKind::Resource => "",
            EntityKind::Location => "location__",
        }
    }

    /// 该实体在报表基础投影中已占用的列名
    pub fn reserved_columns(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Resource => &[
                "name",
                "description",
                "category",
                "subcategory",
                "type",
                "maximum",
                "maximum_calendar_id",
                "cost",
                "maxearly",
                "setupmatrix_id",
                "setup",
                "location_id",
                "available_id",
                "owner_id",
                "avgutil",
            ],
            EntityKind::Location => &[
                "name",
                "description",
                "category",
                "subcategory",
                "available_id",
            ],
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.model_name())
    }
}

// ==========================================
// 资源负荷报表 - 报表领域模型
// ==========================================
// UtilizationRecord 只作为查询输出存在, 不落库
// ==========================================

use crate::domain::types::ResourceType;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// DateRange - 报表时间窗口 [start, end)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// 以日期构造, 起止均取当日零点
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: start.and_time(chrono::NaiveTime::MIN),
            end: end.and_time(chrono::NaiveTime::MIN),
        }
    }

    /// 空窗口或倒置窗口
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

// ==========================================
// ResourceSelection - 基础资源集合
// ==========================================
// 调用方已完成过滤与权限判断, 这里只描述筛选条件
// 所有条件之间为 AND 关系; 全部为空时选择全部资源
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSelection {
    pub names: Option<Vec<String>>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub owner: Option<String>,
}

impl ResourceSelection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: Some(names.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }
}

// ==========================================
// 排序规则
// ==========================================
// 只允许按基础投影中的列排序; 时段起始时间升序总是追加在最后
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    Resource,
    Description,
    Category,
    Subcategory,
    Type,
    Maximum,
    Cost,
    Location,
    Owner,
    AvgUtil,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub column: SortColumn,
    pub descending: bool,
}

impl SortKey {
    pub fn asc(column: SortColumn) -> Self {
        Self {
            column,
            descending: false,
        }
    }

    pub fn desc(column: SortColumn) -> Self {
        Self {
            column,
            descending: true,
        }
    }
}

impl Default for SortKey {
    fn default() -> Self {
        SortKey::asc(SortColumn::Resource)
    }
}

// ==========================================
// ReportRequest - 一次报表查询的输入
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub selection: ResourceSelection,
    pub range: DateRange,
    /// 日历时段划分 (bucket_detail.bucket_id)
    pub calendar: String,
    pub sort: Vec<SortKey>,
}

impl ReportRequest {
    /// 全部资源, 按资源名升序
    pub fn new(calendar: impl Into<String>, range: DateRange) -> Self {
        Self {
            selection: ResourceSelection::all(),
            range,
            calendar: calendar.into(),
            sort: vec![SortKey::default()],
        }
    }

    pub fn with_selection(mut self, selection: ResourceSelection) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_sort(mut self, sort: Vec<SortKey>) -> Self {
        self.sort = sort;
        self
    }
}

// ==========================================
// UtilizationRecord - 资源时段利用率记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UtilizationRecord {
    // ===== 资源 =====
    pub resource: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub maximum: Option<f64>,
    pub maximum_calendar: Option<String>,
    pub cost: Option<f64>,
    pub maxearly: Option<f64>,
    pub setupmatrix: Option<String>,
    pub setup_value: Option<String>,
    pub available_calendar: Option<String>,
    pub owner: Option<String>,

    // ===== 库位 (资源无库位时为空) =====
    pub location: Option<String>,
    pub location_description: Option<String>,
    pub location_category: Option<String>,
    pub location_subcategory: Option<String>,
    pub location_available: Option<String>,

    /// 整个报表窗口内的平均利用率 (%)
    pub avgutil: f64,

    /// 扩展属性, 顺序与注册顺序一致 (先资源后库位)
    pub attributes: Vec<AttributeValue>,

    // ===== 时段 =====
    pub bucket: String,
    pub startdate: NaiveDateTime,

    // ===== 数量 (已换算, 1 位小数) =====
    pub available: f64,
    pub unavailable: f64,
    pub load: f64,
    pub setup: f64,

    /// 利用率 (%, 2 位小数)
    pub utilization: f64,
}

impl UtilizationRecord {
    /// 平铺输出 (CSV) 中位于扩展属性之前的基础字段
    pub const BASE_FIELDS: &'static [&'static str] = &[
        "resource",
        "description",
        "category",
        "subcategory",
        "type",
        "maximum",
        "maximum_calendar",
        "cost",
        "maxearly",
        "setupmatrix",
        "setup_value",
        "location",
        "location__description",
        "location__category",
        "location__subcategory",
        "location__available",
        "avgutil",
        "available_calendar",
        "owner",
    ];

    /// 平铺输出中位于扩展属性之后的时段与数量字段
    pub const QUANTITY_FIELDS: &'static [&'static str] = &[
        "bucket",
        "startdate",
        "available",
        "unavailable",
        "load",
        "setup",
        "utilization",
    ];

    /// 扩展属性不可占用的输出字段名
    pub fn is_reserved_field(field_name: &str) -> bool {
        Self::BASE_FIELDS.contains(&field_name) || Self::QUANTITY_FIELDS.contains(&field_name)
    }

    /// 按输出字段名查找扩展属性值
    pub fn attribute(&self, field_name: &str) -> Option<&serde_json::Value> {
        self.attributes
            .iter()
            .find(|a| a.field_name == field_name)
            .map(|a| &a.value)
    }
}

/// 扩展属性值
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeValue {
    pub field_name: String,
    pub value: serde_json::Value,
}

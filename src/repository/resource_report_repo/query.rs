// ==========================================
// 资源负荷报表 - 报表 SQL 构建
// ==========================================
// 约束:
// - 所有值一律以编号占位符 (?N) 绑定, 不做字符串插值
// - 只拼入两类标识符: 固定列名常量 与 注册表已校验的属性列名
// - 换算系数按资源类型逐行选择 (CASE WHEN), 不做全局乘法
// ==========================================

use crate::config::attribute_registry::AttributeRegistry;
use crate::config::units::UnitScale;
use crate::domain::report::{ReportRequest, ResourceSelection, SortColumn, SortKey};
use crate::domain::types::ResourceType;
use chrono::NaiveDateTime;
use rusqlite::types::Value;

/// 报表基础投影 (固定列, 位于属性列之前)
pub(crate) const BASE_PROJECTION: &[&str] = &[
    "res.name",
    "res.description",
    "res.category",
    "res.subcategory",
    "res.type",
    "res.maximum",
    "res.maximum_calendar_id",
    "res.cost",
    "res.maxearly",
    "res.setupmatrix_id",
    "res.setup",
    "location.name",
    "location.description",
    "location.category",
    "location.subcategory",
    "location.available_id",
    "res.avgutil",
    "res.available_id",
    "res.owner_id",
];

/// 尾部计算列: bucket, startdate, available, unavailable, load, setup
pub(crate) const SUFFIX_COLUMN_COUNT: usize = 6;

/// 平均利用率分母下限, 避免除零
pub(crate) const AVGUTIL_EPSILON: f64 = 0.0001;

/// 与 rusqlite chrono 特性写入格式一致的时间文本
pub(crate) fn sql_datetime(at: NaiveDateTime) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

// ==========================================
// ParamList - 编号参数收集器
// ==========================================
#[derive(Debug, Default)]
pub(crate) struct ParamList {
    values: Vec<Value>,
}

impl ParamList {
    /// 绑定一个值并返回其占位符, 例如 "?3"
    pub(crate) fn bind(&mut self, value: impl Into<Value>) -> String {
        self.values.push(value.into());
        format!("?{}", self.values.len())
    }

    pub(crate) fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// 构建 IN 子句, 空列表返回永假条件
pub(crate) fn build_in_clause(column_name: &str, values: &[String], params: &mut ParamList) -> String {
    if values.is_empty() {
        return "1 = 0".to_string();
    }

    let placeholders = values
        .iter()
        .map(|v| params.bind(v.clone()))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{} IN ({})", column_name, placeholders)
}

/// 基础资源集合的 WHERE 条件 (作用于 resource 表)
pub(crate) fn build_selection_filter(selection: &ResourceSelection, params: &mut ParamList) -> String {
    let mut conditions: Vec<String> = Vec::new();

    if let Some(names) = &selection.names {
        conditions.push(build_in_clause("resource.name", names, params));
    }
    if let Some(location) = &selection.location {
        conditions.push(format!("resource.location_id = {}", params.bind(location.clone())));
    }
    if let Some(category) = &selection.category {
        conditions.push(format!("resource.category = {}", params.bind(category.clone())));
    }
    if let Some(owner) = &selection.owner {
        conditions.push(format!("resource.owner_id = {}", params.bind(owner.clone())));
    }

    if conditions.is_empty() {
        "1 = 1".to_string()
    } else {
        conditions.join(" AND ")
    }
}

fn sort_column_sql(column: SortColumn) -> &'static str {
    match column {
        SortColumn::Resource => "res.name",
        SortColumn::Description => "res.description",
        SortColumn::Category => "res.category",
        SortColumn::Subcategory => "res.subcategory",
        SortColumn::Type => "res.type",
        SortColumn::Maximum => "res.maximum",
        SortColumn::Cost => "res.cost",
        SortColumn::Location => "location.name",
        SortColumn::Owner => "res.owner_id",
        SortColumn::AvgUtil => "res.avgutil",
    }
}

/// ORDER BY 子句; 未给出排序时按资源名升序, 末尾总是追加时段起始时间
pub(crate) fn build_order_by(sort: &[SortKey]) -> String {
    let default_sort = [SortKey::default()];
    let keys = if sort.is_empty() { &default_sort[..] } else { sort };

    let mut parts: Vec<String> = keys
        .iter()
        .map(|k| {
            format!(
                "{} {}",
                sort_column_sql(k.column),
                if k.descending { "DESC" } else { "ASC" }
            )
        })
        .collect();
    parts.push("d.startdate ASC".to_string());
    parts.join(", ")
}

/// 日历时段与报表窗口重叠的条件 (作用于 bucket_detail)
///
/// 时段目录查询与报表聚合共用, 两处的时段集合始终一致
pub(crate) fn bucket_overlap_filter(calendar: &str, range_start: &str, range_end: &str) -> String {
    format!("bucket_id = {calendar} AND enddate > {range_start} AND startdate < {range_end}")
}

/// 不按时间单位换算的资源类型条件, 例如 "res.type IN (?5)"
fn unscaled_type_filter(params: &mut ParamList) -> String {
    let unscaled: Vec<String> = ResourceType::ALL
        .iter()
        .filter(|t| !t.is_scaled())
        .map(|t| t.as_str().to_string())
        .collect();
    build_in_clause("res.type", &unscaled, params)
}

/// 单个数量列的换算汇总表达式
fn scaled_sum(column: &str, alias: &str, unscaled: &str, scale: &str) -> String {
    format!(
        "COALESCE(SUM(rp.{column}), 0) * (CASE WHEN {unscaled} THEN 1 ELSE {scale} END) AS {alias}"
    )
}

/// 构建完成的报表查询
#[derive(Debug)]
pub(crate) struct ReportQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

/// 构建报表聚合查询
///
/// 结构:
/// 1. res: 基础资源集合 + 报表窗口内平均利用率
/// 2. LEFT JOIN location (无库位的资源仍保留)
/// 3. CROSS JOIN 与窗口重叠的日历时段
/// 4. LEFT JOIN 产能计划事实: 落在时段内且落在报表窗口内
/// 5. 按基础投影 + 属性列 + 时段分组
pub(crate) fn build_report_query(
    registry: &AttributeRegistry,
    units: &UnitScale,
    request: &ReportRequest,
) -> ReportQuery {
    let mut params = ParamList::default();

    let range_start = params.bind(sql_datetime(request.range.start));
    let range_end = params.bind(sql_datetime(request.range.end));
    let calendar = params.bind(request.calendar.clone());
    let scale = params.bind(units.factor);
    let unscaled = unscaled_type_filter(&mut params);
    let epsilon = params.bind(AVGUTIL_EPSILON);

    let selection_filter = build_selection_filter(&request.selection, &mut params);

    let base_projection = BASE_PROJECTION.join(", ");
    let attr_projection = registry.projection_fragment();

    let available = scaled_sum("available", "available", &unscaled, &scale);
    let unavailable = scaled_sum("unavailable", "unavailable", &unscaled, &scale);
    let load = scaled_sum("load", "loading", &unscaled, &scale);
    let setup = scaled_sum("setup", "setup_qty", &unscaled, &scale);

    let bucket_filter = bucket_overlap_filter(&calendar, &range_start, &range_end);
    let order_by = build_order_by(&request.sort);

    let sql = format!(
        r#"
        SELECT
            {base_projection},
            {attr_projection}
            d.bucket, d.startdate,
            {available},
            {unavailable},
            {load},
            {setup}
        FROM (
            SELECT resource.*,
                (
                    SELECT (COALESCE(SUM(p.load), 0) + COALESCE(SUM(p.setup), 0)) * 100.0
                        / COALESCE(MAX(SUM(p.available), {epsilon}), 1)
                    FROM resource_plan p
                    WHERE p.resource = resource.name
                      AND p.startdate >= {range_start}
                      AND p.startdate < {range_end}
                ) AS avgutil
            FROM resource
            WHERE {selection_filter}
        ) res
        LEFT OUTER JOIN location
            ON res.location_id = location.name
        CROSS JOIN (
            SELECT name AS bucket, startdate, enddate
            FROM bucket_detail
            WHERE {bucket_filter}
        ) d
        LEFT JOIN resource_plan rp
            ON rp.resource = res.name
           AND d.startdate <= rp.startdate
           AND d.enddate > rp.startdate
           AND rp.startdate >= {range_start}
           AND rp.startdate < {range_end}
        GROUP BY
            {base_projection},
            {attr_projection}
            d.bucket, d.startdate
        ORDER BY {order_by}
        "#
    );

    ReportQuery {
        sql,
        params: params.into_values(),
    }
}

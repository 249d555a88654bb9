// ==========================================
// 资源负荷报表 - 结果行解码
// ==========================================
// 行结构: [基础投影 19 列][资源属性 …][库位属性 …][bucket, startdate, 4 个数量]
// - 尾部 6 列按相对行尾的偏移读取, 与属性列数无关
// - 属性列从基础投影之后开始, 先资源后库位, 列数取自注册表
// ==========================================

use super::query::{BASE_PROJECTION, SUFFIX_COLUMN_COUNT};
use crate::config::attribute_registry::AttributeRegistry;
use crate::domain::report::{AttributeValue, UtilizationRecord};
use crate::domain::types::{EntityKind, ResourceType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::types::Value;
use rusqlite::Row;

// 基础投影列位置
const COL_NAME: usize = 0;
const COL_DESCRIPTION: usize = 1;
const COL_CATEGORY: usize = 2;
const COL_SUBCATEGORY: usize = 3;
const COL_TYPE: usize = 4;
const COL_MAXIMUM: usize = 5;
const COL_MAXIMUM_CALENDAR: usize = 6;
const COL_COST: usize = 7;
const COL_MAXEARLY: usize = 8;
const COL_SETUPMATRIX: usize = 9;
const COL_SETUP_VALUE: usize = 10;
const COL_LOCATION: usize = 11;
const COL_LOCATION_DESCRIPTION: usize = 12;
const COL_LOCATION_CATEGORY: usize = 13;
const COL_LOCATION_SUBCATEGORY: usize = 14;
const COL_LOCATION_AVAILABLE: usize = 15;
const COL_AVGUTIL: usize = 16;
const COL_AVAILABLE_CALENDAR: usize = 17;
const COL_OWNER: usize = 18;

/// 按指定小数位四舍五入 (远离零)
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// 时段利用率 (%)
///
/// 可用量恰为 0 时报 0, 不做除法
pub fn utilization_pct(available: f64, load: f64, setup: f64) -> f64 {
    if available != 0.0 {
        (load + setup) * 100.0 / available
    } else {
        0.0
    }
}

/// SQLite 值 → JSON 值
fn to_json(value: Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Integer(i) => serde_json::Value::from(i),
        Value::Real(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Text(s) => serde_json::Value::String(s),
        Value::Blob(b) => serde_json::Value::from(b),
    }
}

// ==========================================
// RowLayout - 结果行布局
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct RowLayout<'r> {
    registry: &'r AttributeRegistry,
}

impl<'r> RowLayout<'r> {
    pub fn new(registry: &'r AttributeRegistry) -> Self {
        Self { registry }
    }

    /// 行总列数
    pub fn width(&self) -> usize {
        BASE_PROJECTION.len() + self.registry.len() + SUFFIX_COLUMN_COUNT
    }

    /// 解码一行
    pub fn decode(&self, row: &Row<'_>) -> RepositoryResult<UtilizationRecord> {
        let width = row.as_ref().column_count();
        if width != self.width() {
            return Err(RepositoryError::RowShapeMismatch {
                expected: self.width(),
                actual: width,
            });
        }

        // ===== 尾部计算列 (相对行尾) =====
        let bucket: String = row.get(width - 6)?;
        let startdate: NaiveDateTime = row.get(width - 5)?;
        let available: f64 = row.get(width - 4)?;
        let unavailable: f64 = row.get(width - 3)?;
        let load: f64 = row.get(width - 2)?;
        let setup: f64 = row.get(width - 1)?;

        let utilization = utilization_pct(available, load, setup);

        // ===== 属性列 =====
        let attr_start = BASE_PROJECTION.len();
        let attr_end = width - SUFFIX_COLUMN_COUNT;
        let resource_count = self.registry.columns_for(EntityKind::Resource).len();
        let mut attributes = Vec::with_capacity(attr_end - attr_start);
        for (offset, column) in self.registry.columns().enumerate() {
            debug_assert_eq!(
                column.kind == EntityKind::Resource,
                offset < resource_count
            );
            let value: Value = row.get(attr_start + offset)?;
            attributes.push(AttributeValue {
                field_name: column.field_name.clone(),
                value: to_json(value),
            });
        }

        let resource_type: Option<String> = row.get(COL_TYPE)?;
        let avgutil: Option<f64> = row.get(COL_AVGUTIL)?;

        Ok(UtilizationRecord {
            resource: row.get(COL_NAME)?,
            description: row.get(COL_DESCRIPTION)?,
            category: row.get(COL_CATEGORY)?,
            subcategory: row.get(COL_SUBCATEGORY)?,
            resource_type: ResourceType::from_db(resource_type.as_deref()),
            maximum: row.get(COL_MAXIMUM)?,
            maximum_calendar: row.get(COL_MAXIMUM_CALENDAR)?,
            cost: row.get(COL_COST)?,
            maxearly: row.get(COL_MAXEARLY)?,
            setupmatrix: row.get(COL_SETUPMATRIX)?,
            setup_value: row.get(COL_SETUP_VALUE)?,
            available_calendar: row.get(COL_AVAILABLE_CALENDAR)?,
            owner: row.get(COL_OWNER)?,
            location: row.get(COL_LOCATION)?,
            location_description: row.get(COL_LOCATION_DESCRIPTION)?,
            location_category: row.get(COL_LOCATION_CATEGORY)?,
            location_subcategory: row.get(COL_LOCATION_SUBCATEGORY)?,
            location_available: row.get(COL_LOCATION_AVAILABLE)?,
            avgutil: round_to(avgutil.unwrap_or(0.0), 2),
            attributes,
            bucket,
            startdate,
            available: round_to(available, 1),
            unavailable: round_to(unavailable, 1),
            load: round_to(load, 1),
            setup: round_to(setup, 1),
            utilization: round_to(utilization, 2),
        })
    }
}

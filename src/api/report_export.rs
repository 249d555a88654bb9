// ==========================================
// 资源负荷报表 - 报表导出
// ==========================================
// 格式:
// - CSV: 基础列 → 扩展属性列 (注册顺序) → 时段与数量列
// - JSON Lines: 每条记录一行
// ==========================================

use crate::api::error::ApiResult;
use crate::config::attribute_registry::AttributeRegistry;
use crate::domain::report::UtilizationRecord;
use crate::repository::error::RepositoryResult;
use std::io::Write;

/// CSV 表头
pub fn csv_header(registry: &AttributeRegistry) -> Vec<String> {
    UtilizationRecord::BASE_FIELDS
        .iter()
        .map(|h| h.to_string())
        .chain(registry.columns().map(|c| c.field_name.clone()))
        .chain(UtilizationRecord::QUANTITY_FIELDS.iter().map(|h| h.to_string()))
        .collect()
}

fn opt_text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn opt_number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn json_cell(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn csv_row(record: &UtilizationRecord) -> Vec<String> {
    let mut row = vec![
        record.resource.clone(),
        opt_text(&record.description),
        opt_text(&record.category),
        opt_text(&record.subcategory),
        record.resource_type.to_string(),
        opt_number(record.maximum),
        opt_text(&record.maximum_calendar),
        opt_number(record.cost),
        opt_number(record.maxearly),
        opt_text(&record.setupmatrix),
        opt_text(&record.setup_value),
        opt_text(&record.location),
        opt_text(&record.location_description),
        opt_text(&record.location_category),
        opt_text(&record.location_subcategory),
        opt_text(&record.location_available),
        record.avgutil.to_string(),
        opt_text(&record.available_calendar),
        opt_text(&record.owner),
    ];
    row.extend(record.attributes.iter().map(|a| json_cell(&a.value)));
    row.extend([
        record.bucket.clone(),
        record.startdate.format("%Y-%m-%d %H:%M:%S").to_string(),
        record.available.to_string(),
        record.unavailable.to_string(),
        record.load.to_string(),
        record.setup.to_string(),
        record.utilization.to_string(),
    ]);
    row
}

/// 写出 CSV, 返回记录数
///
/// 记录流中出现错误时立即停止并返回该错误
pub fn write_csv<W, I>(writer: W, registry: &AttributeRegistry, records: I) -> ApiResult<usize>
where
    W: Write,
    I: Iterator<Item = RepositoryResult<UtilizationRecord>>,
{
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(csv_header(registry))?;

    let mut count = 0;
    for record in records {
        csv_writer.write_record(csv_row(&record?))?;
        count += 1;
    }

    csv_writer.flush()?;
    Ok(count)
}

/// 写出 JSON Lines, 返回记录数
pub fn write_json_lines<W, I>(mut writer: W, records: I) -> ApiResult<usize>
where
    W: Write,
    I: Iterator<Item = RepositoryResult<UtilizationRecord>>,
{
    let mut count = 0;
    for record in records {
        serde_json::to_writer(&mut writer, &record?)?;
        writer.write_all(b"\n")?;
        count += 1;
    }

    writer.flush()?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::attribute_registry::AttributeDefinition;
    use crate::domain::report::AttributeValue;
    use crate::domain::types::{EntityKind, ResourceType};
    use chrono::NaiveDate;

    fn record() -> UtilizationRecord {
        UtilizationRecord {
            resource: "R1".to_string(),
            description: None,
            category: Some("press".to_string()),
            subcategory: None,
            resource_type: ResourceType::Continuous,
            maximum: Some(1.0),
            maximum_calendar: None,
            cost: None,
            maxearly: None,
            setupmatrix: None,
            setup_value: None,
            available_calendar: None,
            owner: None,
            location: Some("L1".to_string()),
            location_description: None,
            location_category: None,
            location_subcategory: None,
            location_available: None,
            avgutil: 87.5,
            attributes: vec![AttributeValue {
                field_name: "color".to_string(),
                value: serde_json::json!("red"),
            }],
            bucket: "W01".to_string(),
            startdate: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            available: 1.7,
            unavailable: 0.0,
            load: 1.3,
            setup: 0.2,
            utilization: 87.5,
        }
    }

    #[test]
    fn test_write_csv_layout() {
        let registry = AttributeRegistry::from_definitions(vec![AttributeDefinition::new(
            EntityKind::Resource,
            "color",
        )])
        .unwrap();

        let mut out = Vec::new();
        let count = write_csv(&mut out, &registry, vec![Ok(record())].into_iter()).unwrap();
        assert_eq!(count, 1);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("owner,color,bucket,startdate,available,unavailable,load,setup,utilization"));
        assert!(lines[1].starts_with("R1,,press,,continuous,1,"));
        assert!(lines[1].ends_with(",red,W01,2024-01-01 00:00:00,1.7,0,1.3,0.2,87.5"));
    }

    #[test]
    fn test_write_json_lines() {
        let mut out = Vec::new();
        let count = write_json_lines(&mut out, vec![Ok(record()), Ok(record())].into_iter()).unwrap();
        assert_eq!(count, 2);

        let text = String::from_utf8(out).unwrap();
        let first: serde_json::Value = serde_json::from_str(text.lines().next().unwrap()).unwrap();
        assert_eq!(first["resource"], "R1");
        assert_eq!(first["type"], "continuous");
        assert_eq!(first["utilization"], 87.5);
    }
}

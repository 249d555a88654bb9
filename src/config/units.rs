// ==========================================
// 资源负荷报表 - 负荷时间单位换算
// ==========================================
// 配置项: loading_time_units
//   hours → (1.0,   "hours")
//   weeks → (1/168, "weeks")
//   其他值/缺失/读取失败 → (1/24, "days")
// 红线: 该解析永不向外报错
// ==========================================

use crate::config::config_manager::config_keys;
use crate::config::parameter_reader::ParameterReader;
use crate::domain::types::TimeUnit;
use serde::Serialize;
use tracing::{debug, warn};

/// 报表数量的显示单位
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UnitScale {
    pub unit: TimeUnit,
    /// 小时 → 显示单位的换算系数
    pub factor: f64,
}

impl UnitScale {
    pub fn new(unit: TimeUnit) -> Self {
        Self {
            unit,
            factor: unit.scale_factor(),
        }
    }

    /// 从配置解析时间单位
    pub fn resolve(config: &dyn ParameterReader) -> Self {
        match config.get_parameter(config_keys::LOADING_TIME_UNITS) {
            Ok(Some(value)) => match TimeUnit::parse(&value) {
                Some(unit) => Self::new(unit),
                None => {
                    debug!(value = %value, "loading_time_units 取默认单位 days");
                    Self::default()
                }
            },
            Ok(None) => Self::default(),
            Err(e) => {
                warn!("读取 loading_time_units 失败, 使用 days: {}", e);
                Self::default()
            }
        }
    }

    pub fn label(&self) -> &'static str {
        self.unit.label()
    }

    /// 元组形式 (换算系数, 标签)
    pub fn as_tuple(&self) -> (f64, &'static str) {
        (self.factor, self.label())
    }
}

impl Default for UnitScale {
    fn default() -> Self {
        Self::new(TimeUnit::Days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::error::{RepositoryError, RepositoryResult};
    use std::collections::HashMap;

    struct FailingReader;

    impl ParameterReader for FailingReader {
        fn get_parameter(&self, _key: &str) -> RepositoryResult<Option<String>> {
            Err(RepositoryError::DatabaseQueryError("no such table: config_kv".to_string()))
        }
    }

    fn reader(value: Option<&str>) -> HashMap<String, String> {
        let mut map = HashMap::new();
        if let Some(v) = value {
            map.insert(config_keys::LOADING_TIME_UNITS.to_string(), v.to_string());
        }
        map
    }

    #[test]
    fn test_resolve_recognized_values() {
        assert_eq!(UnitScale::resolve(&reader(Some("hours"))).as_tuple(), (1.0, "hours"));
        assert_eq!(
            UnitScale::resolve(&reader(Some("weeks"))).as_tuple(),
            (1.0 / 168.0, "weeks")
        );
        assert_eq!(
            UnitScale::resolve(&reader(Some("days"))).as_tuple(),
            (1.0 / 24.0, "days")
        );
    }

    #[test]
    fn test_resolve_falls_back_to_days() {
        assert_eq!(UnitScale::resolve(&reader(None)).unit, TimeUnit::Days);
        assert_eq!(UnitScale::resolve(&reader(Some("months"))).unit, TimeUnit::Days);
        assert_eq!(
            UnitScale::resolve(&reader(Some(" weeks "))).as_tuple(),
            (1.0 / 24.0, "days")
        );
        assert_eq!(UnitScale::resolve(&reader(Some("hours\n"))).unit, TimeUnit::Days);
        assert_eq!(UnitScale::resolve(&FailingReader).as_tuple(), (1.0 / 24.0, "days"));
    }
}

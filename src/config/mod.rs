// ==========================================
// 资源负荷报表 - 配置层
// ==========================================
// 职责: 系统配置读取、时间单位换算、扩展属性注册
// 存储: config_kv 表 / attribute_definition 表
// ==========================================

pub mod attribute_registry;
pub mod config_manager;
pub mod parameter_reader;
pub mod units;

// 重导出核心配置类型
pub use attribute_registry::{
    AttributeColumn, AttributeDefinition, AttributeRegistry, AttributeSource,
};
pub use config_manager::{config_keys, ConfigManager};
pub use parameter_reader::ParameterReader;
pub use units::UnitScale;

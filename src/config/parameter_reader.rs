// ==========================================
// 资源负荷报表 - 参数读取 Trait
// ==========================================
// 职责: 定义报表所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::repository::error::RepositoryResult;
use std::collections::HashMap;

// ==========================================
// ParameterReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
//         HashMap<String, String>（嵌入/测试）
pub trait ParameterReader: Send + Sync {
    /// 读取具名参数
    ///
    /// # 返回
    /// - Ok(Some(value)): 参数存在
    /// - Ok(None): 参数不存在
    /// - Err: 读取失败
    fn get_parameter(&self, key: &str) -> RepositoryResult<Option<String>>;
}

impl ParameterReader for HashMap<String, String> {
    fn get_parameter(&self, key: &str) -> RepositoryResult<Option<String>> {
        Ok(self.get(key).cloned())
    }
}

// ==========================================
// 资源负荷报表 - 资源层级一致性 (外部协作方接口)
// ==========================================
// 报表执行前, 资源上下级关系必须已经一致;
// 一致性维护本身不在本系统内实现
// ==========================================

use crate::repository::error::RepositoryResult;
use rusqlite::Connection;

/// 资源层级维护接口
pub trait HierarchyMaintainer: Send + Sync {
    /// 在报表查询之前调用, 返回时保证层级一致
    fn rebuild(&self, conn: &Connection) -> RepositoryResult<()>;
}

/// 默认实现: 上游已保证一致, 不做任何事
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeConsistent;

impl HierarchyMaintainer for AssumeConsistent {
    fn rebuild(&self, _conn: &Connection) -> RepositoryResult<()> {
        Ok(())
    }
}

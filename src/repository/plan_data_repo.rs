// ==========================================
// 资源负荷报表 - 计划主数据与产能事实仓储
// ==========================================
// 职责: 写入 location / resource / resource_plan
// 说明: 正式环境由上游计划过程写入, 这里供导入工具与测试使用
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::resource::{CapacityPlanFact, Location, Resource};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::resource_report_repo::sql_datetime;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// PlanDataRepository
// ==========================================
pub struct PlanDataRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PlanDataRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(format!("{}: {}", db_path, e)))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入或更新库位
    pub fn upsert_location(&self, location: &Location) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO location (name, description, category, subcategory, available_id)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(name) DO UPDATE SET
                description = excluded.description,
                category = excluded.category,
                subcategory = excluded.subcategory,
                available_id = excluded.available_id
            "#,
            params![
                location.name,
                location.description,
                location.category,
                location.subcategory,
                location.available,
            ],
        )?;
        Ok(())
    }

    /// 插入或更新资源
    pub fn upsert_resource(&self, resource: &Resource) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO resource (
                name, description, category, subcategory, type, maximum,
                maximum_calendar_id, cost, maxearly, setupmatrix_id, setup,
                location_id, available_id, owner_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            ON CONFLICT(name) DO UPDATE SET
                description = excluded.description,
                category = excluded.category,
                subcategory = excluded.subcategory,
                type = excluded.type,
                maximum = excluded.maximum,
                maximum_calendar_id = excluded.maximum_calendar_id,
                cost = excluded.cost,
                maxearly = excluded.maxearly,
                setupmatrix_id = excluded.setupmatrix_id,
                setup = excluded.setup,
                location_id = excluded.location_id,
                available_id = excluded.available_id,
                owner_id = excluded.owner_id
            "#,
            params![
                resource.name,
                resource.description,
                resource.category,
                resource.subcategory,
                resource.resource_type.as_str(),
                resource.maximum,
                resource.maximum_calendar,
                resource.cost,
                resource.maxearly,
                resource.setupmatrix,
                resource.setup,
                resource.location,
                resource.available,
                resource.owner,
            ],
        )?;
        Ok(())
    }

    /// 批量插入或更新产能计划事实
    ///
    /// # 返回
    /// - Ok(usize): 写入的记录数
    pub fn upsert_facts(&self, facts: &[CapacityPlanFact]) -> RepositoryResult<usize> {
        for fact in facts {
            if fact.available < 0.0 || fact.unavailable < 0.0 || fact.load < 0.0 || fact.setup < 0.0 {
                return Err(RepositoryError::ValidationError(format!(
                    "产能计划数量不能为负: resource={}, startdate={}",
                    fact.resource, fact.startdate
                )));
            }
        }

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut updated_count = 0;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT OR REPLACE INTO resource_plan (
                    resource, startdate, available, unavailable, load, setup
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )?;
            for fact in facts {
                updated_count += stmt.execute(params![
                    fact.resource,
                    sql_datetime(fact.startdate),
                    fact.available,
                    fact.unavailable,
                    fact.load,
                    fact.setup,
                ])?;
            }
        }

        tx.commit()?;
        Ok(updated_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::ResourceType;
    use chrono::NaiveDate;

    fn setup_repo() -> (Arc<Mutex<Connection>>, PlanDataRepository) {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_report_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        (conn.clone(), PlanDataRepository::from_connection(conn))
    }

    #[test]
    fn test_upsert_resource_and_facts() {
        let (conn, repo) = setup_repo();

        repo.upsert_location(&Location::new("L1")).unwrap();
        repo.upsert_resource(&Resource::new("R1", ResourceType::Buckets).with_location("L1"))
            .unwrap();
        repo.upsert_resource(&Resource::new("R1", ResourceType::Continuous).with_location("L1"))
            .unwrap();

        let at = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let written = repo
            .upsert_facts(&[CapacityPlanFact {
                resource: "R1".to_string(),
                startdate: at,
                available: 24.0,
                unavailable: 0.0,
                load: 12.0,
                setup: 1.0,
            }])
            .unwrap();
        assert_eq!(written, 1);

        let conn = conn.lock().unwrap();
        let kind: String = conn
            .query_row("SELECT type FROM resource WHERE name = 'R1'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(kind, "continuous");
        let start: String = conn
            .query_row("SELECT startdate FROM resource_plan", [], |row| row.get(0))
            .unwrap();
        assert_eq!(start, "2024-01-01 00:00:00");
    }

    #[test]
    fn test_rejects_negative_quantities() {
        let (_conn, repo) = setup_repo();
        let at = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();

        let result = repo.upsert_facts(&[CapacityPlanFact {
            resource: "R1".to_string(),
            startdate: at,
            available: -1.0,
            unavailable: 0.0,
            load: 0.0,
            setup: 0.0,
        }]);
        assert!(matches!(result, Err(RepositoryError::ValidationError(_))));
    }
}

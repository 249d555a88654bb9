// ==========================================
// 资源负荷报表 - 扩展属性定义仓储
// ==========================================
// 存储: attribute_definition 表 (model, name, label, field_type, sequence)
// 约束: 定义的属性必须是对应实体表中真实存在的列
// ==========================================

use crate::config::attribute_registry::{is_sql_identifier, AttributeDefinition, AttributeSource};
use crate::domain::types::EntityKind;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// 基于 SQLite 的扩展属性来源
pub struct SqliteAttributeSource {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteAttributeSource {
    /// 从已有连接创建实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 注册一个扩展属性定义 (排在同实体已有定义之后)
    pub fn register(&self, def: &AttributeDefinition) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO attribute_definition (model, name, label, field_type, sequence)
            VALUES (
                ?1, ?2, ?3, ?4,
                (SELECT COALESCE(MAX(sequence), 0) + 1 FROM attribute_definition WHERE model = ?1)
            )
            "#,
            params![def.kind.model_name(), def.name, def.label, def.field_type],
        )?;
        Ok(())
    }
}

/// 实体表的现有列名
fn table_columns(conn: &Connection, table: &str) -> RepositoryResult<HashSet<String>> {
    // table 只会是 resource / location
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<SqliteResult<HashSet<String>>>()?;
    Ok(columns)
}

impl AttributeSource for SqliteAttributeSource {
    fn definitions(&self, kind: EntityKind) -> RepositoryResult<Vec<AttributeDefinition>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT name, label, field_type
            FROM attribute_definition
            WHERE model = ?1
            ORDER BY sequence, rowid
            "#,
        )?;

        let definitions = stmt
            .query_map(params![kind.model_name()], |row| {
                Ok(AttributeDefinition {
                    kind,
                    name: row.get(0)?,
                    label: row.get(1)?,
                    field_type: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<AttributeDefinition>>>()?;

        if definitions.is_empty() {
            return Ok(definitions);
        }

        let existing = table_columns(&conn, kind.model_name())?;
        for def in &definitions {
            if is_sql_identifier(&def.name) && !existing.contains(&def.name) {
                return Err(RepositoryError::InvalidAttribute {
                    entity: kind.to_string(),
                    name: def.name.clone(),
                    reason: format!("{} 表中不存在该列", kind.model_name()),
                });
            }
        }

        Ok(definitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::attribute_registry::AttributeRegistry;

    fn setup_source() -> SqliteAttributeSource {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_report_schema(&conn).unwrap();
        conn.execute_batch(
            r#"
            ALTER TABLE resource ADD COLUMN color TEXT;
            ALTER TABLE resource ADD COLUMN crew_size INTEGER;
            ALTER TABLE location ADD COLUMN region TEXT;
            "#,
        )
        .unwrap();
        SqliteAttributeSource::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_definitions_in_registration_order() {
        let source = setup_source();
        source
            .register(&AttributeDefinition::new(EntityKind::Resource, "crew_size").with_field_type("integer"))
            .unwrap();
        source
            .register(&AttributeDefinition::new(EntityKind::Location, "region").with_label("Region"))
            .unwrap();
        source
            .register(&AttributeDefinition::new(EntityKind::Resource, "color"))
            .unwrap();

        let registry = AttributeRegistry::discover(&source).unwrap();
        let fields: Vec<&str> = registry.columns().map(|c| c.field_name.as_str()).collect();
        assert_eq!(fields, vec!["crew_size", "color", "location__region"]);
        assert_eq!(registry.columns_for(EntityKind::Resource)[0].field_type, "integer");
    }

    #[test]
    fn test_rejects_unknown_column() {
        let source = setup_source();
        source
            .register(&AttributeDefinition::new(EntityKind::Location, "missing_column"))
            .unwrap();

        let err = AttributeRegistry::discover(&source).unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidAttribute { .. }));
    }

    #[test]
    fn test_no_definitions() {
        let source = setup_source();
        assert!(AttributeRegistry::discover(&source).unwrap().is_empty());
    }
}

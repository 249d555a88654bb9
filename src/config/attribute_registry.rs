// ==========================================
// 资源负荷报表 - 扩展属性注册表
// ==========================================
// 职责: 汇总资源/库位的扩展属性定义, 生成有序列描述
//       供查询投影与结果解码共同使用
// 约束:
// - 进程内只初始化一次, 并发首次访问也只执行一次发现过程
// - 初始化后不可变, 列数与顺序在进程生命周期内固定
// - 非法/重复定义直接拒绝, 不静默忽略
// ==========================================

use crate::domain::report::UtilizationRecord;
use crate::domain::types::EntityKind;
use crate::repository::error::{RepositoryError, RepositoryResult};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::info;

// ==========================================
// AttributeDefinition - 外部属性定义
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    pub kind: EntityKind,
    pub name: String,
    pub label: Option<String>,
    pub field_type: String,
}

impl AttributeDefinition {
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            label: None,
            field_type: "string".to_string(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_field_type(mut self, field_type: impl Into<String>) -> Self {
        self.field_type = field_type.into();
        self
    }
}

// ==========================================
// AttributeSource Trait
// ==========================================
// 实现者: SqliteAttributeSource（attribute_definition 表）
//         Vec<AttributeDefinition>（静态配置/测试）
pub trait AttributeSource: Send + Sync {
    /// 按注册顺序返回某实体的属性定义
    fn definitions(&self, kind: EntityKind) -> RepositoryResult<Vec<AttributeDefinition>>;
}

impl AttributeSource for Vec<AttributeDefinition> {
    fn definitions(&self, kind: EntityKind) -> RepositoryResult<Vec<AttributeDefinition>> {
        Ok(self.iter().filter(|d| d.kind == kind).cloned().collect())
    }
}

// ==========================================
// AttributeColumn - 属性列描述
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeColumn {
    pub kind: EntityKind,
    /// 实体表中的列名
    pub name: String,
    /// 输出字段名 (库位属性带 location__ 前缀)
    pub field_name: String,
    pub label: String,
    pub field_type: String,
}

impl AttributeColumn {
    fn from_definition(def: AttributeDefinition) -> Self {
        let field_name = format!("{}{}", def.kind.field_prefix(), def.name);
        let label = def.label.unwrap_or_else(|| def.name.clone());
        Self {
            kind: def.kind,
            name: def.name,
            field_name,
            label,
            field_type: def.field_type,
        }
    }

    /// 查询中的列引用, 例如 res.color
    pub fn sql_expr(&self) -> String {
        format!("{}.{}", self.kind.sql_alias(), self.name)
    }
}

/// 是否为可安全拼入 SQL 的标识符
pub fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// ==========================================
// AttributeRegistry - 扩展属性注册表
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeRegistry {
    resource: Vec<AttributeColumn>,
    location: Vec<AttributeColumn>,
    projection: String,
}

static GLOBAL_REGISTRY: OnceCell<AttributeRegistry> = OnceCell::new();

impl AttributeRegistry {
    /// 无扩展属性的注册表 (只有基础投影)
    pub fn empty() -> Self {
        Self::default()
    }

    /// 从属性来源发现并校验
    pub fn discover(source: &dyn AttributeSource) -> RepositoryResult<Self> {
        let resource = source.definitions(EntityKind::Resource)?;
        let location = source.definitions(EntityKind::Location)?;
        Self::from_definitions(resource.into_iter().chain(location))
    }

    /// 从定义列表构造, 资源属性在前, 库位属性在后, 各自保持给定顺序
    pub fn from_definitions<I>(definitions: I) -> RepositoryResult<Self>
    where
        I: IntoIterator<Item = AttributeDefinition>,
    {
        let mut resource = Vec::new();
        let mut location = Vec::new();
        let mut seen: HashSet<(EntityKind, String)> = HashSet::new();
        let mut field_names: HashSet<String> = HashSet::new();

        for def in definitions {
            validate_definition(&def)?;
            if !seen.insert((def.kind, def.name.clone())) {
                return Err(invalid(&def, "重复定义"));
            }
            let column = AttributeColumn::from_definition(def.clone());
            if UtilizationRecord::is_reserved_field(&column.field_name) {
                return Err(invalid(
                    &def,
                    &format!("输出字段 {} 与报表固定列重名", column.field_name),
                ));
            }
            if !field_names.insert(column.field_name.clone()) {
                return Err(invalid(
                    &def,
                    &format!("输出字段 {} 与其他属性重名", column.field_name),
                ));
            }
            match column.kind {
                EntityKind::Resource => resource.push(column),
                EntityKind::Location => location.push(column),
            }
        }

        let projection = resource
            .iter()
            .chain(location.iter())
            .map(|c| format!("{}, ", c.sql_expr()))
            .collect();

        Ok(Self {
            resource,
            location,
            projection,
        })
    }

    /// 进程级注册表
    ///
    /// 首次调用时执行发现过程; 并发的首次调用只有一个会执行, 其余等待其结果.
    /// 发现失败时不缓存, 下次调用重试. 之后的调用忽略 source, 直接返回已有注册表.
    pub fn global(source: &dyn AttributeSource) -> RepositoryResult<&'static AttributeRegistry> {
        GLOBAL_REGISTRY.get_or_try_init(|| {
            let registry = Self::discover(source)?;
            info!(
                resource_attributes = registry.resource.len(),
                location_attributes = registry.location.len(),
                "扩展属性注册表已初始化"
            );
            Ok(registry)
        })
    }

    /// 进程级注册表 (未初始化时返回 None)
    pub fn global_if_initialized() -> Option<&'static AttributeRegistry> {
        GLOBAL_REGISTRY.get()
    }

    /// 某实体的属性列 (注册顺序)
    pub fn columns_for(&self, kind: EntityKind) -> &[AttributeColumn] {
        match kind {
            EntityKind::Resource => &self.resource,
            EntityKind::Location => &self.location,
        }
    }

    /// 全部属性列: 先资源后库位
    pub fn columns(&self) -> impl Iterator<Item = &AttributeColumn> {
        self.resource.iter().chain(self.location.iter())
    }

    pub fn len(&self) -> usize {
        self.resource.len() + self.location.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 投影片段, 例如 "res.color, location.region, "
    pub fn projection_fragment(&self) -> &str {
        &self.projection
    }
}

fn invalid(def: &AttributeDefinition, reason: &str) -> RepositoryError {
    RepositoryError::InvalidAttribute {
        entity: def.kind.to_string(),
        name: def.name.clone(),
        reason: reason.to_string(),
    }
}

fn validate_definition(def: &AttributeDefinition) -> RepositoryResult<()> {
    if !is_sql_identifier(&def.name) {
        return Err(invalid(def, "名称不是合法标识符"));
    }
    if def.kind.reserved_columns().contains(&def.name.as_str()) {
        return Err(invalid(def, "与基础列重名"));
    }
    Ok(())
}

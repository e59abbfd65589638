//! TOML mapping sources and the registry that holds processed mappings.
//!
//! ```toml
//! [[table]]
//! name = "users"
//! schema = "app"
//! entity = "User"
//!
//! [[table.column]]
//! name = "id"
//! property = "id"
//! type = "bigint"
//! primary = true
//!
//! [[table.column]]
//! name = "uid"
//! property = "uid"
//! type = "uuid"
//! where_value_template = "CAST(? AS uuid)"
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use super::{ColumnMapping, TableMapping};
use crate::error::{WeaveError, WeaveResult};
use crate::value::{ValueType, WireType};

/// A parsed mapping document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MappingSource {
    #[serde(default, rename = "table")]
    pub tables: Vec<TableSource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableSource {
    pub name: String,
    pub catalog: Option<String>,
    pub schema: Option<String>,
    pub entity: Option<String>,
    #[serde(default)]
    pub free: bool,
    #[serde(default)]
    pub map_underscore_to_camel_case: bool,
    #[serde(default)]
    pub use_delimited: bool,
    #[serde(default = "default_true")]
    pub case_insensitive: bool,
    #[serde(default, rename = "column")]
    pub columns: Vec<ColumnSource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnSource {
    pub name: String,
    pub property: Option<String>,
    #[serde(rename = "type")]
    pub value_type: Option<String>,
    pub wire: Option<String>,
    #[serde(default)]
    pub primary: bool,
    #[serde(default = "default_true")]
    pub insert: bool,
    #[serde(default = "default_true")]
    pub update: bool,
    pub select_template: Option<String>,
    pub insert_template: Option<String>,
    pub set_col_template: Option<String>,
    pub set_value_template: Option<String>,
    pub where_col_template: Option<String>,
    pub where_value_template: Option<String>,
}

fn default_true() -> bool {
    true
}

impl MappingSource {
    pub fn from_toml(input: &str) -> WeaveResult<Self> {
        toml::from_str(input).map_err(|e| WeaveError::Config(format!("invalid mapping: {}", e)))
    }

    pub fn from_file(path: impl AsRef<Path>) -> WeaveResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Build and validate every table in the document.
    pub fn into_mappings(self) -> WeaveResult<Vec<TableMapping>> {
        self.tables.into_iter().map(TableSource::into_mapping).collect()
    }
}

impl TableSource {
    fn into_mapping(self) -> WeaveResult<TableMapping> {
        let mut builder = TableMapping::builder(self.name)
            .free(self.free)
            .map_underscore_to_camel_case(self.map_underscore_to_camel_case)
            .use_delimited(self.use_delimited)
            .case_insensitive(self.case_insensitive);
        if let Some(catalog) = self.catalog {
            builder = builder.catalog(catalog);
        }
        if let Some(schema) = self.schema {
            builder = builder.schema(schema);
        }
        if let Some(entity) = self.entity {
            builder = builder.entity(entity);
        }
        for column in self.columns {
            builder = builder.column(column.into_mapping()?);
        }
        builder.build()
    }
}

impl ColumnSource {
    fn into_mapping(self) -> WeaveResult<ColumnMapping> {
        let property = self.property.unwrap_or_else(|| self.name.clone());
        let mut mapping = ColumnMapping::new(self.name, property)
            .insertable(self.insert)
            .updatable(self.update);
        if let Some(ty) = self.value_type {
            let ty: ValueType = ty.parse().map_err(WeaveError::InvalidMapping)?;
            mapping = mapping.value_type(ty);
        }
        if let Some(wire) = self.wire {
            let wire: WireType = wire.parse().map_err(WeaveError::InvalidMapping)?;
            mapping = mapping.wire_type(wire);
        }
        if self.primary {
            mapping = mapping.primary();
        }
        if let Some(t) = self.select_template {
            mapping = mapping.select_template(t);
        }
        if let Some(t) = self.insert_template {
            mapping = mapping.insert_template(t);
        }
        if let Some(t) = self.set_col_template {
            mapping = mapping.set_col_template(t);
        }
        if let Some(t) = self.set_value_template {
            mapping = mapping.set_value_template(t);
        }
        if let Some(t) = self.where_col_template {
            mapping = mapping.where_col_template(t);
        }
        if let Some(t) = self.where_value_template {
            mapping = mapping.where_value_template(t);
        }
        Ok(mapping)
    }
}

/// Processed mappings, keyed by qualified table name and by entity name.
#[derive(Debug, Default)]
pub struct MappingRegistry {
    tables: HashMap<String, Arc<TableMapping>>,
    entities: HashMap<String, Arc<TableMapping>>,
}

impl MappingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(schema: Option<&str>, table: &str) -> String {
        match schema.filter(|s| !s.is_empty()) {
            Some(schema) => format!("{}.{}", schema, table).to_ascii_lowercase(),
            None => table.to_ascii_lowercase(),
        }
    }

    pub fn register(&mut self, mapping: TableMapping) -> Arc<TableMapping> {
        let mapping = Arc::new(mapping);
        let key = Self::key(mapping.schema(), mapping.table());
        if self.tables.insert(key.clone(), mapping.clone()).is_some() {
            tracing::warn!("mapping for '{}' replaced", key);
        }
        if let Some(entity) = mapping.entity() {
            self.entities.insert(entity.to_string(), mapping.clone());
        }
        mapping
    }

    pub fn load_source(&mut self, source: MappingSource) -> WeaveResult<usize> {
        let mappings = source.into_mappings()?;
        let count = mappings.len();
        for mapping in mappings {
            self.register(mapping);
        }
        Ok(count)
    }

    pub fn load_file(&mut self, path: impl AsRef<Path>) -> WeaveResult<usize> {
        let path = path.as_ref();
        let count = self.load_source(MappingSource::from_file(path)?)?;
        tracing::debug!("loaded {} table mappings from {}", count, path.display());
        Ok(count)
    }

    pub fn find_by_table(&self, schema: Option<&str>, table: &str) -> Option<Arc<TableMapping>> {
        self.tables.get(&Self::key(schema, table)).cloned()
    }

    pub fn find_by_entity(&self, entity: &str) -> Option<Arc<TableMapping>> {
        self.entities.get(entity).cloned()
    }

    /// The registered mapping, or a free mapping for unknown tables.
    pub fn find_or_free(&self, schema: Option<&str>, table: &str) -> Arc<TableMapping> {
        self.find_by_table(schema, table).unwrap_or_else(|| {
            let mut builder = TableMapping::builder(table).free(true);
            if let Some(schema) = schema {
                builder = builder.schema(schema);
            }
            // A free mapping with no columns cannot fail validation.
            Arc::new(builder.build().unwrap_or_else(|_| TableMapping::free(table)))
        })
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
[[table]]
name = "users"
schema = "app"
entity = "User"

[[table.column]]
name = "id"
type = "bigint"
primary = true

[[table.column]]
name = "user_name"
property = "name"
type = "text"

[[table.column]]
name = "created"
type = "timestamp"
wire = "TIMESTAMP"
update = false
where_value_template = "CAST(? AS timestamp)"
"#;

    #[test]
    fn test_load_toml() {
        let mut registry = MappingRegistry::new();
        assert_eq!(registry.load_source(MappingSource::from_toml(DOC).unwrap()).unwrap(), 1);
        let users = registry.find_by_table(Some("APP"), "users").unwrap();
        assert_eq!(users.properties().len(), 3);
        assert_eq!(users.property_by_name("name").unwrap().column(), "user_name");
        let created = users.property_by_name("created").unwrap();
        assert!(!created.is_update());
        assert_eq!(created.where_value_tpl(), Some("CAST(? AS timestamp)"));
        assert!(registry.find_by_entity("User").is_some());
    }

    #[test]
    fn test_bad_wire_type() {
        let doc = r#"
[[table]]
name = "t"
[[table.column]]
name = "a"
wire = "NOPE"
"#;
        let err = MappingSource::from_toml(doc).unwrap().into_mappings().unwrap_err();
        assert!(matches!(err, WeaveError::InvalidMapping(_)));
    }

    #[test]
    fn test_find_or_free() {
        let registry = MappingRegistry::new();
        let mapping = registry.find_or_free(None, "events");
        assert!(mapping.is_free());
        assert_eq!(mapping.table(), "events");
    }
}

//! Table and column mapping.
//!
//! A [`TableMapping`] binds entity properties to columns. It is built once
//! through [`TableMappingBuilder`], validated at that point, and immutable
//! afterwards. Builders consult it for identifiers, write policy and the
//! per-clause rendering templates.

pub mod source;

use std::borrow::Cow;
use std::collections::HashMap;

use crate::codec::CodecRegistry;
use crate::error::{WeaveError, WeaveResult};
use crate::segment::count_markers;
use crate::value::{Value, ValueType, WireType, WireValue};

pub use source::{MappingRegistry, MappingSource};

/// A result row as column name and wire value pairs.
pub type WireRow = Vec<(String, WireValue)>;

/// Property read/write access on an instance.
pub trait Entity {
    fn get_property(&self, property: &str) -> Option<Value>;

    fn set_property(&mut self, property: &str, value: Value) -> WeaveResult<()>;

    /// Property names the instance carries, used by free mappings.
    fn property_names(&self) -> Vec<String> {
        Vec::new()
    }
}

/// An ordered property map usable as an entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    entries: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property, replacing an earlier value for the same name.
    pub fn with(mut self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(property, value);
        self
    }

    pub fn insert(&mut self, property: impl Into<String>, value: impl Into<Value>) {
        let property = property.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == property) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((property, value)),
        }
    }

    pub fn get(&self, property: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == property).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Entity for Row {
    fn get_property(&self, property: &str) -> Option<Value> {
        self.get(property).cloned()
    }

    fn set_property(&mut self, property: &str, value: Value) -> WeaveResult<()> {
        self.insert(property, value);
        Ok(())
    }

    fn property_names(&self) -> Vec<String> {
        self.entries.iter().map(|(k, _)| k.clone()).collect()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

/// How one property maps to one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMapping {
    column: String,
    property: String,
    value_type: Option<ValueType>,
    wire_type: Option<WireType>,
    insert: bool,
    update: bool,
    primary: bool,
    select_template: Option<String>,
    insert_template: Option<String>,
    set_col_template: Option<String>,
    set_value_template: Option<String>,
    where_col_template: Option<String>,
    where_value_template: Option<String>,
}

impl ColumnMapping {
    pub fn new(column: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            property: property.into(),
            value_type: None,
            wire_type: None,
            insert: true,
            update: true,
            primary: false,
            select_template: None,
            insert_template: None,
            set_col_template: None,
            set_value_template: None,
            where_col_template: None,
            where_value_template: None,
        }
    }

    /// Declared language type of the property.
    pub fn value_type(mut self, ty: ValueType) -> Self {
        self.value_type = Some(ty);
        self
    }

    /// Declared wire type. Left unset, it is inferred from the value type.
    pub fn wire_type(mut self, wire: WireType) -> Self {
        self.wire_type = Some(wire);
        self
    }

    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    pub fn insertable(mut self, insert: bool) -> Self {
        self.insert = insert;
        self
    }

    pub fn updatable(mut self, update: bool) -> Self {
        self.update = update;
        self
    }

    /// Expression selected in place of the column, rendered `<expr> AS <column>`.
    pub fn select_template(mut self, template: impl Into<String>) -> Self {
        self.select_template = Some(template.into());
        self
    }

    /// Value expression for INSERT, with one `?` marker.
    pub fn insert_template(mut self, template: impl Into<String>) -> Self {
        self.insert_template = Some(template.into());
        self
    }

    /// Column expression on the left of a SET assignment.
    pub fn set_col_template(mut self, template: impl Into<String>) -> Self {
        self.set_col_template = Some(template.into());
        self
    }

    /// Value expression on the right of a SET assignment, with one `?` marker.
    pub fn set_value_template(mut self, template: impl Into<String>) -> Self {
        self.set_value_template = Some(template.into());
        self
    }

    /// Column expression used in predicates.
    pub fn where_col_template(mut self, template: impl Into<String>) -> Self {
        self.where_col_template = Some(template.into());
        self
    }

    /// Value expression used in predicates, with one `?` marker.
    pub fn where_value_template(mut self, template: impl Into<String>) -> Self {
        self.where_value_template = Some(template.into());
        self
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn declared_type(&self) -> Option<ValueType> {
        self.value_type
    }

    /// Declared wire type, or the default for the declared value type.
    pub fn wire(&self) -> Option<WireType> {
        self.wire_type
            .or_else(|| self.value_type.as_ref().map(WireType::default_for))
    }

    pub fn is_insert(&self) -> bool {
        self.insert
    }

    pub fn is_update(&self) -> bool {
        self.update
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    pub fn select_tpl(&self) -> Option<&str> {
        self.select_template.as_deref()
    }

    pub fn insert_tpl(&self) -> Option<&str> {
        self.insert_template.as_deref()
    }

    pub fn set_col_tpl(&self) -> Option<&str> {
        self.set_col_template.as_deref()
    }

    pub fn set_value_tpl(&self) -> Option<&str> {
        self.set_value_template.as_deref()
    }

    pub fn where_col_tpl(&self) -> Option<&str> {
        self.where_col_template.as_deref()
    }

    pub fn where_value_tpl(&self) -> Option<&str> {
        self.where_value_template.as_deref()
    }

    /// Encode a property value for this column.
    pub fn encode(&self, registry: &CodecRegistry, value: &Value) -> WeaveResult<WireValue> {
        Ok(registry.encode(value, self.wire())?)
    }

    fn validate(&self) -> WeaveResult<()> {
        if self.column.is_empty() || self.property.is_empty() {
            return Err(WeaveError::invalid_mapping(format!(
                "column and property must be set ('{}' -> '{}')",
                self.property, self.column
            )));
        }
        let value_templates = [
            ("insert", &self.insert_template),
            ("set value", &self.set_value_template),
            ("where value", &self.where_value_template),
        ];
        for (clause, template) in value_templates {
            if let Some(tpl) = template {
                let markers = count_markers(tpl);
                if markers != 1 {
                    return Err(WeaveError::invalid_mapping(format!(
                        "{} template of '{}' must contain exactly one '?', found {}",
                        clause, self.property, markers
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Metadata for one table.
#[derive(Debug, Clone)]
pub struct TableMapping {
    catalog: Option<String>,
    schema: Option<String>,
    table: String,
    entity: Option<String>,
    use_delimited: bool,
    case_insensitive: bool,
    free: bool,
    map_underscore: bool,
    columns: Vec<ColumnMapping>,
    by_property: HashMap<String, usize>,
    by_column: HashMap<String, Vec<usize>>,
}

impl TableMapping {
    pub fn builder(table: impl Into<String>) -> TableMappingBuilder {
        TableMappingBuilder::new(table)
    }

    /// A mapping with no declared columns; every property is its own column.
    pub fn free(table: impl Into<String>) -> Self {
        Self {
            catalog: None,
            schema: None,
            table: table.into(),
            entity: None,
            use_delimited: false,
            case_insensitive: true,
            free: true,
            map_underscore: false,
            columns: Vec::new(),
            by_property: HashMap::new(),
            by_column: HashMap::new(),
        }
    }

    pub fn catalog(&self) -> Option<&str> {
        self.catalog.as_deref()
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn entity(&self) -> Option<&str> {
        self.entity.as_deref()
    }

    pub fn use_delimited(&self) -> bool {
        self.use_delimited
    }

    pub fn is_free(&self) -> bool {
        self.free
    }

    /// Columns in declaration order.
    pub fn properties(&self) -> &[ColumnMapping] {
        &self.columns
    }

    pub fn property_by_name(&self, property: &str) -> Option<&ColumnMapping> {
        self.by_property.get(property).map(|&i| &self.columns[i])
    }

    /// The mapping for a column; with overlays, the primary one wins.
    pub fn property_by_column(&self, column: &str) -> Option<&ColumnMapping> {
        let overlays = self.properties_by_column(column);
        overlays
            .iter()
            .find(|m| m.is_primary())
            .or_else(|| overlays.first())
            .copied()
    }

    /// All mappings that share a column.
    pub fn properties_by_column(&self, column: &str) -> Vec<&ColumnMapping> {
        self.by_column
            .get(&self.column_key(column))
            .map(|idx| idx.iter().map(|&i| &self.columns[i]).collect())
            .unwrap_or_default()
    }

    pub fn primary_keys(&self) -> impl Iterator<Item = &ColumnMapping> {
        self.columns.iter().filter(|c| c.is_primary())
    }

    /// Resolve a property, synthesising a column for free mappings.
    pub fn resolve(&self, property: &str) -> WeaveResult<Cow<'_, ColumnMapping>> {
        if let Some(mapping) = self.property_by_name(property) {
            return Ok(Cow::Borrowed(mapping));
        }
        if self.free {
            let column = if self.map_underscore {
                camel_to_snake(property)
            } else {
                property.to_string()
            };
            return Ok(Cow::Owned(ColumnMapping::new(column, property)));
        }
        Err(WeaveError::UnknownProperty {
            table: self.table.clone(),
            property: property.to_string(),
        })
    }

    /// Lookup key for a column name under this mapping's case rule.
    pub fn column_key(&self, column: &str) -> String {
        if self.case_insensitive {
            column.to_ascii_lowercase()
        } else {
            column.to_string()
        }
    }

    /// Decode a result row into a new entity.
    pub fn read_row<E: Entity + Default>(&self, row: &WireRow, registry: &CodecRegistry) -> WeaveResult<E> {
        let mut entity = E::default();
        for (column, wire) in row {
            let overlays = self.properties_by_column(column);
            if overlays.is_empty() {
                if self.free {
                    let property = if self.map_underscore {
                        snake_to_camel(column)
                    } else {
                        column.clone()
                    };
                    if let Some(value) = registry.decode_column(wire, WireType::Other)? {
                        entity.set_property(&property, value)?;
                    }
                }
                continue;
            }
            for mapping in overlays {
                let decoded = match (mapping.declared_type(), mapping.wire()) {
                    (Some(ty), wire_type) => registry.decode(wire, &ty, wire_type)?,
                    (None, Some(wire_type)) => registry.decode_column(wire, wire_type)?,
                    (None, None) => registry.decode_column(wire, WireType::Other)?,
                };
                match decoded {
                    Some(value) => entity.set_property(mapping.property(), value)?,
                    None => tracing::trace!(
                        "no match decoding column '{}' into '{}'",
                        column,
                        mapping.property()
                    ),
                }
            }
        }
        Ok(entity)
    }
}

/// Validating builder for [`TableMapping`].
#[derive(Debug)]
pub struct TableMappingBuilder {
    mapping: TableMapping,
}

impl TableMappingBuilder {
    fn new(table: impl Into<String>) -> Self {
        let mut mapping = TableMapping::free(table);
        mapping.free = false;
        Self { mapping }
    }

    pub fn catalog(mut self, catalog: impl Into<String>) -> Self {
        self.mapping.catalog = Some(catalog.into());
        self
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.mapping.schema = Some(schema.into());
        self
    }

    pub fn entity(mut self, entity: impl Into<String>) -> Self {
        self.mapping.entity = Some(entity.into());
        self
    }

    pub fn use_delimited(mut self, use_delimited: bool) -> Self {
        self.mapping.use_delimited = use_delimited;
        self
    }

    pub fn case_insensitive(mut self, case_insensitive: bool) -> Self {
        self.mapping.case_insensitive = case_insensitive;
        self
    }

    /// Let undeclared properties map to same-named columns.
    pub fn free(mut self, free: bool) -> Self {
        self.mapping.free = free;
        self
    }

    /// In free mode, map `userName` to `user_name`.
    pub fn map_underscore_to_camel_case(mut self, enabled: bool) -> Self {
        self.mapping.map_underscore = enabled;
        self
    }

    pub fn column(mut self, column: ColumnMapping) -> Self {
        self.mapping.columns.push(column);
        self
    }

    pub fn build(self) -> WeaveResult<TableMapping> {
        let mut mapping = self.mapping;
        for (i, column) in mapping.columns.iter().enumerate() {
            column.validate()?;
            if mapping
                .by_property
                .insert(column.property.clone(), i)
                .is_some()
            {
                return Err(WeaveError::ambiguous(format!(
                    "property '{}' is mapped more than once on '{}'",
                    column.property, mapping.table
                )));
            }
            let key = mapping.column_key(&column.column);
            mapping.by_column.entry(key).or_default().push(i);
        }

        for (column, idx) in &mapping.by_column {
            let overlays: Vec<&ColumnMapping> = idx.iter().map(|&i| &mapping.columns[i]).collect();
            let primaries = overlays.iter().filter(|m| m.primary).count();
            let inserts = overlays.iter().filter(|m| !m.primary && m.insert).count();
            let updates = overlays.iter().filter(|m| !m.primary && m.update).count();
            if primaries > 1 || inserts > 1 || updates > 1 {
                return Err(WeaveError::ambiguous(format!(
                    "multiple properties write column '{}' on '{}'",
                    column, mapping.table
                )));
            }
        }

        tracing::debug!(
            "mapped table '{}' with {} columns",
            mapping.table,
            mapping.columns.len()
        );
        Ok(mapping)
    }
}

/// `userName` -> `user_name`
pub fn camel_to_snake(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// `user_name` -> `userName`
pub fn snake_to_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '_' {
            upper = !out.is_empty();
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> TableMapping {
        TableMapping::builder("users")
            .schema("app")
            .column(ColumnMapping::new("id", "id").value_type(ValueType::BigInt).primary())
            .column(ColumnMapping::new("name", "name").value_type(ValueType::Text))
            .column(ColumnMapping::new("age", "age").value_type(ValueType::Int))
            .build()
            .unwrap()
    }

    #[test]
    fn test_indices() {
        let t = users();
        assert_eq!(t.properties().len(), 3);
        assert_eq!(t.property_by_name("name").map(|c| c.column()), Some("name"));
        assert_eq!(t.property_by_column("ID").map(|c| c.property()), Some("id"));
        assert_eq!(t.primary_keys().count(), 1);
        assert_eq!(t.schema(), Some("app"));
    }

    #[test]
    fn test_wire_type_inferred() {
        let t = users();
        assert_eq!(t.property_by_name("age").and_then(|c| c.wire()), Some(WireType::Integer));
        let c = ColumnMapping::new("flag", "flag")
            .value_type(ValueType::Bool)
            .wire_type(WireType::TinyInt);
        assert_eq!(c.wire(), Some(WireType::TinyInt));
    }

    #[test]
    fn test_duplicate_property_rejected() {
        let err = TableMapping::builder("t")
            .column(ColumnMapping::new("a", "x"))
            .column(ColumnMapping::new("a", "x"))
            .build()
            .unwrap_err();
        assert!(matches!(err, WeaveError::AmbiguousMapping(_)));
    }

    #[test]
    fn test_overlay_rules() {
        // One primary plus one writer on the same column is fine.
        let ok = TableMapping::builder("t")
            .column(ColumnMapping::new("code", "id").primary())
            .column(ColumnMapping::new("code", "code"))
            .column(ColumnMapping::new("code", "label").insertable(false).updatable(false))
            .build();
        assert!(ok.is_ok());

        let two_primaries = TableMapping::builder("t")
            .column(ColumnMapping::new("code", "a").primary())
            .column(ColumnMapping::new("code", "b").primary())
            .build();
        assert!(matches!(two_primaries, Err(WeaveError::AmbiguousMapping(_))));

        let two_writers = TableMapping::builder("t")
            .column(ColumnMapping::new("code", "a"))
            .column(ColumnMapping::new("CODE", "b"))
            .build();
        assert!(matches!(two_writers, Err(WeaveError::AmbiguousMapping(_))));
    }

    #[test]
    fn test_value_template_needs_one_marker() {
        let err = TableMapping::builder("t")
            .column(ColumnMapping::new("id", "id").where_value_template("CAST(id AS text)"))
            .build()
            .unwrap_err();
        assert!(matches!(err, WeaveError::InvalidMapping(_)));
    }

    #[test]
    fn test_strict_and_free_resolution() {
        let t = users();
        assert!(matches!(t.resolve("nope"), Err(WeaveError::UnknownProperty { .. })));

        let free = TableMapping::builder("t")
            .free(true)
            .map_underscore_to_camel_case(true)
            .build()
            .unwrap();
        assert_eq!(free.resolve("createdAt").unwrap().column(), "created_at");
        assert_eq!(TableMapping::free("t").resolve("createdAt").unwrap().column(), "createdAt");
    }

    #[test]
    fn test_read_row() {
        let registry = CodecRegistry::new();
        let row: WireRow = vec![
            ("id".to_string(), WireValue::Int(7)),
            ("NAME".to_string(), WireValue::Text("bob".into())),
            ("age".to_string(), WireValue::Null),
            ("extra".to_string(), WireValue::Int(1)),
        ];
        let entity: Row = users().read_row(&row, &registry).unwrap();
        assert_eq!(entity.get("id"), Some(&Value::BigInt(7)));
        assert_eq!(entity.get("name"), Some(&Value::Text("bob".into())));
        assert_eq!(entity.get("age"), Some(&Value::Null));
        assert_eq!(entity.get("extra"), None);
    }

    #[test]
    fn test_read_row_free() {
        let registry = CodecRegistry::new();
        let free = TableMapping::builder("t")
            .free(true)
            .map_underscore_to_camel_case(true)
            .build()
            .unwrap();
        let row: WireRow = vec![("user_name".to_string(), WireValue::Text("x".into()))];
        let entity: Row = free.read_row(&row, &registry).unwrap();
        assert_eq!(entity.get("userName"), Some(&Value::Text("x".into())));
    }

    #[test]
    fn test_case_conversion() {
        assert_eq!(camel_to_snake("userName"), "user_name");
        assert_eq!(camel_to_snake("id"), "id");
        assert_eq!(snake_to_camel("user_name"), "userName");
        assert_eq!(snake_to_camel("_private"), "private");
    }
}

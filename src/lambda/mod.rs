//! Fluent statement builders.
//!
//! [`LambdaTemplate`] bundles a dialect, a codec registry and the known
//! table mappings, and hands out one builder per statement:
//!
//! ```rust,ignore
//! use dbweave::prelude::*;
//!
//! let tpl = LambdaTemplate::new(DialectKind::Postgres.strategy());
//! let stmt = tpl
//!     .select("users")
//!     .gt("age", 10)
//!     .nested(|q| q.eq("dept", 1).or().eq("dept", 2))
//!     .order_by(&["name"])
//!     .build()?;
//! // SELECT * FROM users WHERE age > $1 AND (dept = $2 OR dept = $3) ORDER BY name ASC
//! ```
//!
//! Builders accumulate segments and record the first error they hit;
//! `build()` surfaces it, so a statement is either complete or not produced.

pub mod compare;
pub mod delete;
pub mod insert;
pub mod select;
pub mod update;

use std::sync::Arc;

use crate::codec::CodecRegistry;
use crate::dialect::SqlDialect;
use crate::error::WeaveResult;
use crate::mapping::{ColumnMapping, MappingRegistry, TableMapping};
use crate::segment::Segment;
use crate::value::Value;

pub use compare::{Compare, ConditionState};
pub use delete::DeleteBuilder;
pub use insert::InsertBuilder;
pub use select::SelectBuilder;
pub use update::UpdateBuilder;

/// Builder lifecycle. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Fresh,
    Conditions,
    GroupLocked,
    OrderLocked,
    Built,
}

/// Entry point producing statement builders.
#[derive(Debug, Clone)]
pub struct LambdaTemplate {
    dialect: Arc<dyn SqlDialect>,
    registry: Arc<CodecRegistry>,
    mappings: Arc<MappingRegistry>,
    use_delimited: bool,
}

impl LambdaTemplate {
    pub fn new(dialect: Arc<dyn SqlDialect>) -> Self {
        Self {
            dialect,
            registry: Arc::new(CodecRegistry::new()),
            mappings: Arc::new(MappingRegistry::new()),
            use_delimited: false,
        }
    }

    pub fn with_registry(mut self, registry: Arc<CodecRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_mappings(mut self, mappings: Arc<MappingRegistry>) -> Self {
        self.mappings = mappings;
        self
    }

    /// Quote every identifier.
    pub fn use_delimited(mut self, use_delimited: bool) -> Self {
        self.use_delimited = use_delimited;
        self
    }

    pub fn dialect(&self) -> &dyn SqlDialect {
        self.dialect.as_ref()
    }

    pub fn registry(&self) -> &Arc<CodecRegistry> {
        &self.registry
    }

    pub fn mappings(&self) -> &Arc<MappingRegistry> {
        &self.mappings
    }

    /// Mapping for `table` (optionally `schema.table`), free when unregistered.
    pub fn mapping_for(&self, table: &str) -> Arc<TableMapping> {
        match table.split_once('.') {
            Some((schema, table)) => self.mappings.find_or_free(Some(schema), table),
            None => self.mappings.find_or_free(None, table),
        }
    }

    fn context(&self, mapping: Arc<TableMapping>) -> Context {
        Context {
            dialect: self.dialect.clone(),
            registry: self.registry.clone(),
            use_delimited: self.use_delimited || mapping.use_delimited(),
            mapping,
        }
    }

    pub fn select(&self, table: &str) -> SelectBuilder {
        self.select_mapping(self.mapping_for(table))
    }

    pub fn select_mapping(&self, mapping: Arc<TableMapping>) -> SelectBuilder {
        SelectBuilder::new(self.context(mapping))
    }

    pub fn update(&self, table: &str) -> UpdateBuilder {
        self.update_mapping(self.mapping_for(table))
    }

    pub fn update_mapping(&self, mapping: Arc<TableMapping>) -> UpdateBuilder {
        UpdateBuilder::new(self.context(mapping))
    }

    pub fn delete(&self, table: &str) -> DeleteBuilder {
        self.delete_mapping(self.mapping_for(table))
    }

    pub fn delete_mapping(&self, mapping: Arc<TableMapping>) -> DeleteBuilder {
        DeleteBuilder::new(self.context(mapping))
    }

    pub fn insert(&self, table: &str) -> InsertBuilder {
        self.insert_mapping(self.mapping_for(table))
    }

    pub fn insert_mapping(&self, mapping: Arc<TableMapping>) -> InsertBuilder {
        InsertBuilder::new(self.context(mapping))
    }
}

/// Everything a builder needs besides its own accumulated state.
#[derive(Debug, Clone)]
pub struct Context {
    dialect: Arc<dyn SqlDialect>,
    registry: Arc<CodecRegistry>,
    mapping: Arc<TableMapping>,
    use_delimited: bool,
}

impl Context {
    pub fn dialect(&self) -> &dyn SqlDialect {
        self.dialect.as_ref()
    }

    pub fn registry(&self) -> &CodecRegistry {
        &self.registry
    }

    pub fn mapping(&self) -> &TableMapping {
        &self.mapping
    }

    pub(crate) fn table_name(&self) -> String {
        let m = &self.mapping;
        self.dialect
            .table_name(self.use_delimited, m.catalog(), m.schema(), m.table())
    }

    pub(crate) fn table_segment(&self) -> Segment {
        Segment::text(self.table_name())
    }

    pub(crate) fn column_name(&self, column: &ColumnMapping) -> String {
        let m = &self.mapping;
        self.dialect.column_name(
            self.use_delimited,
            m.catalog(),
            m.schema(),
            m.table(),
            column.column(),
        )
    }

    /// Encode `value` for `column`, wrapped in `template` when one is set.
    pub(crate) fn value_segment(
        &self,
        column: &ColumnMapping,
        value: &Value,
        template: Option<&str>,
    ) -> WeaveResult<Segment> {
        let wire = column.encode(&self.registry, value)?;
        match template {
            Some(tpl) => Segment::template(tpl, vec![wire]),
            None => Ok(Segment::Param(wire)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::DialectKind;
    use crate::mapping::ColumnMapping;

    #[test]
    fn test_phase_order() {
        assert!(Phase::Fresh < Phase::Conditions);
        assert!(Phase::GroupLocked < Phase::OrderLocked);
        assert!(Phase::OrderLocked < Phase::Built);
    }

    #[test]
    fn test_mapping_lookup() {
        let mut mappings = MappingRegistry::new();
        mappings.register(
            TableMapping::builder("users")
                .schema("app")
                .column(ColumnMapping::new("id", "id").primary())
                .build()
                .unwrap(),
        );
        let tpl = LambdaTemplate::new(DialectKind::Postgres.strategy())
            .with_mappings(Arc::new(mappings));
        assert!(!tpl.mapping_for("app.users").is_free());
        assert!(tpl.mapping_for("users").is_free());
    }
}

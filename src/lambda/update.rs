//! UPDATE builder.

use std::collections::HashMap;

use crate::error::{WeaveError, WeaveResult};
use crate::mapping::Entity;
use crate::segment::{MergeSegment, Segment, SqlKeyword};
use crate::statement::BoundStatement;
use crate::value::Value;

use super::compare::{Compare, ConditionState};
use super::select::append_list;
use super::{Context, Phase};

#[derive(Debug)]
pub struct UpdateBuilder {
    cond: ConditionState,
    sets: Vec<(String, Value)>,
    allow_update_key: bool,
    allow_empty_where: bool,
}

impl UpdateBuilder {
    pub(crate) fn new(ctx: Context) -> Self {
        Self {
            cond: ConditionState::new(ctx),
            sets: Vec::new(),
            allow_update_key: false,
            allow_empty_where: false,
        }
    }

    fn set(&mut self, property: String, value: Value) {
        if !self.cond.advance(Phase::OrderLocked, Phase::Fresh, "SET") {
            return;
        }
        match self.sets.iter_mut().find(|(p, _)| *p == property) {
            Some(entry) => entry.1 = value,
            None => self.sets.push((property, value)),
        }
    }

    /// Set one property; a later call for the same property wins.
    pub fn update_to(mut self, property: &str, value: impl Into<Value>) -> Self {
        self.set(property.to_string(), value.into());
        self
    }

    pub fn update_to_map<I, K, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (property, value) in values {
            self.set(property.into(), value.into());
        }
        self
    }

    fn entity_properties<E: Entity>(&self, entity: &E) -> Vec<String> {
        let mapping = self.cond.ctx.mapping();
        if mapping.is_free() && mapping.properties().is_empty() {
            entity.property_names()
        } else {
            mapping
                .properties()
                .iter()
                .filter(|c| c.is_update())
                .map(|c| c.property().to_string())
                .collect()
        }
    }

    /// Set every updatable property that is non-null on `sample`.
    pub fn update_to_sample<E: Entity>(mut self, sample: &E) -> Self {
        for property in self.entity_properties(sample) {
            match sample.get_property(&property) {
                Some(value) if !value.is_null() => self.set(property, value),
                _ => {}
            }
        }
        self
    }

    /// Set every updatable property of `row`, nulls included.
    pub fn update_row<E: Entity>(mut self, row: &E) -> Self {
        for property in self.entity_properties(row) {
            let value = row.get_property(&property).unwrap_or(Value::Null);
            self.set(property, value);
        }
        self
    }

    pub fn reset_update(mut self) -> Self {
        self.sets.clear();
        self
    }

    /// Permit primary-key columns in the SET list.
    pub fn allow_update_key(mut self) -> Self {
        self.allow_update_key = true;
        self
    }

    /// Permit an update without WHERE for the next build only.
    pub fn allow_empty_where(mut self) -> Self {
        self.allow_empty_where = true;
        self
    }

    pub fn condition_state(&self) -> &ConditionState {
        &self.cond
    }

    fn set_list(&self) -> WeaveResult<Vec<Segment>> {
        let ctx = &self.cond.ctx;
        let mapping = ctx.mapping();
        let mut owners: HashMap<String, &str> = HashMap::new();
        let mut items = Vec::new();
        for (property, value) in &self.sets {
            let column = mapping.resolve(property)?;
            if !column.is_update() {
                tracing::trace!("skipping non-updatable property '{}'", property);
                continue;
            }
            if column.is_primary() {
                if value.is_null() {
                    continue;
                }
                if !self.allow_update_key {
                    return Err(WeaveError::unsafe_op(format!(
                        "primary key '{}' cannot be updated without allow_update_key",
                        property
                    )));
                }
            }
            let key = mapping.column_key(column.column());
            if let Some(other) = owners.insert(key, property) {
                return Err(WeaveError::ambiguous(format!(
                    "properties '{}' and '{}' both update column '{}'",
                    other,
                    property,
                    column.column()
                )));
            }

            let mut item = MergeSegment::new();
            item.append(match column.set_col_tpl() {
                Some(tpl) => Segment::text(tpl),
                None => Segment::text(ctx.column_name(&column)),
            });
            item.append(SqlKeyword::Eq);
            match column.set_value_tpl() {
                None if value.is_null() => item.append(SqlKeyword::Null),
                tpl => item.append(ctx.value_segment(&column, value, tpl)?),
            }
            items.push(Segment::from(item));
        }
        Ok(items)
    }

    pub fn build(&mut self) -> WeaveResult<BoundStatement> {
        let allow_empty_where = std::mem::take(&mut self.allow_empty_where);
        self.cond.check()?;
        let items = self.set_list()?;
        if items.is_empty() {
            return Err(WeaveError::NothingToWrite("update has no SET values"));
        }
        if !self.cond.has_predicate() && !allow_empty_where {
            return Err(WeaveError::unsafe_op(format!(
                "update of '{}' without WHERE; call allow_empty_where() to permit it",
                self.cond.ctx.mapping().table()
            )));
        }

        let mut seg = MergeSegment::new();
        seg.append(SqlKeyword::Update);
        seg.append(self.cond.ctx.table_segment());
        seg.append(SqlKeyword::Set);
        append_list(&mut seg, items);
        if self.cond.has_predicate() {
            seg.append(SqlKeyword::Where);
            seg.append(self.cond.where_body());
        }
        let stmt = seg.render(self.cond.ctx.dialect());
        tracing::debug!("built update: {} ({} args)", stmt.sql(), stmt.args().len());
        self.cond.set_phase(Phase::Built);
        Ok(stmt)
    }
}

impl Compare for UpdateBuilder {
    fn condition(&mut self) -> &mut ConditionState {
        &mut self.cond
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::dialect::DialectKind;
    use crate::lambda::LambdaTemplate;
    use crate::mapping::{ColumnMapping, Row, TableMapping};
    use crate::value::WireValue;
    use pretty_assertions::assert_eq;

    fn tpl() -> LambdaTemplate {
        LambdaTemplate::new(DialectKind::Postgres.strategy())
    }

    fn users() -> Arc<TableMapping> {
        Arc::new(
            TableMapping::builder("users")
                .column(ColumnMapping::new("id", "id").primary())
                .column(ColumnMapping::new("user_name", "name"))
                .column(ColumnMapping::new("created", "created").updatable(false))
                .column(
                    ColumnMapping::new("tags", "tags").set_value_template("CAST(? AS jsonb)"),
                )
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_update_requires_where() {
        let err = tpl().update("t").update_to("x", 5).build().unwrap_err();
        assert!(matches!(err, WeaveError::UnsafeOperation(_)));
    }

    #[test]
    fn test_allow_empty_where_renders_no_where() {
        let stmt = tpl()
            .update("t")
            .allow_empty_where()
            .update_to("x", 5)
            .build()
            .unwrap();
        assert_eq!(stmt.sql(), "UPDATE t SET x = $1");
        assert!(!stmt.sql().contains("WHERE"));
        assert_eq!(stmt.args(), &[WireValue::Int(5)]);
    }

    #[test]
    fn test_empty_group_does_not_satisfy_where_guard() {
        let err = tpl()
            .update("t")
            .update_to("x", 1)
            .nested(|q| q)
            .build()
            .unwrap_err();
        assert!(matches!(err, WeaveError::UnsafeOperation(_)));
    }

    #[test]
    fn test_allow_empty_where_is_one_shot() {
        let mut builder = tpl().update("t").allow_empty_where().update_to("x", 5);
        assert!(builder.build().is_ok());
        let err = builder.build().unwrap_err();
        assert!(matches!(err, WeaveError::UnsafeOperation(_)));
    }

    #[test]
    fn test_set_list_and_where() {
        let stmt = tpl()
            .update_mapping(users())
            .update_to("name", "bob")
            .update_to("created", "ignored")
            .update_to("tags", Value::Null)
            .eq("id", 7i64)
            .build()
            .unwrap();
        assert_eq!(
            stmt.sql(),
            "UPDATE users SET user_name = $1, tags = CAST($2 AS jsonb) WHERE id = $3"
        );
        assert_eq!(stmt.args().len(), 3);
    }

    #[test]
    fn test_null_without_template_is_literal() {
        let stmt = tpl()
            .update_mapping(users())
            .update_to("name", Value::Null)
            .eq("id", 1)
            .build()
            .unwrap();
        assert_eq!(stmt.sql(), "UPDATE users SET user_name = NULL WHERE id = $1");
        assert_eq!(stmt.args().len(), 1);
    }

    #[test]
    fn test_primary_key_update() {
        let err = tpl()
            .update_mapping(users())
            .update_to("id", 2)
            .eq("id", 1)
            .build()
            .unwrap_err();
        assert!(matches!(err, WeaveError::UnsafeOperation(_)));

        let stmt = tpl()
            .update_mapping(users())
            .allow_update_key()
            .update_to("id", 2)
            .eq("id", 1)
            .build()
            .unwrap();
        assert_eq!(stmt.sql(), "UPDATE users SET id = $1 WHERE id = $2");
    }

    #[test]
    fn test_update_row_and_sample() {
        let row = Row::new()
            .with("id", Value::Null)
            .with("name", Value::Null)
            .with("tags", "[]");
        let stmt = tpl()
            .update_mapping(users())
            .update_row(&row)
            .eq("id", 1)
            .build()
            .unwrap();
        // The null key is skipped and the null name renders as a literal.
        assert_eq!(
            stmt.sql(),
            "UPDATE users SET user_name = NULL, tags = CAST($1 AS jsonb) WHERE id = $2"
        );

        let stmt = tpl()
            .update_mapping(users())
            .update_to_sample(&row)
            .eq("id", 1)
            .build()
            .unwrap();
        assert_eq!(stmt.sql(), "UPDATE users SET tags = CAST($1 AS jsonb) WHERE id = $2");

        let keyed = Row::new().with("id", 9).with("name", "x");
        let err = tpl()
            .update_mapping(users())
            .update_to_sample(&keyed)
            .eq("id", 1)
            .build()
            .unwrap_err();
        assert!(matches!(err, WeaveError::UnsafeOperation(_)));
    }

    #[test]
    fn test_column_collision() {
        let mapping = TableMapping::builder("t")
            .free(true)
            .map_underscore_to_camel_case(true)
            .build()
            .unwrap();
        let err = tpl()
            .update_mapping(Arc::new(mapping))
            .update_to("userName", "a")
            .update_to("user_name", "b")
            .eq("id", 1)
            .build()
            .unwrap_err();
        assert!(matches!(err, WeaveError::AmbiguousMapping(_)));
    }

    #[test]
    fn test_case_sensitive_columns_do_not_collide() {
        let mapping = TableMapping::builder("t")
            .free(true)
            .case_insensitive(false)
            .build()
            .unwrap();
        let stmt = tpl()
            .update_mapping(Arc::new(mapping))
            .update_to("A", 1)
            .update_to("a", 2)
            .eq("id", 1)
            .build()
            .unwrap();
        assert_eq!(stmt.sql(), "UPDATE t SET A = $1, a = $2 WHERE id = $3");

        let folded = TableMapping::builder("t").free(true).build().unwrap();
        let err = tpl()
            .update_mapping(Arc::new(folded))
            .update_to("A", 1)
            .update_to("a", 2)
            .eq("id", 1)
            .build()
            .unwrap_err();
        assert!(matches!(err, WeaveError::AmbiguousMapping(_)));
    }

    #[test]
    fn test_empty_set_list() {
        let err = tpl()
            .update("t")
            .eq("id", 1)
            .update_to("x", 1)
            .reset_update()
            .build()
            .unwrap_err();
        assert!(matches!(err, WeaveError::NothingToWrite(_)));
    }

    #[test]
    fn test_update_to_map() {
        let stmt = tpl()
            .update("t")
            .update_to_map([("a", 1), ("b", 2)])
            .eq("id", 3)
            .build()
            .unwrap();
        assert_eq!(stmt.sql(), "UPDATE t SET a = $1, b = $2 WHERE id = $3");
    }
}

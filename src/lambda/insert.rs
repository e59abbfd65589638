//! INSERT builder with multi-row VALUES and duplicate-key strategies.

use crate::dialect::DuplicateKeyStrategy;
use crate::error::{WeaveError, WeaveResult};
use crate::mapping::{ColumnMapping, Entity, Row};
use crate::segment::{MergeSegment, Segment, SqlKeyword};
use crate::statement::BoundStatement;
use crate::value::Value;

use super::select::append_list;
use super::Context;

#[derive(Debug)]
pub struct InsertBuilder {
    ctx: Context,
    rows: Vec<Row>,
    strategy: DuplicateKeyStrategy,
}

fn strategy_capability(strategy: DuplicateKeyStrategy) -> &'static str {
    match strategy {
        DuplicateKeyStrategy::Into => "insert",
        DuplicateKeyStrategy::Ignore => "insert ignoring duplicates",
        DuplicateKeyStrategy::Update => "upsert",
    }
}

impl InsertBuilder {
    pub(crate) fn new(ctx: Context) -> Self {
        Self {
            ctx,
            rows: Vec::new(),
            strategy: DuplicateKeyStrategy::default(),
        }
    }

    /// Add one row per entity, reading the insert-eligible properties.
    pub fn apply_entity<E: Entity>(mut self, entities: &[E]) -> Self {
        let mapping = self.ctx.mapping();
        for entity in entities {
            let properties: Vec<String> = if mapping.properties().is_empty() {
                entity.property_names()
            } else {
                mapping
                    .properties()
                    .iter()
                    .filter(|c| c.is_insert())
                    .map(|c| c.property().to_string())
                    .collect()
            };
            let row = properties
                .into_iter()
                .map(|p| {
                    let value = entity.get_property(&p).unwrap_or(Value::Null);
                    (p, value)
                })
                .collect();
            self.rows.push(row);
        }
        self
    }

    pub fn apply_map<I: IntoIterator<Item = Row>>(mut self, rows: I) -> Self {
        self.rows.extend(rows);
        self
    }

    pub fn on_duplicate(mut self, strategy: DuplicateKeyStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Target columns: declared insert-eligible columns, or the union of
    /// row properties for free mappings. Overlays on one column keep the
    /// primary mapping.
    fn columns(&self) -> WeaveResult<Vec<ColumnMapping>> {
        let mapping = self.ctx.mapping();
        let mut columns: Vec<ColumnMapping> = Vec::new();
        let mut push = |column: ColumnMapping| {
            let existing = columns
                .iter()
                .position(|c| c.column().eq_ignore_ascii_case(column.column()));
            match existing {
                Some(i) if column.is_primary() && !columns[i].is_primary() => columns[i] = column,
                Some(_) => {}
                None => columns.push(column),
            }
        };

        if mapping.properties().is_empty() {
            for row in &self.rows {
                for (property, _) in row.iter() {
                    push(mapping.resolve(property)?.into_owned());
                }
            }
        } else {
            for row in &self.rows {
                for (property, _) in row.iter() {
                    mapping.resolve(property)?;
                }
            }
            for column in mapping.properties().iter().filter(|c| c.is_insert()) {
                if self.rows.iter().any(|r| r.get(column.property()).is_some()) {
                    push(column.clone());
                }
            }
        }
        Ok(columns)
    }

    pub fn build(&self) -> WeaveResult<BoundStatement> {
        if self.rows.is_empty() {
            return Err(WeaveError::NothingToWrite("insert has no rows"));
        }
        let columns = self.columns()?;
        if columns.is_empty() {
            return Err(WeaveError::NothingToWrite("insert has no insertable columns"));
        }

        let dialect = self.ctx.dialect();
        let table = self.ctx.table_name();
        let names: Vec<String> = columns.iter().map(|c| self.ctx.column_name(c)).collect();
        let keys: Vec<String> = columns
            .iter()
            .filter(|c| c.is_primary())
            .map(|c| self.ctx.column_name(c))
            .collect();
        if self.strategy == DuplicateKeyStrategy::Update && keys.is_empty() {
            return Err(WeaveError::invalid_mapping(format!(
                "upsert into '{}' needs a primary key column",
                self.ctx.mapping().table()
            )));
        }

        let missing = || WeaveError::capability(dialect.name(), strategy_capability(self.strategy));
        let (head, tail, multi_row) = match dialect.insert() {
            Some(ins) => (
                ins.insert_into(self.strategy, &table).ok_or_else(missing)?,
                ins.conflict_clause(self.strategy, &keys, &names),
                ins.multi_row_values(),
            ),
            None if self.strategy == DuplicateKeyStrategy::Into => {
                (format!("INSERT INTO {}", table), None, true)
            }
            None => return Err(missing()),
        };
        if self.rows.len() > 1 && !multi_row {
            return Err(WeaveError::capability(dialect.name(), "multi-row insert"));
        }

        let mut seg = MergeSegment::new();
        seg.append(Segment::text(head));
        seg.append(SqlKeyword::LeftParen);
        append_list(&mut seg, names.iter().map(|n| Segment::text(n.clone())));
        seg.append(SqlKeyword::RightParen);
        seg.append(SqlKeyword::Values);
        let mut tuples = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let mut tuple = MergeSegment::new();
            tuple.append(SqlKeyword::LeftParen);
            let mut values = Vec::with_capacity(columns.len());
            for column in &columns {
                let value = row.get(column.property()).cloned().unwrap_or(Value::Null);
                values.push(self.ctx.value_segment(column, &value, column.insert_tpl())?);
            }
            append_list(&mut tuple, values);
            tuple.append(SqlKeyword::RightParen);
            tuples.push(Segment::from(tuple));
        }
        append_list(&mut seg, tuples);
        if let Some(tail) = tail {
            seg.append(Segment::text(tail));
        }

        let stmt = seg.render(dialect);
        tracing::debug!(
            "built insert: {} ({} rows, {} args)",
            stmt.sql(),
            self.rows.len(),
            stmt.args().len()
        );
        Ok(stmt)
    }
}

//! SELECT builder.

use crate::dialect::NullsOrder;
use crate::error::{WeaveError, WeaveResult};
use crate::segment::{MergeSegment, Segment, SqlKeyword};
use crate::statement::BoundStatement;

use super::compare::{Compare, ConditionState};
use super::{Context, Phase};

#[derive(Debug)]
pub struct SelectBuilder {
    cond: ConditionState,
    columns: Vec<String>,
    raw_select: Option<String>,
    group_by: Vec<String>,
    order_by: Vec<(String, SqlKeyword, NullsOrder)>,
    page: Option<(u64, u64)>,
}

impl SelectBuilder {
    pub(crate) fn new(ctx: Context) -> Self {
        Self {
            cond: ConditionState::new(ctx),
            columns: Vec::new(),
            raw_select: None,
            group_by: Vec::new(),
            order_by: Vec::new(),
            page: None,
        }
    }

    /// Restrict the select list to `properties`.
    pub fn select(mut self, properties: &[&str]) -> Self {
        if !self.cond.advance(Phase::OrderLocked, Phase::Fresh, "select") {
            return self;
        }
        for property in properties {
            match self.cond.ctx.mapping().resolve(property) {
                Ok(column) => {
                    let name = self.cond.ctx.column_name(&column);
                    let item = match column.select_tpl() {
                        Some(tpl) => format!("{} AS {}", tpl, name),
                        None => name,
                    };
                    if !self.columns.contains(&item) {
                        self.columns.push(item);
                    }
                }
                Err(err) => {
                    self.cond.fail(err);
                    return self;
                }
            }
        }
        self
    }

    /// Back to `SELECT *`.
    pub fn select_all(mut self) -> Self {
        self.columns.clear();
        self.raw_select = None;
        self
    }

    /// Use `sql` verbatim as the select list.
    pub fn apply_select(mut self, sql: impl Into<String>) -> Self {
        self.raw_select = Some(sql.into());
        self
    }

    pub fn group_by(mut self, properties: &[&str]) -> Self {
        if !self.cond.advance(Phase::GroupLocked, Phase::GroupLocked, "GROUP BY") {
            return self;
        }
        for property in properties {
            match self.cond.ctx.mapping().resolve(property) {
                Ok(column) => {
                    let name = self.cond.ctx.column_name(&column);
                    if !self.group_by.contains(&name) {
                        self.group_by.push(name);
                    }
                }
                Err(err) => {
                    self.cond.fail(err);
                    return self;
                }
            }
        }
        self
    }

    /// Ascending order, the default direction.
    pub fn order_by(self, properties: &[&str]) -> Self {
        self.order(properties, SqlKeyword::Asc, NullsOrder::Default)
    }

    pub fn asc(self, properties: &[&str]) -> Self {
        self.order(properties, SqlKeyword::Asc, NullsOrder::Default)
    }

    pub fn desc(self, properties: &[&str]) -> Self {
        self.order(properties, SqlKeyword::Desc, NullsOrder::Default)
    }

    /// Ascending with an explicit NULL placement. Dialects without
    /// `NULLS FIRST/LAST` sort on a null test first.
    pub fn asc_nulls(self, nulls: NullsOrder, properties: &[&str]) -> Self {
        self.order(properties, SqlKeyword::Asc, nulls)
    }

    pub fn desc_nulls(self, nulls: NullsOrder, properties: &[&str]) -> Self {
        self.order(properties, SqlKeyword::Desc, nulls)
    }

    fn order(mut self, properties: &[&str], direction: SqlKeyword, nulls: NullsOrder) -> Self {
        if !self.cond.advance(Phase::OrderLocked, Phase::OrderLocked, "ORDER BY") {
            return self;
        }
        for property in properties {
            match self.cond.ctx.mapping().resolve(property) {
                Ok(column) => {
                    let name = self.cond.ctx.column_name(&column);
                    self.order_by.push((name, direction, nulls));
                }
                Err(err) => {
                    self.cond.fail(err);
                    return self;
                }
            }
        }
        self
    }

    /// Zero-based page of `size` rows. A size of zero disables paging.
    pub fn page(mut self, size: u64, page_number: u64) -> Self {
        self.page = (size > 0).then(|| (page_number.saturating_mul(size), size));
        self
    }

    /// Explicit limit and offset. A limit of zero means no row limit.
    pub fn limit_offset(mut self, limit: u64, offset: u64) -> Self {
        self.page = (limit > 0 || offset > 0).then_some((offset, limit));
        self
    }

    pub fn condition_state(&self) -> &ConditionState {
        &self.cond
    }

    fn segments(&self, with_order: bool) -> MergeSegment {
        let mut seg = MergeSegment::new();
        seg.append(SqlKeyword::Select);
        if let Some(raw) = &self.raw_select {
            seg.append(Segment::text(raw.clone()));
        } else if !self.columns.is_empty() {
            append_list(&mut seg, self.columns.iter().map(|c| Segment::text(c.clone())));
        } else if !self.group_by.is_empty() {
            append_list(&mut seg, self.group_by.iter().map(|c| Segment::text(c.clone())));
        } else {
            seg.append(Segment::text("*"));
        }
        seg.append(SqlKeyword::From);
        seg.append(self.cond.ctx.table_segment());
        if self.cond.has_predicate() {
            seg.append(SqlKeyword::Where);
            seg.append(self.cond.where_body());
        }
        if !self.group_by.is_empty() {
            seg.append(SqlKeyword::GroupBy);
            append_list(&mut seg, self.group_by.iter().map(|c| Segment::text(c.clone())));
        }
        if with_order && !self.order_by.is_empty() {
            seg.append(SqlKeyword::OrderBy);
            append_list(
                &mut seg,
                self.order_by.iter().map(|(column, direction, nulls)| match nulls {
                    NullsOrder::Default => {
                        let mut item = MergeSegment::new();
                        item.append(Segment::text(column.clone()));
                        item.append(*direction);
                        Segment::from(item)
                    }
                    _ => Segment::text(self.cond.ctx.dialect().order_item(
                        column,
                        direction.text(),
                        *nulls,
                    )),
                }),
            );
        }
        seg
    }

    pub fn build(&mut self) -> WeaveResult<BoundStatement> {
        self.cond.check()?;
        let dialect = self.cond.ctx.dialect();
        let base = self.segments(true).render(dialect);
        let stmt = match self.page {
            Some((offset, limit)) => {
                let pager = dialect
                    .paging()
                    .ok_or_else(|| WeaveError::capability(dialect.name(), "paging"))?;
                pager.page_statement(&base, offset, limit, !self.order_by.is_empty())
            }
            None => base,
        };
        tracing::debug!("built select: {} ({} args)", stmt.sql(), stmt.args().len());
        self.cond.set_phase(Phase::Built);
        Ok(stmt)
    }

    /// Row count of the same query, ignoring ORDER BY and paging.
    pub fn build_count(&mut self) -> WeaveResult<BoundStatement> {
        self.cond.check()?;
        let dialect = self.cond.ctx.dialect();
        let base = self.segments(false).render(dialect);
        let stmt = dialect.count_statement(&base);
        tracing::debug!("built count: {} ({} args)", stmt.sql(), stmt.args().len());
        self.cond.set_phase(Phase::Built);
        Ok(stmt)
    }
}

impl Compare for SelectBuilder {
    fn condition(&mut self) -> &mut ConditionState {
        &mut self.cond
    }
}

/// Comma-separated list, commas only between items.
pub(crate) fn append_list<I: IntoIterator<Item = Segment>>(seg: &mut MergeSegment, items: I) {
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            seg.append(SqlKeyword::Comma);
        }
        seg.append(item);
    }
}

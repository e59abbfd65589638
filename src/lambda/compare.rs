//! Predicate construction shared by select, update and delete builders.

use crate::dialect::LikeMode;
use crate::error::{WeaveError, WeaveResult};
use crate::mapping::{Entity, Row};
use crate::segment::{MergeSegment, Segment, SqlKeyword};
use crate::value::Value;

use super::{Context, Phase};

/// Connective to emit before the next predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    /// Start of a group: no connective.
    Empty,
    /// Nothing requested: AND.
    Default,
    Explicit(SqlKeyword),
}

/// Accumulated WHERE segments plus lifecycle bookkeeping.
#[derive(Debug)]
pub struct ConditionState {
    pub(crate) ctx: Context,
    predicate: MergeSegment,
    pending: Pending,
    negate: bool,
    conditions: usize,
    phase: Phase,
    error: Option<WeaveError>,
    failed: bool,
}

impl ConditionState {
    pub(crate) fn new(ctx: Context) -> Self {
        Self {
            ctx,
            predicate: MergeSegment::new(),
            pending: Pending::Default,
            negate: false,
            conditions: 0,
            phase: Phase::Fresh,
            error: None,
            failed: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// The first error recorded by this builder, if any.
    pub fn error(&self) -> Option<&WeaveError> {
        self.error.as_ref()
    }

    /// True once at least one real condition was added. Empty groups
    /// alone do not count.
    pub fn has_predicate(&self) -> bool {
        self.conditions > 0
    }

    /// Conditions added so far, group parentheses excluded.
    pub fn condition_count(&self) -> usize {
        self.conditions
    }

    /// WHERE body with the leading connective removed.
    pub(crate) fn where_body(&self) -> MergeSegment {
        self.predicate.strip_leading_connective()
    }

    /// Keep the first error; later ones are consequences.
    pub(crate) fn fail(&mut self, err: WeaveError) {
        if self.error.is_none() && !self.failed {
            tracing::debug!("builder error recorded: {}", err);
            self.error = Some(err);
        }
        self.failed = true;
    }

    /// Surface the recorded error before a build.
    pub(crate) fn check(&mut self) -> WeaveResult<()> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        if self.failed {
            return Err(WeaveError::state("builder failed during construction"));
        }
        Ok(())
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    /// Move to `target`, failing if the builder is already past `limit`.
    pub(crate) fn advance(&mut self, limit: Phase, target: Phase, what: &str) -> bool {
        if self.phase == Phase::Built {
            self.fail(WeaveError::state(format!("{} after the statement was built", what)));
            return false;
        }
        if self.phase > limit {
            self.fail(WeaveError::state(format!(
                "{} is not allowed once {} is set",
                what,
                match self.phase {
                    Phase::GroupLocked => "GROUP BY",
                    _ => "ORDER BY",
                }
            )));
            return false;
        }
        if target > self.phase {
            self.phase = target;
        }
        true
    }

    fn push(&mut self, segments: Vec<Segment>) -> bool {
        if !self.advance(Phase::Conditions, Phase::Conditions, "adding a condition") {
            return false;
        }
        match self.pending {
            Pending::Empty => {}
            Pending::Default => self.predicate.append(SqlKeyword::And),
            Pending::Explicit(kw) => self.predicate.append(kw),
        }
        if std::mem::take(&mut self.negate) {
            self.predicate.append(SqlKeyword::Not);
        }
        self.predicate.append_all(segments);
        self.pending = Pending::Default;
        true
    }

    fn push_condition(&mut self, segments: Vec<Segment>) {
        if self.push(segments) {
            self.conditions += 1;
        }
    }

    fn connective(&mut self, kw: SqlKeyword) {
        // A connective at the start of a group has nothing to join.
        if self.pending != Pending::Empty {
            self.pending = Pending::Explicit(kw);
        }
    }

    /// Negate the next condition or group.
    fn negate(&mut self) {
        self.negate = true;
    }

    pub(crate) fn open_group(&mut self) {
        self.push(vec![SqlKeyword::LeftParen.into()]);
        self.pending = Pending::Empty;
    }

    pub(crate) fn close_group(&mut self) {
        self.pending = Pending::Empty;
        self.negate = false;
        self.push(vec![SqlKeyword::RightParen.into()]);
    }

    /// Non-null `(property, value)` pairs of `sample`. Declared mappings
    /// drive the property list; free ones use what the sample carries.
    fn sample_pairs<E: Entity>(&self, sample: &E) -> Vec<(String, Value)> {
        let mapping = self.ctx.mapping();
        let properties = if mapping.properties().is_empty() {
            sample.property_names()
        } else {
            mapping
                .properties()
                .iter()
                .map(|c| c.property().to_string())
                .collect()
        };
        properties
            .into_iter()
            .filter_map(|p| match sample.get_property(&p) {
                Some(value) if !value.is_null() => Some((p, value)),
                _ => None,
            })
            .collect()
    }

    fn column(&self, column: &crate::mapping::ColumnMapping) -> Segment {
        match column.where_col_tpl() {
            Some(tpl) => Segment::text(tpl),
            None => Segment::text(self.ctx.column_name(column)),
        }
    }

    fn try_compare(&self, property: &str, op: SqlKeyword, value: &Value) -> WeaveResult<Vec<Segment>> {
        let column = self.ctx.mapping().resolve(property)?;
        let value = self.ctx.value_segment(&column, value, column.where_value_tpl())?;
        Ok(vec![self.column(&column), op.into(), value])
    }

    pub(crate) fn compare(&mut self, property: &str, op: SqlKeyword, value: Value) {
        match self.try_compare(property, op, &value) {
            Ok(segments) => self.push_condition(segments),
            Err(err) => self.fail(err),
        }
    }

    fn try_like(&self, property: &str, negate: bool, mode: LikeMode, value: &Value) -> WeaveResult<Vec<Segment>> {
        let column = self.ctx.mapping().resolve(property)?;
        let wire = column.encode(self.ctx.registry(), value)?;
        let marker = column.where_value_tpl().unwrap_or("?");
        let pattern = self.ctx.dialect().like_pattern(mode, marker);
        let mut segments = vec![self.column(&column)];
        if negate {
            segments.push(SqlKeyword::Not.into());
        }
        segments.push(SqlKeyword::Like.into());
        segments.push(Segment::template(pattern, vec![wire])?);
        Ok(segments)
    }

    pub(crate) fn like(&mut self, property: &str, negate: bool, mode: LikeMode, value: Value) {
        match self.try_like(property, negate, mode, &value) {
            Ok(segments) => self.push_condition(segments),
            Err(err) => self.fail(err),
        }
    }

    pub(crate) fn null_check(&mut self, property: &str, op: SqlKeyword) {
        match self.ctx.mapping().resolve(property) {
            Ok(column) => {
                let segments = vec![self.column(&column), op.into()];
                self.push_condition(segments);
            }
            Err(err) => self.fail(err),
        }
    }

    fn try_in(&self, property: &str, negate: bool, values: &[Value]) -> WeaveResult<Vec<Segment>> {
        if values.is_empty() {
            return Err(WeaveError::InvalidArgument(format!(
                "empty value list for IN on '{}'",
                property
            )));
        }
        let column = self.ctx.mapping().resolve(property)?;
        let mut segments = vec![self.column(&column)];
        if negate {
            segments.push(SqlKeyword::Not.into());
        }
        segments.push(SqlKeyword::In.into());
        segments.push(SqlKeyword::LeftParen.into());
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                segments.push(SqlKeyword::Comma.into());
            }
            segments.push(self.ctx.value_segment(&column, value, column.where_value_tpl())?);
        }
        segments.push(SqlKeyword::RightParen.into());
        Ok(segments)
    }

    pub(crate) fn in_list(&mut self, property: &str, negate: bool, values: Vec<Value>) {
        match self.try_in(property, negate, &values) {
            Ok(segments) => self.push_condition(segments),
            Err(err) => self.fail(err),
        }
    }

    fn try_between(&self, property: &str, negate: bool, low: &Value, high: &Value) -> WeaveResult<Vec<Segment>> {
        let column = self.ctx.mapping().resolve(property)?;
        let tpl = column.where_value_tpl();
        let mut segments = vec![self.column(&column)];
        if negate {
            segments.push(SqlKeyword::Not.into());
        }
        segments.push(SqlKeyword::Between.into());
        segments.push(self.ctx.value_segment(&column, low, tpl)?);
        segments.push(SqlKeyword::And.into());
        segments.push(self.ctx.value_segment(&column, high, tpl)?);
        Ok(segments)
    }

    pub(crate) fn between(&mut self, property: &str, negate: bool, low: Value, high: Value) {
        match self.try_between(property, negate, &low, &high) {
            Ok(segments) => self.push_condition(segments),
            Err(err) => self.fail(err),
        }
    }

    pub(crate) fn raw(&mut self, sql: &str, args: Vec<Value>) {
        if sql.trim().is_empty() {
            return;
        }
        let encoded: WeaveResult<Vec<_>> = args
            .iter()
            .map(|v| self.ctx.registry().encode(v, None).map_err(WeaveError::from))
            .collect();
        match encoded.and_then(|wires| Segment::template(sql, wires)) {
            Ok(segment) => self.push_condition(vec![segment]),
            Err(err) => self.fail(err),
        }
    }
}

/// Fluent predicate methods. Calls chain with an implicit AND unless
/// [`or`](Compare::or) is called in between.
pub trait Compare: Sized {
    fn condition(&mut self) -> &mut ConditionState;

    fn eq(mut self, property: &str, value: impl Into<Value>) -> Self {
        self.condition().compare(property, SqlKeyword::Eq, value.into());
        self
    }

    fn ne(mut self, property: &str, value: impl Into<Value>) -> Self {
        self.condition().compare(property, SqlKeyword::Ne, value.into());
        self
    }

    fn gt(mut self, property: &str, value: impl Into<Value>) -> Self {
        self.condition().compare(property, SqlKeyword::Gt, value.into());
        self
    }

    fn ge(mut self, property: &str, value: impl Into<Value>) -> Self {
        self.condition().compare(property, SqlKeyword::Ge, value.into());
        self
    }

    fn lt(mut self, property: &str, value: impl Into<Value>) -> Self {
        self.condition().compare(property, SqlKeyword::Lt, value.into());
        self
    }

    fn le(mut self, property: &str, value: impl Into<Value>) -> Self {
        self.condition().compare(property, SqlKeyword::Le, value.into());
        self
    }

    /// `LIKE '%v%'`
    fn like(mut self, property: &str, value: impl Into<Value>) -> Self {
        self.condition().like(property, false, LikeMode::Contains, value.into());
        self
    }

    fn not_like(mut self, property: &str, value: impl Into<Value>) -> Self {
        self.condition().like(property, true, LikeMode::Contains, value.into());
        self
    }

    /// `LIKE '%v'`
    fn like_left(mut self, property: &str, value: impl Into<Value>) -> Self {
        self.condition().like(property, false, LikeMode::EndsWith, value.into());
        self
    }

    fn not_like_left(mut self, property: &str, value: impl Into<Value>) -> Self {
        self.condition().like(property, true, LikeMode::EndsWith, value.into());
        self
    }

    /// `LIKE 'v%'`
    fn like_right(mut self, property: &str, value: impl Into<Value>) -> Self {
        self.condition().like(property, false, LikeMode::StartsWith, value.into());
        self
    }

    fn not_like_right(mut self, property: &str, value: impl Into<Value>) -> Self {
        self.condition().like(property, true, LikeMode::StartsWith, value.into());
        self
    }

    fn is_null(mut self, property: &str) -> Self {
        self.condition().null_check(property, SqlKeyword::IsNull);
        self
    }

    fn is_not_null(mut self, property: &str) -> Self {
        self.condition().null_check(property, SqlKeyword::IsNotNull);
        self
    }

    /// `IN (...)`; an empty list is an error.
    fn in_list<I, V>(mut self, property: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.condition().in_list(property, false, values);
        self
    }

    fn not_in<I, V>(mut self, property: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.condition().in_list(property, true, values);
        self
    }

    fn between(mut self, property: &str, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        self.condition().between(property, false, low.into(), high.into());
        self
    }

    fn not_between(mut self, property: &str, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        self.condition().between(property, true, low.into(), high.into());
        self
    }

    fn and(mut self) -> Self {
        self.condition().connective(SqlKeyword::And);
        self
    }

    fn or(mut self) -> Self {
        self.condition().connective(SqlKeyword::Or);
        self
    }

    /// Parenthesised sub-predicate. The group joins with the pending
    /// connective; conditions inside start fresh.
    fn nested(mut self, build: impl FnOnce(Self) -> Self) -> Self {
        self.condition().open_group();
        let mut this = build(self);
        this.condition().close_group();
        this
    }

    /// Negate what comes next: `AND NOT` / `OR NOT` before the next
    /// condition or nested group.
    fn not(mut self) -> Self {
        self.condition().negate();
        self
    }

    /// Run `build` only when `test` holds.
    fn if_true(self, test: bool, build: impl FnOnce(Self) -> Self) -> Self {
        if test { build(self) } else { self }
    }

    /// `(p > low AND p < high)`
    fn range_open_open(self, property: &str, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        let (low, high) = (low.into(), high.into());
        self.nested(|q| q.gt(property, low).lt(property, high))
    }

    fn range_not_open_open(self, property: &str, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        self.not().range_open_open(property, low, high)
    }

    /// `(p > low AND p <= high)`
    fn range_open_closed(self, property: &str, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        let (low, high) = (low.into(), high.into());
        self.nested(|q| q.gt(property, low).le(property, high))
    }

    fn range_not_open_closed(self, property: &str, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        self.not().range_open_closed(property, low, high)
    }

    /// `(p >= low AND p < high)`
    fn range_closed_open(self, property: &str, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        let (low, high) = (low.into(), high.into());
        self.nested(|q| q.ge(property, low).lt(property, high))
    }

    fn range_not_closed_open(self, property: &str, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        self.not().range_closed_open(property, low, high)
    }

    /// `(p >= low AND p <= high)`
    fn range_closed_closed(self, property: &str, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        let (low, high) = (low.into(), high.into());
        self.nested(|q| q.ge(property, low).le(property, high))
    }

    fn range_not_closed_closed(self, property: &str, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        self.not().range_closed_closed(property, low, high)
    }

    /// Group of `=` conditions, one per non-null property of `sample`.
    /// Adds nothing when every property is null.
    fn eq_by_sample<E: Entity>(mut self, sample: &E) -> Self {
        let pairs = self.condition().sample_pairs(sample);
        if pairs.is_empty() {
            return self;
        }
        self.nested(|mut q| {
            for (property, value) in pairs {
                q.condition().compare(&property, SqlKeyword::Eq, value);
            }
            q
        })
    }

    fn eq_by_sample_map(self, sample: &Row) -> Self {
        self.eq_by_sample(sample)
    }

    /// Raw predicate with `?` markers bound to `args`.
    fn apply(mut self, sql: &str, args: Vec<Value>) -> Self {
        self.condition().raw(sql, args);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::DialectKind;
    use crate::lambda::LambdaTemplate;
    use pretty_assertions::assert_eq;

    fn tpl(kind: DialectKind) -> LambdaTemplate {
        LambdaTemplate::new(kind.strategy())
    }

    #[test]
    fn test_implicit_and() {
        let stmt = tpl(DialectKind::Postgres)
            .select("t")
            .eq("a", 1)
            .ne("b", 2)
            .build()
            .unwrap();
        assert_eq!(stmt.sql(), "SELECT * FROM t WHERE a = $1 AND b <> $2");
    }

    #[test]
    fn test_or_applies_once() {
        let stmt = tpl(DialectKind::MySql)
            .select("t")
            .eq("a", 1)
            .or()
            .eq("b", 2)
            .eq("c", 3)
            .build()
            .unwrap();
        assert_eq!(stmt.sql(), "SELECT * FROM t WHERE a = ? OR b = ? AND c = ?");
    }

    #[test]
    fn test_nested_wrapping() {
        let empty = tpl(DialectKind::Sqlite)
            .select("t")
            .eq("a", 1)
            .nested(|q| q)
            .build()
            .unwrap();
        assert_eq!(empty.sql(), "SELECT * FROM t WHERE a = ? AND ()");

        let one = tpl(DialectKind::Sqlite)
            .select("t")
            .nested(|q| q.eq("a", 1))
            .build()
            .unwrap();
        assert_eq!(one.sql(), "SELECT * FROM t WHERE (a = ?)");

        let many = tpl(DialectKind::Sqlite)
            .select("t")
            .eq("x", 0)
            .or()
            .nested(|q| q.or().eq("a", 1).or().eq("b", 2).eq("c", 3))
            .build()
            .unwrap();
        assert_eq!(
            many.sql(),
            "SELECT * FROM t WHERE x = ? OR (a = ? OR b = ? AND c = ?)"
        );
        assert_eq!(many.args().len(), 4);
    }

    #[test]
    fn test_deeply_nested() {
        let stmt = tpl(DialectKind::Postgres)
            .select("t")
            .nested(|q| q.eq("a", 1).nested(|q| q.eq("b", 2).or().eq("c", 3)))
            .build()
            .unwrap();
        assert_eq!(
            stmt.sql(),
            "SELECT * FROM t WHERE (a = $1 AND (b = $2 OR c = $3))"
        );
    }

    #[test]
    fn test_in_and_between() {
        let stmt = tpl(DialectKind::Postgres)
            .select("t")
            .in_list("a", [1, 2, 3])
            .not_between("b", 5, 9)
            .build()
            .unwrap();
        assert_eq!(
            stmt.sql(),
            "SELECT * FROM t WHERE a IN ($1, $2, $3) AND b NOT BETWEEN $4 AND $5"
        );
        assert_eq!(stmt.args().len(), 5);
    }

    #[test]
    fn test_empty_in_list_fails() {
        let err = tpl(DialectKind::Postgres)
            .select("t")
            .in_list("a", Vec::<i32>::new())
            .build()
            .unwrap_err();
        assert!(matches!(err, WeaveError::InvalidArgument(_)));
    }

    #[test]
    fn test_null_checks() {
        let stmt = tpl(DialectKind::Postgres)
            .select("t")
            .is_null("a")
            .is_not_null("b")
            .build()
            .unwrap();
        assert_eq!(stmt.sql(), "SELECT * FROM t WHERE a IS NULL AND b IS NOT NULL");
        assert!(stmt.args().is_empty());
    }

    #[test]
    fn test_like_variants() {
        let stmt = tpl(DialectKind::Postgres)
            .select("t")
            .like("a", "x")
            .not_like_right("b", "y")
            .like_left("c", "z")
            .build()
            .unwrap();
        assert_eq!(
            stmt.sql(),
            "SELECT * FROM t WHERE a LIKE '%' || $1 || '%' AND b NOT LIKE $2 || '%' AND c LIKE '%' || $3"
        );

        let my = tpl(DialectKind::MySql)
            .select("t")
            .like("a", "x")
            .build()
            .unwrap();
        assert_eq!(my.sql(), "SELECT * FROM t WHERE a LIKE CONCAT('%', ?, '%')");
    }

    #[test]
    fn test_apply_raw() {
        let stmt = tpl(DialectKind::Postgres)
            .select("t")
            .eq("a", 1)
            .apply("lower(name) = ?", vec![Value::from("bob")])
            .build()
            .unwrap();
        assert_eq!(stmt.sql(), "SELECT * FROM t WHERE a = $1 AND lower(name) = $2");

        let err = tpl(DialectKind::Postgres)
            .select("t")
            .apply("a = ? AND b = ?", vec![Value::from(1)])
            .build()
            .unwrap_err();
        assert!(matches!(err, WeaveError::InvalidMapping(_)));
    }

    #[test]
    fn test_not_prefixes_connective() {
        let stmt = tpl(DialectKind::Postgres)
            .select("t")
            .eq("a", 1)
            .not()
            .eq("b", 2)
            .or()
            .not()
            .is_null("c")
            .build()
            .unwrap();
        assert_eq!(
            stmt.sql(),
            "SELECT * FROM t WHERE a = $1 AND NOT b = $2 OR NOT c IS NULL"
        );

        let first = tpl(DialectKind::Postgres)
            .select("t")
            .not()
            .nested(|q| q.eq("a", 1).or().eq("b", 2))
            .build()
            .unwrap();
        assert_eq!(first.sql(), "SELECT * FROM t WHERE NOT (a = $1 OR b = $2)");
    }

    #[test]
    fn test_ranges() {
        let stmt = tpl(DialectKind::MySql)
            .select("t")
            .eq("seq", 1)
            .range_open_open("n", 2, 3)
            .or()
            .range_closed_closed("m", 4, 5)
            .build()
            .unwrap();
        assert_eq!(
            stmt.sql(),
            "SELECT * FROM t WHERE seq = ? AND (n > ? AND n < ?) OR (m >= ? AND m <= ?)"
        );
        assert_eq!(stmt.args().len(), 5);

        let half = tpl(DialectKind::MySql)
            .select("t")
            .range_open_closed("n", 1, 2)
            .range_closed_open("m", 3, 4)
            .build()
            .unwrap();
        assert_eq!(
            half.sql(),
            "SELECT * FROM t WHERE (n > ? AND n <= ?) AND (m >= ? AND m < ?)"
        );
    }

    #[test]
    fn test_negated_ranges() {
        let stmt = tpl(DialectKind::MySql)
            .select("t")
            .eq("seq", 1)
            .range_not_open_open("n", 2, 3)
            .or()
            .range_not_closed_open("m", 4, 5)
            .build()
            .unwrap();
        assert_eq!(
            stmt.sql(),
            "SELECT * FROM t WHERE seq = ? AND NOT (n > ? AND n < ?) OR NOT (m >= ? AND m < ?)"
        );

        let closed = tpl(DialectKind::MySql)
            .select("t")
            .range_not_open_closed("n", 1, 2)
            .range_not_closed_closed("m", 3, 4)
            .build()
            .unwrap();
        assert_eq!(
            closed.sql(),
            "SELECT * FROM t WHERE NOT (n > ? AND n <= ?) AND NOT (m >= ? AND m <= ?)"
        );
    }

    #[test]
    fn test_if_true() {
        let name: Option<&str> = None;
        let stmt = tpl(DialectKind::Postgres)
            .select("t")
            .if_true(name.is_some(), |q| q.eq("name", name.unwrap_or_default()))
            .if_true(true, |q| q.gt("age", 18))
            .build()
            .unwrap();
        assert_eq!(stmt.sql(), "SELECT * FROM t WHERE age > $1");
    }

    #[test]
    fn test_eq_by_sample() {
        let mapping = crate::mapping::TableMapping::builder("users")
            .column(crate::mapping::ColumnMapping::new("id", "id").primary())
            .column(crate::mapping::ColumnMapping::new("user_name", "name"))
            .column(crate::mapping::ColumnMapping::new("age", "age"))
            .build()
            .unwrap();
        let sample = Row::new()
            .with("id", Value::Null)
            .with("name", "ann")
            .with("age", 31)
            .with("extra", 1);
        let stmt = tpl(DialectKind::Postgres)
            .select_mapping(std::sync::Arc::new(mapping))
            .gt("id", 0)
            .eq_by_sample(&sample)
            .build()
            .unwrap();
        assert_eq!(
            stmt.sql(),
            "SELECT * FROM users WHERE id > $1 AND (user_name = $2 AND age = $3)"
        );

        let free = tpl(DialectKind::Postgres)
            .select("t")
            .eq_by_sample_map(&Row::new().with("a", 1).with("b", Value::Null))
            .build()
            .unwrap();
        assert_eq!(free.sql(), "SELECT * FROM t WHERE (a = $1)");

        let empty = tpl(DialectKind::Postgres)
            .select("t")
            .eq_by_sample_map(&Row::new().with("a", Value::Null))
            .build()
            .unwrap();
        assert_eq!(empty.sql(), "SELECT * FROM t");
    }

    #[test]
    fn test_empty_group_is_not_a_condition() {
        let mut builder = tpl(DialectKind::Sqlite).select("t").nested(|q| q);
        assert_eq!(builder.condition_state().condition_count(), 0);
        assert!(!builder.condition_state().has_predicate());
        assert_eq!(builder.build().unwrap().sql(), "SELECT * FROM t");

        let counted = tpl(DialectKind::Sqlite)
            .select("t")
            .nested(|q| q.eq("a", 1).nested(|q| q.is_null("b")));
        assert_eq!(counted.condition_state().condition_count(), 2);
    }

    #[test]
    fn test_first_error_is_kept() {
        let mapping = crate::mapping::TableMapping::builder("t")
            .column(crate::mapping::ColumnMapping::new("a", "a"))
            .build()
            .unwrap();
        let err = tpl(DialectKind::Postgres)
            .select_mapping(std::sync::Arc::new(mapping))
            .eq("missing", 1)
            .in_list("a", Vec::<i32>::new())
            .build()
            .unwrap_err();
        assert!(matches!(err, WeaveError::UnknownProperty { .. }));
    }
}

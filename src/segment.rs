//! Segment model: an immutable tree of SQL fragments rendered in one pass.
//!
//! Builders only append segments. All render-time state (the SQL buffer,
//! the argument list and the placeholder counter) lives in a local
//! [`RenderContext`], so rendering the same tree twice gives identical output.

use crate::dialect::SqlDialect;
use crate::error::{WeaveError, WeaveResult};
use crate::statement::BoundStatement;
use crate::value::WireValue;

/// Spacing class of a keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordClass {
    /// Statement verbs (SELECT, UPDATE, ...)
    Verb,
    /// Clause introducers (FROM, WHERE, SET, ...)
    Clause,
    /// AND / OR
    Connective,
    /// Comparison and predicate operators
    Operator,
    /// `(`
    Open,
    /// `)`
    Close,
    /// `,`
    Separator,
}

/// Fixed keyword taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlKeyword {
    Select,
    Update,
    DeleteFrom,
    InsertInto,
    From,
    Where,
    Set,
    Values,
    GroupBy,
    OrderBy,
    As,
    And,
    Or,
    Not,
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Like,
    In,
    Between,
    IsNull,
    IsNotNull,
    Asc,
    Desc,
    Null,
    LeftParen,
    RightParen,
    Comma,
}

impl SqlKeyword {
    pub fn text(&self) -> &'static str {
        match self {
            SqlKeyword::Select => "SELECT",
            SqlKeyword::Update => "UPDATE",
            SqlKeyword::DeleteFrom => "DELETE FROM",
            SqlKeyword::InsertInto => "INSERT INTO",
            SqlKeyword::From => "FROM",
            SqlKeyword::Where => "WHERE",
            SqlKeyword::Set => "SET",
            SqlKeyword::Values => "VALUES",
            SqlKeyword::GroupBy => "GROUP BY",
            SqlKeyword::OrderBy => "ORDER BY",
            SqlKeyword::As => "AS",
            SqlKeyword::And => "AND",
            SqlKeyword::Or => "OR",
            SqlKeyword::Not => "NOT",
            SqlKeyword::Eq => "=",
            SqlKeyword::Ne => "<>",
            SqlKeyword::Gt => ">",
            SqlKeyword::Ge => ">=",
            SqlKeyword::Lt => "<",
            SqlKeyword::Le => "<=",
            SqlKeyword::Like => "LIKE",
            SqlKeyword::In => "IN",
            SqlKeyword::Between => "BETWEEN",
            SqlKeyword::IsNull => "IS NULL",
            SqlKeyword::IsNotNull => "IS NOT NULL",
            SqlKeyword::Asc => "ASC",
            SqlKeyword::Desc => "DESC",
            SqlKeyword::Null => "NULL",
            SqlKeyword::LeftParen => "(",
            SqlKeyword::RightParen => ")",
            SqlKeyword::Comma => ",",
        }
    }

    pub fn class(&self) -> KeywordClass {
        match self {
            SqlKeyword::Select
            | SqlKeyword::Update
            | SqlKeyword::DeleteFrom
            | SqlKeyword::InsertInto => KeywordClass::Verb,
            SqlKeyword::From
            | SqlKeyword::Where
            | SqlKeyword::Set
            | SqlKeyword::Values
            | SqlKeyword::GroupBy
            | SqlKeyword::OrderBy
            | SqlKeyword::As => KeywordClass::Clause,
            SqlKeyword::And | SqlKeyword::Or => KeywordClass::Connective,
            SqlKeyword::LeftParen => KeywordClass::Open,
            SqlKeyword::RightParen => KeywordClass::Close,
            SqlKeyword::Comma => KeywordClass::Separator,
            _ => KeywordClass::Operator,
        }
    }

    pub fn is_connective(&self) -> bool {
        self.class() == KeywordClass::Connective
    }
}

/// One node of the segment tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// A taxonomy keyword.
    Keyword(SqlKeyword),
    /// Literal SQL text such as an identifier.
    Text(String),
    /// A single bound argument rendered as a placeholder.
    Param(WireValue),
    /// SQL text whose `?` markers are bound, in order, to `args`.
    Template { sql: String, args: Vec<WireValue> },
    /// A nested sequence rendered inline.
    Merge(MergeSegment),
}

impl Segment {
    pub fn text(sql: impl Into<String>) -> Self {
        Segment::Text(sql.into())
    }

    /// A template segment; the marker count must match `args`.
    pub fn template(sql: impl Into<String>, args: Vec<WireValue>) -> WeaveResult<Self> {
        let sql = sql.into();
        let markers = count_markers(&sql);
        if markers != args.len() {
            return Err(WeaveError::invalid_mapping(format!(
                "'{}' has {} markers but {} arguments",
                sql,
                markers,
                args.len()
            )));
        }
        Ok(Segment::Template { sql, args })
    }

    pub fn keyword(&self) -> Option<SqlKeyword> {
        match self {
            Segment::Keyword(kw) => Some(*kw),
            _ => None,
        }
    }

    pub fn is_keyword(&self, kw: SqlKeyword) -> bool {
        self.keyword() == Some(kw)
    }

    fn render_into(&self, ctx: &mut RenderContext<'_>) {
        match self {
            Segment::Keyword(kw) => ctx.push(kw.text(), kw.class()),
            Segment::Text(text) => ctx.push(text, KeywordClass::Operator),
            Segment::Param(value) => {
                let marker = ctx.bind(value.clone());
                ctx.push(&marker, KeywordClass::Operator);
            }
            Segment::Template { sql, args } => {
                let expanded = ctx.expand(sql, args);
                ctx.push(&expanded, KeywordClass::Operator);
            }
            Segment::Merge(merge) => {
                for child in &merge.items {
                    child.render_into(ctx);
                }
            }
        }
    }
}

impl From<SqlKeyword> for Segment {
    fn from(kw: SqlKeyword) -> Self {
        Segment::Keyword(kw)
    }
}

impl From<MergeSegment> for Segment {
    fn from(merge: MergeSegment) -> Self {
        Segment::Merge(merge)
    }
}

/// An ordered sequence of segments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeSegment {
    items: Vec<Segment>,
}

impl MergeSegment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, segment: impl Into<Segment>) {
        self.items.push(segment.into());
    }

    pub fn append_all<I, S>(&mut self, segments: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<Segment>,
    {
        self.items.extend(segments.into_iter().map(Into::into));
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn first(&self) -> Option<&Segment> {
        self.items.first()
    }

    /// The sequence without its first `n` segments.
    pub fn sub(&self, n: usize) -> MergeSegment {
        MergeSegment {
            items: self.items.iter().skip(n).cloned().collect(),
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.items.iter()
    }

    /// Drop one leading AND/OR, if present.
    pub fn strip_leading_connective(&self) -> MergeSegment {
        match self.first().and_then(Segment::keyword) {
            Some(kw) if kw.is_connective() => self.sub(1),
            _ => self.clone(),
        }
    }

    /// Render to text plus arguments, numbering placeholders from 1.
    pub fn render(&self, dialect: &dyn SqlDialect) -> BoundStatement {
        let mut ctx = RenderContext::new(dialect);
        for item in &self.items {
            item.render_into(&mut ctx);
        }
        ctx.finish()
    }
}

impl FromIterator<Segment> for MergeSegment {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

/// Mutable state owned by a single render pass.
struct RenderContext<'a> {
    sql: String,
    args: Vec<WireValue>,
    dialect: &'a dyn SqlDialect,
    glue: bool,
}

impl<'a> RenderContext<'a> {
    fn new(dialect: &'a dyn SqlDialect) -> Self {
        Self {
            sql: String::new(),
            args: Vec::new(),
            dialect,
            glue: true,
        }
    }

    fn push(&mut self, token: &str, class: KeywordClass) {
        if token.is_empty() {
            return;
        }
        let tight = matches!(class, KeywordClass::Close | KeywordClass::Separator);
        if !self.glue && !tight {
            self.sql.push(' ');
        }
        self.sql.push_str(token);
        self.glue = class == KeywordClass::Open;
    }

    fn bind(&mut self, value: WireValue) -> String {
        self.args.push(value);
        self.dialect.placeholder(self.args.len())
    }

    fn expand(&mut self, sql: &str, args: &[WireValue]) -> String {
        let mut out = String::with_capacity(sql.len());
        let mut next = args.iter();
        let mut quoted = false;
        for c in sql.chars() {
            match c {
                '\'' => {
                    quoted = !quoted;
                    out.push(c);
                }
                '?' if !quoted => match next.next() {
                    Some(arg) => out.push_str(&self.bind(arg.clone())),
                    None => out.push(c),
                },
                _ => out.push(c),
            }
        }
        out
    }

    fn finish(self) -> BoundStatement {
        BoundStatement::new(self.sql, self.args)
    }
}

/// Number of `?` markers outside single-quoted literals.
pub fn count_markers(sql: &str) -> usize {
    let mut quoted = false;
    let mut count = 0;
    for c in sql.chars() {
        match c {
            '\'' => quoted = !quoted,
            '?' if !quoted => count += 1,
            _ => {}
        }
    }
    count
}

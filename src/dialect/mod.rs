//! Dialect strategies.
//!
//! Everything vendor-specific lives behind [`SqlDialect`]: identifier
//! quoting, placeholder style, LIKE pattern concatenation and the optional
//! paging and insert capabilities. Builders never branch on the vendor.

pub mod mysql;
pub mod oracle;
pub mod postgres;
pub mod sqlite;
pub mod sqlserver;
pub mod standard;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;

use crate::statement::BoundStatement;
use crate::value::WireValue;

pub use mysql::MySqlDialect;
pub use oracle::OracleDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;
pub use sqlserver::SqlServerDialect;
pub use standard::StandardDialect;

/// Where the wildcard goes in a LIKE pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeMode {
    /// `%value%`
    Contains,
    /// `value%`
    StartsWith,
    /// `%value`
    EndsWith,
}

/// Placement of NULLs in an ORDER BY item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullsOrder {
    /// Whatever the database does.
    #[default]
    Default,
    First,
    Last,
}

/// Conflict handling for inserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateKeyStrategy {
    /// Plain insert; duplicates fail in the database.
    #[default]
    Into,
    /// Skip rows that collide on a key.
    Ignore,
    /// Overwrite the colliding row.
    Update,
}

/// Per-database SQL syntax.
pub trait SqlDialect: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn quote_identifier(&self, id: &str) -> String {
        format!("\"{}\"", id.replace('"', "\"\""))
    }

    /// Placeholder for the 1-based argument `index`.
    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn fmt_name(&self, use_delimited: bool, name: &str) -> String {
        if use_delimited {
            self.quote_identifier(name)
        } else {
            name.to_string()
        }
    }

    /// Table identifier, schema-qualified when a schema is set.
    fn table_name(
        &self,
        use_delimited: bool,
        _catalog: Option<&str>,
        schema: Option<&str>,
        table: &str,
    ) -> String {
        match schema.filter(|s| !s.is_empty()) {
            Some(schema) => format!(
                "{}.{}",
                self.fmt_name(use_delimited, schema),
                self.fmt_name(use_delimited, table)
            ),
            None => self.fmt_name(use_delimited, table),
        }
    }

    fn column_name(
        &self,
        use_delimited: bool,
        _catalog: Option<&str>,
        _schema: Option<&str>,
        _table: &str,
        column: &str,
    ) -> String {
        self.fmt_name(use_delimited, column)
    }

    /// LIKE right-hand side wrapping `marker` (a `?` or a value template).
    fn like_pattern(&self, mode: LikeMode, marker: &str) -> String {
        match mode {
            LikeMode::Contains => format!("'%' || {} || '%'", marker),
            LikeMode::StartsWith => format!("{} || '%'", marker),
            LikeMode::EndsWith => format!("'%' || {}", marker),
        }
    }

    /// ORDER BY item for `column` with an explicit NULL placement.
    fn order_item(&self, column: &str, direction: &str, nulls: NullsOrder) -> String {
        match nulls {
            NullsOrder::Default => format!("{} {}", column, direction),
            NullsOrder::First => format!("{} {} NULLS FIRST", column, direction),
            NullsOrder::Last => format!("{} {} NULLS LAST", column, direction),
        }
    }

    /// Row-count variant of `base`, keeping its arguments.
    fn count_statement(&self, base: &BoundStatement) -> BoundStatement {
        BoundStatement::new(
            format!("SELECT COUNT(*) FROM ({}) TEMP_T", base.sql()),
            base.args().to_vec(),
        )
    }

    fn paging(&self) -> Option<&dyn PageDialect> {
        None
    }

    fn insert(&self) -> Option<&dyn InsertDialect> {
        None
    }
}

/// Paging capability.
pub trait PageDialect {
    /// Limit `base` to `limit` rows starting at the zero-based `offset`.
    /// New arguments are appended after the base arguments. `ordered` tells
    /// whether `base` ends with its own ORDER BY clause.
    fn page_statement(
        &self,
        base: &BoundStatement,
        offset: u64,
        limit: u64,
        ordered: bool,
    ) -> BoundStatement;
}

/// Insert capability.
pub trait InsertDialect {
    /// Leading `INSERT ... INTO <table>`, `None` if `strategy` is unsupported.
    fn insert_into(&self, strategy: DuplicateKeyStrategy, table: &str) -> Option<String>;

    /// Trailing conflict clause for `strategy`.
    fn conflict_clause(
        &self,
        _strategy: DuplicateKeyStrategy,
        _keys: &[String],
        _columns: &[String],
    ) -> Option<String> {
        None
    }

    fn multi_row_values(&self) -> bool {
        true
    }
}

/// Row counts bind as BIGINT; anything past `i64::MAX` saturates.
pub(crate) fn row_count(n: u64) -> WireValue {
    WireValue::Int(i64::try_from(n).unwrap_or(i64::MAX))
}

/// Helper for LIMIT/OFFSET style paging.
pub(crate) fn limit_offset(
    dialect: &dyn SqlDialect,
    base: &BoundStatement,
    offset: u64,
    limit: u64,
) -> BoundStatement {
    let (mut sql, mut args) = base.clone().into_parts();
    if limit > 0 {
        args.push(row_count(limit));
        sql.push_str(&format!(" LIMIT {}", dialect.placeholder(args.len())));
    }
    if offset > 0 {
        args.push(row_count(offset));
        sql.push_str(&format!(" OFFSET {}", dialect.placeholder(args.len())));
    }
    BoundStatement::new(sql, args)
}

/// Supported dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    #[default]
    Postgres,
    MySql,
    Sqlite,
    SqlServer,
    Oracle,
    Standard,
}

impl DialectKind {
    pub const ALL: [DialectKind; 6] = [
        DialectKind::Postgres,
        DialectKind::MySql,
        DialectKind::Sqlite,
        DialectKind::SqlServer,
        DialectKind::Oracle,
        DialectKind::Standard,
    ];

    pub fn strategy(&self) -> Arc<dyn SqlDialect> {
        match self {
            DialectKind::Postgres => Arc::new(PostgresDialect),
            DialectKind::MySql => Arc::new(MySqlDialect),
            DialectKind::Sqlite => Arc::new(SqliteDialect),
            DialectKind::SqlServer => Arc::new(SqlServerDialect),
            DialectKind::Oracle => Arc::new(OracleDialect),
            DialectKind::Standard => Arc::new(StandardDialect),
        }
    }

    /// Guess the dialect from a connection URL scheme.
    pub fn from_url(url: &str) -> Option<Self> {
        let scheme = url.split(':').next()?;
        scheme.parse().ok()
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DialectKind::Postgres => "postgres",
            DialectKind::MySql => "mysql",
            DialectKind::Sqlite => "sqlite",
            DialectKind::SqlServer => "sqlserver",
            DialectKind::Oracle => "oracle",
            DialectKind::Standard => "standard",
        };
        f.write_str(name)
    }
}

impl FromStr for DialectKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(DialectKind::Postgres),
            "mysql" | "mariadb" => Ok(DialectKind::MySql),
            "sqlite" => Ok(DialectKind::Sqlite),
            "sqlserver" | "mssql" => Ok(DialectKind::SqlServer),
            "oracle" => Ok(DialectKind::Oracle),
            "standard" | "ansi" => Ok(DialectKind::Standard),
            _ => Err(format!("unknown dialect '{}'", s)),
        }
    }
}

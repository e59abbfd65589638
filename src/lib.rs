//! # dbweave
//!
//! Fluent SQL construction and value coercion for relational databases.
//!
//! dbweave turns builder calls into a parameterised statement for one of
//! several SQL dialects. Values pass through a codec registry on the way
//! out, and property names resolve through table mappings.
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use dbweave::prelude::*;
//!
//! let tpl = LambdaTemplate::new(DialectKind::MySql.strategy());
//! let stmt = tpl
//!     .select("t")
//!     .eq("a", 1)
//!     .nested(|q| q.eq("b", 2).or().eq("c", 3))
//!     .build()?;
//! assert_eq!(stmt.sql(), "SELECT * FROM t WHERE a = ? AND (b = ? OR c = ?)");
//! ```
//!
//! ## Layers
//!
//! | Module      | Role                                           |
//! |-------------|------------------------------------------------|
//! | `segment`   | SQL fragments and placeholder renumbering      |
//! | `codec`     | Value to wire conversions                      |
//! | `mapping`   | Table and column mapping                       |
//! | `dialect`   | Quoting, placeholders, paging and upserts      |
//! | `lambda`    | Fluent SELECT, UPDATE, DELETE, INSERT builders |
//! | `filter`    | Text filter expressions for the CLI            |
//! | `engine`    | Execution over sqlx                            |

pub mod codec;
pub mod config;
pub mod dialect;
pub mod engine;
pub mod error;
pub mod filter;
pub mod lambda;
pub mod mapping;
pub mod segment;
pub mod statement;
pub mod value;

pub mod prelude {
    pub use crate::codec::{Codec, CodecError, CodecRegistry, SqlEnum};
    pub use crate::config::WeaveConfig;
    pub use crate::dialect::{DialectKind, DuplicateKeyStrategy, LikeMode, NullsOrder, SqlDialect};
    pub use crate::engine::WeaveDb;
    pub use crate::error::{WeaveError, WeaveResult};
    pub use crate::lambda::{
        Compare, DeleteBuilder, InsertBuilder, LambdaTemplate, SelectBuilder, UpdateBuilder,
    };
    pub use crate::mapping::{
        ColumnMapping, Entity, MappingRegistry, Row, TableMapping, WireRow,
    };
    pub use crate::statement::BoundStatement;
    pub use crate::value::{Value, ValueType, WireType, WireValue};
}

pub use error::{WeaveError, WeaveResult};
pub use lambda::LambdaTemplate;
pub use statement::BoundStatement;

/// Parse a filter expression such as `age > 10 and name like 'b%'`.
///
/// # Example
///
/// ```
/// let expr = dbweave::parse_filter("a = 1 or b is null").unwrap();
/// assert_eq!(expr.describe(), r#".eq("a", 1).or().is_null("b")"#);
/// ```
pub fn parse_filter(input: &str) -> WeaveResult<filter::FilterExpr> {
    filter::parse(input)
}

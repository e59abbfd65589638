use super::{row_count, DuplicateKeyStrategy, InsertDialect, PageDialect, SqlDialect};
use crate::statement::BoundStatement;
use crate::value::WireValue;

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqlDialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn paging(&self) -> Option<&dyn PageDialect> {
        Some(self)
    }

    fn insert(&self) -> Option<&dyn InsertDialect> {
        Some(self)
    }
}

impl PageDialect for SqliteDialect {
    fn page_statement(
        &self,
        base: &BoundStatement,
        offset: u64,
        limit: u64,
        _ordered: bool,
    ) -> BoundStatement {
        let (mut sql, mut args) = base.clone().into_parts();
        // SQLite only accepts OFFSET after a LIMIT; -1 means unbounded.
        let limit = if limit > 0 { row_count(limit) } else { WireValue::Int(-1) };
        sql.push_str(" LIMIT ?");
        args.push(limit);
        if offset > 0 {
            sql.push_str(" OFFSET ?");
            args.push(row_count(offset));
        }
        BoundStatement::new(sql, args)
    }
}

impl InsertDialect for SqliteDialect {
    fn insert_into(&self, strategy: DuplicateKeyStrategy, table: &str) -> Option<String> {
        let verb = match strategy {
            DuplicateKeyStrategy::Into => "INSERT INTO",
            DuplicateKeyStrategy::Ignore => "INSERT OR IGNORE INTO",
            DuplicateKeyStrategy::Update => "INSERT OR REPLACE INTO",
        };
        Some(format!("{} {}", verb, table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_without_limit() {
        let base = BoundStatement::new("SELECT * FROM t", vec![]);
        let page = SqliteDialect.page_statement(&base, 5, 0, false);
        assert_eq!(page.sql(), "SELECT * FROM t LIMIT ? OFFSET ?");
        assert_eq!(page.args(), &[WireValue::Int(-1), WireValue::Int(5)]);
    }

    #[test]
    fn test_replace() {
        assert_eq!(
            SqliteDialect.insert_into(DuplicateKeyStrategy::Update, "t"),
            Some("INSERT OR REPLACE INTO t".to_string())
        );
    }
}

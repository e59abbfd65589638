use super::{
    row_count, DuplicateKeyStrategy, InsertDialect, LikeMode, NullsOrder, PageDialect, SqlDialect,
};
use crate::statement::BoundStatement;

#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl SqlDialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, id: &str) -> String {
        format!("`{}`", id.replace('`', "``"))
    }

    fn like_pattern(&self, mode: LikeMode, marker: &str) -> String {
        match mode {
            LikeMode::Contains => format!("CONCAT('%', {}, '%')", marker),
            LikeMode::StartsWith => format!("CONCAT({}, '%')", marker),
            LikeMode::EndsWith => format!("CONCAT('%', {})", marker),
        }
    }

    /// No NULLS FIRST/LAST; sort on the null test first.
    fn order_item(&self, column: &str, direction: &str, nulls: NullsOrder) -> String {
        match nulls {
            NullsOrder::Default => format!("{} {}", column, direction),
            NullsOrder::First => format!("{} IS NULL DESC, {} {}", column, column, direction),
            NullsOrder::Last => format!("{} IS NULL ASC, {} {}", column, column, direction),
        }
    }

    fn paging(&self) -> Option<&dyn PageDialect> {
        Some(self)
    }

    fn insert(&self) -> Option<&dyn InsertDialect> {
        Some(self)
    }
}

impl PageDialect for MySqlDialect {
    fn page_statement(
        &self,
        base: &BoundStatement,
        offset: u64,
        limit: u64,
        _ordered: bool,
    ) -> BoundStatement {
        let (mut sql, mut args) = base.clone().into_parts();
        if offset > 0 {
            // MySQL has no OFFSET without a row count.
            let count = if limit > 0 { limit } else { u64::MAX };
            sql.push_str(" LIMIT ?, ?");
            args.push(row_count(offset));
            args.push(row_count(count));
        } else if limit > 0 {
            sql.push_str(" LIMIT ?");
            args.push(row_count(limit));
        }
        BoundStatement::new(sql, args)
    }
}

impl InsertDialect for MySqlDialect {
    fn insert_into(&self, strategy: DuplicateKeyStrategy, table: &str) -> Option<String> {
        match strategy {
            DuplicateKeyStrategy::Ignore => Some(format!("INSERT IGNORE INTO {}", table)),
            _ => Some(format!("INSERT INTO {}", table)),
        }
    }

    fn conflict_clause(
        &self,
        strategy: DuplicateKeyStrategy,
        keys: &[String],
        columns: &[String],
    ) -> Option<String> {
        if strategy != DuplicateKeyStrategy::Update {
            return None;
        }
        let sets: Vec<String> = columns
            .iter()
            .filter(|c| !keys.contains(c))
            .map(|c| format!("{} = VALUES({})", c, c))
            .collect();
        if sets.is_empty() {
            return None;
        }
        Some(format!("ON DUPLICATE KEY UPDATE {}", sets.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::WireValue;

    #[test]
    fn test_like_uses_concat() {
        assert_eq!(
            MySqlDialect.like_pattern(LikeMode::Contains, "?"),
            "CONCAT('%', ?, '%')"
        );
    }

    #[test]
    fn test_page_with_offset() {
        let base = BoundStatement::new("SELECT * FROM t", vec![]);
        let page = MySqlDialect.page_statement(&base, 30, 15, false);
        assert_eq!(page.sql(), "SELECT * FROM t LIMIT ?, ?");
        assert_eq!(page.args(), &[WireValue::Int(30), WireValue::Int(15)]);
    }

    #[test]
    fn test_page_saturates_large_offset() {
        let base = BoundStatement::new("SELECT * FROM t", vec![]);
        let page = MySqlDialect.page_statement(&base, u64::MAX, 0, false);
        assert_eq!(page.args(), &[WireValue::Int(i64::MAX), WireValue::Int(i64::MAX)]);
    }

    #[test]
    fn test_nulls_first_emulated() {
        assert_eq!(
            MySqlDialect.order_item("name", "ASC", NullsOrder::First),
            "name IS NULL DESC, name ASC"
        );
    }

    #[test]
    fn test_insert_ignore() {
        assert_eq!(
            MySqlDialect.insert_into(DuplicateKeyStrategy::Ignore, "t"),
            Some("INSERT IGNORE INTO t".to_string())
        );
    }
}

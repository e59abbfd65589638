use super::{row_count, DuplicateKeyStrategy, InsertDialect, PageDialect, SqlDialect};
use crate::statement::BoundStatement;

#[derive(Debug, Clone, Copy, Default)]
pub struct OracleDialect;

impl SqlDialect for OracleDialect {
    fn name(&self) -> &'static str {
        "oracle"
    }

    fn placeholder(&self, index: usize) -> String {
        format!(":{}", index)
    }

    fn paging(&self) -> Option<&dyn PageDialect> {
        Some(self)
    }

    fn insert(&self) -> Option<&dyn InsertDialect> {
        Some(self)
    }
}

impl PageDialect for OracleDialect {
    /// ROWNUM wrapping, which works on every Oracle version.
    fn page_statement(
        &self,
        base: &BoundStatement,
        offset: u64,
        limit: u64,
        _ordered: bool,
    ) -> BoundStatement {
        let (sql, mut args) = base.clone().into_parts();
        let upper = match limit {
            0 => u64::MAX,
            _ => offset.saturating_add(limit),
        };
        args.push(row_count(upper));
        let upper = self.placeholder(args.len());
        args.push(row_count(offset));
        let lower = self.placeholder(args.len());
        BoundStatement::new(
            format!(
                "SELECT * FROM ( SELECT TMP.*, ROWNUM ROW_ID FROM ( {} ) TMP WHERE ROWNUM <= {} ) WHERE ROW_ID > {}",
                sql, upper, lower
            ),
            args,
        )
    }
}

impl InsertDialect for OracleDialect {
    fn insert_into(&self, strategy: DuplicateKeyStrategy, table: &str) -> Option<String> {
        match strategy {
            DuplicateKeyStrategy::Into => Some(format!("INSERT INTO {}", table)),
            _ => None,
        }
    }

    fn multi_row_values(&self) -> bool {
        false
    }
}

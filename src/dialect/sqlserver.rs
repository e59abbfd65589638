use super::{
    row_count, DuplicateKeyStrategy, InsertDialect, LikeMode, NullsOrder, PageDialect, SqlDialect,
};
use crate::statement::BoundStatement;

#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerDialect;

impl SqlDialect for SqlServerDialect {
    fn name(&self) -> &'static str {
        "sqlserver"
    }

    fn quote_identifier(&self, id: &str) -> String {
        format!("[{}]", id.replace(']', "]]"))
    }

    fn placeholder(&self, index: usize) -> String {
        format!("@p{}", index)
    }

    fn table_name(
        &self,
        use_delimited: bool,
        catalog: Option<&str>,
        schema: Option<&str>,
        table: &str,
    ) -> String {
        [catalog, schema, Some(table)]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .map(|part| self.fmt_name(use_delimited, part))
            .collect::<Vec<_>>()
            .join(".")
    }

    fn like_pattern(&self, mode: LikeMode, marker: &str) -> String {
        match mode {
            LikeMode::Contains => format!("'%' + {} + '%'", marker),
            LikeMode::StartsWith => format!("{} + '%'", marker),
            LikeMode::EndsWith => format!("'%' + {}", marker),
        }
    }

    fn order_item(&self, column: &str, direction: &str, nulls: NullsOrder) -> String {
        let rank = match nulls {
            NullsOrder::Default => return format!("{} {}", column, direction),
            NullsOrder::First => "0 ELSE 1",
            NullsOrder::Last => "1 ELSE 0",
        };
        format!(
            "CASE WHEN {} IS NULL THEN {} END, {} {}",
            column, rank, column, direction
        )
    }

    fn paging(&self) -> Option<&dyn PageDialect> {
        Some(self)
    }

    fn insert(&self) -> Option<&dyn InsertDialect> {
        Some(self)
    }
}

impl PageDialect for SqlServerDialect {
    fn page_statement(
        &self,
        base: &BoundStatement,
        offset: u64,
        limit: u64,
        ordered: bool,
    ) -> BoundStatement {
        let (mut sql, mut args) = base.clone().into_parts();
        // OFFSET/FETCH is only legal after ORDER BY.
        if !ordered {
            sql.push_str(" ORDER BY (SELECT NULL)");
        }
        args.push(row_count(offset));
        sql.push_str(&format!(" OFFSET {} ROWS", self.placeholder(args.len())));
        if limit > 0 {
            args.push(row_count(limit));
            sql.push_str(&format!(" FETCH NEXT {} ROWS ONLY", self.placeholder(args.len())));
        }
        BoundStatement::new(sql, args)
    }
}

impl InsertDialect for SqlServerDialect {
    fn insert_into(&self, strategy: DuplicateKeyStrategy, table: &str) -> Option<String> {
        match strategy {
            DuplicateKeyStrategy::Into => Some(format!("INSERT INTO {}", table)),
            _ => None,
        }
    }
}

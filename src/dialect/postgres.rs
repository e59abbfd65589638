use super::{limit_offset, DuplicateKeyStrategy, InsertDialect, PageDialect, SqlDialect};
use crate::statement::BoundStatement;

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl SqlDialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    fn paging(&self) -> Option<&dyn PageDialect> {
        Some(self)
    }

    fn insert(&self) -> Option<&dyn InsertDialect> {
        Some(self)
    }
}

impl PageDialect for PostgresDialect {
    fn page_statement(
        &self,
        base: &BoundStatement,
        offset: u64,
        limit: u64,
        _ordered: bool,
    ) -> BoundStatement {
        limit_offset(self, base, offset, limit)
    }
}

impl InsertDialect for PostgresDialect {
    fn insert_into(&self, _strategy: DuplicateKeyStrategy, table: &str) -> Option<String> {
        Some(format!("INSERT INTO {}", table))
    }

    fn conflict_clause(
        &self,
        strategy: DuplicateKeyStrategy,
        keys: &[String],
        columns: &[String],
    ) -> Option<String> {
        match strategy {
            DuplicateKeyStrategy::Into => None,
            DuplicateKeyStrategy::Ignore => Some("ON CONFLICT DO NOTHING".to_string()),
            DuplicateKeyStrategy::Update => {
                let sets: Vec<String> = columns
                    .iter()
                    .filter(|c| !keys.contains(c))
                    .map(|c| format!("{} = EXCLUDED.{}", c, c))
                    .collect();
                if sets.is_empty() {
                    Some(format!("ON CONFLICT ({}) DO NOTHING", keys.join(", ")))
                } else {
                    Some(format!(
                        "ON CONFLICT ({}) DO UPDATE SET {}",
                        keys.join(", "),
                        sets.join(", ")
                    ))
                }
            }
        }
    }
}

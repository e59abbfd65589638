use super::SqlDialect;

/// ANSI quoting and `?` placeholders, without paging or insert strategies.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardDialect;

impl SqlDialect for StandardDialect {
    fn name(&self) -> &'static str {
        "standard"
    }
}

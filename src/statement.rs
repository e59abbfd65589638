//! The flattened output of every builder.

use std::fmt;

use crate::value::WireValue;

/// SQL text plus its positionally ordered arguments.
///
/// The i-th placeholder in `sql` corresponds to `args[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundStatement {
    sql: String,
    args: Vec<WireValue>,
}

impl BoundStatement {
    pub fn new(sql: impl Into<String>, args: Vec<WireValue>) -> Self {
        Self {
            sql: sql.into(),
            args,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn args(&self) -> &[WireValue] {
        &self.args
    }

    pub fn into_parts(self) -> (String, Vec<WireValue>) {
        (self.sql, self.args)
    }
}

impl fmt::Display for BoundStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql)?;
        if !self.args.is_empty() {
            write!(f, " -- [")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", arg)?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_args() {
        let stmt = BoundStatement::new(
            "SELECT * FROM t WHERE a = $1",
            vec![WireValue::Int(1)],
        );
        assert_eq!(stmt.to_string(), "SELECT * FROM t WHERE a = $1 -- [1]");
    }

    #[test]
    fn test_display_without_args() {
        let stmt = BoundStatement::new("SELECT 1", vec![]);
        assert_eq!(stmt.to_string(), "SELECT 1");
        assert!(stmt.args().is_empty());
    }
}

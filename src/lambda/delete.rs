//! DELETE builder.

use crate::error::{WeaveError, WeaveResult};
use crate::segment::{MergeSegment, SqlKeyword};
use crate::statement::BoundStatement;

use super::compare::{Compare, ConditionState};
use super::{Context, Phase};

#[derive(Debug)]
pub struct DeleteBuilder {
    cond: ConditionState,
    allow_empty_where: bool,
}

impl DeleteBuilder {
    pub(crate) fn new(ctx: Context) -> Self {
        Self {
            cond: ConditionState::new(ctx),
            allow_empty_where: false,
        }
    }

    /// Permit a delete without WHERE for the next build only.
    pub fn allow_empty_where(mut self) -> Self {
        self.allow_empty_where = true;
        self
    }

    pub fn condition_state(&self) -> &ConditionState {
        &self.cond
    }

    pub fn build(&mut self) -> WeaveResult<BoundStatement> {
        let allow_empty_where = std::mem::take(&mut self.allow_empty_where);
        self.cond.check()?;
        if !self.cond.has_predicate() && !allow_empty_where {
            return Err(WeaveError::unsafe_op(format!(
                "delete from '{}' without WHERE; call allow_empty_where() to permit it",
                self.cond.ctx.mapping().table()
            )));
        }

        let mut seg = MergeSegment::new();
        seg.append(SqlKeyword::DeleteFrom);
        seg.append(self.cond.ctx.table_segment());
        if self.cond.has_predicate() {
            seg.append(SqlKeyword::Where);
            seg.append(self.cond.where_body());
        }
        let stmt = seg.render(self.cond.ctx.dialect());
        tracing::debug!("built delete: {} ({} args)", stmt.sql(), stmt.args().len());
        self.cond.set_phase(Phase::Built);
        Ok(stmt)
    }
}

impl Compare for DeleteBuilder {
    fn condition(&mut self) -> &mut ConditionState {
        &mut self.cond
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::DialectKind;
    use crate::lambda::LambdaTemplate;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_delete_requires_where() {
        let tpl = LambdaTemplate::new(DialectKind::MySql.strategy());
        let err = tpl.delete("t").build().unwrap_err();
        assert!(matches!(err, WeaveError::UnsafeOperation(_)));

        let stmt = tpl.delete("t").allow_empty_where().build().unwrap();
        assert_eq!(stmt.sql(), "DELETE FROM t");
    }

    #[test]
    fn test_empty_group_does_not_satisfy_where_guard() {
        let tpl = LambdaTemplate::new(DialectKind::Postgres.strategy());
        let err = tpl.delete("t").nested(|q| q).build().unwrap_err();
        assert!(matches!(err, WeaveError::UnsafeOperation(_)));

        let err = tpl
            .delete("t")
            .nested(|q| q.nested(|q| q))
            .build()
            .unwrap_err();
        assert!(matches!(err, WeaveError::UnsafeOperation(_)));

        let stmt = tpl
            .delete("t")
            .nested(|q| q)
            .allow_empty_where()
            .build()
            .unwrap();
        assert_eq!(stmt.sql(), "DELETE FROM t");
    }

    #[test]
    fn test_delete_with_where() {
        let tpl = LambdaTemplate::new(DialectKind::SqlServer.strategy()).use_delimited(true);
        let stmt = tpl
            .delete("dbo.t")
            .eq("a", 1)
            .or()
            .is_null("b")
            .build()
            .unwrap();
        assert_eq!(
            stmt.sql(),
            "DELETE FROM [dbo].[t] WHERE [a] = @p1 OR [b] IS NULL"
        );
    }

    #[test]
    fn test_only_connective_stripped() {
        let tpl = LambdaTemplate::new(DialectKind::Oracle.strategy());
        let stmt = tpl
            .delete("t")
            .or()
            .eq("a", 1)
            .build()
            .unwrap();
        assert_eq!(stmt.sql(), "DELETE FROM t WHERE a = :1");
    }
}

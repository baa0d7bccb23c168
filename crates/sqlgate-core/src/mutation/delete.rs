use super::conditions::compile_where;
use super::MutationCompiler;
use crate::error::Result;
use crate::policy::Operation;
use crate::query::CompiledQuery;
use crate::value::Record;
use tracing::debug;

impl MutationCompiler<'_> {
    /// Compile a DELETE. A condition map is required.
    pub fn delete(&self, conditions: &Record) -> Result<CompiledQuery> {
        self.expect_operation(Operation::Delete)?;
        let clause = compile_where(conditions, self.columns())?;
        let sql = format!("DELETE FROM {} WHERE {}", self.table(), clause.sql);
        debug!(table = self.table(), sql = %sql, "built delete");
        Ok(CompiledQuery::new(sql, clause.values))
    }
}

//! Staged single-row statements.
//!
//! Postgres has no `UPDATE ... LIMIT 1`, so single-row writes are staged through a
//! common table expression: the row identifier is selected by the caller's criteria
//! first, then the write joins back to it on `_id`.
//!
//! ```text
//! WITH cte AS ( SELECT _id FROM users WHERE id = $1 LIMIT 1 )
//! UPDATE users SET name = $2 FROM cte WHERE cte._id = users._id
//! ```
//!
//! Both halves live in one statement, so the backend evaluates the criteria once and
//! the write applies to exactly the row the stage selected. Placeholders in the write
//! continue after the stage's own.

use crate::builder::{QueryBuilder, Statement, StatementKind};
use crate::criteria::{Connective, Filter, Predicate};
use crate::error::{ModelError, ModelResult};
use crate::record::Record;
use crate::schema::TableSchema;

/// Alias of the staging CTE.
pub const STAGE_ALIAS: &str = "cte";

/// Row-identifier column the stage selects and the write joins on.
pub const ROW_ID: &str = "_id";

/// A single row of `schema`'s table, picked by `criteria`.
#[derive(Debug, Clone)]
pub struct StagedRow {
    schema: TableSchema,
    criteria: Filter,
}

impl StagedRow {
    pub fn new(schema: TableSchema, criteria: Filter) -> Self {
        Self { schema, criteria }
    }

    /// `WITH cte AS (...) UPDATE t SET ... FROM cte WHERE cte._id = t._id`.
    ///
    /// Only fields known to the schema are written.
    pub fn update(&self, updates: &Record) -> ModelResult<Statement> {
        let stage = self.stage()?;
        let target = QueryBuilder::new(self.schema.clone())
            .prepare(StatementKind::Update)
            .set_fields(updates);
        self.finish(stage, target)
    }

    /// `WITH cte AS (...) DELETE FROM t USING cte WHERE cte._id = t._id`.
    ///
    /// Fails when the criteria select nothing to narrow by.
    pub fn delete(&self) -> ModelResult<Statement> {
        let stage = self.stage()?;
        if stage.values().is_empty() {
            return Err(ModelError::validation(format!(
                "delete from '{}' requires criteria",
                self.schema.name()
            )));
        }
        let target = QueryBuilder::new(self.schema.clone()).prepare(StatementKind::Delete);
        self.finish(stage, target)
    }

    fn stage(&self) -> ModelResult<Statement> {
        let select = QueryBuilder::new(self.schema.clone())
            .select_unchecked(&[ROW_ID])
            .and_where(self.criteria.clone())
            .limit(1);
        Ok(select
            .build_query()?
            .wrapped(format!("WITH {STAGE_ALIAS} AS ("), ")"))
    }

    fn finish(&self, mut staged: Statement, target: QueryBuilder) -> ModelResult<Statement> {
        let join_back = Predicate::raw(
            format!("{STAGE_ALIAS}.{ROW_ID} = {}.{ROW_ID}", self.schema.name()),
            Connective::And,
        );
        let write = target
            .staging_from(STAGE_ALIAS)
            .predicate(join_back)
            .build_query_from(staged.values().len())?;
        staged.append(write);
        staged.validate()?;
        Ok(staged)
    }
}

//! CRUD facade over one table.
//!
//! Every operation builds its statements on a fresh [`QueryBuilder`], so a `Model` can be
//! shared across tasks; predicate state never leaks from one call into the next.
//!
//! # Example
//! ```ignore
//! use pgmodel::{Filter, Model, Record, TableSchema, UpdateDoc, UpdateOptions};
//!
//! let pool = pgmodel::create_pool(&dsn)?;
//! let users = Model::new(pool, TableSchema::new("users").with_fields(&["_id", "id", "name"]));
//!
//! users.insert_one(Record::new().with("name", "ann")).await?;
//! let ann = users.find_one(Filter::new().eq("name", "ann"), &Default::default()).await?;
//! users
//!     .find_one_and_update(
//!         Filter::new().eq("name", "bob"),
//!         UpdateDoc::set(Record::new().with("name", "bob")),
//!         UpdateOptions::upsert(),
//!     )
//!     .await?;
//! ```

mod options;

pub use options::{FindOptions, UpdateOptions};

use crate::builder::{QueryBuilder, Statement, StatementKind};
use crate::config::ModelConfig;
use crate::criteria::Filter;
use crate::error::{ModelError, ModelResult};
use crate::executor::Executor;
use crate::id::{SeedHasher, Uuid5SeedHasher};
use crate::record::Record;
use crate::schema::TableSchema;
use crate::staged::{ROW_ID, StagedRow};
use crate::update::{InsertResult, UpdateDoc, UpsertOutcome};
use crate::value::Value;
use std::sync::Arc;

/// Backend-assigned key returned by `insert_one`.
const RETURNED_ID: &str = "id";

/// The CRUD facade for one table.
pub struct Model<E> {
    executor: E,
    schema: TableSchema,
    config: ModelConfig,
    ids: Arc<dyn SeedHasher>,
}

impl<E: Executor> Model<E> {
    pub fn new(executor: E, schema: TableSchema) -> Self {
        Self {
            executor,
            schema,
            config: ModelConfig::default(),
            ids: Arc::new(Uuid5SeedHasher),
        }
    }

    /// Use `config`'s unknown-operator policy and SQL log truncation.
    pub fn with_config(mut self, config: ModelConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the synthetic `_id` generator.
    pub fn with_seed_hasher(mut self, ids: impl SeedHasher + 'static) -> Self {
        self.ids = Arc::new(ids);
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// A fresh statement builder for this table.
    pub fn builder(&self) -> QueryBuilder {
        QueryBuilder::new(self.schema.clone()).unknown_operators(self.config.unknown_operators)
    }

    /// Parse a JSON filter object under this model's unknown-operator policy.
    pub fn filter(&self, json: &serde_json::Value) -> ModelResult<Filter> {
        Filter::from_json(json, self.config.unknown_operators)
    }

    // ==================== Operations ====================

    /// Insert one row: `INSERT INTO t (cols) values ($1..$n) RETURNING id`.
    ///
    /// When the table has an `_id` column the caller left out, a synthetic one is
    /// generated and reported in [`InsertResult::synthetic_id`].
    pub async fn insert_one(&self, data: Record) -> ModelResult<InsertResult> {
        let op = "insert_one";
        let mut data = data;
        let mut synthetic_id = None;
        if self.schema.has_field(ROW_ID) && !data.contains(ROW_ID) {
            let id = self.ids.generate(self.schema.name());
            data.insert(ROW_ID, id.clone());
            synthetic_id = Some(id);
        }

        let returning = self.schema.has_field(RETURNED_ID).then_some(RETURNED_ID);
        let stmt = Statement::insert(self.schema.name(), &data, returning)
            .map_err(|e| self.context(op, e))?;
        let rows = self.fetch(op, &stmt).await?;
        let id = rows
            .first()
            .and_then(|row| row.get(RETURNED_ID))
            .and_then(Value::as_i64);
        Ok(InsertResult { id, synthetic_id })
    }

    /// First matching row, or an empty record.
    ///
    /// The statement is always bounded: a `limit` override of 0 counts as 1.
    pub async fn find_one(&self, criteria: Filter, options: &FindOptions) -> ModelResult<Record> {
        let op = "find_one";
        let stmt = self
            .select_builder(criteria, options)
            .limit(options.limit.unwrap_or(1).max(1))
            .build_query()
            .map_err(|e| self.context(op, e))?;
        let rows = self.fetch(op, &stmt).await?;
        Ok(rows.into_iter().next().unwrap_or_default())
    }

    /// Every matching row; empty when nothing matches.
    pub async fn find_all(&self, criteria: Filter, options: &FindOptions) -> ModelResult<Vec<Record>> {
        let op = "find_all";
        let stmt = self
            .select_builder(criteria, options)
            .limit(options.limit.unwrap_or(0))
            .build_query()
            .map_err(|e| self.context(op, e))?;
        self.fetch(op, &stmt).await
    }

    /// `find_all` with default options.
    pub async fn find_by(&self, criteria: Filter) -> ModelResult<Vec<Record>> {
        self.find_all(criteria, &FindOptions::default()).await
    }

    /// Update the single row picked by `criteria` through a staged CTE.
    ///
    /// With `upsert`, delegates to [`Model::find_one_and_update`] with `updates` as `$set`.
    pub async fn update_one(
        &self,
        criteria: Filter,
        updates: Record,
        options: UpdateOptions,
    ) -> ModelResult<UpsertOutcome> {
        if options.upsert {
            return self
                .find_one_and_update(criteria, UpdateDoc::set(updates), options)
                .await;
        }
        let op = "update_one";
        let stmt = StagedRow::new(self.schema.clone(), criteria)
            .update(&updates)
            .map_err(|e| self.context(op, e))?;
        match self.exec(op, &stmt).await? {
            0 => Ok(UpsertOutcome::NotFound),
            n => Ok(UpsertOutcome::Updated(n)),
        }
    }

    /// Unbounded `UPDATE t SET ... WHERE ...`; returns the affected row count.
    pub async fn update_many(&self, criteria: Filter, updates: &Record) -> ModelResult<u64> {
        let op = "update_many";
        let stmt = self
            .builder()
            .prepare(StatementKind::Update)
            .set_fields(updates)
            .and_where(criteria)
            .build_query()
            .map_err(|e| self.context(op, e))?;
        self.exec(op, &stmt).await
    }

    /// Find the row, then insert (`$set` + `$setOnInsert`) or update (`$set`) it.
    ///
    /// Two round trips; not atomic across them.
    pub async fn find_one_and_update(
        &self,
        criteria: Filter,
        update: UpdateDoc,
        options: UpdateOptions,
    ) -> ModelResult<UpsertOutcome> {
        let op = "find_one_and_update";
        let found = self
            .find_one(criteria.clone(), &FindOptions::default())
            .await
            .map_err(|e| self.context(op, e))?;

        if found.is_empty() {
            if !options.upsert {
                return Ok(UpsertOutcome::NotFound);
            }
            let inserted = self
                .insert_one(update.insert_fields())
                .await
                .map_err(|e| self.context(op, e))?;
            return Ok(UpsertOutcome::Inserted(inserted));
        }

        let Some(set) = update.set else {
            return Err(self.context(
                op,
                ModelError::validation("$set is required to update an existing row"),
            ));
        };

        // Pin the write to the row just read when it carries an identifier.
        let target = match found.get(ROW_ID) {
            Some(id) if !id.is_falsy() => Filter::new().eq(ROW_ID, id.clone()),
            _ => criteria,
        };
        let stmt = StagedRow::new(self.schema.clone(), target)
            .update(&set)
            .map_err(|e| self.context(op, e))?;
        let n = self.exec(op, &stmt).await?;
        Ok(UpsertOutcome::Updated(n))
    }

    /// Delete the single row picked by `criteria`. Criteria are required.
    pub async fn delete_one(&self, criteria: Filter) -> ModelResult<u64> {
        let op = "delete_one";
        let stmt = StagedRow::new(self.schema.clone(), criteria)
            .delete()
            .map_err(|e| self.context(op, e))?;
        self.exec(op, &stmt).await
    }

    /// Delete every row matching `criteria`. Criteria are required.
    pub async fn remove(&self, criteria: Filter) -> ModelResult<u64> {
        let op = "remove";
        let stmt = self
            .builder()
            .prepare(StatementKind::Delete)
            .and_where(criteria)
            .build_query()
            .map_err(|e| self.context(op, e))?;
        self.exec(op, &stmt).await
    }

    /// `SELECT COUNT(_id) FROM t WHERE ...`; 0 when no row comes back.
    pub async fn count(&self, criteria: Filter) -> ModelResult<i64> {
        let op = "count";
        let projection = format!("COUNT({ROW_ID})");
        let stmt = self
            .builder()
            .select_unchecked(&[projection.as_str()])
            .and_where(criteria)
            .build_query()
            .map_err(|e| self.context(op, e))?;
        let rows = self.fetch(op, &stmt).await?;
        Ok(rows
            .first()
            .and_then(|row| row.iter().next())
            .and_then(|(_, value)| value.as_i64())
            .unwrap_or(0))
    }

    /// Run trusted SQL as-is.
    pub async fn raw_query(&self, sql: &str, values: &[Value]) -> ModelResult<Vec<Record>> {
        let stmt = Statement::from_parts(vec![sql.to_string()], values.to_vec());
        self.fetch("raw_query", &stmt).await
    }

    // ==================== Internals ====================

    fn select_builder(&self, criteria: Filter, options: &FindOptions) -> QueryBuilder {
        let fields: Vec<&str> = options.select.iter().map(String::as_str).collect();
        let mut qb = self.builder();
        qb = if options.skip_validation {
            qb.select_unchecked(&fields)
        } else {
            qb.select(&fields)
        };
        for join in &options.joins {
            qb = qb.join(join.kind, &join.table, &join.on);
        }
        for sort in &options.sorts {
            qb = qb.sort_by(&sort.field, sort.direction);
        }
        qb.and_where(criteria).offset(options.offset)
    }

    fn context(&self, op: &str, err: ModelError) -> ModelError {
        err.with_context(format!("{op}({})", self.schema.name()))
    }

    fn log(&self, op: &str, stmt: &Statement) {
        let sql = stmt.sql();
        tracing::debug!(
            target: "pgmodel.sql",
            op,
            table = self.schema.name(),
            param_count = stmt.values().len(),
            sql = %truncate_sql(&sql, self.config.max_sql_log_length),
            "executing statement"
        );
    }

    async fn fetch(&self, op: &str, stmt: &Statement) -> ModelResult<Vec<Record>> {
        self.log(op, stmt);
        self.executor
            .query(&stmt.sql(), stmt.values())
            .await
            .map_err(|e| self.context(op, e))
    }

    async fn exec(&self, op: &str, stmt: &Statement) -> ModelResult<u64> {
        self.log(op, stmt);
        self.executor
            .execute(&stmt.sql(), stmt.values())
            .await
            .map_err(|e| self.context(op, e))
    }
}

/// Cut `sql` to at most `max` bytes on a char boundary, marking the cut with `...`.
fn truncate_sql(sql: &str, max: Option<usize>) -> String {
    match max {
        Some(max) if sql.len() > max => {
            let mut end = max;
            while end > 0 && !sql.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}...", &sql[..end])
        }
        _ => sql.to_string(),
    }
}

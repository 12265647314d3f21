//! Statement context and assembler.
//!
//! A [`QueryBuilder`] accumulates the projection, predicates, joins, sorts, pagination
//! and field/value map of exactly one logical statement, then assembles them with
//! [`QueryBuilder::build_query`]. Builders are consumed by each chained call; start a
//! fresh one (or call [`QueryBuilder::prepare`]) per statement so nothing leaks from
//! a previous operation.
//!
//! # Example
//! ```ignore
//! use pgmodel::{Filter, QueryBuilder, TableSchema};
//!
//! let users = TableSchema::new("users").with_fields(&["id", "name", "email"]);
//! let stmt = QueryBuilder::new(users)
//!     .select(&["*"])
//!     .and_where(Filter::new().eq("id", 1))
//!     .limit(1)
//!     .build_query()?;
//! assert_eq!(stmt.sql(), "SELECT * FROM users WHERE id = $1 LIMIT 1");
//! ```

mod clauses;
mod statement;

pub use clauses::{Join, JoinKind, Pagination, Sort, SortDirection};
pub use statement::Statement;

use crate::criteria::{Connective, Filter, Predicate, PredicateSet, UnknownOperatorPolicy};
use crate::error::{ModelError, ModelResult};
use crate::record::Record;
use crate::schema::TableSchema;

/// Which statement [`QueryBuilder::build_query`] assembles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatementKind {
    #[default]
    Select,
    Update,
    Delete,
}

/// Mutable accumulator for one statement.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    schema: TableSchema,
    table: String,
    kind: StatementKind,
    /// `None` until `select` is called; `None` renders as `*`.
    projection: Option<Vec<String>>,
    predicates: PredicateSet,
    joins: Vec<Join>,
    sorts: Vec<Sort>,
    pagination: Pagination,
    assignments: Record,
    /// `FROM <alias>` for UPDATE, `USING <alias>` for DELETE.
    staging: Option<String>,
    unknown_operators: UnknownOperatorPolicy,
    /// First chaining error, reported by `build_query`.
    build_error: Option<String>,
}

impl QueryBuilder {
    /// Create a SELECT builder over `schema`'s table.
    pub fn new(schema: TableSchema) -> Self {
        let table = schema.name().to_string();
        Self {
            schema,
            table,
            kind: StatementKind::Select,
            projection: None,
            predicates: PredicateSet::new(),
            joins: Vec::new(),
            sorts: Vec::new(),
            pagination: Pagination::default(),
            assignments: Record::new(),
            staging: None,
            unknown_operators: UnknownOperatorPolicy::default(),
            build_error: None,
        }
    }

    /// Set how JSON filters treat unknown operator keys.
    pub fn unknown_operators(mut self, policy: UnknownOperatorPolicy) -> Self {
        self.unknown_operators = policy;
        self
    }

    /// Clear all accumulated state and fix the statement kind.
    pub fn prepare(mut self, kind: StatementKind) -> Self {
        self.reset();
        self.kind = kind;
        self
    }

    /// Clear predicates, projection, joins, sorts, pagination, field values and errors.
    ///
    /// The table, schema and unknown-operator policy are kept.
    pub fn reset(&mut self) {
        self.table = self.schema.name().to_string();
        self.kind = StatementKind::Select;
        self.projection = None;
        self.predicates.clear();
        self.joins.clear();
        self.sorts.clear();
        self.pagination = Pagination::default();
        self.assignments = Record::new();
        self.staging = None;
        self.build_error = None;
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn predicates(&self) -> &PredicateSet {
        &self.predicates
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    /// Field/value pairs that survived schema filtering.
    pub fn assignments(&self) -> &Record {
        &self.assignments
    }

    fn fail(&mut self, err: ModelError) {
        if self.build_error.is_none() {
            self.build_error = Some(match err {
                ModelError::Validation(msg) => msg,
                other => other.to_string(),
            });
        }
    }

    // ==================== Projection ====================

    /// Add projected fields, keeping only `*` and fields known to the schema
    /// (an optional `table.` prefix is ignored for the check). An empty list means `*`.
    pub fn select(self, fields: &[&str]) -> Self {
        self.select_fields(fields, false)
    }

    /// Add projected fields without the schema check (joined or computed columns).
    pub fn select_unchecked(self, fields: &[&str]) -> Self {
        self.select_fields(fields, true)
    }

    fn select_fields(mut self, fields: &[&str], skip_validation: bool) -> Self {
        let fields: &[&str] = if fields.is_empty() { &["*"] } else { fields };
        let projection = self.projection.get_or_insert_with(Vec::new);
        for field in fields {
            if skip_validation || self.schema.allows_projection(field) {
                projection.push((*field).to_string());
            } else {
                tracing::trace!(
                    target: "pgmodel.criteria",
                    table = %self.table,
                    field = *field,
                    "dropping unknown projection field"
                );
            }
        }
        self
    }

    /// Override the FROM / target table.
    pub fn from(mut self, table: &str) -> Self {
        self.table = table.to_string();
        self
    }

    // ==================== Criteria ====================

    /// Add AND-predicates.
    pub fn and_where(mut self, filter: Filter) -> Self {
        if let Err(e) = self.predicates.add_filter(filter, Connective::And) {
            self.fail(e);
        }
        self
    }

    /// Add OR-predicates.
    pub fn or_where(mut self, filter: Filter) -> Self {
        if let Err(e) = self.predicates.add_filter(filter, Connective::Or) {
            self.fail(e);
        }
        self
    }

    /// Add AND-predicates from a JSON filter object.
    pub fn where_json(self, json: &serde_json::Value) -> Self {
        self.json_filter(json, Connective::And)
    }

    /// Add OR-predicates from a JSON filter object.
    pub fn or_where_json(self, json: &serde_json::Value) -> Self {
        self.json_filter(json, Connective::Or)
    }

    fn json_filter(mut self, json: &serde_json::Value, connective: Connective) -> Self {
        let parsed = Filter::from_json(json, self.unknown_operators)
            .and_then(|filter| self.predicates.add_filter(filter, connective));
        if let Err(e) = parsed {
            self.fail(e);
        }
        self
    }

    /// Add a single pre-built predicate.
    pub fn predicate(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    // ==================== Join / sort / pagination ====================

    /// Add `<KIND> JOIN table ON condition`. Table and condition are required.
    pub fn join(mut self, kind: JoinKind, table: &str, on: &str) -> Self {
        match Join::new(kind, table, on) {
            Ok(join) => self.joins.push(join),
            Err(e) => self.fail(e),
        }
        self
    }

    /// Add `ORDER BY field DESC`.
    pub fn sort(self, field: &str) -> Self {
        self.sort_by(field, SortDirection::Desc)
    }

    /// Add `ORDER BY field <direction>`. Calls accumulate in order.
    pub fn sort_by(mut self, field: &str, direction: SortDirection) -> Self {
        match Sort::new(field, direction) {
            Ok(sort) => self.sorts.push(sort),
            Err(e) => self.fail(e),
        }
        self
    }

    /// Set LIMIT (0 = none).
    pub fn limit(mut self, n: u64) -> Self {
        self.pagination.limit = n;
        self
    }

    /// Set OFFSET (0 = none).
    pub fn offset(mut self, n: u64) -> Self {
        self.pagination.offset = n;
        self
    }

    // ==================== Update fields ====================

    /// Set the UPDATE field/value map.
    ///
    /// Only fields known to the schema are kept, ordered by the schema's field order.
    pub fn set_fields(mut self, updates: &Record) -> Self {
        let mut assignments = Record::new();
        for field in self.schema.fields() {
            if let Some(value) = updates.get(field) {
                assignments.insert(field, value.clone());
            }
        }
        for column in updates.columns().filter(|c| !self.schema.has_field(c)) {
            tracing::trace!(
                target: "pgmodel.criteria",
                table = %self.table,
                field = column,
                "dropping unknown update field"
            );
        }
        self.assignments = assignments;
        self
    }

    /// `FROM alias` (UPDATE) / `USING alias` (DELETE), for staged statements.
    pub(crate) fn staging_from(mut self, alias: &str) -> Self {
        self.staging = Some(alias.to_string());
        self
    }

    // ==================== Build ====================

    /// Assemble the statement with placeholders starting at `$1`.
    pub fn build_query(&self) -> ModelResult<Statement> {
        let stmt = self.build_query_from(0)?;
        stmt.validate()?;
        Ok(stmt)
    }

    /// Assemble the statement with placeholders starting at `$offset + 1`.
    ///
    /// `offset` is the number of values already bound earlier in the enclosing statement;
    /// the returned statement holds only this builder's own values.
    pub fn build_query_from(&self, offset: usize) -> ModelResult<Statement> {
        if let Some(msg) = &self.build_error {
            return Err(ModelError::validation(msg.clone()));
        }
        match self.kind {
            StatementKind::Select => self.assemble_select(offset),
            StatementKind::Update => self.assemble_update(offset),
            StatementKind::Delete => self.assemble_delete(offset),
        }
    }

    fn assemble_select(&self, offset: usize) -> ModelResult<Statement> {
        let projection = match &self.projection {
            None => "*".to_string(),
            Some(fields) if fields.is_empty() => {
                return Err(ModelError::validation(format!(
                    "no selectable fields left for '{}'",
                    self.table
                )));
            }
            Some(fields) => fields.join(", "),
        };

        let mut stmt = Statement::default();
        stmt.push_fragment(format!("SELECT {projection} FROM {}", self.table));
        for join in &self.joins {
            for fragment in join.fragments() {
                stmt.push_fragment(fragment);
            }
        }
        self.append_criteria(&mut stmt, offset);
        if let Some(order_by) = clauses::order_by_fragment(&self.sorts) {
            stmt.push_fragment(order_by);
        }
        for fragment in self.pagination.fragments() {
            stmt.push_fragment(fragment);
        }
        Ok(stmt)
    }

    fn assemble_update(&self, offset: usize) -> ModelResult<Statement> {
        if self.assignments.is_empty() {
            return Err(ModelError::validation(format!(
                "update of '{}' has no fields known to the schema",
                self.table
            )));
        }

        let mut values = Vec::with_capacity(self.assignments.len());
        let set: Vec<String> = self
            .assignments
            .iter()
            .map(|(field, value)| {
                values.push(value.clone());
                format!("{field} = ${}", offset + values.len())
            })
            .collect();

        let mut stmt = Statement::bound(
            vec![format!("UPDATE {} SET", self.table), set.join(", ")],
            values,
            offset + 1,
        );
        if let Some(alias) = &self.staging {
            stmt.push_fragment(format!("FROM {alias}"));
        }
        self.append_criteria(&mut stmt, offset);
        Ok(stmt)
    }

    fn assemble_delete(&self, offset: usize) -> ModelResult<Statement> {
        if self.predicates.is_empty() {
            return Err(ModelError::validation(format!(
                "delete from '{}' requires criteria",
                self.table
            )));
        }
        let mut stmt = Statement::default();
        stmt.push_fragment(format!("DELETE FROM {}", self.table));
        if let Some(alias) = &self.staging {
            stmt.push_fragment(format!("USING {alias}"));
        }
        self.append_criteria(&mut stmt, offset);
        Ok(stmt)
    }

    /// Compile the WHERE clause after everything `stmt` has bound so far.
    fn append_criteria(&self, stmt: &mut Statement, offset: usize) {
        let start = offset + stmt.values().len();
        let compiled = self.predicates.compile(start);
        stmt.append(Statement::bound(compiled.fragments, compiled.values, start + 1));
    }
}

#[cfg(test)]
mod tests;

//! Compiled statements: ordered SQL fragments plus their bound values.

use crate::error::{ModelError, ModelResult};
use crate::record::Record;
use crate::value::Value;
use tokio_postgres::types::ToSql;

/// A compiled statement.
///
/// The Nth value corresponds to the Nth `$n` placeholder read left to right across
/// `fragments`; numbering starts at `$1` and never skips or repeats.
///
/// Placeholder numbers are recorded as the compiler emits them. Trusted text such as
/// join conditions, raw predicates and unchecked projections is never scanned, so a
/// literal like `'USD$1'` there does not count as a placeholder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statement {
    fragments: Vec<String>,
    values: Vec<Value>,
    placeholders: Vec<usize>,
}

impl Statement {
    /// Create a statement from hand-written parts. Call [`Statement::validate`] before
    /// execution.
    ///
    /// The fragments are scanned for `$n` markers.
    pub fn from_parts(fragments: Vec<String>, values: Vec<Value>) -> Self {
        let placeholders = scan_placeholders(&fragments);
        Self {
            fragments,
            values,
            placeholders,
        }
    }

    /// Compiler output binding `values` to `$first`, `$first + 1`, ... in order.
    pub(crate) fn bound(fragments: Vec<String>, values: Vec<Value>, first: usize) -> Self {
        let placeholders = (first..first + values.len()).collect();
        Self {
            fragments,
            values,
            placeholders,
        }
    }

    /// Build `INSERT INTO table (cols) values ($1..$n) RETURNING returning`.
    pub fn insert(table: &str, data: &Record, returning: Option<&str>) -> ModelResult<Self> {
        if data.is_empty() {
            return Err(ModelError::validation(format!(
                "insert into '{table}' requires at least one field"
            )));
        }
        let columns: Vec<&str> = data.columns().collect();
        let placeholders: Vec<String> = (1..=data.len()).map(|n| format!("${n}")).collect();
        let mut sql = format!(
            "INSERT INTO {table} ({}) values ({})",
            columns.join(","),
            placeholders.join(",")
        );
        if let Some(cols) = returning {
            sql.push_str(" RETURNING ");
            sql.push_str(cols);
        }
        let values = data.iter().map(|(_, v)| v.clone()).collect();
        Ok(Self::bound(vec![sql], values, 1))
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<Value>) {
        (self.fragments, self.values)
    }

    /// Surround the fragments with `open` and `close`, keeping the bindings.
    pub(crate) fn wrapped(mut self, open: impl Into<String>, close: impl Into<String>) -> Self {
        self.fragments.insert(0, open.into());
        self.fragments.push(close.into());
        self
    }

    /// Fragments joined with single spaces.
    pub fn sql(&self) -> String {
        self.fragments.join(" ")
    }

    /// Parameter refs compatible with `tokio-postgres`.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.values
            .iter()
            .map(|v| v as &(dyn ToSql + Sync))
            .collect()
    }

    /// Append another statement's fragments and values.
    ///
    /// `other` must have been compiled with an offset equal to `self.values().len()`.
    pub(crate) fn append(&mut self, other: Statement) {
        self.fragments.extend(other.fragments);
        self.values.extend(other.values);
        self.placeholders.extend(other.placeholders);
    }

    pub(crate) fn push_fragment(&mut self, fragment: impl Into<String>) {
        self.fragments.push(fragment.into());
    }

    /// Placeholder numbers in reading order.
    pub fn placeholders(&self) -> Vec<usize> {
        self.placeholders.clone()
    }

    /// Check the placeholder invariant: `$1..$n` in order, one per value.
    pub fn validate(&self) -> ModelResult<()> {
        let placeholders = &self.placeholders;
        if placeholders.len() != self.values.len() {
            return Err(ModelError::query_build(format!(
                "placeholders({}) != params({})",
                placeholders.len(),
                self.values.len()
            )));
        }
        for (i, n) in placeholders.iter().enumerate() {
            if *n != i + 1 {
                return Err(ModelError::query_build(format!(
                    "placeholder #{} is ${n}, expected ${}",
                    i + 1,
                    i + 1
                )));
            }
        }
        Ok(())
    }
}

/// `$<digits>` markers in reading order; a bare `$` is skipped.
fn scan_placeholders(fragments: &[String]) -> Vec<usize> {
    let mut out = Vec::new();
    for fragment in fragments {
        let bytes = fragment.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'$' {
                let start = i + 1;
                let mut end = start;
                while end < bytes.len() && bytes[end].is_ascii_digit() {
                    end += 1;
                }
                if end > start {
                    if let Ok(n) = fragment[start..end].parse() {
                        out.push(n);
                    }
                }
                i = end;
            } else {
                i += 1;
            }
        }
    }
    out
}

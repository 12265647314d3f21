//! Predicate model and criteria compiler.
//!
//! A [`PredicateSet`] holds two ordered sequences, AND-predicates and OR-predicates.
//! [`PredicateSet::compile`] emits them as `WHERE` fragments, AND-predicates first,
//! each predicate after the first preceded by its own connective:
//!
//! ```text
//! where(a = 1, b = 2).or_where(c = 3)  =>  WHERE a = $1 AND b = $2 OR c = $3
//! ```
//!
//! The clause is flat: no parentheses are added, so SQL's own AND-over-OR precedence
//! applies to the whole list.

mod filter;

pub use filter::{Filter, UnknownOperatorPolicy};

use crate::error::{ModelError, ModelResult};
use crate::value::Value;

/// A comparison operator together with its operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// field = $n
    Eq(Value),
    /// field != $n
    Ne(Value),
    /// field < $n
    Lt(Value),
    /// field <= $n
    Lte(Value),
    /// field > $n
    Gt(Value),
    /// field >= $n
    Gte(Value),
    /// field IN ($n, $n+1, ...), one placeholder per element
    In(Vec<Value>),
    /// LOWER(field) LIKE LOWER($n)
    Like(String),
}

impl Op {
    pub fn eq(value: impl Into<Value>) -> Self {
        Op::Eq(value.into())
    }

    pub fn ne(value: impl Into<Value>) -> Self {
        Op::Ne(value.into())
    }

    pub fn lt(value: impl Into<Value>) -> Self {
        Op::Lt(value.into())
    }

    pub fn lte(value: impl Into<Value>) -> Self {
        Op::Lte(value.into())
    }

    pub fn gt(value: impl Into<Value>) -> Self {
        Op::Gt(value.into())
    }

    pub fn gte(value: impl Into<Value>) -> Self {
        Op::Gte(value.into())
    }

    pub fn in_list<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Op::In(values.into_iter().map(Into::into).collect())
    }

    pub fn like(pattern: impl Into<String>) -> Self {
        Op::Like(pattern.into())
    }

    /// The filter-object key for this operator (`$gt`, `$in`, ...).
    pub fn key(&self) -> &'static str {
        match self {
            Op::Eq(_) => "$eq",
            Op::Ne(_) => "$ne",
            Op::Lt(_) => "$lt",
            Op::Lte(_) => "$lte",
            Op::Gt(_) => "$gt",
            Op::Gte(_) => "$gte",
            Op::In(_) => "$in",
            Op::Like(_) => "$like",
        }
    }

    /// The SQL operator token.
    pub fn sql_operator(&self) -> &'static str {
        match self {
            Op::Eq(_) => "=",
            Op::Ne(_) => "!=",
            Op::Lt(_) => "<",
            Op::Lte(_) => "<=",
            Op::Gt(_) => ">",
            Op::Gte(_) => ">=",
            Op::In(_) => "IN",
            Op::Like(_) => "LIKE",
        }
    }

    /// Number of placeholders this operator consumes.
    pub fn param_count(&self) -> usize {
        match self {
            Op::In(values) => values.len(),
            _ => 1,
        }
    }

    fn check(&self, field: &str) -> ModelResult<()> {
        match self {
            Op::In(values) if values.is_empty() => Err(ModelError::validation(format!(
                "IN filter on '{field}' requires a non-empty list"
            ))),
            _ => Ok(()),
        }
    }
}

/// The joiner placed before a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

impl Connective {
    pub fn as_str(self) -> &'static str {
        match self {
            Connective::And => "AND",
            Connective::Or => "OR",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Body {
    Op(Op),
    /// Trusted SQL, emitted verbatim, no parameters.
    Raw(String),
}

/// A single filter condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    field: String,
    connective: Connective,
    body: Body,
}

impl Predicate {
    /// Create a predicate. Fails if `op` is an empty IN list.
    pub fn new(field: impl Into<String>, connective: Connective, op: Op) -> ModelResult<Self> {
        let field = field.into();
        op.check(&field)?;
        Ok(Self {
            field,
            connective,
            body: Body::Op(op),
        })
    }

    /// A raw SQL condition (e.g. a column-to-column join predicate).
    ///
    /// The text is emitted as-is. Never pass end-user input here.
    pub fn raw(sql: impl Into<String>, connective: Connective) -> Self {
        Self {
            field: String::new(),
            connective,
            body: Body::Raw(sql.into()),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn connective(&self) -> Connective {
        self.connective
    }

    /// The operator, or `None` for raw predicates.
    pub fn op(&self) -> Option<&Op> {
        match &self.body {
            Body::Op(op) => Some(op),
            Body::Raw(_) => None,
        }
    }

    /// Render this predicate, numbering placeholders after `*last` and advancing it.
    fn render(&self, last: &mut usize, values: &mut Vec<Value>) -> String {
        let mut next = |value: &Value| {
            *last += 1;
            values.push(value.clone());
            format!("${}", *last)
        };

        let op = match &self.body {
            Body::Raw(sql) => return sql.clone(),
            Body::Op(op) => op,
        };

        match op {
            Op::Eq(v) | Op::Ne(v) | Op::Lt(v) | Op::Lte(v) | Op::Gt(v) | Op::Gte(v) => {
                let placeholder = next(v);
                format!("{} {} {}", self.field, op.sql_operator(), placeholder)
            }
            Op::In(list) => {
                let placeholders: Vec<String> = list.iter().map(&mut next).collect();
                format!("{} IN ({})", self.field, placeholders.join(","))
            }
            Op::Like(pattern) => {
                let placeholder = next(&Value::Text(pattern.clone()));
                format!("LOWER({}) LIKE LOWER({})", self.field, placeholder)
            }
        }
    }
}

/// The compiled `WHERE` clause: SQL tokens plus the values they bind, in placeholder order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledCriteria {
    pub fragments: Vec<String>,
    pub values: Vec<Value>,
}

/// Ordered AND- and OR-predicates accumulated for one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredicateSet {
    and: Vec<Predicate>,
    or: Vec<Predicate>,
}

impl PredicateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a predicate to the sequence matching its connective.
    pub fn push(&mut self, predicate: Predicate) {
        match predicate.connective {
            Connective::And => self.and.push(predicate),
            Connective::Or => self.or.push(predicate),
        }
    }

    /// Append every usable entry of `filter`, joined with `connective`.
    ///
    /// Literal entries with a falsy value (NULL, `""`, `false`) are skipped; `0` is kept.
    pub fn add_filter(&mut self, filter: Filter, connective: Connective) -> ModelResult<()> {
        for predicate in filter.into_predicates(connective)? {
            self.push(predicate);
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.and.is_empty() && self.or.is_empty()
    }

    pub fn len(&self) -> usize {
        self.and.len() + self.or.len()
    }

    pub fn clear(&mut self) {
        self.and.clear();
        self.or.clear();
    }

    /// Predicates in emission order: every AND-predicate, then every OR-predicate.
    pub fn iter(&self) -> impl Iterator<Item = &Predicate> {
        self.and.iter().chain(self.or.iter())
    }

    /// Total placeholders the compiled clause will consume.
    pub fn param_count(&self) -> usize {
        self.iter()
            .filter_map(Predicate::op)
            .map(Op::param_count)
            .sum()
    }

    /// Compile into a `WHERE` clause whose first placeholder is `$offset + 1`.
    ///
    /// `offset` is the number of parameters already bound earlier in the same statement.
    /// An empty set compiles to no fragments.
    pub fn compile(&self, offset: usize) -> CompiledCriteria {
        let mut out = CompiledCriteria::default();
        let mut last = offset;
        for (i, predicate) in self.iter().enumerate() {
            if i == 0 {
                out.fragments.push("WHERE".to_string());
            } else {
                out.fragments
                    .push(predicate.connective.as_str().to_string());
            }
            out.fragments
                .push(predicate.render(&mut last, &mut out.values));
        }
        out
    }
}

#[cfg(test)]
mod tests;

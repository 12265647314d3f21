//! Filter objects: the `{ field: value | { $op: value } }` input accepted by `where`.

use super::{Connective, Op, Predicate};
use crate::error::{ModelError, ModelResult};
use crate::value::Value;

/// What to do with operator keys the compiler does not know (`$regex`, `$or`, ...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownOperatorPolicy {
    /// Drop the entry and keep compiling.
    #[default]
    Ignore,
    /// Fail with a validation error.
    Reject,
}

#[derive(Debug, Clone, PartialEq)]
enum Entry {
    /// A bare value: compiled as `field = $n`, skipped when falsy.
    Literal(Value),
    /// An operator object; kept even when its operand is falsy.
    Op(Op),
}

/// An ordered field → condition map, the argument of `where` / `or_where`.
///
/// # Example
/// ```ignore
/// let filter = Filter::new()
///     .eq("name", "a")
///     .gt("age", 5)
///     .in_list("tag", [1, 2, 3]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    entries: Vec<(String, Entry)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `field = value`, given as a bare value. Falsy values drop the field.
    pub fn eq(self, field: &str, value: impl Into<Value>) -> Self {
        self.entry(field, Entry::Literal(value.into()))
    }

    /// Add an explicit operator condition.
    pub fn op(self, field: &str, op: Op) -> Self {
        self.entry(field, Entry::Op(op))
    }

    /// Entries without a field name are dropped.
    fn entry(mut self, field: &str, entry: Entry) -> Self {
        if !field.is_empty() {
            self.entries.push((field.to_string(), entry));
        }
        self
    }

    pub fn ne(self, field: &str, value: impl Into<Value>) -> Self {
        self.op(field, Op::ne(value))
    }

    pub fn lt(self, field: &str, value: impl Into<Value>) -> Self {
        self.op(field, Op::lt(value))
    }

    pub fn lte(self, field: &str, value: impl Into<Value>) -> Self {
        self.op(field, Op::lte(value))
    }

    pub fn gt(self, field: &str, value: impl Into<Value>) -> Self {
        self.op(field, Op::gt(value))
    }

    pub fn gte(self, field: &str, value: impl Into<Value>) -> Self {
        self.op(field, Op::gte(value))
    }

    pub fn in_list<I, V>(self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.op(field, Op::in_list(values))
    }

    /// Case-insensitive pattern match.
    pub fn like(self, field: &str, pattern: impl Into<String>) -> Self {
        self.op(field, Op::like(pattern))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Parse a JSON filter object.
    ///
    /// A bare scalar means equality; an object's first key names the operator
    /// (`$eq`, `$ne`, `$lt`, `$lte`, `$gt`, `$gte`, `$in`, `$like`). Key order is kept.
    /// Unknown operators follow `policy`. Anything but an object is rejected.
    pub fn from_json(json: &serde_json::Value, policy: UnknownOperatorPolicy) -> ModelResult<Self> {
        let obj = json.as_object().ok_or_else(|| {
            ModelError::validation(format!(
                "where() expects an object, got {}",
                json_kind(json)
            ))
        })?;

        let mut filter = Filter::new();
        for (field, raw) in obj {
            if field.is_empty() {
                continue;
            }
            match raw {
                serde_json::Value::Object(op_obj) => {
                    let mut keys = op_obj.iter();
                    let Some((key, operand)) = keys.next() else {
                        continue;
                    };
                    for (extra, _) in keys {
                        unknown(policy, field, extra)?;
                    }
                    match parse_op(field, key, operand)? {
                        Some(op) => filter = filter.op(field, op),
                        None => unknown(policy, field, key)?,
                    }
                }
                serde_json::Value::Array(_) => unknown(policy, field, "[array]")?,
                scalar => {
                    let value = Value::from_json(scalar).unwrap_or(Value::Null);
                    filter = filter.eq(field, value);
                }
            }
        }
        Ok(filter)
    }

    /// Turn entries into predicates, skipping falsy literals.
    pub(crate) fn into_predicates(self, connective: Connective) -> ModelResult<Vec<Predicate>> {
        let mut out = Vec::with_capacity(self.entries.len());
        for (field, entry) in self.entries {
            let op = match entry {
                Entry::Literal(value) if value.is_falsy() => continue,
                Entry::Literal(value) => Op::Eq(value),
                Entry::Op(op) => op,
            };
            out.push(Predicate::new(field, connective, op)?);
        }
        Ok(out)
    }
}

fn unknown(policy: UnknownOperatorPolicy, field: &str, key: &str) -> ModelResult<()> {
    match policy {
        UnknownOperatorPolicy::Ignore => {
            tracing::trace!(
                target: "pgmodel.criteria",
                field,
                operator = key,
                "dropping unsupported filter operator"
            );
            Ok(())
        }
        UnknownOperatorPolicy::Reject => Err(ModelError::validation(format!(
            "unsupported filter operator '{key}' on '{field}'"
        ))),
    }
}

/// `Ok(None)` means the key is not a known operator.
fn parse_op(field: &str, key: &str, operand: &serde_json::Value) -> ModelResult<Option<Op>> {
    let scalar = || {
        Value::from_json(operand).ok_or_else(|| {
            ModelError::validation(format!("operator '{key}' on '{field}' expects a scalar"))
        })
    };

    let op = match key {
        "$eq" => Op::Eq(scalar()?),
        "$ne" => Op::Ne(scalar()?),
        "$lt" => Op::Lt(scalar()?),
        "$lte" => Op::Lte(scalar()?),
        "$gt" => Op::Gt(scalar()?),
        "$gte" => Op::Gte(scalar()?),
        "$in" => {
            let items = operand.as_array().ok_or_else(|| {
                ModelError::validation(format!("operator '$in' on '{field}' expects an array"))
            })?;
            let values = items
                .iter()
                .map(|item| {
                    Value::from_json(item).ok_or_else(|| {
                        ModelError::validation(format!(
                            "operator '$in' on '{field}' expects scalar elements"
                        ))
                    })
                })
                .collect::<ModelResult<Vec<_>>>()?;
            Op::In(values)
        }
        "$like" => {
            let pattern = operand.as_str().ok_or_else(|| {
                ModelError::validation(format!("operator '$like' on '{field}' expects a string"))
            })?;
            Op::Like(pattern.to_string())
        }
        _ => return Ok(None),
    };
    Ok(Some(op))
}

fn json_kind(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

//! Update documents for `find_one_and_update` and upserts.

use crate::error::{ModelError, ModelResult};
use crate::record::Record;
use serde::Serialize;

/// `{ $set: {...}, $setOnInsert: {...} }`
///
/// `set` is applied to an existing row; an upsert that inserts writes `set` merged with
/// `set_on_insert` (on key collision the `set_on_insert` value wins).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateDoc {
    pub set: Option<Record>,
    pub set_on_insert: Option<Record>,
}

impl UpdateDoc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only `$set`.
    pub fn set(fields: Record) -> Self {
        Self {
            set: Some(fields),
            set_on_insert: None,
        }
    }

    pub fn with_set_on_insert(mut self, fields: Record) -> Self {
        self.set_on_insert = Some(fields);
        self
    }

    /// Parse `{ "$set": {...}, "$setOnInsert": {...} }`. Other keys are rejected.
    pub fn from_json(json: &serde_json::Value) -> ModelResult<Self> {
        let obj = json
            .as_object()
            .ok_or_else(|| ModelError::validation("update document must be an object"))?;

        let mut doc = Self::new();
        for (key, fields) in obj {
            match key.as_str() {
                "$set" => doc.set = Some(Record::from_json(fields)?),
                "$setOnInsert" => doc.set_on_insert = Some(Record::from_json(fields)?),
                other => {
                    return Err(ModelError::validation(format!(
                        "unsupported update operator '{other}'"
                    )));
                }
            }
        }
        Ok(doc)
    }

    /// Fields written when the upsert inserts.
    pub fn insert_fields(&self) -> Record {
        let mut fields = self.set.clone().unwrap_or_default();
        if let Some(extra) = &self.set_on_insert {
            fields.merge(extra);
        }
        fields
    }
}

/// Result of `insert_one`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InsertResult {
    /// Backend-assigned `id`, when the table returns one.
    pub id: Option<i64>,
    /// Generated `_id`, when the caller did not supply one.
    pub synthetic_id: Option<String>,
}

/// What `find_one_and_update` did.
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertOutcome {
    /// No row matched and the upsert inserted one.
    Inserted(InsertResult),
    /// A row matched and `$set` was applied; holds the affected row count.
    Updated(u64),
    /// No row matched and upsert was off.
    NotFound,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use serde_json::json;

    #[test]
    fn parses_both_operators() {
        let doc = UpdateDoc::from_json(&json!({
            "$set": {"name": "n"},
            "$setOnInsert": {"created": 1}
        }))
        .unwrap();
        assert_eq!(doc.set, Some(Record::new().with("name", "n")));
        assert_eq!(doc.set_on_insert, Some(Record::new().with("created", 1)));
    }

    #[test]
    fn rejects_unknown_operators_and_shapes() {
        assert!(UpdateDoc::from_json(&json!({"$inc": {"n": 1}}))
            .unwrap_err()
            .is_validation());
        assert!(UpdateDoc::from_json(&json!([1])).unwrap_err().is_validation());
        assert!(UpdateDoc::from_json(&json!({"$set": 3})).unwrap_err().is_validation());
    }

    #[test]
    fn insert_fields_merge_set_on_insert_last() {
        let doc = UpdateDoc::set(Record::new().with("name", "a").with("plan", "free"))
            .with_set_on_insert(Record::new().with("plan", "trial").with("created", 7));
        let fields = doc.insert_fields();
        assert_eq!(fields.columns().collect::<Vec<_>>(), vec!["name", "plan", "created"]);
        assert_eq!(fields.get("plan"), Some(&Value::from("trial")));
    }

    #[test]
    fn missing_set_is_distinguishable() {
        let doc = UpdateDoc::from_json(&json!({"$setOnInsert": {"a": 1}})).unwrap();
        assert!(doc.set.is_none());
        assert_eq!(doc.insert_fields(), Record::new().with("a", 1));
    }
}

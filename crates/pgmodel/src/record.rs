//! Ordered column → value mappings.
//!
//! [`Record`] is used both for decoded result rows and for the field/value maps handed to
//! inserts and updates. Insertion order is preserved because it decides placeholder order.

use crate::error::{ModelError, ModelResult};
use crate::value::Value;
use serde::ser::{Serialize, SerializeMap, Serializer};
use tokio_postgres::Row;

/// An ordered mapping of column name to [`Value`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    entries: Vec<(String, Value)>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    /// Insert or replace a column value. A replaced column keeps its original position.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(c, _)| c.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(c, v)| (c.as_str(), v))
    }

    /// Copy every entry of `other` into `self`; `other` wins on conflicts.
    pub fn merge(&mut self, other: &Record) {
        for (column, value) in other.iter() {
            self.insert(column, value.clone());
        }
    }

    /// Decode a driver row. Every column must decode into a [`Value`].
    pub fn from_row(row: &Row) -> ModelResult<Self> {
        let mut record = Record::new();
        for (idx, column) in row.columns().iter().enumerate() {
            let value: Value = row
                .try_get(idx)
                .map_err(|e| ModelError::decode(column.name(), e.to_string()))?;
            record.entries.push((column.name().to_string(), value));
        }
        Ok(record)
    }

    /// Build a record from a JSON object of scalars.
    pub fn from_json(json: &serde_json::Value) -> ModelResult<Self> {
        let obj = json
            .as_object()
            .ok_or_else(|| ModelError::validation("expected a JSON object of field values"))?;
        let mut record = Record::new();
        for (column, raw) in obj {
            let value = Value::from_json(raw).ok_or_else(|| {
                ModelError::validation(format!("field '{column}' is not a scalar value"))
            })?;
            record.insert(column.as_str(), value);
        }
        Ok(record)
    }

    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .entries
            .iter()
            .map(|(c, v)| (c.clone(), v.to_json()))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (column, value) in &self.entries {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_ordered_map() {
        let r = Record::new().with("z", 1).with("a", Value::Null).with("m", "x");
        assert_eq!(
            serde_json::to_string(&r).unwrap(),
            r#"{"z":1,"a":null,"m":"x"}"#
        );
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut r = Record::new().with("a", 1).with("b", 2);
        r.insert("a", 3);
        let cols: Vec<_> = r.columns().collect();
        assert_eq!(cols, vec!["a", "b"]);
        assert_eq!(r.get("a"), Some(&Value::Int(3)));
    }

    #[test]
    fn merge_prefers_other() {
        let mut base = Record::new().with("name", "x").with("plan", "free");
        base.merge(&Record::new().with("plan", "pro").with("seats", 3));
        assert_eq!(base.get("plan"), Some(&Value::Text("pro".into())));
        assert_eq!(base.len(), 3);
    }

    #[test]
    fn from_json_rejects_nested_values() {
        let err = Record::from_json(&serde_json::json!({"tags": [1, 2]})).unwrap_err();
        assert!(err.is_validation());
        let ok = Record::from_json(&serde_json::json!({"b": 1, "a": "x"})).unwrap();
        assert_eq!(ok.columns().collect::<Vec<_>>(), vec!["b", "a"]);
    }
}

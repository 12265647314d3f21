//! Schema registry: the set of valid field names per table.
//!
//! The compiler consults it only to whitelist projections and update fields.

use crate::error::{ModelError, ModelResult};
use std::collections::HashMap;

/// Static table metadata, for types that describe a table at compile time.
pub trait TableMeta {
    /// The database table name.
    fn table_name() -> &'static str;

    /// Column names, in the order updates should assign them.
    fn columns() -> &'static [&'static str];
}

/// A table name plus its ordered field set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    name: String,
    fields: Vec<String>,
}

impl TableSchema {
    /// Create a new table schema with no fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Build from a [`TableMeta`] implementor.
    pub fn of<T: TableMeta>() -> Self {
        Self::new(T::table_name()).with_fields(T::columns())
    }

    /// Add multiple fields. Duplicates are ignored.
    pub fn with_fields(mut self, fields: &[&str]) -> Self {
        for f in fields {
            self.add_field(*f);
        }
        self
    }

    /// Add a field. Duplicates are ignored.
    pub fn add_field(&mut self, field: impl Into<String>) {
        let field = field.into();
        if !self.fields.contains(&field) {
            self.fields.push(field);
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in registry iteration order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    /// Check if this table has a field with the given (unqualified) name.
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f == name)
    }

    /// Projection check: `*`, or a known field after stripping an optional `table.` prefix.
    pub fn allows_projection(&self, field: &str) -> bool {
        if field == "*" {
            return true;
        }
        let bare = field.rsplit_once('.').map_or(field, |(_, col)| col);
        self.has_field(bare)
    }
}

/// Registry of table schemas, keyed by table name.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    tables: HashMap<String, TableSchema>,
}

impl SchemaRegistry {
    /// Create a new empty schema registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a table schema.
    pub fn register(&mut self, schema: TableSchema) {
        self.tables.insert(schema.name.clone(), schema);
    }

    /// Register a [`TableMeta`] implementor.
    pub fn register_meta<T: TableMeta>(&mut self) {
        self.register(TableSchema::of::<T>());
    }

    pub fn get(&self, table: &str) -> Option<&TableSchema> {
        self.tables.get(table)
    }

    /// Like [`SchemaRegistry::get`], but an unknown table is an error.
    pub fn require(&self, table: &str) -> ModelResult<&TableSchema> {
        self.get(table)
            .ok_or_else(|| ModelError::validation(format!("table '{table}' is not registered")))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

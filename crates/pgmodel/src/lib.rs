//! # pgmodel
//!
//! A criteria-to-SQL compiler and a small CRUD facade for PostgreSQL.
//!
//! ## Features
//!
//! - **Declarative criteria**: `{ field: value | { $op: value } }` filters, typed or from JSON
//! - **Positional placeholders**: one contiguous `$1..$n` sequence per statement, even across CTEs
//! - **Schema-checked**: projections and update fields are filtered against the table's field set
//! - **Staged single-row writes**: `update_one` / `delete_one` target exactly one row via a CTE
//! - **Safe defaults**: DELETE requires criteria, UPDATE requires known fields
//! - **Transaction-friendly**: any [`Executor`] works, including `tokio_postgres::Transaction`
//!
//! ## Compiling statements
//!
//! ```ignore
//! use pgmodel::{Filter, QueryBuilder, TableSchema};
//!
//! let users = TableSchema::new("users").with_fields(&["id", "name", "email"]);
//! let stmt = QueryBuilder::new(users)
//!     .select(&["name", "email"])
//!     .and_where(Filter::new().gt("id", 10).like("email", "%@example.com"))
//!     .or_where(Filter::new().in_list("name", ["ann", "bob"]))
//!     .sort("id")
//!     .limit(20)
//!     .build_query()?;
//!
//! client.query(&stmt.sql(), &stmt.params_ref()).await?;
//! ```
//!
//! ## Model facade
//!
//! ```ignore
//! use pgmodel::{Filter, FindOptions, Model, Record};
//!
//! let users = Model::new(pool, users_schema);
//! users.insert_one(Record::new().with("name", "ann")).await?;
//! let rows = users.find_all(Filter::new().eq("name", "ann"), &FindOptions::new().limit(5)).await?;
//! let n = users.count(Filter::new()).await?;
//! ```

pub mod builder;
pub mod config;
pub mod criteria;
pub mod error;
pub mod executor;
pub mod id;
pub mod model;
pub mod record;
pub mod schema;
pub mod staged;
pub mod update;
pub mod value;

pub use builder::{
    Join, JoinKind, Pagination, QueryBuilder, Sort, SortDirection, Statement, StatementKind,
};
pub use config::ModelConfig;
pub use criteria::{
    CompiledCriteria, Connective, Filter, Op, Predicate, PredicateSet, UnknownOperatorPolicy,
};
pub use error::{ModelError, ModelResult};
pub use executor::Executor;
pub use id::{SeedHasher, Uuid5SeedHasher};
pub use model::{FindOptions, Model, UpdateOptions};
pub use record::Record;
pub use schema::{SchemaRegistry, TableMeta, TableSchema};
pub use staged::StagedRow;
pub use update::{InsertResult, UpdateDoc, UpsertOutcome};
pub use value::Value;

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_config};

//! The execution boundary: `(sql, values) -> rows`.

use crate::error::{ModelError, ModelResult};
use crate::record::Record;
use crate::value::Value;
use std::future::Future;
use tokio_postgres::types::ToSql;

/// Anything that can run a compiled statement.
///
/// Implemented for plain and pooled `tokio-postgres` clients, transactions and the
/// pool itself, so the model facade can run inside or outside a transaction.
pub trait Executor: Send + Sync {
    /// Run a statement and decode every returned row.
    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = ModelResult<Vec<Record>>> + Send;

    /// Run a statement and return the number of affected rows.
    fn execute(&self, sql: &str, params: &[Value]) -> impl Future<Output = ModelResult<u64>> + Send;
}

impl<T: Executor> Executor for &T {
    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = ModelResult<Vec<Record>>> + Send {
        (**self).query(sql, params)
    }

    fn execute(&self, sql: &str, params: &[Value]) -> impl Future<Output = ModelResult<u64>> + Send {
        (**self).execute(sql, params)
    }
}

fn param_refs(params: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

fn driver_error(context: &str, err: tokio_postgres::Error) -> ModelError {
    tracing::warn!(target: "pgmodel.sql", context, error = %err, "statement failed");
    ModelError::execution(context, err)
}

impl Executor for tokio_postgres::Client {
    async fn query(&self, sql: &str, params: &[Value]) -> ModelResult<Vec<Record>> {
        let rows = tokio_postgres::Client::query(self, sql, &param_refs(params))
            .await
            .map_err(|e| driver_error("query", e))?;
        rows.iter().map(Record::from_row).collect()
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> ModelResult<u64> {
        tokio_postgres::Client::execute(self, sql, &param_refs(params))
            .await
            .map_err(|e| driver_error("execute", e))
    }
}

impl Executor for tokio_postgres::Transaction<'_> {
    async fn query(&self, sql: &str, params: &[Value]) -> ModelResult<Vec<Record>> {
        let rows = tokio_postgres::Transaction::query(self, sql, &param_refs(params))
            .await
            .map_err(|e| driver_error("query", e))?;
        rows.iter().map(Record::from_row).collect()
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> ModelResult<u64> {
        tokio_postgres::Transaction::execute(self, sql, &param_refs(params))
            .await
            .map_err(|e| driver_error("execute", e))
    }
}

// ===== deadpool-postgres support =====

#[cfg(feature = "pool")]
impl Executor for deadpool_postgres::Client {
    async fn query(&self, sql: &str, params: &[Value]) -> ModelResult<Vec<Record>> {
        // Delegate to the deref target (tokio_postgres::Client).
        let client: &tokio_postgres::Client = self;
        Executor::query(client, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> ModelResult<u64> {
        let client: &tokio_postgres::Client = self;
        Executor::execute(client, sql, params).await
    }
}

/// Each call checks out a connection for the duration of one statement.
#[cfg(feature = "pool")]
impl Executor for deadpool_postgres::Pool {
    async fn query(&self, sql: &str, params: &[Value]) -> ModelResult<Vec<Record>> {
        let client = self.get().await?;
        Executor::query(&client, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> ModelResult<u64> {
        let client = self.get().await?;
        Executor::execute(&client, sql, params).await
    }
}

//! Runtime configuration.

use crate::criteria::UnknownOperatorPolicy;
use crate::error::{ModelError, ModelResult};

/// Environment variable holding the connection string.
pub const DSN_ENV: &str = "POSTGRESQL_DSN";

/// Optional environment variable overriding [`ModelConfig::max_pool_size`].
pub const POOL_SIZE_ENV: &str = "PGMODEL_POOL_SIZE";

/// Settings shared by the pool and the model facade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    pub database_url: String,
    pub max_pool_size: usize,
    /// How JSON filters treat unknown operator keys.
    pub unknown_operators: UnknownOperatorPolicy,
    /// Truncate logged SQL (in bytes). `None` logs it whole.
    pub max_sql_log_length: Option<usize>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 16,
            unknown_operators: UnknownOperatorPolicy::Ignore,
            max_sql_log_length: Some(200),
        }
    }
}

impl ModelConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Self::default()
        }
    }

    /// Read `POSTGRESQL_DSN` and, if set, `PGMODEL_POOL_SIZE`.
    ///
    /// Loading a `.env` file is left to the caller.
    pub fn from_env() -> ModelResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ModelResult<Self> {
        let database_url = lookup(DSN_ENV)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ModelError::Config(format!("{DSN_ENV} is not set")))?;

        let mut config = Self::new(database_url);
        if let Some(raw) = lookup(POOL_SIZE_ENV) {
            let size: usize = raw.trim().parse().map_err(|_| {
                ModelError::Config(format!("{POOL_SIZE_ENV} must be a positive integer, got '{raw}'"))
            })?;
            if size == 0 {
                return Err(ModelError::Config(format!("{POOL_SIZE_ENV} must be at least 1")));
            }
            config.max_pool_size = size;
        }
        Ok(config)
    }

    pub fn max_pool_size(mut self, size: usize) -> Self {
        self.max_pool_size = size;
        self
    }

    pub fn unknown_operators(mut self, policy: UnknownOperatorPolicy) -> Self {
        self.unknown_operators = policy;
        self
    }

    pub fn max_sql_log_length(mut self, len: usize) -> Self {
        self.max_sql_log_length = Some(len);
        self
    }

    /// Log SQL without truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_log_length = None;
        self
    }
}

//! Synthetic row identifiers.
//!
//! `insert_one` fills `_id` when the table has one and the caller left it out. The
//! identifier comes from a [`SeedHasher`] keyed on the table name and the current time.

use chrono::Utc;
use uuid::Uuid;

/// Turns a seed into a unique string identifier.
pub trait SeedHasher: Send + Sync {
    fn hash(&self, seed: &str) -> String;

    /// Identifier for a new row of `table`.
    fn generate(&self, table: &str) -> String {
        let now = Utc::now();
        let nanos = now
            .timestamp_nanos_opt()
            .unwrap_or_else(|| now.timestamp_micros() * 1_000);
        self.hash(&format!("{table}:{nanos}"))
    }
}

/// Name-based UUID (v5) over the seed, salted with a random v4 so two inserts in the
/// same nanosecond still differ.
#[derive(Debug, Clone, Copy, Default)]
pub struct Uuid5SeedHasher;

impl SeedHasher for Uuid5SeedHasher {
    fn hash(&self, seed: &str) -> String {
        let salted = format!("{seed}:{}", Uuid::new_v4());
        Uuid::new_v5(&Uuid::NAMESPACE_OID, salted.as_bytes())
            .simple()
            .to_string()
    }
}

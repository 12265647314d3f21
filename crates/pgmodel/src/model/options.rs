use crate::builder::{Join, Sort};

/// Options for `find_one` / `find_all`.
///
/// ```ignore
/// let options = FindOptions::new()
///     .select(&["users.name", "o.total"])
///     .skip_validation()
///     .join(Join::new(JoinKind::Left, "orders o", "o.user_id = users.id")?)
///     .sort(Sort::new("o.total", SortDirection::Desc)?)
///     .limit(10);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    /// Projected fields; empty means `*`.
    pub select: Vec<String>,
    /// Keep projected fields the schema does not know (joined columns).
    pub skip_validation: bool,
    pub joins: Vec<Join>,
    pub sorts: Vec<Sort>,
    /// Overrides the operation's default (1 for `find_one`, none for `find_all`).
    pub limit: Option<u64>,
    pub offset: u64,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(mut self, fields: &[&str]) -> Self {
        self.select.extend(fields.iter().map(|f| f.to_string()));
        self
    }

    pub fn skip_validation(mut self) -> Self {
        self.skip_validation = true;
        self
    }

    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sorts.push(sort);
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: u64) -> Self {
        self.offset = n;
        self
    }
}

/// Options for `update_one` / `find_one_and_update`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Insert when no row matches.
    pub upsert: bool,
}

impl UpdateOptions {
    pub fn upsert() -> Self {
        Self { upsert: true }
    }
}

//! Projection-independent clauses: JOIN, ORDER BY, LIMIT/OFFSET.
//!
//! None of these bind parameters; join tables and ON conditions are trusted SQL.

use crate::error::{ModelError, ModelResult};
use std::str::FromStr;

/// JOIN flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
}

impl JoinKind {
    pub fn as_str(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER",
            JoinKind::Left => "LEFT",
            JoinKind::Right => "RIGHT",
            JoinKind::Full => "FULL OUTER",
        }
    }
}

impl FromStr for JoinKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inner" => Ok(JoinKind::Inner),
            "left" => Ok(JoinKind::Left),
            "right" => Ok(JoinKind::Right),
            "full" | "full outer" => Ok(JoinKind::Full),
            "" => Err(ModelError::validation("join kind is required")),
            other => Err(ModelError::validation(format!("unknown join kind '{other}'"))),
        }
    }
}

/// `<KIND> JOIN <table> ON <condition>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    pub kind: JoinKind,
    pub table: String,
    pub on: String,
}

impl Join {
    /// Both `table` and `on` are required.
    pub fn new(kind: JoinKind, table: &str, on: &str) -> ModelResult<Self> {
        if table.trim().is_empty() {
            return Err(ModelError::validation("join requires a target table"));
        }
        if on.trim().is_empty() {
            return Err(ModelError::validation(format!(
                "join on '{table}' requires an ON condition"
            )));
        }
        Ok(Self {
            kind,
            table: table.to_string(),
            on: on.to_string(),
        })
    }

    pub(crate) fn fragments(&self) -> [String; 2] {
        [
            format!("{} JOIN {}", self.kind.as_str(), self.table),
            format!("ON {}", self.on),
        ]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" | "" => Ok(SortDirection::Desc),
            other => Err(ModelError::validation(format!(
                "unknown sort direction '{other}'"
            ))),
        }
    }
}

/// One `ORDER BY` item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    /// The field is required.
    pub fn new(field: &str, direction: SortDirection) -> ModelResult<Self> {
        if field.trim().is_empty() {
            return Err(ModelError::validation("sort requires a field"));
        }
        Ok(Self {
            field: field.to_string(),
            direction,
        })
    }
}

pub(crate) fn order_by_fragment(sorts: &[Sort]) -> Option<String> {
    if sorts.is_empty() {
        return None;
    }
    let items: Vec<String> = sorts
        .iter()
        .map(|s| format!("{} {}", s.field, s.direction.as_str()))
        .collect();
    Some(format!("ORDER BY {}", items.join(", ")))
}

/// LIMIT/OFFSET. Zero means the clause is omitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    pub limit: u64,
    pub offset: u64,
}

impl Pagination {
    pub(crate) fn fragments(&self) -> Vec<String> {
        let mut out = Vec::new();
        if self.limit > 0 {
            out.push(format!("LIMIT {}", self.limit));
        }
        if self.offset > 0 {
            out.push(format!("OFFSET {}", self.offset));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_requires_table_and_condition() {
        assert!(Join::new(JoinKind::Left, "", "a.id = b.id").unwrap_err().is_validation());
        assert!(Join::new(JoinKind::Left, "orders", " ").unwrap_err().is_validation());
        let join = Join::new(JoinKind::Left, "orders o", "o.user_id = users.id").unwrap();
        assert_eq!(
            join.fragments(),
            ["LEFT JOIN orders o".to_string(), "ON o.user_id = users.id".to_string()]
        );
    }

    #[test]
    fn join_kind_parsing() {
        assert_eq!("left".parse::<JoinKind>().unwrap(), JoinKind::Left);
        assert_eq!("FULL OUTER".parse::<JoinKind>().unwrap(), JoinKind::Full);
        assert!("".parse::<JoinKind>().unwrap_err().is_validation());
        assert!("sideways".parse::<JoinKind>().is_err());
    }

    #[test]
    fn sort_defaults_to_desc() {
        assert_eq!(SortDirection::default(), SortDirection::Desc);
        assert_eq!("".parse::<SortDirection>().unwrap(), SortDirection::Desc);
        assert!(Sort::new("", SortDirection::Asc).unwrap_err().is_validation());
    }

    #[test]
    fn zero_pagination_emits_nothing() {
        assert!(Pagination::default().fragments().is_empty());
        let page = Pagination { limit: 10, offset: 20 };
        assert_eq!(page.fragments(), vec!["LIMIT 10", "OFFSET 20"]);
        let offset_only = Pagination { limit: 0, offset: 5 };
        assert_eq!(offset_only.fragments(), vec!["OFFSET 5"]);
    }
}

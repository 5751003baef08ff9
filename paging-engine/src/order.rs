// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use std::cmp::Ordering;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ArgumentError;
use crate::query::PageQuery;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn reversed(self) -> Self {
        match self {
            Direction::Ascending => Direction::Descending,
            Direction::Descending => Direction::Ascending,
        }
    }

    /// Applies this direction to an ascending comparison result.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Ascending => "ASC",
            Direction::Descending => "DESC",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// One sort key: a property path and its direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderKey {
    pub field: String,
    pub direction: Direction,
}

impl OrderKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self { field: field.into(), direction: Direction::Ascending }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self { field: field.into(), direction: Direction::Descending }
    }

    pub fn reversed(&self) -> Self {
        Self { field: self.field.clone(), direction: self.direction.reversed() }
    }
}

/// The total order a paginated query relies on. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderSpec {
    keys: Vec<OrderKey>,
}

impl OrderSpec {
    pub fn new(keys: Vec<OrderKey>) -> Result<Self, ArgumentError> {
        if keys.is_empty() {
            return Err(ArgumentError::NoOrderKeys);
        }
        Ok(Self { keys })
    }

    /// Reads the ordering already applied to `query`.
    pub fn extract<Q: PageQuery>(query: &Q) -> Result<Self, ArgumentError> {
        Self::new(query.ordering().to_vec())
    }

    pub fn keys(&self) -> &[OrderKey] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    // Never true, kept for clippy's `len_without_is_empty`.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|key| key.field.as_str())
    }

    pub fn reversed(&self) -> Self {
        Self { keys: self.keys.iter().map(OrderKey::reversed).collect() }
    }

    /// Compares two key tuples lexicographically, honoring each key's direction.
    pub fn compare(&self, left: &[Value], right: &[Value]) -> Ordering {
        for (index, key) in self.keys.iter().enumerate() {
            let (Some(l), Some(r)) = (left.get(index), right.get(index)) else {
                break;
            };
            let ordering = key.direction.apply(l.compare(r));
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

impl fmt::Display for OrderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys =
            self.keys.iter().map(|k| format!("{} {}", k.field, k.direction)).collect::<Vec<_>>();
        f.write_str(&keys.join(", "))
    }
}

// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use std::fmt;

use async_graphql::Enum;
use async_graphql::InputObject;
use paging_engine::OrderKey;

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Enum, Copy, Clone, Eq, PartialEq)]
/// Specify sort order direction
pub enum QueryOrderByDirection {
    /// Documents will be sorted in ascended order (e.g. from A to Z)
    ASC,
    /// Documents will be sorted in descendant order (e.g. from Z to A)
    DESC,
}

impl fmt::Display for QueryOrderByDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(InputObject, Debug, Clone)]
/// Specify how to sort results. You can sort documents in result set using more
/// than one field.
pub struct QueryOrderBy {
    /// Column used as a sort criteria, e.g. "seq_no".
    pub path: Option<String>,
    /// Sort order direction
    pub direction: Option<QueryOrderByDirection>,
}

impl QueryOrderBy {
    fn to_order_key(&self) -> Option<OrderKey> {
        let path = self.path.as_deref().filter(|path| !path.is_empty())?;
        Some(match self.direction {
            Some(QueryOrderByDirection::DESC) => OrderKey::desc(path),
            _ => OrderKey::asc(path),
        })
    }
}

/// Order keys requested by a client, or `default` when none are given.
pub fn order_keys(
    order_by: Option<Vec<Option<QueryOrderBy>>>,
    default: &[OrderKey],
) -> Vec<OrderKey> {
    let keys = order_by
        .unwrap_or_default()
        .iter()
        .flatten()
        .filter_map(QueryOrderBy::to_order_key)
        .collect::<Vec<_>>();
    if keys.is_empty() {
        default.to_vec()
    } else {
        keys
    }
}

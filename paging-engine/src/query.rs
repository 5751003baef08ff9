// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::batch::GroupKey;
use crate::error::ArgumentError;
use crate::error::PagingError;
use crate::order::OrderKey;
use crate::order::OrderSpec;
use crate::value::Value;

/// Exposes named field values of an item so the engine can project sort keys
/// and group keys out of it.
pub trait Record {
    fn value_of(&self, field: &str) -> Option<Value>;
}

/// Projects the values of every order key out of `record`.
pub fn project<R: Record + ?Sized>(
    record: &R,
    spec: &OrderSpec,
) -> Result<Vec<Value>, PagingError> {
    spec.fields()
        .map(|field| {
            record.value_of(field).ok_or_else(|| PagingError::MissingField(field.to_string()))
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeysetBound {
    After,
    Before,
}

/// "Tuple of keys is strictly after/before the cursor tuple" in the order of
/// `order`, where a descending key compares reversed.
#[derive(Debug, Clone, PartialEq)]
pub struct KeysetPredicate {
    pub bound: KeysetBound,
    pub order: OrderSpec,
    pub values: Vec<Value>,
}

impl KeysetPredicate {
    pub fn after(order: &OrderSpec, values: Vec<Value>) -> Self {
        Self { bound: KeysetBound::After, order: order.clone(), values }
    }

    pub fn before(order: &OrderSpec, values: Vec<Value>) -> Self {
        Self { bound: KeysetBound::Before, order: order.clone(), values }
    }

    pub fn matches(&self, values: &[Value]) -> bool {
        let ordering = self.order.compare(values, &self.values);
        match self.bound {
            KeysetBound::After => ordering == Ordering::Greater,
            KeysetBound::Before => ordering == Ordering::Less,
        }
    }

    pub fn matches_record<R: Record + ?Sized>(&self, record: &R) -> Result<bool, PagingError> {
        Ok(self.matches(&project(record, &self.order)?))
    }
}

/// The grouping half of a batch query; ordering lives in [`OrderSpec`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKeySpec {
    pub field: String,
}

impl GroupKeySpec {
    pub fn new(field: impl Into<String>) -> Self {
        Self { field: field.into() }
    }

    pub fn key_of<R: Record + ?Sized>(&self, record: &R) -> Result<Value, PagingError> {
        record.value_of(&self.field).ok_or_else(|| PagingError::MissingField(self.field.clone()))
    }
}

/// Query builder over one backend.
///
/// The engine receives a query with its base filters and ordering already
/// applied, and narrows it with the `with_*` methods before fetching.
pub trait PageQuery: Send + Sync + Sized {
    type Item: Record + Send + 'static;

    /// Ordering applied by the caller.
    fn ordering(&self) -> &[OrderKey];

    fn with_predicate(self, predicate: KeysetPredicate) -> Result<Self, ArgumentError>;

    /// Replaces the traversal order.
    fn with_order(self, order: OrderSpec) -> Result<Self, ArgumentError>;

    fn with_skip(self, skip: usize) -> Self;

    fn with_take(self, take: usize) -> Self;

    /// Human-readable form of the physical query, shown to interceptors.
    fn describe(&self) -> String;

    /// Form of the query run by [`PageQuery::fetch_with_total`].
    fn describe_with_total(&self) -> String {
        self.describe()
    }

    fn fetch(&self) -> BoxStream<'_, anyhow::Result<Self::Item>>;

    /// Like [`PageQuery::fetch`], pairing every item with the number of items
    /// in the source before keyset predicates, skip and take were applied.
    /// Must be served by a single physical query.
    fn fetch_with_total(&self) -> BoxStream<'_, anyhow::Result<(usize, Self::Item)>>;
}

/// A [`PageQuery`] that can window each group of a parent key independently.
#[async_trait]
pub trait GroupedQuery: PageQuery {
    /// Partitions the query by `group`: `with_skip`/`with_take` apply per
    /// group and fetched items come grouped, each group in traversal order.
    fn with_grouping(self, group: &GroupKeySpec) -> Result<Self, ArgumentError>;

    /// Restricts the source to the given parent keys.
    fn with_group_keys(self, group: &GroupKeySpec, keys: Vec<Value>)
        -> Result<Self, ArgumentError>;

    fn describe_group_count(&self, group: &GroupKeySpec) -> String;

    /// Item count per parent key of the query as currently built.
    async fn count_groups<K: GroupKey>(
        &self,
        group: &GroupKeySpec,
    ) -> anyhow::Result<HashMap<K, usize>>;
}

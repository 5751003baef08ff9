// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

//! In-memory [`PageQuery`] backend over a shared vector of records.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream;
use futures::stream::BoxStream;
use futures::StreamExt;

use crate::batch::GroupKey;
use crate::error::ArgumentError;
use crate::order::OrderKey;
use crate::order::OrderSpec;
use crate::query::project;
use crate::query::GroupKeySpec;
use crate::query::GroupedQuery;
use crate::query::KeysetPredicate;
use crate::query::PageQuery;
use crate::query::Record;
use crate::value::Value;

type Filter<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

pub struct MemorySource<T> {
    items: Arc<Vec<T>>,
    filters: Vec<Filter<T>>,
    order: Vec<OrderKey>,
    predicates: Vec<KeysetPredicate>,
    skip: usize,
    take: Option<usize>,
    grouping: Option<GroupKeySpec>,
    group_keys: Option<(GroupKeySpec, Vec<Value>)>,
}

impl<T> Clone for MemorySource<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            filters: self.filters.clone(),
            order: self.order.clone(),
            predicates: self.predicates.clone(),
            skip: self.skip,
            take: self.take,
            grouping: self.grouping.clone(),
            group_keys: self.group_keys.clone(),
        }
    }
}

impl<T> MemorySource<T>
where
    T: Record + Clone + Send + Sync + 'static,
{
    pub fn new(items: Vec<T>) -> Self {
        Self::shared(Arc::new(items))
    }

    pub fn shared(items: Arc<Vec<T>>) -> Self {
        Self {
            items,
            filters: Vec::new(),
            order: Vec::new(),
            predicates: Vec::new(),
            skip: 0,
            take: None,
            grouping: None,
            group_keys: None,
        }
    }

    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.filters.push(Arc::new(filter));
        self
    }

    pub fn order_by(mut self, key: OrderKey) -> Self {
        self.order.push(key);
        self
    }

    fn in_base(&self, item: &T) -> anyhow::Result<bool> {
        if !self.filters.iter().all(|filter| filter(item)) {
            return Ok(false);
        }
        match &self.group_keys {
            Some((group, keys)) => Ok(keys.contains(&group.key_of(item)?)),
            None => Ok(true),
        }
    }

    fn base(&self) -> anyhow::Result<Vec<&T>> {
        let mut base = Vec::new();
        for item in self.items.iter() {
            if self.in_base(item)? {
                base.push(item);
            }
        }
        Ok(base)
    }

    /// Runs the query: base filters, keyset predicates, ordering, then
    /// skip/take (per group when grouped).
    fn evaluate(&self) -> anyhow::Result<(usize, Vec<T>)> {
        let base = self.base()?;
        let total = base.len();

        let mut rows = Vec::with_capacity(base.len());
        for item in base {
            let mut keep = true;
            for predicate in &self.predicates {
                if !predicate.matches_record(item)? {
                    keep = false;
                    break;
                }
            }
            if keep {
                rows.push(item);
            }
        }

        if let Ok(spec) = OrderSpec::new(self.order.clone()) {
            let mut keyed = rows
                .into_iter()
                .map(|item| Ok((project(item, &spec)?, item)))
                .collect::<anyhow::Result<Vec<_>>>()?;
            keyed.sort_by(|(left, _), (right, _)| spec.compare(left, right));
            rows = keyed.into_iter().map(|(_, item)| item).collect();
        }

        let take = self.take.unwrap_or(usize::MAX);
        let Some(group) = &self.grouping else {
            let page = rows.into_iter().skip(self.skip).take(take).cloned().collect();
            return Ok((total, page));
        };

        let mut partitions: Vec<Vec<&T>> = Vec::new();
        let mut index: HashMap<Value, usize> = HashMap::new();
        for item in rows {
            let key = group.key_of(item)?;
            let slot = *index.entry(key).or_insert_with(|| {
                partitions.push(Vec::new());
                partitions.len() - 1
            });
            partitions[slot].push(item);
        }
        let page = partitions
            .into_iter()
            .flat_map(|partition| partition.into_iter().skip(self.skip).take(take))
            .cloned()
            .collect();
        Ok((total, page))
    }
}

impl<T> PageQuery for MemorySource<T>
where
    T: Record + Clone + Send + Sync + 'static,
{
    type Item = T;

    fn ordering(&self) -> &[OrderKey] {
        &self.order
    }

    fn with_predicate(mut self, predicate: KeysetPredicate) -> Result<Self, ArgumentError> {
        self.predicates.push(predicate);
        Ok(self)
    }

    fn with_order(mut self, order: OrderSpec) -> Result<Self, ArgumentError> {
        self.order = order.keys().to_vec();
        Ok(self)
    }

    fn with_skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    fn with_take(mut self, take: usize) -> Self {
        self.take = Some(take);
        self
    }

    fn describe(&self) -> String {
        self.to_string()
    }

    fn fetch(&self) -> BoxStream<'_, anyhow::Result<T>> {
        match self.evaluate() {
            Ok((_, rows)) => stream::iter(rows.into_iter().map(Ok)).boxed(),
            Err(err) => stream::once(async move { Err(err) }).boxed(),
        }
    }

    fn fetch_with_total(&self) -> BoxStream<'_, anyhow::Result<(usize, T)>> {
        match self.evaluate() {
            Ok((total, rows)) => {
                stream::iter(rows.into_iter().map(move |row| Ok((total, row)))).boxed()
            }
            Err(err) => stream::once(async move { Err(err) }).boxed(),
        }
    }
}

#[async_trait]
impl<T> GroupedQuery for MemorySource<T>
where
    T: Record + Clone + Send + Sync + 'static,
{
    fn with_grouping(mut self, group: &GroupKeySpec) -> Result<Self, ArgumentError> {
        self.grouping = Some(group.clone());
        Ok(self)
    }

    fn with_group_keys(
        mut self,
        group: &GroupKeySpec,
        keys: Vec<Value>,
    ) -> Result<Self, ArgumentError> {
        self.group_keys = Some((group.clone(), keys));
        Ok(self)
    }

    fn describe_group_count(&self, group: &GroupKeySpec) -> String {
        format!("memory count by {}", group.field)
    }

    async fn count_groups<K: GroupKey>(
        &self,
        group: &GroupKeySpec,
    ) -> anyhow::Result<HashMap<K, usize>> {
        let mut counts = HashMap::new();
        for item in self.base()? {
            let key = K::try_from(group.key_of(item)?)?;
            *counts.entry(key).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

impl<T> fmt::Display for MemorySource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "memory[{}]", self.items.len())?;
        if !self.filters.is_empty() {
            write!(f, " filters={}", self.filters.len())?;
        }
        for predicate in &self.predicates {
            write!(f, " {:?}({})", predicate.bound, predicate.order)?;
        }
        if let Ok(order) = OrderSpec::new(self.order.clone()) {
            write!(f, " order by {order}")?;
        }
        if let Some(group) = &self.grouping {
            write!(f, " partition by {}", group.field)?;
        }
        if self.skip > 0 {
            write!(f, " skip {}", self.skip)?;
        }
        if let Some(take) = self.take {
            write!(f, " take {take}")?;
        }
        Ok(())
    }
}

// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use std::collections::HashMap;
use std::hash::Hash;

use futures::StreamExt;

use crate::arguments::PagingArguments;
use crate::config::PagingConfig;
use crate::context::PagingContext;
use crate::context::QueryKind;
use crate::error::PagingError;
use crate::order::OrderSpec;
use crate::page::Page;
use crate::page::PageAssembler;
use crate::paginator::plan_arguments;
use crate::query::GroupKeySpec;
use crate::query::GroupedQuery;
use crate::value::Value;
use crate::window::Window;

/// Parent key of a batch: anything that round-trips through [`Value`].
pub trait GroupKey:
    Clone + Eq + Hash + Send + Sync + 'static + Into<Value> + TryFrom<Value, Error = PagingError>
{
}

impl<T> GroupKey for T where
    T: Clone
        + Eq
        + Hash
        + Send
        + Sync
        + 'static
        + Into<Value>
        + TryFrom<Value, Error = PagingError>
{
}

/// Paginates every group of `query` independently with the same arguments.
///
/// Groups without rows are absent from the result.
pub async fn paginate_batch<K, Q>(
    query: Q,
    group: &GroupKeySpec,
    arguments: &PagingArguments,
    config: &PagingConfig,
    ctx: &PagingContext,
) -> Result<HashMap<K, Page<Q::Item>>, PagingError>
where
    K: GroupKey,
    Q: GroupedQuery,
{
    ctx.ensure_active()?;
    let spec = OrderSpec::extract(&query)?;
    let window = plan_arguments(&spec, arguments, config)?;
    batch_pages(query, group, &spec, &window, ctx).await
}

/// Like [`paginate_batch`] restricted to `keys`; every requested key gets an
/// entry, an empty page when it has no rows.
pub async fn paginate_batch_for_keys<K, Q>(
    query: Q,
    group: &GroupKeySpec,
    keys: &[K],
    arguments: &PagingArguments,
    config: &PagingConfig,
    ctx: &PagingContext,
) -> Result<HashMap<K, Page<Q::Item>>, PagingError>
where
    K: GroupKey,
    Q: GroupedQuery,
{
    ctx.ensure_active()?;
    let spec = OrderSpec::extract(&query)?;
    let window = plan_arguments(&spec, arguments, config)?;
    if keys.is_empty() {
        return Ok(HashMap::new());
    }

    let query = query.with_group_keys(group, keys.iter().cloned().map(Into::into).collect())?;
    let mut pages = batch_pages(query, group, &spec, &window, ctx).await?;
    for key in keys {
        pages.entry(key.clone()).or_insert_with(Page::empty);
    }
    Ok(pages)
}

async fn batch_pages<K, Q>(
    query: Q,
    group: &GroupKeySpec,
    spec: &OrderSpec,
    window: &Window,
    ctx: &PagingContext,
) -> Result<HashMap<K, Page<Q::Item>>, PagingError>
where
    K: GroupKey,
    Q: GroupedQuery,
{
    let totals = if window.include_total_count {
        ctx.intercept(QueryKind::GroupCount, || query.describe_group_count(group));
        Some(ctx.run(query.count_groups::<K>(group)).await??)
    } else {
        None
    };

    let query = window.apply(query.with_grouping(group)?)?;
    ctx.intercept(QueryKind::Page, || query.describe());

    let mut groups: HashMap<K, Vec<Q::Item>> = HashMap::new();
    let mut fetched = 0;
    {
        let mut stream = query.fetch();
        while let Some(item) = ctx.run(stream.next()).await? {
            let item = item?;
            let key = K::try_from(group.key_of(&item)?)?;
            let bucket = groups.entry(key).or_default();
            if bucket.len() < window.take {
                bucket.push(item);
                fetched += 1;
            }
        }
    }

    tracing::debug!(
        target: "paging",
        group = %group.field,
        groups = groups.len(),
        fetched,
        "fetched batch"
    );

    let assembler = PageAssembler::new(window, spec);
    groups
        .into_iter()
        .map(|(key, items)| {
            let total = totals.as_ref().and_then(|totals| totals.get(&key).copied());
            let page = assembler.assemble(items, total)?;
            Ok((key, page))
        })
        .collect()
}

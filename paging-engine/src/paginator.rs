// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use futures::StreamExt;

use crate::arguments::PagingArguments;
use crate::config::PagingConfig;
use crate::context::PagingContext;
use crate::context::QueryKind;
use crate::cursor::Cursor;
use crate::cursor::CursorCodec;
use crate::error::PagingError;
use crate::order::OrderSpec;
use crate::page::Page;
use crate::page::PageAssembler;
use crate::query::PageQuery;
use crate::window::plan;
use crate::window::Window;

/// Decodes both cursors of `arguments` and plans the window for `spec`.
pub(crate) fn plan_arguments(
    spec: &OrderSpec,
    arguments: &PagingArguments,
    config: &PagingConfig,
) -> Result<Window, PagingError> {
    let decode = |token: &Option<String>| -> Result<Option<Cursor>, PagingError> {
        let cursor = token.as_deref().map(|token| CursorCodec::decode_for(token, spec));
        Ok(cursor.transpose()?)
    };
    let after = decode(&arguments.after)?;
    let before = decode(&arguments.before)?;
    Ok(plan(spec, arguments, after, before, config)?)
}

/// Fetches one page of `query`.
///
/// `query` carries the caller's filters and ordering; the ordering must be
/// total for cursors to be stable.
pub async fn paginate<Q: PageQuery>(
    query: Q,
    arguments: &PagingArguments,
    config: &PagingConfig,
    ctx: &PagingContext,
) -> Result<Page<Q::Item>, PagingError> {
    ctx.ensure_active()?;

    let spec = OrderSpec::extract(&query)?;
    let window = plan_arguments(&spec, arguments, config)?;
    let query = window.apply(query)?;

    let mut items = Vec::with_capacity(window.take);
    let mut total_count = None;
    if window.include_total_count {
        ctx.intercept(QueryKind::Page, || query.describe_with_total());
        let mut stream = query.fetch_with_total();
        while items.len() < window.take {
            let Some(row) = ctx.run(stream.next()).await? else {
                break;
            };
            let (total, item) = row?;
            total_count = Some(total);
            items.push(item);
        }
    } else {
        ctx.intercept(QueryKind::Page, || query.describe());
        let mut stream = query.fetch();
        while items.len() < window.take {
            let Some(item) = ctx.run(stream.next()).await? else {
                break;
            };
            items.push(item?);
        }
    }

    tracing::debug!(
        target: "paging",
        fetched = items.len(),
        requested = window.requested_count,
        total = ?total_count,
        "fetched page"
    );

    PageAssembler::new(&window, &spec).assemble(items, total_count)
}

// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use std::sync::Arc;

use async_graphql::Context;
use async_graphql::FieldResult;
use async_graphql::Object;
use paging_engine::paginate;
use paging_engine::OrderKey;
use paging_engine::PagingArguments;
use paging_engine::PagingConfig;
use paging_engine::PagingContext;
use paging_engine::QueryInterceptor;
use tokio_util::sync::CancellationToken;

use crate::schema::db;
use crate::schema::db::DBConnector;
use crate::schema::db::FilterOp;

pub mod block;
pub mod connection;
pub mod error;
pub mod loader;
pub mod order;
pub mod transaction;

mod test;

use block::Block;
use connection::page_connection;
use connection::BlocksConnection;
use connection::BlocksEdge;
use connection::PageConnection;
use connection::TransactionsConnection;
use connection::TransactionsEdge;
use error::api_error;
use order::order_keys;
use order::QueryOrderBy;
use transaction::Transaction;

/// Shared by every resolver through the schema data.
#[derive(Clone)]
pub struct ApiState {
    pub connector: Arc<DBConnector>,
    pub paging: PagingConfig,
    shutdown: CancellationToken,
    interceptor: Option<Arc<dyn QueryInterceptor>>,
}

impl ApiState {
    pub fn new(
        connector: Arc<DBConnector>,
        paging: PagingConfig,
        shutdown: CancellationToken,
    ) -> Self {
        Self { connector, paging, shutdown, interceptor: None }
    }

    pub fn with_interceptor(mut self, interceptor: Arc<dyn QueryInterceptor>) -> Self {
        self.interceptor = Some(interceptor);
        self
    }

    /// A fresh context for one pagination call. It is cancelled together
    /// with the server.
    pub fn paging_context(&self) -> PagingContext {
        let ctx = PagingContext::new().with_cancellation(self.shutdown.child_token());
        match &self.interceptor {
            Some(interceptor) => ctx.with_interceptor(interceptor.clone()),
            None => ctx,
        }
    }
}

pub(crate) fn paging_arguments(
    first: Option<i32>,
    after: Option<String>,
    last: Option<i32>,
    before: Option<String>,
    with_total_count: Option<bool>,
    relative_cursors: Option<bool>,
) -> PagingArguments {
    PagingArguments {
        first,
        last,
        after: after.filter(|cursor| !cursor.is_empty()),
        before: before.filter(|cursor| !cursor.is_empty()),
        include_total_count: with_total_count.unwrap_or(false),
        enable_relative_cursors: relative_cursors.unwrap_or(false),
    }
}

pub(crate) fn block_order() -> Vec<OrderKey> {
    vec![OrderKey::asc("seq_no")]
}

pub(crate) fn transaction_order() -> Vec<OrderKey> {
    vec![OrderKey::asc("lt")]
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    #[allow(clippy::too_many_arguments)]
    /// Paginated blocks, ordered by `seq_no` unless `orderBy` says otherwise.
    async fn blocks(
        &self,
        ctx: &Context<'_>,
        #[graphql(desc = "Optional filter by block producer")] producer_id: Option<String>,
        #[graphql(desc = "Lower bound of transactions in a block")] min_tr_count: Option<i32>,
        #[graphql(desc = "Upper bound of transactions in a block")] max_tr_count: Option<i32>,
        #[graphql(desc = "This field is mutually exclusive with 'last'.")] first: Option<i32>,
        after: Option<String>,
        #[graphql(desc = "This field is mutually exclusive with 'first'.")] last: Option<i32>,
        before: Option<String>,
        order_by: Option<Vec<Option<QueryOrderBy>>>,
        with_total_count: Option<bool>,
        relative_cursors: Option<bool>,
    ) -> FieldResult<PageConnection<Block, BlocksConnection, BlocksEdge>> {
        let state = ctx.data::<ApiState>()?;
        let mut query = state
            .connector
            .query::<db::Block>()
            .order_by_total(order_keys(order_by, &block_order()))
            .map_err(api_error)?;
        if let Some(producer_id) = producer_id {
            query = query.filter("producer_id", FilterOp::Eq, producer_id).map_err(api_error)?;
        }
        if let Some(min) = min_tr_count {
            query = query.filter("tr_count", FilterOp::Ge, min).map_err(api_error)?;
        }
        if let Some(max) = max_tr_count {
            query = query.filter("tr_count", FilterOp::Le, max).map_err(api_error)?;
        }

        let arguments =
            paging_arguments(first, after, last, before, with_total_count, relative_cursors);
        tracing::trace!(target: "gql_server", "blocks: {arguments:?}");
        let page = paginate(query, &arguments, &state.paging, &state.paging_context())
            .await
            .map_err(api_error)?;
        Ok(page_connection(page, Block::from))
    }

    #[allow(clippy::too_many_arguments)]
    /// Paginated transactions, ordered by logical time unless `orderBy` says
    /// otherwise.
    async fn transactions(
        &self,
        ctx: &Context<'_>,
        account_addr: Option<String>,
        block_id: Option<String>,
        aborted: Option<bool>,
        #[graphql(desc = "This field is mutually exclusive with 'last'.")] first: Option<i32>,
        after: Option<String>,
        #[graphql(desc = "This field is mutually exclusive with 'first'.")] last: Option<i32>,
        before: Option<String>,
        order_by: Option<Vec<Option<QueryOrderBy>>>,
        with_total_count: Option<bool>,
        relative_cursors: Option<bool>,
    ) -> FieldResult<PageConnection<Transaction, TransactionsConnection, TransactionsEdge>> {
        let state = ctx.data::<ApiState>()?;
        let mut query = state
            .connector
            .query::<db::Transaction>()
            .order_by_total(order_keys(order_by, &transaction_order()))
            .map_err(api_error)?;
        if let Some(account_addr) = account_addr {
            query = query.filter("account_addr", FilterOp::Eq, account_addr).map_err(api_error)?;
        }
        if let Some(block_id) = block_id {
            query = query.filter("block_id", FilterOp::Eq, block_id).map_err(api_error)?;
        }
        if let Some(aborted) = aborted {
            query = query.filter("aborted", FilterOp::Eq, aborted).map_err(api_error)?;
        }

        let arguments =
            paging_arguments(first, after, last, before, with_total_count, relative_cursors);
        tracing::trace!(target: "gql_server", "transactions: {arguments:?}");
        let page = paginate(query, &arguments, &state.paging, &state.paging_context())
            .await
            .map_err(api_error)?;
        Ok(page_connection(page, Transaction::from))
    }
}

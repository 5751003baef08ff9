// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use async_graphql::dataloader::DataLoader;
use async_graphql::ComplexObject;
use async_graphql::Context;
use async_graphql::FieldResult;
use async_graphql::SimpleObject;

use super::connection::page_connection;
use super::connection::PageConnection;
use super::connection::TransactionsConnection;
use super::connection::TransactionsEdge;
use super::loader::BlockTransactionsKey;
use super::loader::BlockTransactionsLoader;
use super::order::order_keys;
use super::order::QueryOrderBy;
use super::paging_arguments;
use super::transaction::Transaction;
use super::transaction_order;
use crate::schema::db;

#[derive(SimpleObject, Clone, Debug)]
#[graphql(complex)]
pub struct Block {
    pub id: String,
    pub seq_no: i64,
    /// Unix time of block creation.
    pub gen_utime: i64,
    pub producer_id: String,
    /// Number of transactions in the block.
    pub tr_count: i64,
}

#[ComplexObject]
impl Block {
    #[allow(clippy::too_many_arguments)]
    /// Transactions of this block. Requests for many blocks are resolved
    /// together.
    async fn transactions(
        &self,
        ctx: &Context<'_>,
        #[graphql(desc = "This field is mutually exclusive with 'last'.")] first: Option<i32>,
        after: Option<String>,
        #[graphql(desc = "This field is mutually exclusive with 'first'.")] last: Option<i32>,
        before: Option<String>,
        order_by: Option<Vec<Option<QueryOrderBy>>>,
        with_total_count: Option<bool>,
        relative_cursors: Option<bool>,
    ) -> FieldResult<PageConnection<Transaction, TransactionsConnection, TransactionsEdge>> {
        let loader = ctx.data::<DataLoader<BlockTransactionsLoader>>()?;
        let key = BlockTransactionsKey {
            block_id: self.id.clone(),
            arguments: paging_arguments(
                first,
                after,
                last,
                before,
                with_total_count,
                relative_cursors,
            ),
            order: order_keys(order_by, &transaction_order()),
        };
        let page = loader.load_one(key).await?.unwrap_or_default();
        Ok(page_connection(page, Transaction::from))
    }
}

impl From<db::Block> for Block {
    fn from(block: db::Block) -> Self {
        Self {
            id: block.id,
            seq_no: block.seq_no,
            gen_utime: block.gen_utime,
            producer_id: block.producer_id,
            tr_count: block.tr_count,
        }
    }
}

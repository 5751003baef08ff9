// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use std::collections::HashMap;

use async_graphql::dataloader::Loader;
use async_graphql::Error;
use paging_engine::paginate_batch_for_keys;
use paging_engine::GroupKeySpec;
use paging_engine::OrderKey;
use paging_engine::Page;
use paging_engine::PagingArguments;

use super::error::api_error;
use super::ApiState;
use crate::schema::db;

/// One `Block.transactions` request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockTransactionsKey {
    pub block_id: String,
    pub arguments: PagingArguments,
    pub order: Vec<OrderKey>,
}

/// Resolves `Block.transactions` for every block of a response with one
/// page query per distinct (arguments, order) pair.
pub struct BlockTransactionsLoader {
    pub state: ApiState,
}

impl BlockTransactionsLoader {
    pub fn new(state: ApiState) -> Self {
        Self { state }
    }
}

impl Loader<BlockTransactionsKey> for BlockTransactionsLoader {
    type Error = Error;
    type Value = Page<db::Transaction>;

    async fn load(
        &self,
        keys: &[BlockTransactionsKey],
    ) -> Result<HashMap<BlockTransactionsKey, Self::Value>, Self::Error> {
        let mut batches: HashMap<(&PagingArguments, &[OrderKey]), Vec<String>> = HashMap::new();
        for key in keys {
            batches
                .entry((&key.arguments, key.order.as_slice()))
                .or_default()
                .push(key.block_id.clone());
        }

        let group = GroupKeySpec::new("block_id");
        let mut pages = HashMap::with_capacity(keys.len());
        for ((arguments, order), block_ids) in batches {
            tracing::trace!(
                target: "data_loader",
                "load transactions of {} blocks: {arguments:?}",
                block_ids.len()
            );
            let query = self
                .state
                .connector
                .query::<db::Transaction>()
                .order_by_total(order.to_vec())
                .map_err(api_error)?;
            let batch = paginate_batch_for_keys::<String, _>(
                query,
                &group,
                &block_ids,
                arguments,
                &self.state.paging,
                &self.state.paging_context(),
            )
            .await
            .map_err(api_error)?;

            for (block_id, page) in batch {
                let key = BlockTransactionsKey {
                    block_id,
                    arguments: arguments.clone(),
                    order: order.to_vec(),
                };
                pages.insert(key, page);
            }
        }
        Ok(pages)
    }
}

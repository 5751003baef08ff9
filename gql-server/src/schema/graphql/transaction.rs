// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use async_graphql::SimpleObject;

use crate::schema::db;

#[derive(SimpleObject, Clone, Debug)]
pub struct Transaction {
    pub id: String,
    pub block_id: String,
    pub account_addr: String,
    /// Logical time of the transaction.
    pub lt: i64,
    pub balance_delta: i64,
    pub aborted: bool,
    /// Unix time of the transaction.
    pub now: i64,
}

impl From<db::Transaction> for Transaction {
    fn from(trx: db::Transaction) -> Self {
        Self {
            id: trx.id,
            block_id: trx.block_id,
            account_addr: trx.account_addr,
            lt: trx.lt,
            balance_delta: trx.balance_delta,
            aborted: trx.aborted,
            now: trx.now,
        }
    }
}

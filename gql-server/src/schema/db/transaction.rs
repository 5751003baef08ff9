// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use paging_engine::Record;
use paging_engine::Value;
use sqlx::prelude::FromRow;
use struct_fields_macro_derive::FieldList;

use crate::schema::db::Table;

#[derive(Clone, Debug, FromRow, FieldList)]
pub struct Transaction {
    pub id: String,           // id TEXT PRIMARY KEY,
    pub block_id: String,     // block_id TEXT NOT NULL,
    pub account_addr: String, // account_addr TEXT NOT NULL,
    pub lt: i64,              // lt INTEGER NOT NULL,
    pub balance_delta: i64,   // balance_delta INTEGER NOT NULL,
    pub aborted: bool,        // aborted INTEGER NOT NULL,
    pub now: i64,             // now INTEGER NOT NULL,
}

impl Table for Transaction {
    const ID: &'static str = "id";
    const TABLE: &'static str = "transactions";

    fn columns() -> &'static [&'static str] {
        Transaction::COLUMNS
    }
}

impl Record for Transaction {
    fn value_of(&self, field: &str) -> Option<Value> {
        Some(match field {
            "id" => Value::from(self.id.as_str()),
            "block_id" => Value::from(self.block_id.as_str()),
            "account_addr" => Value::from(self.account_addr.as_str()),
            "lt" => Value::Int(self.lt),
            "balance_delta" => Value::Int(self.balance_delta),
            "aborted" => Value::Bool(self.aborted),
            "now" => Value::Int(self.now),
            _ => return None,
        })
    }
}

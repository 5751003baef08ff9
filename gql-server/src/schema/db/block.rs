// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use paging_engine::Record;
use paging_engine::Value;
use sqlx::prelude::FromRow;
use struct_fields_macro_derive::FieldList;

use crate::schema::db::Table;

#[derive(Clone, Debug, FromRow, FieldList)]
pub struct Block {
    pub id: String,          // id TEXT PRIMARY KEY,
    pub seq_no: i64,         // seq_no INTEGER NOT NULL,
    pub gen_utime: i64,      // gen_utime INTEGER NOT NULL,
    pub producer_id: String, // producer_id TEXT NOT NULL,
    pub tr_count: i64,       // tr_count INTEGER NOT NULL,
}

impl Table for Block {
    const ID: &'static str = "id";
    const TABLE: &'static str = "blocks";

    fn columns() -> &'static [&'static str] {
        Block::COLUMNS
    }
}

impl Record for Block {
    fn value_of(&self, field: &str) -> Option<Value> {
        Some(match field {
            "id" => Value::from(self.id.as_str()),
            "seq_no" => Value::Int(self.seq_no),
            "gen_utime" => Value::Int(self.gen_utime),
            "producer_id" => Value::from(self.producer_id.as_str()),
            "tr_count" => Value::Int(self.tr_count),
            _ => return None,
        })
    }
}

// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use paging_engine::Record;
use sqlx::sqlite::SqliteRow;
use sqlx::FromRow;

pub mod block;
pub mod connector;
pub mod query;
pub mod transaction;

pub use block::Block;
pub use connector::DBConnector;
pub use query::FilterOp;
pub use query::SqliteQuery;
pub use transaction::Transaction;

/// A row type read from one table.
pub trait Table: for<'r> FromRow<'r, SqliteRow> + Record + Send + Sync + Unpin + 'static {
    const TABLE: &'static str;

    /// Unique column appended to every ordering so it is total.
    const ID: &'static str;

    /// Columns that may appear in filters, orderings and groupings.
    fn columns() -> &'static [&'static str];

    fn has_column(name: &str) -> bool {
        Self::columns().contains(&name)
    }
}

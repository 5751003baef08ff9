// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use std::sync::Arc;

use paging_engine::ProjectionCache;
use sqlx::SqlitePool;

use crate::schema::db::SqliteQuery;
use crate::schema::db::Table;

const SCHEMA: &str = include_str!("../../../sql/schema.sql");

pub struct DBConnector {
    pool: SqlitePool,
    // Grouped COUNT statements, one per (key type, table, group column).
    group_counts: ProjectionCache<String>,
}

impl DBConnector {
    pub fn new(pool: SqlitePool) -> Arc<Self> {
        Arc::new(Self { pool, group_counts: ProjectionCache::new() })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn group_counts(&self) -> &ProjectionCache<String> {
        &self.group_counts
    }

    /// Starts a query over all rows of `T`.
    pub fn query<T: Table>(self: &Arc<Self>) -> SqliteQuery<T> {
        SqliteQuery::new(self.clone())
    }

    /// Creates missing tables and indexes.
    pub async fn apply_schema(&self) -> anyhow::Result<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }
}

// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//
pub const PATH_TO_DB: &str = "sqlite://data/node-archive.db";
pub const LISTEN: &str = "127.0.0.1:3000";

pub const MAX_POOL_CONNECTIONS: u32 = 8;
pub const DB_CONNECT_ATTEMPTS: u16 = 3;
pub const DB_CONNECT_INTERVAL: u64 = 3; // in seconds

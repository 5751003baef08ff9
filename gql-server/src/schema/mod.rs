// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//
pub mod db;
pub mod graphql;

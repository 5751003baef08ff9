// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//
pub mod web;

pub mod config;
pub mod defaults;
pub mod helpers;
pub mod schema;

// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

//! Cursor pagination over ordered, filterable sources.
//!
//! Keyset (absolute) and page-jump (relative) cursors, single-source and
//! batched per-parent pagination. Backends plug in through [`PageQuery`] and
//! [`GroupedQuery`].

pub mod arguments;
pub mod batch;
pub mod cache;
pub mod config;
pub mod context;
pub mod cursor;
pub mod error;
pub mod memory;
pub mod order;
pub mod page;
pub mod paginator;
pub mod query;
pub mod value;
pub mod window;

pub use arguments::PagingArguments;
pub use batch::paginate_batch;
pub use batch::paginate_batch_for_keys;
pub use batch::GroupKey;
pub use cache::ProjectionCache;
pub use cache::ProjectionKey;
pub use config::PagingConfig;
pub use context::PagingContext;
pub use context::PlannedQuery;
pub use context::QueryInterceptor;
pub use context::QueryKind;
pub use cursor::Cursor;
pub use cursor::CursorCodec;
pub use cursor::CursorPageInfo;
pub use error::ArgumentError;
pub use error::CursorDecodeError;
pub use error::PagingError;
pub use memory::MemorySource;
pub use order::Direction;
pub use order::OrderKey;
pub use order::OrderSpec;
pub use page::Page;
pub use paginator::paginate;
pub use query::GroupKeySpec;
pub use query::GroupedQuery;
pub use query::KeysetBound;
pub use query::KeysetPredicate;
pub use query::PageQuery;
pub use query::Record;
pub use value::Value;

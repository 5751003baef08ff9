// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use thiserror::Error;

use crate::value::Value;
use crate::window::PaginateDirection;

/// Invalid paging arguments. Always raised before any query executes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("pagination requires an ordered source with at least one order key")]
    NoOrderKeys,

    #[error("`first` and `last` are mutually exclusive")]
    BothFirstAndLast,

    #[error("`before` cannot be combined with a relative `after` cursor")]
    ConflictingCursorDirection,

    #[error("relative cursor offset {offset} is not allowed when paging {direction}")]
    InvalidRelativeOffsetSign { offset: i64, direction: PaginateDirection },

    #[error("relative cursor offset {offset} skips more items than a source can hold")]
    InvalidRelativeOffset { offset: i64 },

    #[error("page size must be positive, got {0}")]
    InvalidPageSize(i64),

    #[error("requested page size {requested} exceeds the maximum of {max}")]
    PageSizeExceeded { requested: usize, max: usize },

    #[error("unknown field `{0}`")]
    UnknownField(String),
}

/// A cursor token could not be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CursorDecodeError {
    #[error("cursor token is empty")]
    Empty,

    #[error("cursor token exceeds max length: {len} chars (max {max})")]
    TooLong { len: usize, max: usize },

    #[error("cursor token is not valid base64")]
    InvalidBase64,

    #[error("cursor frame is truncated")]
    Truncated,

    #[error("unsupported cursor version {0}")]
    UnsupportedVersion(u8),

    #[error("unknown cursor kind {0}")]
    UnknownKind(u8),

    #[error("unknown value tag {0}")]
    UnknownValueTag(u8),

    #[error("invalid payload for value tag {0}")]
    InvalidPayload(u8),

    #[error("cursor text value is not valid UTF-8")]
    InvalidUtf8,

    #[error("cursor carries {actual} key values, the current order has {expected}")]
    KeyCountMismatch { expected: usize, actual: usize },
}

#[derive(Error, Debug)]
pub enum PagingError {
    #[error("invalid paging arguments: {0}")]
    Argument(#[from] ArgumentError),

    #[error("invalid cursor: {0}")]
    Cursor(#[from] CursorDecodeError),

    #[error("record has no value for order field `{0}`")]
    MissingField(String),

    #[error("group key is not {expected}: {found}")]
    GroupKey { expected: &'static str, found: Value },

    #[error(transparent)]
    Execution(#[from] anyhow::Error),

    #[error("pagination was cancelled")]
    Cancelled,
}

impl PagingError {
    pub fn is_argument_error(&self) -> bool {
        matches!(self, PagingError::Argument(_))
    }

    pub fn is_cursor_error(&self) -> bool {
        matches!(self, PagingError::Cursor(_))
    }
}

// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

/// Client-supplied paging arguments, as received from the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PagingArguments {
    /// Forward page size. Mutually exclusive with `last`.
    pub first: Option<i32>,
    /// Backward page size. Mutually exclusive with `first`.
    pub last: Option<i32>,
    pub after: Option<String>,
    pub before: Option<String>,
    /// Forces a total count computation.
    pub include_total_count: bool,
    /// Emit relative cursors that allow jumping by whole pages.
    pub enable_relative_cursors: bool,
}

impl PagingArguments {
    pub fn first(first: i32) -> Self {
        Self { first: Some(first), ..Default::default() }
    }

    pub fn last(last: i32) -> Self {
        Self { last: Some(last), ..Default::default() }
    }

    pub fn after(mut self, cursor: impl Into<String>) -> Self {
        self.after = Some(cursor.into());
        self
    }

    pub fn before(mut self, cursor: impl Into<String>) -> Self {
        self.before = Some(cursor.into());
        self
    }

    pub fn with_total_count(mut self) -> Self {
        self.include_total_count = true;
        self
    }

    pub fn with_relative_cursors(mut self) -> Self {
        self.enable_relative_cursors = true;
        self
    }

    pub fn has_cursor(&self) -> bool {
        self.after.is_some() || self.before.is_some()
    }
}

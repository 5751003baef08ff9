// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use crate::cursor::CursorCodec;
use crate::cursor::CursorPageInfo;
use crate::error::PagingError;
use crate::order::OrderSpec;
use crate::query::project;
use crate::query::KeysetBound;
use crate::query::Record;
use crate::value::Value;
use crate::window::PaginateDirection;
use crate::window::Window;

/// One page of items in source order, with the sort key tuple of every item
/// kept alongside so cursors can be produced without touching the items
/// again.
#[derive(Debug, Clone)]
pub struct Page<T> {
    items: Vec<T>,
    keys: Vec<Vec<Value>>,
    has_next_page: bool,
    has_previous_page: bool,
    page_index: Option<usize>,
    requested_page_size: Option<usize>,
    total_count: Option<usize>,
    relative: bool,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            keys: Vec::new(),
            has_next_page: false,
            has_previous_page: false,
            page_index: None,
            requested_page_size: None,
            total_count: None,
            relative: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn has_next_page(&self) -> bool {
        self.has_next_page
    }

    pub fn has_previous_page(&self) -> bool {
        self.has_previous_page
    }

    /// 1-based position of this page; only known in relative mode.
    pub fn page_index(&self) -> Option<usize> {
        self.page_index
    }

    pub fn requested_page_size(&self) -> Option<usize> {
        self.requested_page_size
    }

    pub fn total_count(&self) -> Option<usize> {
        self.total_count
    }

    /// Whether cursors of this page carry page metadata.
    pub fn is_relative(&self) -> bool {
        self.relative
    }

    pub fn cursor_at(&self, index: usize) -> Option<String> {
        let page = self.page_info(0);
        self.keys.get(index).map(|keys| CursorCodec::encode(keys, page.as_ref()))
    }

    /// A cursor of item `index` that jumps `offset` whole pages past the
    /// adjacent page when used as `after` (positive) or `before` (negative).
    /// `None` when the page is not in relative mode.
    pub fn relative_cursor(&self, index: usize, offset: i64) -> Option<String> {
        let page = self.page_info(offset)?;
        self.keys.get(index).map(|keys| CursorCodec::encode(keys, Some(&page)))
    }

    pub fn start_cursor(&self) -> Option<String> {
        self.cursor_at(0)
    }

    pub fn end_cursor(&self) -> Option<String> {
        self.cursor_at(self.items.len().checked_sub(1)?)
    }

    pub fn edges(&self) -> impl Iterator<Item = (&T, String)> + '_ {
        let page = self.page_info(0);
        self.items
            .iter()
            .zip(self.keys.iter())
            .map(move |(item, keys)| (item, CursorCodec::encode(keys, page.as_ref())))
    }

    /// Converts the items while keeping cursors and metadata.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            keys: self.keys,
            has_next_page: self.has_next_page,
            has_previous_page: self.has_previous_page,
            page_index: self.page_index,
            requested_page_size: self.requested_page_size,
            total_count: self.total_count,
            relative: self.relative,
        }
    }

    fn page_info(&self, offset: i64) -> Option<CursorPageInfo> {
        if !self.relative {
            return None;
        }
        Some(CursorPageInfo { offset, page_index: self.page_index, total_count: self.total_count })
    }
}

/// Builds pages for one planned window; shared by every group of a batch.
pub(crate) struct PageAssembler<'a> {
    window: &'a Window,
    spec: &'a OrderSpec,
}

impl<'a> PageAssembler<'a> {
    pub(crate) fn new(window: &'a Window, spec: &'a OrderSpec) -> Self {
        Self { window, spec }
    }

    /// `items` must be in traversal order and hold at most `window.take`
    /// items.
    pub(crate) fn assemble<T: Record>(
        &self,
        mut items: Vec<T>,
        total_count: Option<usize>,
    ) -> Result<Page<T>, PagingError> {
        let window = self.window;
        let fetched = items.len();
        if fetched == 0 {
            return Ok(Page::empty());
        }

        let over_fetched = fetched > window.requested_count;
        if !window.is_forward() {
            items.reverse();
        }
        if over_fetched {
            if window.is_forward() {
                items.pop();
            } else {
                items.remove(0);
            }
        }

        let has_previous_page = window.has_after || (!window.is_forward() && over_fetched);
        let has_next_page = (window.is_forward() && over_fetched) || window.has_before;

        let total_count = total_count.or_else(|| window.embedded_total());
        let page_index = page_index(window, total_count);
        let relative =
            window.enable_relative_cursors && page_index.is_some() && total_count.is_some();

        let keys =
            items.iter().map(|item| project(item, self.spec)).collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            items,
            keys,
            has_next_page,
            has_previous_page,
            page_index,
            requested_page_size: Some(window.requested_count),
            total_count,
            relative,
        })
    }
}

fn page_index(window: &Window, total_count: Option<usize>) -> Option<usize> {
    if !window.enable_relative_cursors {
        return None;
    }
    let requested = window.requested_count;

    if !window.has_after && !window.has_before {
        return match window.direction {
            PaginateDirection::Forward => Some(1),
            PaginateDirection::Backward => {
                total_count.map(|total| total.div_ceil(requested).max(1))
            }
        };
    }

    let anchor = window.relative.as_ref()?;
    let index = anchor.cursor.page_index()?;
    let jump = anchor.cursor.offset().unsigned_abs() as usize;
    match (anchor.bound, window.direction) {
        (KeysetBound::After, PaginateDirection::Forward) => index.checked_add(jump)?.checked_add(1),
        (KeysetBound::Before, PaginateDirection::Backward) => {
            Some(index.saturating_sub(jump.saturating_add(1)).max(1))
        }
        _ => None,
    }
}

// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use std::fmt;

use crate::arguments::PagingArguments;
use crate::config::PagingConfig;
use crate::cursor::Cursor;
use crate::error::ArgumentError;
use crate::order::OrderSpec;
use crate::query::KeysetBound;
use crate::query::KeysetPredicate;
use crate::query::PageQuery;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginateDirection {
    Forward,
    Backward,
}

impl fmt::Display for PaginateDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaginateDirection::Forward => f.write_str("forward"),
            PaginateDirection::Backward => f.write_str("backward"),
        }
    }
}

/// The planned shape of one page request.
#[derive(Debug, Clone)]
pub struct Window {
    pub direction: PaginateDirection,
    pub requested_count: usize,
    /// Traversal order; the source order reversed when paging backward.
    pub order: OrderSpec,
    pub predicates: Vec<KeysetPredicate>,
    pub skip: usize,
    /// Always `requested_count + 1`: the extra item signals another page.
    pub take: usize,
    pub has_after: bool,
    pub has_before: bool,
    /// The relative cursor that drives page arithmetic, if any.
    pub relative: Option<RelativeAnchor>,
    pub include_total_count: bool,
    pub enable_relative_cursors: bool,
}

/// A relative cursor together with the argument it came from.
#[derive(Debug, Clone)]
pub struct RelativeAnchor {
    pub bound: KeysetBound,
    pub cursor: Cursor,
}

impl Window {
    pub fn is_forward(&self) -> bool {
        self.direction == PaginateDirection::Forward
    }

    /// Total known without counting: the one embedded in a relative cursor.
    pub fn embedded_total(&self) -> Option<usize> {
        self.relative.as_ref().and_then(|anchor| anchor.cursor.total_count())
    }

    /// Narrows `query` to this window.
    pub fn apply<Q: PageQuery>(&self, query: Q) -> Result<Q, ArgumentError> {
        let mut query = query;
        for predicate in &self.predicates {
            query = query.with_predicate(predicate.clone())?;
        }
        if !self.is_forward() {
            query = query.with_order(self.order.clone())?;
        }
        if self.skip > 0 {
            query = query.with_skip(self.skip);
        }
        Ok(query.with_take(self.take))
    }
}

// Backends address rows with signed 64-bit offsets.
const MAX_SKIP: usize = i64::MAX as usize;

/// Plans the window for `arguments` over a source ordered by `spec`.
///
/// `after` and `before` are the already decoded cursors of `arguments`.
pub fn plan(
    spec: &OrderSpec,
    arguments: &PagingArguments,
    after: Option<Cursor>,
    before: Option<Cursor>,
    config: &PagingConfig,
) -> Result<Window, ArgumentError> {
    let (direction, requested_count) = match (arguments.first, arguments.last) {
        (Some(_), Some(_)) => return Err(ArgumentError::BothFirstAndLast),
        (Some(first), None) => (PaginateDirection::Forward, page_size(first.into(), config)?),
        (None, Some(last)) => (PaginateDirection::Backward, page_size(last.into(), config)?),
        (None, None) => {
            let default = i64::try_from(config.default_page_size).unwrap_or(i64::MAX);
            (PaginateDirection::Forward, page_size(default, config)?)
        }
    };

    if before.is_some() && after.as_ref().is_some_and(Cursor::is_relative) {
        return Err(ArgumentError::ConflictingCursorDirection);
    }

    let has_after = after.is_some();
    let has_before = before.is_some();
    let mut predicates = Vec::with_capacity(2);
    let mut relative = None;

    if let Some(cursor) = after {
        predicates.push(KeysetPredicate::after(spec, cursor.values().to_vec()));
        if cursor.is_relative() {
            relative = Some(RelativeAnchor { bound: KeysetBound::After, cursor });
        }
    }

    if let Some(cursor) = before {
        predicates.push(KeysetPredicate::before(spec, cursor.values().to_vec()));
        if cursor.is_relative() {
            relative = Some(RelativeAnchor { bound: KeysetBound::Before, cursor });
        }
    }

    let mut skip = 0;
    if let Some(anchor) = &relative {
        let offset = anchor.cursor.offset();
        let sign_mismatch = match direction {
            PaginateDirection::Forward => offset < 0,
            PaginateDirection::Backward => offset > 0,
        };
        if sign_mismatch {
            return Err(ArgumentError::InvalidRelativeOffsetSign { offset, direction });
        }
        skip = usize::try_from(offset.unsigned_abs())
            .ok()
            .and_then(|pages| pages.checked_mul(requested_count))
            .filter(|skip| *skip <= MAX_SKIP)
            .ok_or(ArgumentError::InvalidRelativeOffset { offset })?;
    }

    let order = match direction {
        PaginateDirection::Forward => spec.clone(),
        PaginateDirection::Backward => spec.reversed(),
    };

    // Page indices of relative cursors need an initial total.
    let include_total_count = arguments.include_total_count
        || (arguments.enable_relative_cursors && !has_after && !has_before);

    let window = Window {
        direction,
        requested_count,
        order,
        predicates,
        skip,
        take: requested_count + 1,
        has_after,
        has_before,
        relative,
        include_total_count,
        enable_relative_cursors: arguments.enable_relative_cursors,
    };

    tracing::trace!(
        target: "paging",
        direction = %window.direction,
        requested = window.requested_count,
        skip = window.skip,
        take = window.take,
        order = %window.order,
        "planned window"
    );

    Ok(window)
}

fn page_size(requested: i64, config: &PagingConfig) -> Result<usize, ArgumentError> {
    if requested <= 0 {
        return Err(ArgumentError::InvalidPageSize(requested));
    }
    let requested = usize::try_from(requested).unwrap_or(usize::MAX);
    if requested > config.max_page_size {
        return Err(ArgumentError::PageSizeExceeded { requested, max: config.max_page_size });
    }
    Ok(requested)
}

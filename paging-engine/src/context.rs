// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::PagingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// The windowed item query.
    Page,
    /// The auxiliary per-parent count of a batch.
    GroupCount,
}

/// A physical query about to be executed.
#[derive(Debug, Clone)]
pub struct PlannedQuery {
    pub kind: QueryKind,
    pub description: String,
}

/// Observes every physical query right before it runs.
pub trait QueryInterceptor: Send + Sync {
    fn on_query(&self, query: &PlannedQuery);
}

impl<F> QueryInterceptor for F
where
    F: Fn(&PlannedQuery) + Send + Sync,
{
    fn on_query(&self, query: &PlannedQuery) {
        self(query)
    }
}

/// Call-scoped state for one pagination call: the optional interceptor and
/// cancellation signal. Nothing here is shared with other calls unless the
/// caller clones it in.
#[derive(Clone, Default)]
pub struct PagingContext {
    interceptor: Option<Arc<dyn QueryInterceptor>>,
    cancellation: Option<CancellationToken>,
}

impl PagingContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interceptor(mut self, interceptor: Arc<dyn QueryInterceptor>) -> Self {
        self.interceptor = Some(interceptor);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub(crate) fn intercept(&self, kind: QueryKind, description: impl FnOnce() -> String) {
        if let Some(interceptor) = &self.interceptor {
            interceptor.on_query(&PlannedQuery { kind, description: description() });
        }
    }

    pub(crate) fn ensure_active(&self) -> Result<(), PagingError> {
        match &self.cancellation {
            Some(token) if token.is_cancelled() => Err(PagingError::Cancelled),
            _ => Ok(()),
        }
    }

    /// Awaits `future` unless the call is cancelled first.
    pub(crate) async fn run<F, T>(&self, future: F) -> Result<T, PagingError>
    where
        F: Future<Output = T>,
    {
        match &self.cancellation {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => Err(PagingError::Cancelled),
                output = future => Ok(output),
            },
            None => Ok(future.await),
        }
    }
}

impl fmt::Debug for PagingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PagingContext")
            .field("interceptor", &self.interceptor.is_some())
            .field("cancellation", &self.cancellation)
            .finish()
    }
}

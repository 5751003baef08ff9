// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use std::sync::Arc;

use paging_engine::paginate;
use paging_engine::paginate_batch;
use paging_engine::paginate_batch_for_keys;
use paging_engine::ArgumentError;
use paging_engine::CursorCodec;
use paging_engine::CursorDecodeError;
use paging_engine::CursorPageInfo;
use paging_engine::GroupKeySpec;
use paging_engine::MemorySource;
use paging_engine::OrderKey;
use paging_engine::Page;
use paging_engine::PagingArguments;
use paging_engine::PagingConfig;
use paging_engine::PagingContext;
use paging_engine::PagingError;
use paging_engine::PlannedQuery;
use paging_engine::QueryKind;
use paging_engine::Record;
use paging_engine::Value;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq)]
struct Message {
    id: i64,
    thread: String,
    score: i64,
}

impl Record for Message {
    fn value_of(&self, field: &str) -> Option<Value> {
        match field {
            "id" => Some(Value::Int(self.id)),
            "thread" => Some(Value::from(self.thread.as_str())),
            "score" => Some(Value::Int(self.score)),
            _ => None,
        }
    }
}

fn message(id: i64, thread: &str) -> Message {
    Message { id, thread: thread.to_string(), score: id % 3 }
}

fn ascending(ids: std::ops::RangeInclusive<i64>) -> MemorySource<Message> {
    MemorySource::new(ids.map(|id| message(id, "a")).collect()).order_by(OrderKey::asc("id"))
}

fn ids(page: &Page<Message>) -> Vec<i64> {
    page.items().iter().map(|m| m.id).collect()
}

fn recording() -> (PagingContext, Arc<Mutex<Vec<PlannedQuery>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let ctx = PagingContext::new()
        .with_interceptor(Arc::new(move |query: &PlannedQuery| sink.lock().push(query.clone())));
    (ctx, seen)
}

async fn page(source: MemorySource<Message>, arguments: PagingArguments) -> Page<Message> {
    paginate(source, &arguments, &PagingConfig::default(), &PagingContext::new()).await.unwrap()
}

#[tokio::test]
async fn test_forward_walk() {
    let first = page(ascending(1..=5), PagingArguments::first(2)).await;
    assert_eq!(ids(&first), vec![1, 2]);
    assert!(first.has_next_page());
    assert!(!first.has_previous_page());

    let second =
        page(ascending(1..=5), PagingArguments::first(2).after(first.end_cursor().unwrap())).await;
    assert_eq!(ids(&second), vec![3, 4]);
    assert!(second.has_next_page());
    assert!(second.has_previous_page());

    let third =
        page(ascending(1..=5), PagingArguments::first(2).after(second.end_cursor().unwrap())).await;
    assert_eq!(ids(&third), vec![5]);
    assert!(!third.has_next_page());
    assert!(third.has_previous_page());
}

#[tokio::test]
async fn test_backward_walk() {
    let last = page(ascending(1..=5), PagingArguments::last(2)).await;
    assert_eq!(ids(&last), vec![4, 5]);
    assert!(!last.has_next_page());
    assert!(last.has_previous_page());

    let before =
        page(ascending(1..=5), PagingArguments::last(2).before(last.start_cursor().unwrap())).await;
    assert_eq!(ids(&before), vec![2, 3]);
    assert!(before.has_next_page());
    assert!(before.has_previous_page());

    let head =
        page(ascending(1..=5), PagingArguments::last(2).before(before.start_cursor().unwrap()))
            .await;
    assert_eq!(ids(&head), vec![1]);
    assert!(head.has_next_page());
    assert!(!head.has_previous_page());
}

#[tokio::test]
async fn test_forward_and_backward_agree() {
    let forward = page(ascending(1..=9), PagingArguments::first(3)).await;
    let cursor = forward.end_cursor().unwrap();
    let next = page(ascending(1..=9), PagingArguments::first(3).after(cursor)).await;
    let back =
        page(ascending(1..=9), PagingArguments::last(3).before(next.start_cursor().unwrap())).await;
    assert_eq!(ids(&back), ids(&forward));
}

#[tokio::test]
async fn test_mixed_directions_with_tie_breaker() {
    let items = (1..=8).map(|id| message(id, "a")).collect::<Vec<_>>();
    let source = || {
        MemorySource::new(items.clone())
            .order_by(OrderKey::desc("score"))
            .order_by(OrderKey::asc("id"))
    };

    let mut seen = Vec::new();
    let mut after = None::<String>;
    loop {
        let mut arguments = PagingArguments::first(3);
        if let Some(cursor) = after.take() {
            arguments = arguments.after(cursor);
        }
        let current = page(source(), arguments).await;
        seen.extend(ids(&current));
        if !current.has_next_page() {
            break;
        }
        after = current.end_cursor();
    }
    // score = id % 3, descending, then id ascending.
    assert_eq!(seen, vec![2, 5, 8, 1, 4, 7, 3, 6]);
}

#[tokio::test]
async fn test_total_count_ignores_cursor() {
    let first = page(ascending(1..=5), PagingArguments::first(2).with_total_count()).await;
    assert_eq!(first.total_count(), Some(5));

    let next = page(
        ascending(1..=5),
        PagingArguments::first(2).with_total_count().after(first.end_cursor().unwrap()),
    )
    .await;
    assert_eq!(next.total_count(), Some(5));
}

#[tokio::test]
async fn test_relative_cursor_jumps_pages() {
    let arguments = PagingArguments::first(2).with_relative_cursors();
    let first = page(ascending(1..=9), arguments.clone()).await;
    assert_eq!(first.page_index(), Some(1));
    assert_eq!(first.total_count(), Some(9));

    // Skip page 2, land on page 3.
    let jump = first.relative_cursor(1, 1).unwrap();
    let third = page(ascending(1..=9), arguments.clone().after(jump)).await;
    assert_eq!(ids(&third), vec![5, 6]);
    assert_eq!(third.page_index(), Some(3));
    assert_eq!(third.total_count(), Some(9));

    let fourth = page(ascending(1..=9), arguments.after(third.end_cursor().unwrap())).await;
    assert_eq!(ids(&fourth), vec![7, 8]);
    assert_eq!(fourth.page_index(), Some(4));

    let last = page(ascending(1..=9), PagingArguments::last(2).with_relative_cursors()).await;
    assert_eq!(ids(&last), vec![8, 9]);
    assert_eq!(last.page_index(), Some(5));
}

#[tokio::test]
async fn test_unreachable_page_index_keeps_the_page() {
    let cursor = CursorCodec::encode(
        &[Value::Int(1)],
        Some(&CursorPageInfo { offset: 0, page_index: Some(usize::MAX), total_count: Some(5) }),
    );
    let current =
        page(ascending(1..=5), PagingArguments::first(2).with_relative_cursors().after(cursor))
            .await;
    assert_eq!(ids(&current), vec![2, 3]);
    assert_eq!(current.page_index(), None);
    assert!(current.relative_cursor(0, 1).is_none());
}

#[tokio::test]
async fn test_rejects_bad_arguments_before_querying() {
    let (ctx, seen) = recording();
    let config = PagingConfig::default();

    let err =
        paginate(ascending(1..=3), &PagingArguments::first(0), &config, &ctx).await.unwrap_err();
    assert!(matches!(err, PagingError::Argument(ArgumentError::InvalidPageSize(0))));

    let source = MemorySource::new(vec![message(1, "a")]);
    let err = paginate(source, &PagingArguments::first(1), &config, &ctx).await.unwrap_err();
    assert!(matches!(err, PagingError::Argument(ArgumentError::NoOrderKeys)));

    let err = paginate(ascending(1..=3), &PagingArguments::first(1).after("%%%"), &config, &ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, PagingError::Cursor(CursorDecodeError::InvalidBase64)));

    assert!(seen.lock().is_empty());
}

#[tokio::test]
async fn test_cursor_from_other_order_is_rejected() {
    let other = MemorySource::new(vec![message(1, "a")])
        .order_by(OrderKey::asc("score"))
        .order_by(OrderKey::asc("id"));
    let cursor = page(other, PagingArguments::first(1)).await.end_cursor().unwrap();

    let err = paginate(
        ascending(1..=3),
        &PagingArguments::first(1).after(cursor),
        &PagingConfig::default(),
        &PagingContext::new(),
    )
    .await
    .unwrap_err();
    assert!(err.is_cursor_error());
}

#[tokio::test]
async fn test_cancelled_call_returns_no_page() {
    let token = CancellationToken::new();
    token.cancel();
    let ctx = PagingContext::new().with_cancellation(token);
    let err = paginate(ascending(1..=3), &PagingArguments::first(2), &PagingConfig::default(), &ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, PagingError::Cancelled));
}

fn threads() -> MemorySource<Message> {
    let mut items = (1..=5).map(|id| message(id, "A")).collect::<Vec<_>>();
    items.extend((6..=8).map(|id| message(id, "C")));
    MemorySource::new(items).order_by(OrderKey::asc("id"))
}

#[tokio::test]
async fn test_batch_runs_one_page_query() {
    let (ctx, seen) = recording();
    let group = GroupKeySpec::new("thread");
    let pages = paginate_batch_for_keys::<String, _>(
        threads(),
        &group,
        &["A".to_string(), "B".to_string()],
        &PagingArguments::first(2),
        &PagingConfig::default(),
        &ctx,
    )
    .await
    .unwrap();

    assert_eq!(pages.len(), 2);
    let a = &pages["A"];
    assert_eq!(ids(a), vec![1, 2]);
    assert!(a.has_next_page());
    assert!(pages["B"].is_empty());

    let kinds = seen.lock().iter().map(|query| query.kind).collect::<Vec<_>>();
    assert_eq!(kinds, vec![QueryKind::Page]);
}

#[tokio::test]
async fn test_batch_with_totals_counts_once() {
    let (ctx, seen) = recording();
    let group = GroupKeySpec::new("thread");
    let pages = paginate_batch::<String, _>(
        threads(),
        &group,
        &PagingArguments::first(2).with_total_count(),
        &PagingConfig::default(),
        &ctx,
    )
    .await
    .unwrap();

    assert_eq!(pages.len(), 2);
    assert_eq!(pages["A"].total_count(), Some(5));
    assert_eq!(pages["C"].total_count(), Some(3));
    assert_eq!(ids(&pages["C"]), vec![6, 7]);

    let kinds = seen.lock().iter().map(|query| query.kind).collect::<Vec<_>>();
    assert_eq!(kinds, vec![QueryKind::GroupCount, QueryKind::Page]);
}

#[tokio::test]
async fn test_batch_cursor_applies_to_every_group() {
    let group = GroupKeySpec::new("thread");
    let config = PagingConfig::default();
    let ctx = PagingContext::new();

    // A cursor at id 6 is past every item of group A.
    let first =
        paginate_batch::<String, _>(threads(), &group, &PagingArguments::first(1), &config, &ctx)
            .await
            .unwrap();
    let cursor = first["C"].end_cursor().unwrap();

    let next = paginate_batch::<String, _>(
        threads(),
        &group,
        &PagingArguments::first(1).after(cursor),
        &config,
        &ctx,
    )
    .await
    .unwrap();
    assert!(!next.contains_key("A"));
    assert_eq!(ids(&next["C"]), vec![7]);
    assert!(next["C"].has_previous_page());
    assert!(next["C"].has_next_page());
}

#[tokio::test]
async fn test_batch_last_pages_each_group_backward() {
    let group = GroupKeySpec::new("thread");
    let pages = paginate_batch::<String, _>(
        threads(),
        &group,
        &PagingArguments::last(2),
        &PagingConfig::default(),
        &PagingContext::new(),
    )
    .await
    .unwrap();

    assert_eq!(ids(&pages["A"]), vec![4, 5]);
    assert_eq!(ids(&pages["C"]), vec![7, 8]);
    for thread in ["A", "C"] {
        assert!(pages[thread].has_previous_page());
        assert!(!pages[thread].has_next_page());
    }
}

#[tokio::test]
async fn test_batch_relative_cursor_reuses_embedded_total() {
    let group = GroupKeySpec::new("thread");
    let config = PagingConfig::default();
    let arguments = PagingArguments::first(1).with_relative_cursors();
    let first =
        paginate_batch::<String, _>(threads(), &group, &arguments, &config, &PagingContext::new())
            .await
            .unwrap();
    assert_eq!(first["A"].total_count(), Some(5));
    assert_eq!(first["A"].page_index(), Some(1));

    // Jump over page 2 of every group.
    let (ctx, seen) = recording();
    let jump = first["A"].relative_cursor(0, 1).unwrap();
    let next =
        paginate_batch::<String, _>(threads(), &group, &arguments.after(jump), &config, &ctx)
            .await
            .unwrap();
    assert_eq!(ids(&next["A"]), vec![3]);
    assert_eq!(ids(&next["C"]), vec![7]);
    assert_eq!(next["A"].page_index(), Some(3));
    assert_eq!(next["A"].total_count(), Some(5));
    assert!(next["A"].is_relative());

    let kinds = seen.lock().iter().map(|query| query.kind).collect::<Vec<_>>();
    assert_eq!(kinds, vec![QueryKind::Page]);
}

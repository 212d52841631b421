use futures::stream::{self, BoxStream};
use futures::StreamExt;

use deferred_rail::stream::merge;

use super::delayed;

#[tokio::test(start_paused = true)]
async fn yields_in_arrival_order() {
    let merged: Vec<&str> =
        merge(vec![delayed(vec![(30, "A")]), delayed(vec![(10, "B")])]).collect().await;

    assert_eq!(merged, vec!["B", "A"]);
}

#[tokio::test(start_paused = true)]
async fn interleaves_sources_by_timing() {
    let merged: Vec<&str> = merge(vec![
        delayed(vec![(10, "a1"), (30, "a2")]),
        delayed(vec![(20, "b1")]),
        delayed(vec![(25, "c1"), (30, "c2")]),
    ])
    .collect()
    .await;

    assert_eq!(merged, vec!["a1", "b1", "c1", "a2", "c2"]);
}

#[tokio::test(start_paused = true)]
async fn ends_after_every_source_is_exhausted() {
    let mut merged = merge(vec![delayed(vec![(5, 1)]), delayed(vec![(50, 2)])]);

    assert_eq!(merged.next().await, Some(1));
    assert_eq!(merged.active_sources(), 1);
    assert_eq!(merged.next().await, Some(2));
    assert_eq!(merged.next().await, None);
    assert_eq!(merged.active_sources(), 0);
}

#[tokio::test]
async fn empty_sources_are_skipped() {
    let sources: Vec<BoxStream<'static, u8>> =
        vec![stream::empty().boxed(), stream::iter(vec![1, 2]).boxed(), stream::empty().boxed()];
    let merged: Vec<u8> = merge(sources).collect().await;

    assert_eq!(merged, vec![1, 2]);
}

#[tokio::test]
async fn no_sources_yield_nothing() {
    let merged: Vec<u8> = merge(Vec::<BoxStream<'static, u8>>::new()).collect().await;
    assert!(merged.is_empty());
}

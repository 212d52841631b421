//! Integration tests for the stream combinators.

mod merge_tests;

use core::time::Duration;

use futures::stream::{self, BoxStream};
use futures::StreamExt;

/// A stream yielding each value after its delay, measured from the previous item.
pub fn delayed<T>(items: Vec<(u64, T)>) -> BoxStream<'static, T>
where
    T: Send + 'static,
{
    stream::iter(items)
        .then(|(ms, value)| async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            value
        })
        .boxed()
}

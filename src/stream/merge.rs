//! Merge combinator for streams.
//!
//! `Merge` keeps exactly one outstanding "next item" request per live source
//! and yields whichever settles first, so items arrive in completion order
//! rather than source order.

use core::pin::Pin;
use core::task::{Context, Poll};

use futures::stream::{FusedStream, FuturesUnordered, StreamFuture};
use futures::{Stream, StreamExt};

/// A stream that fans in multiple streams.
#[must_use = "streams do nothing unless polled"]
pub struct Merge<S> {
    pending: FuturesUnordered<StreamFuture<S>>,
}

impl<S> core::fmt::Debug for Merge<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Merge").field("active_sources", &self.pending.len()).finish()
    }
}

impl<S> Merge<S>
where
    S: Stream + Unpin,
{
    fn new(streams: impl IntoIterator<Item = S>) -> Self {
        Self { pending: streams.into_iter().map(StreamExt::into_future).collect() }
    }
}

impl<S> Merge<S> {
    /// Returns the number of sources not yet exhausted.
    #[must_use]
    pub fn active_sources(&self) -> usize {
        self.pending.len()
    }
}

impl<S> Stream for Merge<S>
where
    S: Stream + Unpin,
{
    type Item = S::Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match self.pending.poll_next_unpin(cx) {
                Poll::Ready(Some((Some(item), rest))) => {
                    self.pending.push(rest.into_future());
                    return Poll::Ready(Some(item));
                }
                Poll::Ready(Some((None, _exhausted))) => {
                    tracing::trace!(remaining = self.pending.len(), "merge source exhausted");
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.pending.is_empty() {
            (0, Some(0))
        } else {
            (0, None)
        }
    }
}

impl<S> FusedStream for Merge<S>
where
    S: Stream + Unpin,
{
    fn is_terminated(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Merges `streams` into one stream yielding items as they arrive.
///
/// The merged stream ends once every source is exhausted; an empty input
/// ends immediately.
///
/// # Example
///
/// ```rust
/// use deferred_rail::stream::merge;
/// use futures::{stream, StreamExt};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let merged: Vec<i32> = merge(vec![stream::iter(vec![1, 2]), stream::iter(vec![3])])
///     .collect()
///     .await;
///
/// assert_eq!(merged.len(), 3);
/// # }
/// ```
pub fn merge<S>(streams: impl IntoIterator<Item = S>) -> Merge<S>
where
    S: Stream + Unpin,
{
    Merge::new(streams)
}

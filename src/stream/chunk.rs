//! Fixed-size batching for streams.

use core::fmt;
use core::pin::Pin;
use core::task::{Context, Poll};

use futures::stream::FusedStream;
use futures::Stream;
use pin_project_lite::pin_project;

use crate::types::ChunkSizeError;

type Filter<T> = Box<dyn FnMut(&T) -> bool + Send>;
type Transform<T> = Box<dyn FnMut(T) -> T + Send>;

/// Optional per-item filter and transform for [`chunk`].
///
/// The filter runs first; rejected items never count toward a batch. The
/// transform runs on each item that passes, before it is buffered.
pub struct ChunkOptions<T> {
    filter: Option<Filter<T>>,
    transform: Option<Transform<T>>,
}

impl<T> Default for ChunkOptions<T> {
    fn default() -> Self {
        Self { filter: None, transform: None }
    }
}

impl<T> fmt::Debug for ChunkOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkOptions")
            .field("filter", &self.filter.is_some())
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

impl<T> ChunkOptions<T> {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter<P>(mut self, predicate: P) -> Self
    where
        P: FnMut(&T) -> bool + Send + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    pub fn transform<M>(mut self, transform: M) -> Self
    where
        M: FnMut(T) -> T + Send + 'static,
    {
        self.transform = Some(Box::new(transform));
        self
    }

    fn admit(&mut self, item: T) -> Option<T> {
        if let Some(filter) = self.filter.as_mut() {
            if !filter(&item) {
                return None;
            }
        }
        Some(match self.transform.as_mut() {
            Some(transform) => transform(item),
            None => item,
        })
    }
}

pin_project! {
    /// Stream for [`chunk`].
    ///
    /// Every batch holds exactly `size` items except possibly the last, which
    /// holds whatever remained when the source ended.
    #[must_use = "streams do nothing unless polled"]
    pub struct Chunks<S, T> {
        #[pin]
        stream: S,
        options: ChunkOptions<T>,
        buffer: Vec<T>,
        size: usize,
        done: bool,
    }
}

impl<S, T> fmt::Debug for Chunks<S, T>
where
    S: fmt::Debug,
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunks")
            .field("stream", &self.stream)
            .field("options", &self.options)
            .field("buffer", &self.buffer)
            .field("size", &self.size)
            .field("done", &self.done)
            .finish()
    }
}

impl<S, T> Chunks<S, T> {
    /// Returns the batch size.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }
}

impl<S, T> Stream for Chunks<S, T>
where
    S: Stream<Item = T>,
{
    type Item = Vec<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        if *this.done {
            return Poll::Ready(None);
        }

        loop {
            match this.stream.as_mut().poll_next(cx) {
                Poll::Ready(Some(item)) => {
                    if let Some(item) = this.options.admit(item) {
                        this.buffer.push(item);
                        if this.buffer.len() >= *this.size {
                            let full = core::mem::replace(this.buffer, Vec::with_capacity(*this.size));
                            return Poll::Ready(Some(full));
                        }
                    }
                }
                Poll::Ready(None) => {
                    *this.done = true;
                    if this.buffer.is_empty() {
                        return Poll::Ready(None);
                    }
                    return Poll::Ready(Some(core::mem::take(this.buffer)));
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            return (0, Some(0));
        }
        let (_, upper) = self.stream.size_hint();
        let upper = upper
            .and_then(|n| n.checked_add(self.buffer.len()))
            .map(|n| n.div_ceil(self.size));
        (0, upper)
    }
}

impl<S, T> FusedStream for Chunks<S, T>
where
    S: Stream<Item = T>,
{
    fn is_terminated(&self) -> bool {
        self.done
    }
}

/// Batches `stream` into groups of `size` items.
///
/// Fails with [`ChunkSizeError`] right away when `size` is zero.
///
/// # Example
///
/// ```rust
/// use deferred_rail::stream::{chunk, ChunkOptions};
/// use futures::{stream, StreamExt};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let batches: Vec<Vec<i32>> = chunk(stream::iter(vec![1, 2, 3, 4, 5]), 2, ChunkOptions::new())
///     .unwrap()
///     .collect()
///     .await;
///
/// assert_eq!(batches, vec![vec![1, 2], vec![3, 4], vec![5]]);
/// assert!(chunk(stream::iter(vec![1]), 0, ChunkOptions::new()).is_err());
/// # }
/// ```
pub fn chunk<S, T>(
    stream: S,
    size: usize,
    options: ChunkOptions<T>,
) -> Result<Chunks<S, T>, ChunkSizeError>
where
    S: Stream<Item = T>,
{
    if size == 0 {
        return Err(ChunkSizeError(size));
    }
    Ok(Chunks { stream, options, buffer: Vec::with_capacity(size), size, done: false })
}

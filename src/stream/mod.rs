//! Stream combinators.
//!
//! - [`merge`]: fan-in of several streams, yielding items in arrival order
//! - [`chunk`]: fixed-size batches with optional filtering and transformation
//!
//! Both operate on any [`futures::Stream`].
//!
//! # Examples
//!
//! ```
//! use deferred_rail::stream::{chunk, ChunkOptions};
//! use futures::{stream, StreamExt};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let evens = ChunkOptions::new().filter(|n: &u32| n % 2 == 0);
//! let batches: Vec<Vec<u32>> = chunk(stream::iter(1..=9), 2, evens)
//!     .unwrap()
//!     .collect()
//!     .await;
//!
//! assert_eq!(batches, vec![vec![2, 4], vec![6, 8]]);
//! # }
//! ```

mod chunk;
mod merge;

pub use chunk::{chunk, ChunkOptions, Chunks};
pub use merge::{merge, Merge};

//! C2 — produce a fixed-length numeric vector for a text span.

use futures::future::BoxFuture;

use segment_core::CancelToken;
use segment_core::Result;

/// Contract for the embedding backend. A single instance reports one fixed
/// `dimensions()` for its lifetime and is expected to be thread-safe (or
/// internally serialized) since it is shared across independent pipeline
/// runs.
pub trait EmbeddingService: Send + Sync {
    /// Embed `text`. The returned future is a suspension point: the
    /// cancellation signal must be observed promptly if it fires while the
    /// call is in flight.
    fn embed<'a>(
        &'a self,
        text: &'a str,
        cancel: &'a CancelToken,
    ) -> BoxFuture<'a, Result<Vec<f32>>>;

    /// Dimensionality of every vector this service produces.
    fn dimensions(&self) -> usize;
}

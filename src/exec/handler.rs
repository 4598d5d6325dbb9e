// src/exec/handler.rs

//! Caller-supplied sink for streamed output.

use std::future::Future;
use std::pin::Pin;

use crate::types::StreamKind;

pub type HandlerFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

/// Receives output chunks of a streaming execution.
///
/// stdout and stderr are read by separate tasks, so `on_chunk` can be
/// running for both streams at once. Within one stream the next chunk is
/// not read until the returned future completes.
///
/// An `Err` (or a panic) is reported as an `error` event and delivery
/// carries on with the next chunk.
///
/// Any `Fn(String, StreamKind) -> impl Future<Output = anyhow::Result<()>>`
/// closure implements this trait.
pub trait OutputHandler: Send + Sync {
    fn on_chunk(&self, chunk: String, stream: StreamKind) -> HandlerFuture;
}

impl<F, Fut> OutputHandler for F
where
    F: Fn(String, StreamKind) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    fn on_chunk(&self, chunk: String, stream: StreamKind) -> HandlerFuture {
        Box::pin(self(chunk, stream))
    }
}

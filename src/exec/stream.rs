// src/exec/stream.rs

//! Per-stream reader tasks.
//!
//! Each child stream gets its own task. [`deliver_stream`] decodes chunks
//! and hands them to the caller's handler one at a time; [`capture_stream`]
//! accumulates raw bytes for buffered runs. Both stop reading as soon as
//! the process's [`TerminationSignal`] fires.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, warn};

use crate::errors::ExecError;
use crate::events::EventBus;
use crate::exec::decode::ChunkDecoder;
use crate::exec::handler::OutputHandler;
use crate::exec::termination::{CancelReason, TerminationSignal};
use crate::types::{OutputEncoding, ProcessId, StreamKind};

const READ_BUF_SIZE: usize = 8 * 1024;

/// Everything a delivering reader needs besides the stream itself.
#[derive(Clone)]
pub struct DeliveryContext {
    pub id: ProcessId,
    pub encoding: OutputEncoding,
    pub handler: Arc<dyn OutputHandler>,
    pub signal: Arc<TerminationSignal>,
    pub events: EventBus,
}

pub async fn deliver_stream<R>(mut reader: R, stream: StreamKind, ctx: DeliveryContext)
where
    R: AsyncRead + Unpin,
{
    let mut decoder = ChunkDecoder::new(ctx.encoding);
    let mut buf = vec![0u8; READ_BUF_SIZE];

    loop {
        let n = tokio::select! {
            biased;
            _ = ctx.signal.cancelled() => {
                debug!(id = %ctx.id, %stream, "termination requested; stopping delivery");
                return;
            }
            res = reader.read(&mut buf) => match res {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    warn!(id = %ctx.id, %stream, error = %e, "reading output failed");
                    break;
                }
            },
        };

        let text = decoder.decode(&buf[..n]);
        if text.is_empty() {
            continue;
        }
        if ctx.signal.is_cancelled() {
            return;
        }
        deliver(&ctx, stream, text).await;
    }

    let rest = decoder.finish();
    if !rest.is_empty() && !ctx.signal.is_cancelled() {
        deliver(&ctx, stream, rest).await;
    }
    debug!(id = %ctx.id, %stream, "output stream closed");
}

async fn deliver(ctx: &DeliveryContext, stream: StreamKind, text: String) {
    let outcome = AssertUnwindSafe(ctx.handler.on_chunk(text, stream))
        .catch_unwind()
        .await;

    let reason = match outcome {
        Ok(Ok(())) => return,
        Ok(Err(e)) => format!("{e:#}"),
        Err(panic) => format!("handler panicked: {}", panic_message(&*panic)),
    };

    let err = ExecError::CallbackFailed { stream, reason };
    warn!(id = %ctx.id, error = %err, "output handler failed; continuing");
    ctx.events.error(Some(ctx.id), err.to_string());
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

/// Read a stream to the end into memory, tripping the signal if more than
/// `max_buffer` bytes arrive.
pub async fn capture_stream<R>(
    mut reader: R,
    stream: StreamKind,
    id: ProcessId,
    max_buffer: usize,
    signal: Arc<TerminationSignal>,
) -> Vec<u8>
where
    R: AsyncRead + Unpin,
{
    let mut captured = Vec::new();
    let mut buf = vec![0u8; READ_BUF_SIZE];

    loop {
        let n = tokio::select! {
            biased;
            _ = signal.cancelled() => break,
            res = reader.read(&mut buf) => match res {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    warn!(id = %id, %stream, error = %e, "reading output failed");
                    break;
                }
            },
        };

        if captured.len() + n > max_buffer {
            warn!(id = %id, %stream, max_buffer, "output exceeded max buffer; terminating");
            signal.cancel(CancelReason::OutputLimit(max_buffer));
            break;
        }
        captured.extend_from_slice(&buf[..n]);
    }

    captured
}

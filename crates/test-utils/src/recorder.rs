use std::sync::{Arc, Mutex};
use std::time::Duration;

use cmdexec::exec::OutputHandler;
use cmdexec::types::StreamKind;

/// An output handler for tests that:
/// - records every chunk it is handed, in call order
/// - can be told to fail (or panic) on the N-th call
/// - can be slowed down to simulate a handler that does I/O.
#[derive(Clone, Default)]
pub struct Recorder {
    chunks: Arc<Mutex<Vec<(StreamKind, String)>>>,
    fail_on_call: Option<usize>,
    panic_on_call: Option<usize>,
    delay: Option<Duration>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return an error from the `n`-th call (1-based).
    pub fn fail_on_call(mut self, n: usize) -> Self {
        self.fail_on_call = Some(n);
        self
    }

    /// Panic inside the `n`-th call (1-based).
    pub fn panic_on_call(mut self, n: usize) -> Self {
        self.panic_on_call = Some(n);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn handler(&self) -> Arc<dyn OutputHandler> {
        let this = self.clone();
        Arc::new(move |chunk: String, stream: StreamKind| {
            let this = this.clone();
            async move {
                if let Some(delay) = this.delay {
                    tokio::time::sleep(delay).await;
                }
                let call = {
                    let mut guard = this.chunks.lock().unwrap();
                    guard.push((stream, chunk));
                    guard.len()
                };
                if this.panic_on_call == Some(call) {
                    panic!("recorder told to panic on call {call}");
                }
                if this.fail_on_call == Some(call) {
                    anyhow::bail!("recorder told to fail on call {call}");
                }
                Ok(())
            }
        })
    }

    pub fn calls(&self) -> usize {
        self.chunks.lock().unwrap().len()
    }

    pub fn chunks(&self) -> Vec<(StreamKind, String)> {
        self.chunks.lock().unwrap().clone()
    }

    /// Concatenation of everything received on `stream`.
    pub fn text(&self, stream: StreamKind) -> String {
        self.chunks
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| *s == stream)
            .map(|(_, c)| c.as_str())
            .collect()
    }
}

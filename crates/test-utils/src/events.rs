use std::time::Duration;

use cmdexec::events::SupervisorEvent;
use tokio::sync::broadcast;

/// Wait up to `within` for an event matching `pred`, skipping others.
pub async fn wait_for_event<F>(
    rx: &mut broadcast::Receiver<SupervisorEvent>,
    within: Duration,
    mut pred: F,
) -> Option<SupervisorEvent>
where
    F: FnMut(&SupervisorEvent) -> bool,
{
    let deadline = tokio::time::Instant::now() + within;
    loop {
        match tokio::time::timeout_at(deadline, rx.recv()).await {
            Ok(Ok(ev)) if pred(&ev) => return Some(ev),
            Ok(Ok(_)) | Ok(Err(broadcast::error::RecvError::Lagged(_))) => continue,
            Ok(Err(broadcast::error::RecvError::Closed)) | Err(_) => return None,
        }
    }
}

/// Drain whatever events are already queued.
pub fn drain_events(rx: &mut broadcast::Receiver<SupervisorEvent>) -> Vec<SupervisorEvent> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ev);
    }
    out
}

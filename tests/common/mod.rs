#![allow(dead_code)]

pub use cmdexec_test_utils::events::{drain_events, wait_for_event};
pub use cmdexec_test_utils::recorder::Recorder;
pub use cmdexec_test_utils::{init_tracing, with_timeout};

/// Turn string literals into an owned argument vector.
pub fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

// tests/execute.rs
//
// One-shot (buffered) runs through `Supervisor::execute` and through
// `realtime_execution` without a handler.

mod common;
use crate::common::{args, drain_events, init_tracing, wait_for_event, with_timeout};

use std::error::Error;
use std::time::{Duration, Instant};

use cmdexec::events::SupervisorEvent;
use cmdexec::types::OutputEncoding;
use cmdexec::{ExecError, ExecOptions, Execution, Supervisor};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn echo_returns_stdout_and_leaves_registry_empty() -> TestResult {
    init_tracing();
    let supervisor = Supervisor::new();

    let out = with_timeout(supervisor.execute("echo hello", &ExecOptions::default())).await?;

    assert_eq!(out, "hello\n");
    assert_eq!(supervisor.running_count(), 0);
    Ok(())
}

#[tokio::test]
async fn stdout_is_returned_byte_for_byte() -> TestResult {
    init_tracing();
    let supervisor = Supervisor::new();

    let out = with_timeout(
        supervisor.execute("printf 'a\\tb\\n\\nc'", &ExecOptions::default()),
    )
    .await?;

    assert_eq!(out, "a\tb\n\nc");
    Ok(())
}

#[tokio::test]
async fn non_zero_exit_fails_with_code_and_stderr() {
    init_tracing();
    let supervisor = Supervisor::new();
    let mut events = supervisor.subscribe();

    let err = with_timeout(
        supervisor.execute("echo partial; echo boom >&2; exit 3", &ExecOptions::default()),
    )
    .await
    .unwrap_err();

    match &err {
        ExecError::ProcessFailed { code, stderr } => {
            assert_eq!(*code, 3);
            assert_eq!(stderr, "boom\n");
        }
        other => panic!("expected ProcessFailed, got {other:?}"),
    }
    assert_eq!(err.exit_code(), Some(3));
    assert_eq!(supervisor.running_count(), 0);

    let ev = wait_for_event(&mut events, Duration::from_secs(1), SupervisorEvent::is_error)
        .await
        .expect("failed call should be reported on the event channel");
    assert!(ev.message().contains("exited with code 3"));
}

#[tokio::test]
async fn stderr_with_zero_exit_is_a_warning_not_a_failure() -> TestResult {
    init_tracing();
    let supervisor = Supervisor::new();
    let mut events = supervisor.subscribe();

    let out = with_timeout(
        supervisor.execute("echo out; echo careful >&2", &ExecOptions::default()),
    )
    .await?;
    assert_eq!(out, "out\n");

    let queued = drain_events(&mut events);
    assert_eq!(queued.len(), 1, "expected exactly one event, got {queued:?}");
    match &queued[0] {
        SupervisorEvent::Warning { id, message } => {
            assert!(id.is_some());
            assert_eq!(message, "careful\n");
        }
        other => panic!("expected a warning, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn timeout_kills_one_shot_run() {
    init_tracing();
    let supervisor = Supervisor::new();
    let options = ExecOptions::default().with_timeout_ms(100);

    let started = Instant::now();
    let err = with_timeout(supervisor.execute("sleep 5", &options))
        .await
        .unwrap_err();

    assert!(matches!(err, ExecError::Timeout(100)), "got {err:?}");
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(supervisor.running_count(), 0);
}

#[tokio::test]
async fn output_over_max_buffer_is_rejected() {
    init_tracing();
    let supervisor = Supervisor::new();
    let options = ExecOptions::default().with_max_buffer(16);

    let err = with_timeout(supervisor.execute("yes", &options))
        .await
        .unwrap_err();

    assert!(matches!(err, ExecError::OutputLimitExceeded(16)), "got {err:?}");
    assert_eq!(supervisor.running_count(), 0);
}

#[tokio::test]
async fn encoding_is_applied_to_captured_output() -> TestResult {
    init_tracing();
    let supervisor = Supervisor::new();
    let options = ExecOptions::default().with_encoding(OutputEncoding::Hex);

    let out = with_timeout(supervisor.execute("printf 'AB'", &options)).await?;

    assert_eq!(out, "4142");
    Ok(())
}

#[tokio::test]
async fn realtime_without_handler_is_a_buffered_run() -> TestResult {
    init_tracing();
    let supervisor = Supervisor::new();

    let execution = with_timeout(supervisor.realtime_execution(
        "echo",
        &args(&["one", "two"]),
        &ExecOptions::default(),
        None,
    ))
    .await?;

    match execution {
        Execution::Buffered(out) => assert_eq!(out, "one two\n"),
        other => panic!("expected buffered output, got {other:?}"),
    }
    assert_eq!(supervisor.running_count(), 0);
    Ok(())
}

#[tokio::test]
async fn realtime_without_handler_fails_on_non_zero_exit() {
    init_tracing();
    let supervisor = Supervisor::new();

    let err = with_timeout(supervisor.realtime_execution(
        "exit",
        &args(&["7"]),
        &ExecOptions::default(),
        None,
    ))
    .await
    .unwrap_err();

    assert_eq!(err.exit_code(), Some(7));
}

#[tokio::test]
async fn direct_spawn_of_missing_binary_fails_immediately() {
    init_tracing();
    let supervisor = Supervisor::new();
    let options = ExecOptions::default().with_shell(false);

    let err = with_timeout(supervisor.realtime_execution(
        "cmdexec-no-such-binary",
        &[],
        &options,
        None,
    ))
    .await
    .unwrap_err();

    assert!(matches!(err, ExecError::SpawnFailed { .. }), "got {err:?}");
    assert_eq!(supervisor.running_count(), 0);
}

#[tokio::test]
async fn direct_spawn_passes_args_verbatim() -> TestResult {
    init_tracing();
    let supervisor = Supervisor::new();
    let options = ExecOptions::default().with_shell(false);

    let out = with_timeout(supervisor.realtime_execution(
        "printf",
        &args(&["%s|%s", "a b", "$HOME"]),
        &options,
        None,
    ))
    .await?
    .into_output()
    .expect("no handler means buffered output");

    assert_eq!(out, "a b|$HOME");
    Ok(())
}

#[tokio::test]
async fn timeout_fires_when_a_background_child_holds_the_pipes() {
    init_tracing();
    let supervisor = Supervisor::new();
    let options = ExecOptions::default().with_timeout_ms(200);

    let started = Instant::now();
    let err = with_timeout(supervisor.execute("sleep 3 & echo hi", &options))
        .await
        .unwrap_err();

    assert!(matches!(err, ExecError::Timeout(200)), "got {err:?}");
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(supervisor.running_count(), 0);
}

#[tokio::test]
async fn realtime_without_handler_warns_on_stderr_with_zero_exit() -> TestResult {
    init_tracing();
    let supervisor = Supervisor::new();
    let mut events = supervisor.subscribe();

    let execution = with_timeout(supervisor.realtime_execution(
        "echo out; echo careful >&2",
        &[],
        &ExecOptions::default(),
        None,
    ))
    .await?;
    assert_eq!(execution.into_output().as_deref(), Some("out\n"));

    let queued = drain_events(&mut events);
    assert_eq!(queued.len(), 1, "expected exactly one event, got {queued:?}");
    match &queued[0] {
        SupervisorEvent::Warning { message, .. } => assert_eq!(message, "careful\n"),
        other => panic!("expected a warning, got {other:?}"),
    }
    Ok(())
}

//! Tests for cancellation signals.

use core::time::Duration;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use deferred_rail::async_ext::{abortable, AbortController, AbortSignal};
use deferred_rail::{AbortError, TimeoutError};

use super::FetchError;

#[tokio::test]
async fn pre_aborted_signal_skips_the_operation() {
    let polled = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&polled);
    let signal = AbortSignal::aborted();

    let result = abortable(
        async move {
            flag.store(true, Ordering::SeqCst);
            Ok::<_, FetchError>(1)
        },
        Some(&signal),
    )
    .await;

    assert_eq!(result, Err(FetchError::Aborted(AbortError::DEFAULT_MESSAGE.to_string())));
    assert!(!polled.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn abort_mid_flight_wins() {
    let controller = AbortController::new();
    let signal = controller.signal();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        controller.abort();
    });

    let result = abortable(
        async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, AbortError>("done")
        },
        Some(&signal),
    )
    .await;

    assert!(matches!(result, Err(AbortError::Aborted)));
    assert!(signal.is_aborted());
}

#[tokio::test]
async fn reason_is_reported() {
    let controller = AbortController::new();
    controller.abort_with(TimeoutError::with_message(Duration::from_secs(1), "user left"));

    let err = abortable(async { Ok::<(), AbortError>(()) }, Some(&controller.signal()))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "user left");
    assert!(err.reason().is_some());
    assert!(AbortError::is_abort_error(&err));
}

#[tokio::test]
async fn without_signal_outcome_passes_through() {
    let ok = abortable(async { Ok::<_, FetchError>(7) }, None).await;
    let err = abortable(async { Err::<u8, _>(FetchError::Custom("own")) }, None).await;

    assert_eq!(ok, Ok(7));
    assert_eq!(err, Err(FetchError::Custom("own")));
}

#[tokio::test]
async fn abort_after_completion_has_no_effect() {
    let controller = AbortController::new();
    let result = abortable(async { Ok::<_, AbortError>(3) }, Some(&controller.signal())).await;
    controller.abort();

    assert!(matches!(result, Ok(3)));
    assert!(controller.is_aborted());
}

#[tokio::test]
async fn signals_share_state() {
    let controller = AbortController::new();
    let first = controller.signal();
    let second = first.clone();

    controller.abort();
    first.cancelled().await;

    assert!(second.is_aborted());
    assert!(second.token().is_cancelled());
    assert!(matches!(second.error(), AbortError::Aborted));
}

#[test]
fn abort_errors_are_recognized() {
    let abort = AbortError::aborted();
    let timeout = TimeoutError::new(Duration::from_secs(1));

    assert!(AbortError::is_abort_error(&abort));
    assert!(!AbortError::is_abort_error(&timeout));
    assert_eq!(abort.to_string(), "This operation was aborted");
}

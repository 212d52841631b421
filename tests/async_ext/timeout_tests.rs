//! Tests for timeout races.

use core::time::Duration;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use deferred_rail::async_ext::{with_timeout, TimeoutErrorSpec};
use deferred_rail::TimeoutError;

use super::FetchError;

async fn after(ms: u64) -> Result<&'static str, FetchError> {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    Ok("value")
}

#[tokio::test(start_paused = true)]
async fn fast_future_wins() {
    let result = with_timeout(after(10), Duration::from_millis(100), TimeoutErrorSpec::Default).await;
    assert_eq!(result, Ok("value"));
}

#[tokio::test(start_paused = true)]
async fn slow_future_times_out_with_default_message() {
    let result = with_timeout(after(500), Duration::from_millis(100), TimeoutErrorSpec::Default).await;
    assert_eq!(result, Err(FetchError::Timeout("operation timed out after 100 ms".to_string())));
}

#[tokio::test(start_paused = true)]
async fn message_spec_sets_the_message() {
    let result = with_timeout(after(500), Duration::from_millis(100), "lookup stalled").await;
    assert_eq!(result, Err(FetchError::Timeout("lookup stalled".to_string())));
}

#[tokio::test(start_paused = true)]
async fn error_spec_is_used_as_is() {
    let result = with_timeout(
        after(500),
        Duration::from_millis(100),
        TimeoutErrorSpec::error(FetchError::Custom("too slow")),
    )
    .await;
    assert_eq!(result, Err(FetchError::Custom("too slow")));
}

#[tokio::test(start_paused = true)]
async fn factory_only_runs_on_timeout() {
    let invoked = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&invoked);
    let spec = TimeoutErrorSpec::error_factory(move || {
        flag.store(true, Ordering::SeqCst);
        FetchError::Custom("built lazily")
    });

    let result = with_timeout(after(10), Duration::from_millis(100), spec).await;
    assert_eq!(result, Ok("value"));
    assert!(!invoked.load(Ordering::SeqCst));

    let flag = Arc::clone(&invoked);
    let spec = TimeoutErrorSpec::factory(move || {
        flag.store(true, Ordering::SeqCst);
        TimeoutErrorSpec::message("nested")
    });
    let result = with_timeout(after(500), Duration::from_millis(100), spec).await;
    assert_eq!(result, Err(FetchError::Timeout("nested".to_string())));
    assert!(invoked.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn inner_error_passes_through() {
    let failing = async { Err::<(), _>(FetchError::Custom("inner")) };
    let result = with_timeout(failing, Duration::from_millis(100), TimeoutErrorSpec::Default).await;
    assert_eq!(result, Err(FetchError::Custom("inner")));
}

#[tokio::test(start_paused = true)]
async fn zero_duration_disables_the_timer() {
    let race = with_timeout(after(1_000), Duration::ZERO, TimeoutErrorSpec::Default);
    assert!(!race.is_armed());
    assert_eq!(race.await, Ok("value"));
}

#[tokio::test(start_paused = true)]
async fn timeout_error_carries_duration() {
    let result = with_timeout(
        std::future::pending::<Result<(), TimeoutError>>(),
        Duration::from_millis(250),
        TimeoutErrorSpec::Default,
    )
    .await;

    let err = result.unwrap_err();
    assert_eq!(err.duration(), Duration::from_millis(250));
    assert_eq!(err.message(), None);
}

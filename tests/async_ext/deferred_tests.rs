//! Tests for externally settled deferreds.

use core::time::Duration;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use deferred_rail::async_ext::{Deferred, DeferredOptions, Settlement, TimeoutErrorSpec};
use deferred_rail::TimeoutError;
use tokio::sync::mpsc;

use super::FetchError;

#[tokio::test]
async fn first_settlement_wins() {
    let deferred: Deferred<u32, String> = Deferred::new();

    assert!(deferred.is_pending());
    assert!(deferred.resolve(1));
    assert!(!deferred.resolve(2));
    assert!(!deferred.reject("late".to_string()));

    assert!(deferred.is_resolved());
    assert!(deferred.is_settled());
    assert!(!deferred.is_rejected());
    assert_eq!(deferred.state(), Settlement::Resolved(1));
    assert_eq!(deferred.wait().await, Ok(1));
}

#[tokio::test]
async fn rejection_is_observable_immediately() {
    let deferred: Deferred<u32, String> = Deferred::new();

    assert!(deferred.reject("boom".to_string()));
    assert!(deferred.is_rejected());
    assert_eq!(deferred.clone().await, Err("boom".to_string()));
}

#[tokio::test]
async fn waiters_see_a_later_settlement() {
    let deferred: Deferred<&'static str, ()> = Deferred::new();
    let waiter = tokio::spawn({
        let deferred = deferred.clone();
        async move { deferred.await }
    });

    tokio::task::yield_now().await;
    deferred.resolve("ready");

    assert_eq!(waiter.await.unwrap(), Ok("ready"));
}

#[tokio::test]
async fn hooks_run_after_the_settling_call_returns() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let resolved = tx.clone();
    let options = DeferredOptions::new()
        .on_resolve(move |value: &u32| {
            resolved.send(format!("resolve {}", value))?;
            Ok(())
        })
        .on_settle(move || {
            tx.send("settle".to_string())?;
            Ok(())
        });

    let deferred: Deferred<u32, String> = Deferred::with_options(options);
    deferred.resolve(3);

    assert!(rx.try_recv().is_err());
    assert_eq!(rx.recv().await.as_deref(), Some("resolve 3"));
    assert_eq!(rx.recv().await.as_deref(), Some("settle"));
}

#[tokio::test]
async fn hooks_fire_once() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let (tx, mut rx) = mpsc::unbounded_channel::<()>();
    let options = DeferredOptions::new().on_settle(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        tx.send(())?;
        Ok(())
    });

    let deferred: Deferred<u32, String> = Deferred::with_options(options);
    deferred.reject("a".to_string());
    deferred.reject("b".to_string());
    deferred.resolve(1);

    rx.recv().await;
    tokio::task::yield_now().await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn hook_failures_reach_on_error() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let options = DeferredOptions::new()
        .on_reject(|_: &String| Err("reject hook broke".into()))
        .on_settle(|| Ok(()))
        .on_error(move |err| {
            let _ = tx.send((err.hook(), err.into_source().to_string()));
        });

    let deferred: Deferred<u32, String> = Deferred::with_options(options);
    deferred.reject("nope".to_string());

    let (hook, message) = rx.recv().await.unwrap();
    assert_eq!(hook, "on_reject");
    assert_eq!(message, "reject hook broke");
    assert!(deferred.is_rejected());
}

#[tokio::test(start_paused = true)]
async fn timeout_rejects_pending_deferred() {
    let deferred: Deferred<u32, TimeoutError> = Deferred::with_timeout(
        Duration::from_millis(100),
        TimeoutErrorSpec::Default,
        DeferredOptions::default(),
    );

    let err = deferred.wait().await.unwrap_err();
    assert_eq!(err.duration(), Duration::from_millis(100));
    assert_eq!(err.to_string(), "operation timed out after 100 ms");
}

#[tokio::test(start_paused = true)]
async fn timeout_uses_custom_message() {
    let deferred: Deferred<u32, FetchError> = Deferred::with_timeout(
        Duration::from_millis(50),
        "upstream too slow",
        DeferredOptions::default(),
    );

    assert_eq!(deferred.await, Err(FetchError::Timeout("upstream too slow".to_string())));
}

#[tokio::test(start_paused = true)]
async fn settling_first_cancels_the_timer() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let options = DeferredOptions::new().on_reject(move |_: &FetchError| {
        tx.send(())?;
        Ok(())
    });
    let deferred: Deferred<u32, FetchError> =
        Deferred::with_timeout(Duration::from_millis(100), TimeoutErrorSpec::Default, options);

    assert!(deferred.resolve(9));
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_eq!(deferred.state(), Settlement::Resolved(9));
    assert!(rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn timeout_runs_reject_hooks() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let options = DeferredOptions::new().on_reject(move |err: &FetchError| {
        tx.send(err.clone())?;
        Ok(())
    });
    let _deferred: Deferred<u32, FetchError> = Deferred::with_timeout(
        Duration::from_millis(20),
        TimeoutErrorSpec::error(FetchError::Custom("deadline")),
        options,
    );

    assert_eq!(rx.recv().await, Some(FetchError::Custom("deadline")));
}

#[tokio::test(start_paused = true)]
async fn zero_timeout_never_fires() {
    let deferred: Deferred<u32, TimeoutError> =
        Deferred::with_timeout(Duration::ZERO, TimeoutErrorSpec::Default, DeferredOptions::default());

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(deferred.is_pending());
}

//! Deferred futures settled from the outside.
//!
//! A [`Deferred`] starts `Pending` and settles exactly once: the first call to
//! [`resolve`](Deferred::resolve) or [`reject`](Deferred::reject) wins and
//! every later call is ignored. The new state is observable as soon as the
//! settling call returns. Lifecycle hooks run later, on a spawned task, so a
//! settling call never re-enters its own hooks.
//!
//! # Examples
//!
//! ```rust
//! use deferred_rail::async_ext::Deferred;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let deferred: Deferred<u32, String> = Deferred::new();
//! let reader = deferred.clone();
//!
//! assert!(deferred.resolve(7));
//! assert!(!deferred.reject("too late".to_string()));
//! assert!(reader.is_resolved());
//! assert_eq!(reader.wait().await, Ok(7));
//! # }
//! ```

use core::fmt;
use core::future::IntoFuture;
use core::time::Duration;
use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::AbortHandle;

use crate::async_ext::timeout::TimeoutErrorSpec;
use crate::types::{BoxError, HookError, TimeoutError};

/// Outcome of a lifecycle hook. Failures are routed to `on_error`.
pub type HookResult = Result<(), BoxError>;

type ValueHook<V> = Arc<dyn Fn(&V) -> HookResult + Send + Sync>;
type SettleHook = Arc<dyn Fn() -> HookResult + Send + Sync>;
type ErrorHook = Arc<dyn Fn(HookError) + Send + Sync>;

/// Settlement state of a [`Deferred`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement<T, E> {
    Pending,
    Resolved(T),
    Rejected(E),
}

impl<T, E> Settlement<T, E> {
    #[inline]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    #[inline]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    #[inline]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    #[inline]
    pub fn is_settled(&self) -> bool {
        !self.is_pending()
    }

    /// Converts a settled state into its result; `None` while pending.
    pub fn into_result(self) -> Option<Result<T, E>> {
        match self {
            Self::Pending => None,
            Self::Resolved(value) => Some(Ok(value)),
            Self::Rejected(error) => Some(Err(error)),
        }
    }
}

/// Lifecycle hooks for a [`Deferred`].
///
/// `on_resolve` / `on_reject` run before `on_settle`, on the same spawned
/// task, at most once per deferred. A failing hook is reported to `on_error`;
/// without `on_error` the failure is logged at debug level and dropped.
pub struct DeferredOptions<T, E> {
    on_resolve: Option<ValueHook<T>>,
    on_reject: Option<ValueHook<E>>,
    on_settle: Option<SettleHook>,
    on_error: Option<ErrorHook>,
}

impl<T, E> Default for DeferredOptions<T, E> {
    fn default() -> Self {
        Self { on_resolve: None, on_reject: None, on_settle: None, on_error: None }
    }
}

impl<T, E> Clone for DeferredOptions<T, E> {
    fn clone(&self) -> Self {
        Self {
            on_resolve: self.on_resolve.clone(),
            on_reject: self.on_reject.clone(),
            on_settle: self.on_settle.clone(),
            on_error: self.on_error.clone(),
        }
    }
}

impl<T, E> fmt::Debug for DeferredOptions<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredOptions")
            .field("on_resolve", &self.on_resolve.is_some())
            .field("on_reject", &self.on_reject.is_some())
            .field("on_settle", &self.on_settle.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

impl<T, E> DeferredOptions<T, E> {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_resolve<F>(mut self, hook: F) -> Self
    where
        F: Fn(&T) -> HookResult + Send + Sync + 'static,
    {
        self.on_resolve = Some(Arc::new(hook));
        self
    }

    pub fn on_reject<F>(mut self, hook: F) -> Self
    where
        F: Fn(&E) -> HookResult + Send + Sync + 'static,
    {
        self.on_reject = Some(Arc::new(hook));
        self
    }

    pub fn on_settle<F>(mut self, hook: F) -> Self
    where
        F: Fn() -> HookResult + Send + Sync + 'static,
    {
        self.on_settle = Some(Arc::new(hook));
        self
    }

    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(HookError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(hook));
        self
    }

    fn is_empty(&self) -> bool {
        self.on_resolve.is_none() && self.on_reject.is_none() && self.on_settle.is_none()
    }

    fn run(&self, outcome: &Result<T, E>) {
        let first = match outcome {
            Ok(value) => self.on_resolve.as_ref().map(|hook| ("on_resolve", hook(value))),
            Err(error) => self.on_reject.as_ref().map(|hook| ("on_reject", hook(error))),
        };
        if let Some((name, Err(err))) = first {
            self.route(HookError::new(name, err));
        }

        if let Some(hook) = &self.on_settle {
            if let Err(err) = hook() {
                self.route(HookError::new("on_settle", err));
            }
        }
    }

    fn route(&self, error: HookError) {
        match &self.on_error {
            Some(on_error) => on_error(error),
            None => {
                let hook = error.hook();
                tracing::debug!(hook, error = %error.into_source(), "deferred hook failed");
            },
        }
    }
}

struct Shared<T, E> {
    state: watch::Sender<Settlement<T, E>>,
    hooks: DeferredOptions<T, E>,
    timer: Mutex<Option<AbortHandle>>,
}

/// A future with externally triggered settlement and observable state.
///
/// Cloning yields another handle to the same deferred; every handle can
/// settle it and every handle can await it.
pub struct Deferred<T, E> {
    shared: Arc<Shared<T, E>>,
}

impl<T, E> Clone for Deferred<T, E> {
    fn clone(&self) -> Self {
        Self { shared: Arc::clone(&self.shared) }
    }
}

impl<T: fmt::Debug, E: fmt::Debug> fmt::Debug for Deferred<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred").field("state", &*self.shared.state.borrow()).finish()
    }
}

impl<T, E> Default for Deferred<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> Deferred<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Creates a pending deferred without hooks.
    pub fn new() -> Self {
        Self::with_options(DeferredOptions::default())
    }

    /// Creates a pending deferred with lifecycle hooks.
    pub fn with_options(options: DeferredOptions<T, E>) -> Self {
        let (state, _) = watch::channel(Settlement::Pending);
        Self { shared: Arc::new(Shared { state, hooks: options, timer: Mutex::new(None) }) }
    }

    /// Creates a deferred that rejects itself with the error described by
    /// `spec` unless it settles within `duration`.
    ///
    /// Settling the deferred cancels the timer. A zero `duration` arms no
    /// timer. Hooks fire for a timeout rejection exactly as for a manual one.
    ///
    /// # Panics
    ///
    /// Panics if a non-zero timer is armed outside a Tokio runtime.
    pub fn with_timeout<S>(duration: Duration, spec: S, options: DeferredOptions<T, E>) -> Self
    where
        E: From<TimeoutError>,
        S: Into<TimeoutErrorSpec<E>>,
    {
        let deferred = Self::with_options(options);
        if duration.is_zero() {
            return deferred;
        }

        let spec = spec.into();
        let weak = Arc::downgrade(&deferred.shared);
        let task = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let Some(shared) = weak.upgrade() else {
                return;
            };
            let deferred = Deferred { shared };
            if deferred.is_pending() {
                tracing::debug!(timeout_ms = duration.as_millis() as u64, "deferred timed out");
                deferred.reject(spec.into_error(duration));
            }
        });
        *deferred.shared.timer.lock() = Some(task.abort_handle());

        deferred
    }

    /// Resolves with `value`. Returns `false` if already settled.
    pub fn resolve(&self, value: T) -> bool {
        self.settle(Settlement::Resolved(value))
    }

    /// Rejects with `error`. Returns `false` if already settled.
    pub fn reject(&self, error: E) -> bool {
        self.settle(Settlement::Rejected(error))
    }

    fn settle(&self, settlement: Settlement<T, E>) -> bool {
        let mut next = Some(settlement);
        let changed = self.shared.state.send_if_modified(|state| {
            if state.is_settled() {
                return false;
            }
            if let Some(next) = next.take() {
                *state = next;
            }
            true
        });

        if !changed {
            return false;
        }

        if let Some(timer) = self.shared.timer.lock().take() {
            timer.abort();
        }
        self.schedule_hooks();
        true
    }

    fn schedule_hooks(&self) {
        if self.shared.hooks.is_empty() {
            return;
        }
        let Some(outcome) = self.state().into_result() else {
            return;
        };

        let hooks = self.shared.hooks.clone();
        let run = move || hooks.run(&outcome);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move { run() });
            }
            Err(_) => {
                std::thread::spawn(run);
            }
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> Settlement<T, E> {
        self.shared.state.borrow().clone()
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.shared.state.borrow().is_pending()
    }

    #[inline]
    pub fn is_resolved(&self) -> bool {
        self.shared.state.borrow().is_resolved()
    }

    #[inline]
    pub fn is_rejected(&self) -> bool {
        self.shared.state.borrow().is_rejected()
    }

    #[inline]
    pub fn is_settled(&self) -> bool {
        self.shared.state.borrow().is_settled()
    }

    /// Waits for settlement and returns a clone of the outcome.
    pub async fn wait(&self) -> Result<T, E> {
        let mut receiver = self.shared.state.subscribe();
        loop {
            let current = receiver.borrow_and_update().clone();
            if let Some(outcome) = current.into_result() {
                return outcome;
            }
            // `self` keeps the sender alive, so the channel cannot close here.
            if receiver.changed().await.is_err() {
                return core::future::pending().await;
            }
        }
    }
}

impl<T, E> IntoFuture for Deferred<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    type Output = Result<T, E>;
    type IntoFuture = BoxFuture<'static, Result<T, E>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move { self.wait().await })
    }
}

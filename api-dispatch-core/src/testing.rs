//! Test utilities for api-dispatch applications
//!
//! - [`TestHarness`]: state plus a recording `forward` callback
//! - [`MockTransport`]: scripted responses, records every call
//! - Assertion macros for verifying forwarded actions
//!
//! # Example
//!
//! ```ignore
//! use api_dispatch::testing::{MockTransport, TestHarness};
//! use api_dispatch::{assert_type_emitted, object, ApiMiddleware, MiddlewareConfig, CALL_API};
//!
//! let transport = MockTransport::new().respond(Response::new(200));
//! let middleware = ApiMiddleware::with_config(MiddlewareConfig::default().with_fetch(transport));
//! let mut harness = TestHarness::new(AppState::default());
//!
//! harness
//!     .process(&middleware, object! { CALL_API => descriptor })
//!     .complete()
//!     .await;
//!
//! let actions = harness.drain_standard();
//! assert_type_emitted!(actions, "SUCCESS");
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{self, BoxFuture, FutureExt};
use tokio::sync::mpsc;

use crate::action::{AnyAction, StandardAction};
use crate::dispatch::DispatchResult;
use crate::error::TransportError;
use crate::middleware::ApiMiddleware;
use crate::transport::{Request, Response, Transport};

/// Test harness standing in for a host store.
///
/// Holds the state handed to `get_state` and records every action the
/// middleware forwards.
pub struct TestHarness<S> {
    state: Arc<Mutex<S>>,
    /// Sender for forwarded actions
    tx: mpsc::UnboundedSender<AnyAction<S>>,
    /// Receiver for draining forwarded actions
    rx: mpsc::UnboundedReceiver<AnyAction<S>>,
}

impl<S> TestHarness<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Create a new test harness with the given initial state.
    pub fn new(state: S) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            state: Arc::new(Mutex::new(state)),
            tx,
            rx,
        }
    }

    /// A snapshot of the current state
    pub fn state(&self) -> S {
        lock(&self.state).clone()
    }

    /// Replace the state
    pub fn set_state(&self, state: S) {
        *lock(&self.state) = state;
    }

    /// A `get_state` callback reading this harness's state
    pub fn get_state(&self) -> impl Fn() -> S + Send + Sync + 'static {
        let state = Arc::clone(&self.state);
        move || lock(&state).clone()
    }

    /// A `forward` callback recording into this harness
    pub fn forward(&self) -> impl Fn(AnyAction<S>) + Send + Sync + 'static {
        let tx = self.tx.clone();
        move |action| {
            let _ = tx.send(action);
        }
    }

    /// Record an action as if it had been forwarded
    pub fn emit(&self, action: impl Into<AnyAction<S>>) {
        let _ = self.tx.send(action.into());
    }

    /// Run `action` through `middleware` against this harness
    pub fn process(
        &self,
        middleware: &ApiMiddleware,
        action: impl Into<AnyAction<S>>,
    ) -> DispatchResult<()> {
        middleware.process_action(action.into(), self.get_state(), self.forward())
    }

    /// Drain all forwarded actions.
    pub fn drain_emitted(&mut self) -> Vec<AnyAction<S>> {
        let mut actions = Vec::new();
        while let Ok(action) = self.rx.try_recv() {
            actions.push(action);
        }
        actions
    }

    /// Drain forwarded standard actions, discarding pass-through records.
    pub fn drain_standard(&mut self) -> Vec<StandardAction> {
        self.drain_emitted()
            .into_iter()
            .filter_map(|action| match action {
                AnyAction::Standard(action) => Some(action),
                AnyAction::Record(_) => None,
            })
            .collect()
    }

    /// Check if any actions were forwarded.
    pub fn has_emitted(&mut self) -> bool {
        !self.drain_emitted().is_empty()
    }
}

impl<S> Default for TestHarness<S>
where
    S: Clone + Default + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(S::default())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
struct MockState {
    replies: VecDeque<Result<Response, TransportError>>,
    calls: Vec<(String, Request)>,
}

/// Transport replaying queued replies in order.
///
/// Clones share the same queue and call log. A call with nothing queued
/// fails with a transport error.
#[derive(Clone, Debug, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Create a transport with nothing queued
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response
    pub fn respond(self, response: Response) -> Self {
        lock(&self.inner).replies.push_back(Ok(response));
        self
    }

    /// Queue a transport failure
    pub fn fail(self, message: impl Into<String>) -> Self {
        lock(&self.inner)
            .replies
            .push_back(Err(TransportError::new(message)));
        self
    }

    /// Every call made so far, as `(endpoint, request)`
    pub fn calls(&self) -> Vec<(String, Request)> {
        lock(&self.inner).calls.clone()
    }

    /// Number of calls made so far
    pub fn call_count(&self) -> usize {
        lock(&self.inner).calls.len()
    }
}

impl Transport for MockTransport {
    fn fetch(
        &self,
        endpoint: &str,
        request: Request,
    ) -> BoxFuture<'static, Result<Response, TransportError>> {
        let mut inner = lock(&self.inner);
        inner.calls.push((endpoint.to_string(), request));
        let reply = inner.replies.pop_front().unwrap_or_else(|| {
            Err(TransportError::new(format!(
                "no response queued for {}",
                endpoint
            )))
        });
        future::ready(reply).boxed()
    }
}

/// Assert that a specific action was emitted.
///
/// # Example
///
/// ```ignore
/// use api_dispatch::assert_emitted;
///
/// let actions = harness.drain_standard();
/// assert_emitted!(actions, StandardAction { error: true, .. });
/// ```
#[macro_export]
macro_rules! assert_emitted {
    ($actions:expr, $pattern:pat $(if $guard:expr)?) => {
        assert!(
            $actions.iter().any(|a| matches!(a, $pattern $(if $guard)?)),
            "Expected action matching `{}` to be emitted, but got: {:?}",
            stringify!($pattern),
            $actions
        );
    };
}

/// Assert that a specific action was NOT emitted.
#[macro_export]
macro_rules! assert_not_emitted {
    ($actions:expr, $pattern:pat $(if $guard:expr)?) => {
        assert!(
            !$actions.iter().any(|a| matches!(a, $pattern $(if $guard)?)),
            "Expected action matching `{}` NOT to be emitted, but it was: {:?}",
            stringify!($pattern),
            $actions
        );
    };
}

/// Find and return the first action matching a pattern.
#[macro_export]
macro_rules! find_emitted {
    ($actions:expr, $pattern:pat $(if $guard:expr)?) => {
        $actions.iter().find(|a| matches!(a, $pattern $(if $guard)?))
    };
}

/// Count how many actions match a pattern.
#[macro_export]
macro_rules! count_emitted {
    ($actions:expr, $pattern:pat $(if $guard:expr)?) => {
        $actions.iter().filter(|a| matches!(a, $pattern $(if $guard)?)).count()
    };
}

/// Assert that an action with the given type name was emitted.
///
/// Works on any slice of [`Action`](crate::Action)s.
///
/// # Example
///
/// ```ignore
/// let actions = harness.drain_standard();
/// assert_type_emitted!(actions, "REQUEST");
/// ```
#[macro_export]
macro_rules! assert_type_emitted {
    ($actions:expr, $name:expr) => {
        assert!(
            $actions.iter().any(|a| {
                use $crate::Action;
                a.name() == $name
            }),
            "Expected action of type `{}` to be emitted, but got: {:?}",
            $name,
            $actions
        );
    };
}

/// Count how many actions have the given type name.
#[macro_export]
macro_rules! count_type {
    ($actions:expr, $name:expr) => {{
        use $crate::Action;
        $actions.iter().filter(|a| a.name() == $name).count()
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object;
    use serde_json::json;

    #[test]
    fn test_harness_emit_and_drain() {
        let mut harness = TestHarness::new(());

        harness.emit(StandardAction::new("FOO"));
        harness.emit(object! { "type" => "BAR" });

        let actions = harness.drain_emitted();
        assert_eq!(actions.len(), 2);
        assert!(actions[0].as_standard().is_some());
        assert!(actions[1].as_record().is_some());

        // Drain again should be empty
        assert!(harness.drain_emitted().is_empty());
    }

    #[test]
    fn test_drain_standard_skips_records() {
        let mut harness = TestHarness::new(());
        harness.emit(object! { "type" => "BAR" });
        harness.emit(StandardAction::new("FOO"));
        assert_eq!(harness.drain_standard(), vec![StandardAction::new("FOO")]);
    }

    #[test]
    fn test_state_accessors() {
        let harness = TestHarness::new(1u32);
        let get_state = harness.get_state();
        harness.set_state(2);
        assert_eq!(get_state(), 2);
        assert_eq!(harness.state(), 2);
    }

    #[tokio::test]
    async fn test_mock_transport_replays_in_order() {
        let transport = MockTransport::new()
            .respond(Response::new(201))
            .fail("connection refused");

        let first = transport.fetch("http://a", Request::default()).await.unwrap();
        assert_eq!(first.status(), 201);

        let second = transport.fetch("http://b", Request::default()).await;
        assert_eq!(second.unwrap_err().message(), "connection refused");

        let third = transport.fetch("http://c", Request::default()).await;
        assert_eq!(third.unwrap_err().message(), "no response queued for http://c");

        let endpoints: Vec<_> = transport.calls().into_iter().map(|(endpoint, _)| endpoint).collect();
        assert_eq!(endpoints, ["http://a", "http://b", "http://c"]);
    }

    #[test]
    fn test_assert_macros() {
        let actions = vec![
            StandardAction::new("REQUEST"),
            StandardAction::new("SUCCESS").with_payload(json!({ "id": 1 })),
        ];

        assert_emitted!(actions, StandardAction { error: false, .. });
        assert_not_emitted!(actions, StandardAction { error: true, .. });
        assert_type_emitted!(actions, "SUCCESS");
        assert_eq!(count_type!(actions, "REQUEST"), 1);
        assert_eq!(count_emitted!(actions, StandardAction { payload: None, .. }), 1);

        let found = find_emitted!(actions, StandardAction { payload: Some(_), .. });
        assert_eq!(found.and_then(StandardAction::payload_json), Some(&json!({ "id": 1 })));
    }
}

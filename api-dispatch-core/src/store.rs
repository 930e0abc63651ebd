//! Reducer store fronted by the API middleware
//!
//! [`StoreWithMiddleware`] is the smallest host pipeline the middleware can
//! sit in: dispatched actions go through [`ApiMiddleware`], and whatever it
//! forwards is reduced into the state, then handed to the optional
//! [`ActionLogger`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use crate::action::AnyAction;
use crate::dispatch::DispatchResult;
use crate::logger::ActionLogger;
use crate::middleware::ApiMiddleware;

/// A reducer function that handles actions and mutates state
///
/// Returns `true` if the state changed.
pub type Reducer<S> = fn(&mut S, &AnyAction<S>) -> bool;

/// State and reducer behind an [`ApiMiddleware`]
///
/// # Example
/// ```ignore
/// fn reducer(state: &mut AppState, action: &AnyAction<AppState>) -> bool {
///     match action.name().as_ref() {
///         "USERS_REQUEST" => {
///             state.loading = true;
///             true
///         }
///         _ => false,
///     }
/// }
///
/// let store = StoreWithMiddleware::new(AppState::default(), reducer);
/// store.dispatch(fetch_users()).complete().await;
/// ```
pub struct StoreWithMiddleware<S> {
    state: Arc<RwLock<S>>,
    reducer: Reducer<S>,
    api: ApiMiddleware,
    logger: Option<Arc<Mutex<ActionLogger>>>,
}

impl<S> StoreWithMiddleware<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Create a store with a default [`ApiMiddleware`] and no logger
    pub fn new(state: S, reducer: Reducer<S>) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
            reducer,
            api: ApiMiddleware::new(),
            logger: None,
        }
    }

    /// Replace the API middleware
    pub fn with_api(mut self, api: ApiMiddleware) -> Self {
        self.api = api;
        self
    }

    /// Log every reduced action
    pub fn with_logger(mut self, logger: ActionLogger) -> Self {
        self.logger = Some(Arc::new(Mutex::new(logger)));
        self
    }

    /// Dispatch an action
    ///
    /// Untagged actions are reduced immediately. For API call actions the
    /// returned lifecycle must be awaited or spawned; each lifecycle action
    /// is reduced as it is forwarded.
    pub fn dispatch(&self, action: impl Into<AnyAction<S>>) -> DispatchResult<bool> {
        let state = Arc::clone(&self.state);
        let reducer = self.reducer;
        let logger = self.logger.clone();
        let forward = move |action: AnyAction<S>| {
            let changed = reducer(&mut state.write().unwrap_or_else(PoisonError::into_inner), &action);
            if let Some(logger) = &logger {
                lock(logger).record(&action, changed);
            }
            changed
        };

        let state = Arc::clone(&self.state);
        let get_state = move || state.read().unwrap_or_else(PoisonError::into_inner).clone();
        self.api.process_action(action.into(), get_state, forward)
    }

    /// A snapshot of the current state
    pub fn state(&self) -> S {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The API middleware
    pub fn api(&self) -> &ApiMiddleware {
        &self.api
    }

    /// Lock the logger, if one was set
    pub fn logger(&self) -> Option<MutexGuard<'_, ActionLogger>> {
        self.logger.as_deref().map(lock)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

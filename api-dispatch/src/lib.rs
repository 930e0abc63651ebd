//! api-dispatch: declarative API calls for Redux-style stores
//!
//! Dispatch a record tagged with [`CALL_API`] and the middleware performs
//! the HTTP call, forwarding a request action before it and a success or
//! failure action after it. Everything else passes through untouched.
//!
//! # Example
//! ```ignore
//! use api_dispatch::prelude::*;
//!
//! let action: Value<AppState> = object! {
//!     CALL_API => object! {
//!         "endpoint" => Value::state_fn(|state: &AppState| Ok(state.users_url().into())),
//!         "method" => "GET",
//!         "headers" => object! { "Accept" => "application/json" },
//!         "types" => vec!["USERS_REQUEST", "USERS_SUCCESS", "USERS_FAILURE"],
//!     },
//! };
//!
//! let store = StoreWithMiddleware::new(AppState::default(), reducer)
//!     .with_logger(ActionLogger::new(ActionFilter::default()));
//! store.dispatch(action).complete().await;
//! ```

// Re-export everything from core
pub use api_dispatch_core::*;

/// Prelude for convenient imports
pub mod prelude {
    // Actions and values
    pub use api_dispatch_core::{
        object, Action, ActionType, AnyAction, Payload, StandardAction, Symbol, Value, CALL_API,
    };

    // Engine
    pub use api_dispatch_core::{
        validate, ApiError, ApiMiddleware, CallError, DispatchResult, MiddlewareConfig, Outcome,
    };

    // Transport
    pub use api_dispatch_core::{Method, Request, Response, Transport};

    // Store and logging
    pub use api_dispatch_core::{ActionFilter, ActionLogger, Reducer, StoreWithMiddleware};
}

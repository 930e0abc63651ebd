//! Core traits and types for api-dispatch
//!
//! This crate turns declarative API call actions into HTTP requests and
//! lifecycle actions, following a Redux-inspired middleware architecture.
//!
//! # Core Concepts
//!
//! - **Tagged action**: a record carrying a [`CALL_API`] descriptor
//! - **Validator**: reports every structural defect of a tagged action
//! - **ApiMiddleware**: runs the request / success / failure lifecycle
//! - **Transport**: performs the HTTP call; reqwest-backed by default
//! - **Store**: reducer-based state container fronted by the middleware
//! - **Logger**: glob-filtered logging of reduced lifecycle actions
//!
//! # Basic Example
//!
//! ```ignore
//! use api_dispatch_core::prelude::*;
//!
//! let action: Value<AppState> = object! {
//!     CALL_API => object! {
//!         "endpoint" => "https://api.example.com/users/1",
//!         "method" => "GET",
//!         "types" => vec!["USER_REQUEST", "USER_SUCCESS", "USER_FAILURE"],
//!     },
//! };
//!
//! let store = StoreWithMiddleware::new(AppState::default(), reducer)
//!     .with_logger(ActionLogger::new(ActionFilter::default()));
//! match store.dispatch(action) {
//!     DispatchResult::Forwarded(changed) => { /* plain action, already reduced */ }
//!     DispatchResult::Pending(call) => {
//!         tokio::spawn(call);
//!     }
//! }
//! ```
//!
//! # Lifecycle
//!
//! For a valid tagged action the middleware:
//!
//! 1. Resolves `endpoint`, `body`, `headers` and `options` against the state
//! 2. Evaluates `bailout` and stops silently if it holds
//! 3. Forwards the request action
//! 4. Calls the transport
//! 5. Forwards the success action, or the failure action with `error: true`
//!
//! Every failure along the way ends up as the payload of a forwarded
//! failure action; nothing is returned to the caller as an error.

pub mod action;
pub mod config;
pub mod descriptor;
pub mod dispatch;
pub mod error;
pub mod logger;
pub mod middleware;
pub mod store;
pub mod testing;
pub mod transport;
pub mod validation;
pub mod value;

// Core trait exports
pub use action::{Action, ActionSummary, ActionType, AnyAction, Payload, StandardAction, Symbol};

// Engine exports
pub use config::MiddlewareConfig;
pub use descriptor::{action_with, normalize_types, CallDescriptor, DescriptorArgs, TypeDescriptor};
pub use dispatch::{DispatchResult, Outcome};
pub use error::{ApiError, BoxError, CallError, TransportError};
pub use middleware::ApiMiddleware;
pub use validation::{is_tagged, is_valid, is_valid_type_descriptor, validate, CALL_API};
pub use value::{Function, Object, Value};

// Transport exports
#[cfg(feature = "reqwest")]
pub use transport::ReqwestTransport;
pub use transport::{
    get_json, transport_fn, Credentials, Headers, Method, Request, Response, Transport,
    UnavailableTransport,
};

// Store exports
pub use logger::{glob_match, ActionFilter, ActionLogger, LoggedAction};
pub use store::{Reducer, StoreWithMiddleware};

// Testing exports
pub use testing::{MockTransport, TestHarness};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::action::{Action, ActionType, AnyAction, Payload, StandardAction, Symbol};
    pub use crate::config::MiddlewareConfig;
    pub use crate::dispatch::{DispatchResult, Outcome};
    pub use crate::error::{ApiError, CallError};
    pub use crate::logger::{ActionFilter, ActionLogger};
    pub use crate::middleware::ApiMiddleware;
    pub use crate::object;
    pub use crate::store::{Reducer, StoreWithMiddleware};
    pub use crate::transport::{Method, Request, Response, Transport};
    pub use crate::validation::{validate, CALL_API};
    pub use crate::value::Value;
}

//! Middleware-wide defaults
//!
//! Per-call `fetch` and `ok` keys on a descriptor override the values here.
//!
//! # Example
//!
//! ```ignore
//! use api_dispatch_core::{ApiMiddleware, MiddlewareConfig};
//!
//! let config = MiddlewareConfig::default()
//!     .with_ok(|response| Ok(response.status() < 400))
//!     .with_before(|_endpoint, mut request| {
//!         request.headers.insert("Accept".into(), "application/json".into());
//!         request
//!     });
//! let middleware = ApiMiddleware::with_config(config);
//! ```

use std::fmt;
use std::sync::Arc;

use crate::error::BoxError;
use crate::transport::{Request, Response, Transport};
use crate::value::OkFn;

/// Hook applied to every request before it reaches the transport
pub type RequestHook = Arc<dyn Fn(&str, Request) -> Request + Send + Sync>;

/// Hook applied to every response before it is classified
pub type ResponseHook = Arc<dyn Fn(Response) -> Response + Send + Sync>;

/// Defaults shared by every call a middleware handles
#[derive(Clone)]
pub struct MiddlewareConfig {
    /// Default `ok` predicate
    pub ok: OkFn,
    /// Default transport
    pub fetch: Arc<dyn Transport>,
    /// Request transform
    pub before: Option<RequestHook>,
    /// Response transform
    pub after: Option<ResponseHook>,
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        Self {
            ok: Arc::new(|response: &Response| Ok(response.ok())),
            fetch: default_transport(),
            before: None,
            after: None,
        }
    }
}

#[cfg(feature = "reqwest")]
fn default_transport() -> Arc<dyn Transport> {
    Arc::new(crate::transport::ReqwestTransport::new())
}

#[cfg(not(feature = "reqwest"))]
fn default_transport() -> Arc<dyn Transport> {
    Arc::new(crate::transport::UnavailableTransport)
}

impl MiddlewareConfig {
    /// Replace the default `ok` predicate
    pub fn with_ok<F>(mut self, ok: F) -> Self
    where
        F: Fn(&Response) -> Result<bool, BoxError> + Send + Sync + 'static,
    {
        self.ok = Arc::new(ok);
        self
    }

    /// Replace the default transport
    pub fn with_fetch<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.fetch = Arc::new(transport);
        self
    }

    /// Transform every outgoing request
    pub fn with_before<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, Request) -> Request + Send + Sync + 'static,
    {
        self.before = Some(Arc::new(hook));
        self
    }

    /// Transform every response before classification
    pub fn with_after<F>(mut self, hook: F) -> Self
    where
        F: Fn(Response) -> Response + Send + Sync + 'static,
    {
        self.after = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for MiddlewareConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareConfig")
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ok_is_status_range() {
        let config = MiddlewareConfig::default();
        assert!((config.ok)(&Response::new(200)).unwrap());
        assert!((config.ok)(&Response::new(299)).unwrap());
        assert!(!(config.ok)(&Response::new(304)).unwrap());
        assert!(!(config.ok)(&Response::new(500)).unwrap());
    }

    #[test]
    fn test_builders() {
        let config = MiddlewareConfig::default()
            .with_ok(|response| Ok(response.status() == 404))
            .with_after(|response| response.with_status_text("rewritten"));
        assert!((config.ok)(&Response::new(404)).unwrap());
        let after = config.after.as_ref().unwrap();
        assert_eq!(after(Response::new(200)).status_text(), "rewritten");
        assert!(format!("{:?}", config).contains("after: true"));
    }
}

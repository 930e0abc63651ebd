//! Transport boundary: requests, responses and the pluggable fetch function
//!
//! The middleware never talks to the network itself. It builds a [`Request`]
//! and hands it to a [`Transport`], which resolves to a buffered
//! [`Response`] or fails with a [`TransportError`].
//!
//! # Example
//!
//! ```ignore
//! use api_dispatch_core::transport::{transport_fn, Response};
//!
//! let transport = transport_fn(|endpoint, request| async move {
//!     Ok(Response::new(200).with_json(&serde_json::json!({ "endpoint": endpoint })))
//! });
//! ```

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use indexmap::IndexMap;

use crate::error::TransportError;

/// HTTP verbs accepted in a call descriptor
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Method {
    #[default]
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Method {
    /// Every accepted method
    pub const ALL: [Method; 7] = [
        Method::Get,
        Method::Head,
        Method::Post,
        Method::Put,
        Method::Patch,
        Method::Delete,
        Method::Options,
    ];

    /// Uppercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
        }
    }

    /// Parse a method name, ignoring case
    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.to_uppercase();
        Self::ALL.into_iter().find(|m| m.as_str() == upper)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credentials policy passed through to the transport
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Credentials {
    Omit,
    SameOrigin,
    Include,
}

impl Credentials {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Credentials::Omit => "omit",
            Credentials::SameOrigin => "same-origin",
            Credentials::Include => "include",
        }
    }

    /// Parse a wire name (exact match)
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "omit" => Some(Credentials::Omit),
            "same-origin" => Some(Credentials::SameOrigin),
            "include" => Some(Credentials::Include),
            _ => None,
        }
    }
}

/// A request ready to be handed to a transport
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Request {
    /// HTTP method
    pub method: Method,
    /// Request headers, in insertion order
    pub headers: IndexMap<String, String>,
    /// Body: strings are sent verbatim, anything else as JSON
    pub body: Option<serde_json::Value>,
    /// Credentials policy
    pub credentials: Option<Credentials>,
    /// Transport-specific extras
    pub options: serde_json::Map<String, serde_json::Value>,
}

/// Response headers with case-insensitive lookup
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Headers {
    entries: IndexMap<String, String>,
}

impl Headers {
    /// Look up a header by name, ignoring case
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Insert or replace a header
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.entries
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    /// Iterate over `(lowercase name, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of headers
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no headers
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::default();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

/// A fully buffered HTTP response. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Response {
    status: u16,
    status_text: String,
    headers: Arc<Headers>,
    body: Arc<[u8]>,
}

impl Response {
    /// Create an empty response with the given status
    ///
    /// The status text defaults to the canonical reason phrase.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            status_text: canonical_reason(status).to_string(),
            headers: Arc::new(Headers::default()),
            body: Arc::from(Vec::new()),
        }
    }

    /// Assemble a response from already-read parts
    pub fn from_parts(status: u16, status_text: String, headers: Headers, body: Vec<u8>) -> Self {
        Self {
            status,
            status_text,
            headers: Arc::new(headers),
            body: Arc::from(body),
        }
    }

    /// Set the status text
    pub fn with_status_text(mut self, status_text: impl Into<String>) -> Self {
        self.status_text = status_text.into();
        self
    }

    /// Add a header
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.headers).insert(name, value);
        self
    }

    /// Set the raw body
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Arc::from(body.into());
        self
    }

    /// Set a JSON body and an `application/json` content type
    pub fn with_json(self, body: &serde_json::Value) -> Self {
        self.with_header("Content-Type", "application/json")
            .with_body(body.to_string())
    }

    /// HTTP status code
    pub fn status(&self) -> u16 {
        self.status
    }

    /// HTTP reason phrase
    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// Whether the status is in the 200..=299 range
    pub fn ok(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    /// Response headers
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Raw body bytes
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as text, replacing invalid UTF-8
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Parse the body as JSON
    pub async fn json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Parse the body as JSON if the response declares a JSON content type.
///
/// Returns `Ok(None)` when the `Content-Type` header does not contain
/// `"json"`, whatever the status. A JSON response with an unparsable body
/// is an error.
pub async fn get_json(response: &Response) -> Result<Option<serde_json::Value>, serde_json::Error> {
    match response.headers().get("Content-Type") {
        Some(content_type) if content_type.contains("json") => response.json().await.map(Some),
        _ => Ok(None),
    }
}

/// Canonical reason phrase for a status code, empty when there is none
fn canonical_reason(status: u16) -> &'static str {
    ::http::StatusCode::from_u16(status)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or_default()
}

/// A fetch-like function performing one HTTP call.
///
/// Returns a boxed future so the trait stays dyn-compatible; implementations
/// must not borrow from `self` or `endpoint` inside the future.
pub trait Transport: Send + Sync {
    /// Perform the call described by `request` against `endpoint`
    fn fetch(&self, endpoint: &str, request: Request)
        -> BoxFuture<'static, Result<Response, TransportError>>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn fetch(
        &self,
        endpoint: &str,
        request: Request,
    ) -> BoxFuture<'static, Result<Response, TransportError>> {
        (**self).fetch(endpoint, request)
    }
}

/// Transport built from an async closure. See [`transport_fn`].
#[derive(Clone)]
pub struct FnTransport<F> {
    f: F,
}

impl<F> fmt::Debug for FnTransport<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTransport").finish_non_exhaustive()
    }
}

/// Turn an async closure `(endpoint, request) -> Result<Response, _>` into a transport
pub fn transport_fn<F, Fut>(f: F) -> FnTransport<F>
where
    F: Fn(String, Request) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response, TransportError>> + Send + 'static,
{
    FnTransport { f }
}

impl<F, Fut> Transport for FnTransport<F>
where
    F: Fn(String, Request) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response, TransportError>> + Send + 'static,
{
    fn fetch(
        &self,
        endpoint: &str,
        request: Request,
    ) -> BoxFuture<'static, Result<Response, TransportError>> {
        (self.f)(endpoint.to_string(), request).boxed()
    }
}

/// Transport that fails every call. Default when the `reqwest` feature is off.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnavailableTransport;

impl Transport for UnavailableTransport {
    fn fetch(
        &self,
        endpoint: &str,
        _request: Request,
    ) -> BoxFuture<'static, Result<Response, TransportError>> {
        let error = TransportError::new(format!("no transport configured for {}", endpoint));
        futures::future::ready(Err(error)).boxed()
    }
}

#[cfg(feature = "reqwest")]
pub use self::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
mod http {
    use super::*;

    /// Default transport backed by a shared [`reqwest::Client`].
    ///
    /// Credentials and options are browser/fetch concepts and are ignored.
    #[derive(Clone, Debug, Default)]
    pub struct ReqwestTransport {
        client: reqwest::Client,
    }

    impl ReqwestTransport {
        /// Create a transport with a default client
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a transport around an existing client
        pub fn with_client(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    impl Transport for ReqwestTransport {
        fn fetch(
            &self,
            endpoint: &str,
            request: Request,
        ) -> BoxFuture<'static, Result<Response, TransportError>> {
            let method = match reqwest::Method::from_bytes(request.method.as_str().as_bytes()) {
                Ok(method) => method,
                Err(e) => return futures::future::ready(Err(TransportError::new(e.to_string()))).boxed(),
            };

            let mut builder = self.client.request(method, endpoint);
            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }
            builder = match request.body {
                Some(serde_json::Value::String(text)) => builder.body(text),
                Some(body) => builder.json(&body),
                None => builder,
            };

            async move {
                let response = builder.send().await?;
                let status = response.status();
                let status_text = canonical_reason(status.as_u16()).to_string();
                let headers = response
                    .headers()
                    .iter()
                    .filter_map(|(name, value)| {
                        value.to_str().ok().map(|value| (name.as_str().to_string(), value.to_string()))
                    })
                    .collect::<Headers>();
                let body = response.bytes().await?;
                Ok(Response::from_parts(
                    status.as_u16(),
                    status_text,
                    headers,
                    body.to_vec(),
                ))
            }
            .boxed()
        }
    }
}

//! The API call middleware
//!
//! [`ApiMiddleware::process_action`] is the single entry point. Untagged
//! actions pass straight through; tagged actions are validated, their
//! dynamic fields resolved against the current state, and the call is
//! translated into request and success/failure actions handed to `forward`.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::action::{Action, AnyAction, StandardAction};
use crate::config::MiddlewareConfig;
use crate::descriptor::{action_with, request_type, CallDescriptor, DescriptorArgs, TypeDescriptor};
use crate::dispatch::{DispatchResult, Outcome};
use crate::error::{BoxError, CallError};
use crate::transport::{Request, Response, Transport};
use crate::validation::is_tagged;
use crate::value::{is_truthy, Function, Value};

/// Middleware translating API call actions into lifecycle actions
#[derive(Clone, Debug, Default)]
pub struct ApiMiddleware {
    config: Arc<MiddlewareConfig>,
}

impl ApiMiddleware {
    /// Create a middleware with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a middleware with custom defaults
    pub fn with_config(config: MiddlewareConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// The middleware defaults
    pub fn config(&self) -> &MiddlewareConfig {
        &self.config
    }

    /// Process one action.
    ///
    /// `get_state` is called whenever a field, payload or meta function
    /// needs the current state. Every action this middleware produces goes
    /// through `forward`.
    pub fn process_action<S, R, G, F>(
        &self,
        action: AnyAction<S>,
        get_state: G,
        forward: F,
    ) -> DispatchResult<R>
    where
        S: Send + Sync + 'static,
        R: Send + 'static,
        G: Fn() -> S + Send + Sync + 'static,
        F: Fn(AnyAction<S>) -> R + Send + Sync + 'static,
    {
        let record = match action {
            AnyAction::Record(record) if is_tagged(&record) => record,
            action => {
                tracing::trace!(action = %action.name(), "Passing action through");
                return DispatchResult::Forwarded(forward(action));
            }
        };

        let call = Lifecycle {
            config: Arc::clone(&self.config),
            action: Arc::new(record),
            get_state,
            forward,
        };
        DispatchResult::Pending(Box::pin(call.run()))
    }
}

/// One tagged action on its way through the lifecycle
struct Lifecycle<S, G, F> {
    config: Arc<MiddlewareConfig>,
    action: Arc<Value<S>>,
    get_state: G,
    forward: F,
}

impl<S, R, G, F> Lifecycle<S, G, F>
where
    S: Send + Sync + 'static,
    R: Send + 'static,
    G: Fn() -> S + Send + Sync + 'static,
    F: Fn(AnyAction<S>) -> R + Send + Sync + 'static,
{
    async fn run(self) -> Outcome<R> {
        let call = match CallDescriptor::from_action(&self.action) {
            Ok(call) => call,
            Err(defects) => return self.reject(defects),
        };

        let (endpoint, request) = match self.resolve_request(&call) {
            Ok(resolved) => resolved,
            Err(error) => return self.fail(&call.failure, error, None).await,
        };

        match self.should_bail_out(&call) {
            Ok(true) => {
                tracing::debug!(%endpoint, "Bailing out of API call");
                return Outcome::BailedOut;
            }
            Ok(false) => {}
            Err(error) => return self.fail(&call.failure, error, None).await,
        }

        let request_action = action_with(&call.request, &self.args(None)).await;
        tracing::debug!(action = %request_action.name(), %endpoint, "Forwarding request action");
        (self.forward)(request_action.into());

        let transport: Arc<dyn Transport> = match &call.fetch {
            None => Arc::clone(&self.config.fetch),
            Some(Function::Fetch(transport)) => Arc::clone(transport),
            Some(_) => {
                return self
                    .fail(&call.failure, CallError::field_failed("fetch"), None)
                    .await
            }
        };
        let request = match &self.config.before {
            Some(before) => before(&endpoint, request),
            None => request,
        };

        tracing::debug!(%endpoint, method = %request.method, "Calling API");
        let response = match transport.fetch(&endpoint, request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(%endpoint, error = %e, "Transport failed");
                return self
                    .fail(&call.failure, CallError::request(e.message()), None)
                    .await;
            }
        };
        let response = match &self.config.after {
            Some(after) => after(response),
            None => response,
        };

        let ok = match &call.ok {
            None => (self.config.ok)(&response),
            Some(Function::Ok(ok)) => ok(&response),
            Some(other) => Err(format!("{:?} cannot classify a response", other).into()),
        };
        match ok {
            Ok(true) => {
                tracing::debug!(status = response.status(), "API call succeeded");
                let success = action_with(&call.success, &self.args(Some(response))).await;
                Outcome::Forwarded((self.forward)(success.into()))
            }
            Ok(false) => {
                tracing::debug!(status = response.status(), "API call failed");
                let failure = call.failure.clone().errored();
                let failure = action_with(&failure, &self.args(Some(response))).await;
                Outcome::Forwarded((self.forward)(failure.into()))
            }
            Err(e) => {
                tracing::debug!(error = %e, "ok predicate failed");
                let error = CallError::internal("[CALL_API].ok function failed");
                self.fail(&call.failure, error, Some(response)).await
            }
        }
    }

    fn args(&self, response: Option<Response>) -> DescriptorArgs<S> {
        DescriptorArgs {
            action: Arc::clone(&self.action),
            state: (self.get_state)(),
            response,
        }
    }

    /// Report a malformed action through its request type, if it has one
    fn reject(&self, defects: Vec<String>) -> Outcome<R> {
        match request_type(&self.action) {
            Some(action_type) => {
                tracing::debug!(action = %action_type, ?defects, "Rejecting malformed API call");
                let error = StandardAction::error(action_type, CallError::Malformed { defects });
                Outcome::Forwarded((self.forward)(error.into()))
            }
            None => {
                tracing::warn!(?defects, "Dropping malformed API call without a request type");
                Outcome::Dropped
            }
        }
    }

    /// Forward a failure action whose payload is `error`
    async fn fail(
        &self,
        failure: &TypeDescriptor<S>,
        error: CallError,
        response: Option<Response>,
    ) -> Outcome<R> {
        let descriptor = failure.clone().with_payload(error).errored();
        let action = action_with(&descriptor, &self.args(response)).await;
        Outcome::Forwarded((self.forward)(action.into()))
    }

    fn resolve_request(&self, call: &CallDescriptor<S>) -> Result<(String, Request), CallError> {
        let endpoint = match self.resolve("endpoint", Some(&call.endpoint))? {
            Some(serde_json::Value::String(endpoint)) => endpoint,
            _ => return Err(CallError::field_failed("endpoint")),
        };

        let body = self
            .resolve("body", call.body.as_ref())?
            .filter(is_truthy);

        let headers = match self.resolve("headers", call.headers.as_ref())? {
            None | Some(serde_json::Value::Null) => IndexMap::new(),
            // Null entries are not sent
            Some(serde_json::Value::Object(headers)) => headers
                .into_iter()
                .filter_map(|(name, value)| match value {
                    serde_json::Value::Null => None,
                    serde_json::Value::String(value) => Some((name, value)),
                    other => Some((name, other.to_string())),
                })
                .collect(),
            Some(_) => return Err(CallError::field_failed("headers")),
        };

        let options = match self.resolve("options", call.options.as_ref())? {
            None | Some(serde_json::Value::Null) => serde_json::Map::new(),
            Some(serde_json::Value::Object(options)) => options,
            Some(_) => return Err(CallError::field_failed("options")),
        };

        Ok((
            endpoint,
            Request {
                method: call.method,
                headers,
                body,
                credentials: call.credentials,
                options,
            },
        ))
    }

    fn should_bail_out(&self, call: &CallDescriptor<S>) -> Result<bool, CallError> {
        match &call.bailout {
            None => Ok(false),
            Some(Value::Bool(bailout)) => Ok(*bailout),
            Some(bailout) => Ok(self
                .resolve("bailout", Some(bailout))?
                .is_some_and(|value| is_truthy(&value))),
        }
    }

    /// Resolve a descriptor field against the current state
    fn resolve(
        &self,
        field: &str,
        value: Option<&Value<S>>,
    ) -> Result<Option<serde_json::Value>, CallError> {
        let Some(value) = value else {
            return Ok(None);
        };
        resolve(value, &(self.get_state)())
            .map(Some)
            .map_err(|e| {
                tracing::debug!(field, error = %e, "Field resolution failed");
                CallError::field_failed(field)
            })
    }
}

/// Resolve a literal or a function of state to JSON
pub fn resolve<S>(value: &Value<S>, state: &S) -> Result<serde_json::Value, BoxError> {
    match value {
        Value::Function(Function::State(f)) => f(state),
        Value::Function(other) => Err(format!("{:?} is not a function of state", other).into()),
        Value::Pending(_) => Err("pending values cannot be resolved synchronously".into()),
        literal => literal
            .to_json()
            .ok_or_else(|| BoxError::from("value contains a function")),
    }
}

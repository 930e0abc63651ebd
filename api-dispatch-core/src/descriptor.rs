//! Call descriptors and lifecycle action construction
//!
//! A validated action is parsed into a [`CallDescriptor`]; its three
//! `types` entries become [`TypeDescriptor`]s, from which [`action_with`]
//! builds the request, success and failure actions.

use std::fmt;
use std::sync::Arc;

use crate::action::{ActionType, Payload, StandardAction};
use crate::error::{ApiError, CallError};
use crate::transport::{get_json, Credentials, Method, Response};
use crate::validation::{validate, CALL_API};
use crate::value::{DescriptorFn, Function, PendingValue, Value};

/// Where a lifecycle action's `payload` or `meta` comes from
pub enum Source<S> {
    /// Left unset
    Absent,
    /// Copied verbatim
    Literal(Payload),
    /// Computed from the original action, state and response
    Function(DescriptorFn<S>),
    /// Awaited
    Pending(PendingValue),
    /// The response body, parsed when it is JSON
    ResponseJson,
    /// An [`ApiError`] built from the response
    ResponseError,
    /// A value that cannot be turned into a payload; resolving it fails
    Unsupported(String),
}

impl<S> Source<S> {
    fn from_field(field: &str, value: Option<&Value<S>>) -> Self {
        match value {
            None => Self::Absent,
            Some(Value::Function(Function::Descriptor(f))) => Self::Function(Arc::clone(f)),
            Some(Value::Function(other)) => Self::Unsupported(format!(
                "{} {:?} cannot compute a {}",
                field, other, field
            )),
            Some(Value::Pending(pending)) => Self::Pending(pending.clone()),
            Some(literal) => match literal.to_json() {
                Some(json) => Self::Literal(Payload::Json(json)),
                None => Self::Unsupported(format!("{} contains a function", field)),
            },
        }
    }

    /// Whether this source is unset
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl<S> Clone for Source<S> {
    fn clone(&self) -> Self {
        match self {
            Self::Absent => Self::Absent,
            Self::Literal(payload) => Self::Literal(payload.clone()),
            Self::Function(f) => Self::Function(Arc::clone(f)),
            Self::Pending(pending) => Self::Pending(pending.clone()),
            Self::ResponseJson => Self::ResponseJson,
            Self::ResponseError => Self::ResponseError,
            Self::Unsupported(message) => Self::Unsupported(message.clone()),
        }
    }
}

impl<S> fmt::Debug for Source<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("Absent"),
            Self::Literal(payload) => f.debug_tuple("Literal").field(payload).finish(),
            Self::Function(_) => f.write_str("Function"),
            Self::Pending(_) => f.write_str("Pending"),
            Self::ResponseJson => f.write_str("ResponseJson"),
            Self::ResponseError => f.write_str("ResponseError"),
            Self::Unsupported(message) => f.debug_tuple("Unsupported").field(message).finish(),
        }
    }
}

/// How to build one lifecycle action
pub struct TypeDescriptor<S> {
    /// Type of the built action
    pub action_type: ActionType,
    /// Payload source
    pub payload: Source<S>,
    /// Meta source
    pub meta: Source<S>,
    /// Whether the built action is flagged as an error
    pub error: bool,
}

impl<S> TypeDescriptor<S> {
    /// A descriptor with only a type
    pub fn new(action_type: impl Into<ActionType>) -> Self {
        Self {
            action_type: action_type.into(),
            payload: Source::Absent,
            meta: Source::Absent,
            error: false,
        }
    }

    /// Parse a bare type or a `{ type, payload?, meta? }` object
    pub fn from_value(value: &Value<S>) -> Option<Self> {
        if let Some(action_type) = ActionType::from_value(value) {
            return Some(Self::new(action_type));
        }
        let object = value.as_object()?;
        Some(Self {
            action_type: ActionType::from_value(object.get("type")?)?,
            payload: Source::from_field("payload", object.get("payload")),
            meta: Source::from_field("meta", object.get("meta")),
            error: false,
        })
    }

    /// Replace the payload with a literal
    pub fn with_payload(mut self, payload: impl Into<Payload>) -> Self {
        self.payload = Source::Literal(payload.into());
        self
    }

    /// Flag the built action as an error
    pub fn errored(mut self) -> Self {
        self.error = true;
        self
    }
}

impl<S> Clone for TypeDescriptor<S> {
    fn clone(&self) -> Self {
        Self {
            action_type: self.action_type.clone(),
            payload: self.payload.clone(),
            meta: self.meta.clone(),
            error: self.error,
        }
    }
}

impl<S> fmt::Debug for TypeDescriptor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("action_type", &self.action_type)
            .field("payload", &self.payload)
            .field("meta", &self.meta)
            .field("error", &self.error)
            .finish()
    }
}

/// Normalize the `[request, success, failure]` type descriptors.
///
/// Success actions default their payload to the JSON response body and
/// failure actions to an [`ApiError`] describing the response. Returns
/// `None` unless there are exactly three valid entries.
pub fn normalize_types<S>(types: &[Value<S>]) -> Option<[TypeDescriptor<S>; 3]> {
    let [request, success, failure] = types else {
        return None;
    };
    let request = TypeDescriptor::from_value(request)?;

    let mut success = TypeDescriptor::from_value(success)?;
    if success.payload.is_absent() {
        success.payload = Source::ResponseJson;
    }

    let mut failure = TypeDescriptor::from_value(failure)?;
    if failure.payload.is_absent() {
        failure.payload = Source::ResponseError;
    }

    Some([request, success, failure])
}

/// Arguments handed to `payload` and `meta` functions
pub struct DescriptorArgs<S> {
    /// The original tagged action
    pub action: Arc<Value<S>>,
    /// State at the time the action is built
    pub state: S,
    /// The response, for success and failure actions
    pub response: Option<Response>,
}

async fn resolve<S>(source: &Source<S>, args: &DescriptorArgs<S>) -> Result<Option<Payload>, String> {
    match source {
        Source::Absent => Ok(None),
        Source::Literal(payload) => Ok(Some(payload.clone())),
        Source::Function(f) => f(&args.action, &args.state, args.response.as_ref())
            .await
            .map(|json| Some(Payload::Json(json)))
            .map_err(|e| e.to_string()),
        Source::Pending(pending) => pending
            .clone()
            .await
            .map(|json| Some(Payload::Json(json)))
            .map_err(|e| e.to_string()),
        Source::ResponseJson => match &args.response {
            Some(response) => get_json(response)
                .await
                .map(|json| json.map(Payload::Json))
                .map_err(|e| e.to_string()),
            None => Ok(None),
        },
        Source::ResponseError => match &args.response {
            Some(response) => get_json(response)
                .await
                .map(|json| {
                    let error = ApiError::new(response.status(), response.status_text(), json);
                    Some(Payload::Error(CallError::Api(error)))
                })
                .map_err(|e| e.to_string()),
            None => Ok(None),
        },
        Source::Unsupported(message) => Err(message.clone()),
    }
}

/// Build a standard action from a type descriptor.
///
/// Payload and meta are resolved independently and both are always
/// attempted. A failure in either sets `error` and puts an
/// [`CallError::Internal`] in the payload; a meta failure is applied last,
/// so it wins when both fail.
pub async fn action_with<S>(descriptor: &TypeDescriptor<S>, args: &DescriptorArgs<S>) -> StandardAction {
    let mut action = StandardAction::new(descriptor.action_type.clone());
    action.error = descriptor.error;

    match resolve(&descriptor.payload, args).await {
        Ok(payload) => action.payload = payload,
        Err(message) => {
            tracing::debug!(action = %action.action_type, %message, "payload resolution failed");
            action.payload = Some(Payload::Error(CallError::internal(message)));
            action.error = true;
        }
    }

    match resolve(&descriptor.meta, args).await {
        Ok(meta) => action.meta = meta,
        Err(message) => {
            tracing::debug!(action = %action.action_type, %message, "meta resolution failed");
            action.payload = Some(Payload::Error(CallError::internal(message)));
            action.error = true;
        }
    }

    action
}

/// A validated call descriptor
pub struct CallDescriptor<S> {
    /// A string or a state function
    pub endpoint: Value<S>,
    pub method: Method,
    pub request: TypeDescriptor<S>,
    pub success: TypeDescriptor<S>,
    pub failure: TypeDescriptor<S>,
    pub body: Option<Value<S>>,
    pub headers: Option<Value<S>>,
    pub options: Option<Value<S>>,
    pub credentials: Option<Credentials>,
    pub bailout: Option<Value<S>>,
    /// Per-call transport override
    pub fetch: Option<Function<S>>,
    /// Per-call `ok` predicate override
    pub ok: Option<Function<S>>,
}

impl<S> CallDescriptor<S> {
    /// Validate `action` and parse its descriptor.
    ///
    /// Returns the validation defects if the action is malformed.
    pub fn from_action(action: &Value<S>) -> Result<Self, Vec<String>> {
        let defects = validate(action);
        if !defects.is_empty() {
            return Err(defects);
        }
        Self::parse(action).ok_or_else(|| vec!["[CALL_API] could not be parsed".to_string()])
    }

    fn parse(action: &Value<S>) -> Option<Self> {
        let descriptor = action.get(CALL_API)?.as_object()?;
        let function = |key: &str| match descriptor.get(key) {
            Some(Value::Function(f)) => Some(f.clone()),
            _ => None,
        };
        let [request, success, failure] = match descriptor.get("types")? {
            Value::Array(types) => normalize_types(types)?,
            _ => return None,
        };
        let credentials = match descriptor.get("credentials") {
            Some(value) => Some(Credentials::from_name(value.as_str()?)?),
            None => None,
        };

        Some(Self {
            endpoint: descriptor.get("endpoint")?.clone(),
            method: Method::from_name(descriptor.get("method")?.as_str()?)?,
            request,
            success,
            failure,
            body: descriptor.get("body").cloned(),
            headers: descriptor.get("headers").cloned(),
            options: descriptor.get("options").cloned(),
            credentials,
            bailout: descriptor.get("bailout").cloned(),
            fetch: function("fetch"),
            ok: function("ok"),
        })
    }
}

/// The request type of a (possibly malformed) tagged action.
///
/// Looks at the first entry of `types`, unwrapping `{ type }` objects.
pub fn request_type<S>(action: &Value<S>) -> Option<ActionType> {
    let Value::Array(types) = action.get(CALL_API)?.get("types")? else {
        return None;
    };
    match types.first()? {
        Value::Object(object) => ActionType::from_value(object.get("type")?),
        bare => ActionType::from_value(bare),
    }
}

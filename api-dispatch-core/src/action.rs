//! Action types flowing through the host pipeline

use std::borrow::Cow;
use std::fmt::{self, Debug};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::error::CallError;
use crate::validation::CALL_API;
use crate::value::Value;

/// Trait for actions that can be dispatched through a store
///
/// Actions represent intents to change state. They should be:
/// - Clone: Actions may be logged, replayed, or sent to multiple handlers
/// - Debug: For debugging and logging
/// - Send + 'static: For async dispatch across tasks
pub trait Action: Clone + Debug + Send + 'static {
    /// Get the action name for logging and filtering
    fn name(&self) -> Cow<'_, str>;
}

/// Actions that can produce a one-line summary for action logs
pub trait ActionSummary: Action {
    /// Short human-readable description of the action
    ///
    /// Defaults to the `Debug` representation.
    fn summary(&self) -> String {
        format!("{:?}", self)
    }

    /// Whether the action reports a failure
    fn is_error(&self) -> bool {
        false
    }
}

static NEXT_SYMBOL_ID: AtomicU64 = AtomicU64::new(0);

/// A unique action type identifier.
///
/// Two symbols are equal only if one is a clone of the other, even when
/// their descriptions match.
#[derive(Clone)]
pub struct Symbol {
    id: u64,
    description: Arc<str>,
}

impl Symbol {
    /// Create a fresh symbol with the given description
    pub fn new(description: impl Into<Arc<str>>) -> Self {
        Self {
            id: NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed),
            description: description.into(),
        }
    }

    /// The description given at creation
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description)
    }
}

/// The `type` of a standard action: a plain name or a unique symbol
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ActionType {
    /// A string identifier such as `"FETCH_USER_REQUEST"`
    Name(String),
    /// A unique symbol
    Symbol(Symbol),
}

impl ActionType {
    /// Extract an action type from a bare `Value::String` or `Value::Symbol`
    pub fn from_value<S>(value: &Value<S>) -> Option<Self> {
        match value {
            Value::String(name) => Some(Self::Name(name.clone())),
            Value::Symbol(symbol) => Some(Self::Symbol(symbol.clone())),
            _ => None,
        }
    }

    /// The name, if this is a string type
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            Self::Symbol(_) => None,
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Symbol(symbol) => fmt::Display::fmt(symbol, f),
        }
    }
}

impl From<&str> for ActionType {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for ActionType {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<Symbol> for ActionType {
    fn from(symbol: Symbol) -> Self {
        Self::Symbol(symbol)
    }
}

impl PartialEq<&str> for ActionType {
    fn eq(&self, other: &&str) -> bool {
        self.as_name() == Some(*other)
    }
}

impl Serialize for ActionType {
    fn serialize<Z: Serializer>(&self, serializer: Z) -> Result<Z::Ok, Z::Error> {
        serializer.collect_str(self)
    }
}

/// Payload or meta carried by a [`StandardAction`]
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    /// Plain data
    Json(serde_json::Value),
    /// An error value (the action's `error` flag is set alongside)
    Error(CallError),
}

impl Payload {
    /// The JSON data, if this payload is not an error
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Error(_) => None,
        }
    }

    /// The error, if this payload is one
    pub fn as_error(&self) -> Option<&CallError> {
        match self {
            Self::Json(_) => None,
            Self::Error(error) => Some(error),
        }
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

impl From<CallError> for Payload {
    fn from(error: CallError) -> Self {
        Self::Error(error)
    }
}

/// A flux-standard action emitted for one step of an API call lifecycle
///
/// Never carries the [`CALL_API`] marker.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StandardAction {
    /// The action type
    #[serde(rename = "type")]
    pub action_type: ActionType,
    /// Optional payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
    /// Optional meta
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Payload>,
    /// Whether the payload describes an error
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,
}

impl StandardAction {
    /// Create an action with only a type
    pub fn new(action_type: impl Into<ActionType>) -> Self {
        Self {
            action_type: action_type.into(),
            payload: None,
            meta: None,
            error: false,
        }
    }

    /// Create an error action whose payload is `error`
    pub fn error(action_type: impl Into<ActionType>, error: CallError) -> Self {
        Self {
            action_type: action_type.into(),
            payload: Some(Payload::Error(error)),
            meta: None,
            error: true,
        }
    }

    /// Set the payload
    pub fn with_payload(mut self, payload: impl Into<Payload>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Set the meta
    pub fn with_meta(mut self, meta: impl Into<Payload>) -> Self {
        self.meta = Some(meta.into());
        self
    }

    /// The payload as JSON data, if present and not an error
    pub fn payload_json(&self) -> Option<&serde_json::Value> {
        self.payload.as_ref().and_then(Payload::as_json)
    }

    /// The payload as an error, if it is one
    pub fn payload_error(&self) -> Option<&CallError> {
        self.payload.as_ref().and_then(Payload::as_error)
    }
}

impl Action for StandardAction {
    fn name(&self) -> Cow<'_, str> {
        match &self.action_type {
            ActionType::Name(name) => Cow::Borrowed(name),
            ActionType::Symbol(symbol) => Cow::Owned(symbol.to_string()),
        }
    }
}

impl ActionSummary for StandardAction {
    fn summary(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
    }

    fn is_error(&self) -> bool {
        self.error
    }
}

/// Any action travelling through the host pipeline
pub enum AnyAction<S> {
    /// An arbitrary key/value record, possibly tagged with [`CALL_API`]
    Record(Value<S>),
    /// A flux-standard action
    Standard(StandardAction),
}

impl<S> AnyAction<S> {
    /// The standard action, if this is one
    pub fn as_standard(&self) -> Option<&StandardAction> {
        match self {
            Self::Standard(action) => Some(action),
            Self::Record(_) => None,
        }
    }

    /// The record, if this is one
    pub fn as_record(&self) -> Option<&Value<S>> {
        match self {
            Self::Record(record) => Some(record),
            Self::Standard(_) => None,
        }
    }
}

impl<S> Clone for AnyAction<S> {
    fn clone(&self) -> Self {
        match self {
            Self::Record(record) => Self::Record(record.clone()),
            Self::Standard(action) => Self::Standard(action.clone()),
        }
    }
}

impl<S> Debug for AnyAction<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Record(record) => f.debug_tuple("Record").field(record).finish(),
            Self::Standard(action) => f.debug_tuple("Standard").field(action).finish(),
        }
    }
}

impl<S> From<StandardAction> for AnyAction<S> {
    fn from(action: StandardAction) -> Self {
        Self::Standard(action)
    }
}

impl<S> From<Value<S>> for AnyAction<S> {
    fn from(record: Value<S>) -> Self {
        Self::Record(record)
    }
}

impl<S: 'static> Action for AnyAction<S> {
    fn name(&self) -> Cow<'_, str> {
        match self {
            Self::Standard(action) => action.name(),
            Self::Record(Value::Object(object)) => match object.get("type") {
                Some(Value::String(name)) => Cow::Borrowed(name),
                Some(Value::Symbol(symbol)) => Cow::Owned(symbol.to_string()),
                _ if object.contains_key(CALL_API) => Cow::Borrowed("CALL_API"),
                _ => Cow::Borrowed("Record"),
            },
            Self::Record(_) => Cow::Borrowed("Record"),
        }
    }
}

impl<S: 'static> ActionSummary for AnyAction<S> {
    fn summary(&self) -> String {
        match self {
            Self::Standard(action) => action.summary(),
            Self::Record(record) => format!("{:?}", record),
        }
    }

    fn is_error(&self) -> bool {
        self.as_standard().is_some_and(ActionSummary::is_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_symbol_identity() {
        let a = Symbol::new("REQUEST");
        let b = Symbol::new("REQUEST");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_eq!(a.description(), "REQUEST");
    }

    #[test]
    fn test_action_type_compare_with_str() {
        assert_eq!(ActionType::from("SUCCESS"), "SUCCESS");
        assert!(ActionType::from(Symbol::new("SUCCESS")) != "SUCCESS");
    }

    #[test]
    fn test_action_type_display() {
        assert_eq!(ActionType::from("SUCCESS").to_string(), "SUCCESS");
        assert_eq!(ActionType::from(Symbol::new("SUCCESS")).to_string(), "Symbol(SUCCESS)");
        let action = StandardAction::new(Symbol::new("REQUEST"));
        assert_eq!(action.name(), "Symbol(REQUEST)");
    }

    #[test]
    fn test_standard_action_serializes_fsa_shape() {
        let action = StandardAction::new("SUCCESS").with_payload(json!({ "id": 1 }));
        assert_eq!(
            serde_json::to_value(&action).unwrap(),
            json!({ "type": "SUCCESS", "payload": { "id": 1 } })
        );

        let action = StandardAction::error(
            "FAILURE",
            CallError::Request {
                message: "Network request failed".into(),
            },
        );
        assert_eq!(
            serde_json::to_value(&action).unwrap(),
            json!({
                "type": "FAILURE",
                "payload": { "name": "RequestError", "message": "Network request failed" },
                "error": true
            })
        );
    }

    #[test]
    fn test_any_action_name() {
        let standard: AnyAction<()> = StandardAction::new("PING").into();
        assert_eq!(standard.name(), "PING");

        let record: AnyAction<()> = AnyAction::Record(crate::object! { "type" => "PONG" });
        assert_eq!(record.name(), "PONG");

        let tagged: AnyAction<()> = AnyAction::Record(crate::object! {
            CALL_API => crate::object! {},
        });
        assert_eq!(tagged.name(), "CALL_API");
    }
}

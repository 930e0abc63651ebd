//! Dynamic values for action records
//!
//! An API call action is an open key/value record whose fields may hold
//! literals or callbacks. [`Value`] models that record as a closed union so
//! every shape the schema admits is matched exhaustively.
//!
//! # Example
//!
//! ```ignore
//! use api_dispatch_core::{object, value::Value, CALL_API};
//!
//! let action: Value<AppState> = object! {
//!     CALL_API => object! {
//!         "endpoint" => Value::state_fn(|state: &AppState| Ok(state.user_url().into())),
//!         "method" => "GET",
//!         "types" => vec!["REQUEST", "SUCCESS", "FAILURE"],
//!     },
//! };
//! ```

use std::fmt::{self, Debug};
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use indexmap::IndexMap;

use crate::action::Symbol;
use crate::error::BoxError;
use crate::transport::{Response, Transport};

/// Ordered record of named values
pub type Object<S> = IndexMap<String, Value<S>>;

/// Function of the current state: `endpoint`, `body`, `headers`, `options`, `bailout`
pub type StateFn<S> = Arc<dyn Fn(&S) -> Result<serde_json::Value, BoxError> + Send + Sync>;

/// Function computing a lifecycle action's `payload` or `meta`.
///
/// Receives the original action, the current state and, for success and
/// failure actions, the response.
pub type DescriptorFn<S> = Arc<
    dyn Fn(&Value<S>, &S, Option<&Response>) -> BoxFuture<'static, Result<serde_json::Value, BoxError>>
        + Send
        + Sync,
>;

/// Predicate classifying a response as ok or not
pub type OkFn = Arc<dyn Fn(&Response) -> Result<bool, BoxError> + Send + Sync>;

/// A value still being computed; may be awaited any number of times
pub type PendingValue = Shared<BoxFuture<'static, Result<serde_json::Value, Arc<str>>>>;

/// The callback shapes a record may carry
pub enum Function<S> {
    /// Called with the current state
    State(StateFn<S>),
    /// Called with the original action, the state and the response
    Descriptor(DescriptorFn<S>),
    /// Called with a response to decide whether it is ok
    Ok(OkFn),
    /// A transport used in place of the configured one
    Fetch(Arc<dyn Transport>),
}

impl<S> Function<S> {
    fn kind(&self) -> &'static str {
        match self {
            Self::State(_) => "State",
            Self::Descriptor(_) => "Descriptor",
            Self::Ok(_) => "Ok",
            Self::Fetch(_) => "Fetch",
        }
    }
}

impl<S> Clone for Function<S> {
    fn clone(&self) -> Self {
        match self {
            Self::State(f) => Self::State(Arc::clone(f)),
            Self::Descriptor(f) => Self::Descriptor(Arc::clone(f)),
            Self::Ok(f) => Self::Ok(Arc::clone(f)),
            Self::Fetch(t) => Self::Fetch(Arc::clone(t)),
        }
    }
}

impl<S> Debug for Function<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Function: {}]", self.kind())
    }
}

/// A dynamic value inside an action record
pub enum Value<S> {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    /// A unique identifier, usable as an action type
    Symbol(Symbol),
    Array(Vec<Value<S>>),
    /// A plain object
    Object(Object<S>),
    Function(Function<S>),
    /// A value still being computed
    Pending(PendingValue),
}

impl<S> Value<S> {
    /// Wrap a function of state
    pub fn state_fn<F>(f: F) -> Self
    where
        F: Fn(&S) -> Result<serde_json::Value, BoxError> + Send + Sync + 'static,
    {
        Self::Function(Function::State(Arc::new(f)))
    }

    /// Wrap a synchronous `payload`/`meta` function
    pub fn payload_fn<F>(f: F) -> Self
    where
        S: 'static,
        F: Fn(&Value<S>, &S, Option<&Response>) -> Result<serde_json::Value, BoxError>
            + Send
            + Sync
            + 'static,
    {
        Self::Function(Function::Descriptor(Arc::new(
            move |action: &Value<S>, state: &S, response: Option<&Response>| {
                futures::future::ready(f(action, state, response)).boxed()
            },
        )))
    }

    /// Wrap an asynchronous `payload`/`meta` function
    pub fn payload_async<F, Fut>(f: F) -> Self
    where
        S: 'static,
        F: Fn(&Value<S>, &S, Option<&Response>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<serde_json::Value, BoxError>> + Send + 'static,
    {
        Self::Function(Function::Descriptor(Arc::new(
            move |action: &Value<S>, state: &S, response: Option<&Response>| {
                f(action, state, response).boxed()
            },
        )))
    }

    /// Wrap a custom `ok` predicate
    pub fn ok_fn<F>(f: F) -> Self
    where
        F: Fn(&Response) -> Result<bool, BoxError> + Send + Sync + 'static,
    {
        Self::Function(Function::Ok(Arc::new(f)))
    }

    /// Wrap a per-call transport
    pub fn fetch<T: Transport + 'static>(transport: T) -> Self {
        Self::Function(Function::Fetch(Arc::new(transport)))
    }

    /// Wrap a value that is still being computed
    pub fn pending<Fut>(future: Fut) -> Self
    where
        Fut: Future<Output = Result<serde_json::Value, BoxError>> + Send + 'static,
    {
        let future = future
            .map(|result| result.map_err(|e| Arc::<str>::from(e.to_string())))
            .boxed();
        Self::Pending(future.shared())
    }

    /// Whether this is a plain object
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    /// Whether this is any kind of function
    pub fn is_function(&self) -> bool {
        matches!(self, Self::Function(_))
    }

    /// The object, if this is one
    pub fn as_object(&self) -> Option<&Object<S>> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// The string, if this is one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a key on an object
    pub fn get(&self, key: &str) -> Option<&Value<S>> {
        self.as_object().and_then(|object| object.get(key))
    }

    /// Convert to plain JSON.
    ///
    /// Symbols become their description. Returns `None` if the value
    /// contains a function or a pending value.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        Some(match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => serde_json::Value::Number(n.clone()),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Symbol(symbol) => serde_json::Value::String(symbol.description().to_string()),
            Self::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect::<Option<_>>()?)
            }
            Self::Object(object) => serde_json::Value::Object(
                object
                    .iter()
                    .map(|(k, v)| v.to_json().map(|v| (k.clone(), v)))
                    .collect::<Option<_>>()?,
            ),
            Self::Function(_) | Self::Pending(_) => return None,
        })
    }
}

/// JavaScript-style truthiness of a JSON value
pub fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}

impl<S> Clone for Value<S> {
    fn clone(&self) -> Self {
        match self {
            Self::Null => Self::Null,
            Self::Bool(b) => Self::Bool(*b),
            Self::Number(n) => Self::Number(n.clone()),
            Self::String(s) => Self::String(s.clone()),
            Self::Symbol(symbol) => Self::Symbol(symbol.clone()),
            Self::Array(items) => Self::Array(items.clone()),
            Self::Object(object) => Self::Object(object.clone()),
            Self::Function(f) => Self::Function(f.clone()),
            Self::Pending(p) => Self::Pending(p.clone()),
        }
    }
}

impl<S> Debug for Value<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Number(n) => write!(f, "{}", n),
            Self::String(s) => write!(f, "{:?}", s),
            Self::Symbol(symbol) => write!(f, "{:?}", symbol),
            Self::Array(items) => f.debug_list().entries(items).finish(),
            Self::Object(object) => f.debug_map().entries(object.iter()).finish(),
            Self::Function(function) => write!(f, "{:?}", function),
            Self::Pending(_) => f.write_str("[Pending]"),
        }
    }
}

impl<S> From<&str> for Value<S> {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl<S> From<String> for Value<S> {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl<S> From<bool> for Value<S> {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl<S> From<i64> for Value<S> {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl<S> From<i32> for Value<S> {
    fn from(n: i32) -> Self {
        Self::Number(n.into())
    }
}

impl<S> From<u64> for Value<S> {
    fn from(n: u64) -> Self {
        Self::Number(n.into())
    }
}

impl<S> From<f64> for Value<S> {
    fn from(n: f64) -> Self {
        serde_json::Number::from_f64(n).map_or(Self::Null, Self::Number)
    }
}

impl<S> From<Symbol> for Value<S> {
    fn from(symbol: Symbol) -> Self {
        Self::Symbol(symbol)
    }
}

impl<S> From<Function<S>> for Value<S> {
    fn from(function: Function<S>) -> Self {
        Self::Function(function)
    }
}

impl<S> From<Object<S>> for Value<S> {
    fn from(object: Object<S>) -> Self {
        Self::Object(object)
    }
}

impl<S, T: Into<Value<S>>> From<Vec<T>> for Value<S> {
    fn from(items: Vec<T>) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<S> From<serde_json::Value> for Value<S> {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

/// Build a [`Value::Object`] from `key => value` pairs, keeping their order.
///
/// Values go through `Value::from`, so string literals, numbers, vectors,
/// JSON values and other `Value`s can be mixed freely.
#[macro_export]
macro_rules! object {
    () => {
        $crate::value::Value::Object($crate::value::Object::new())
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut object = $crate::value::Object::new();
        $(
            object.insert(::std::string::String::from($key), $crate::value::Value::from($value));
        )+
        $crate::value::Value::Object(object)
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_macro_keeps_order() {
        let value: Value<()> = crate::object! {
            "zeta" => 1,
            "alpha" => "two",
            "mid" => vec!["a", "b"],
        };
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_to_json() {
        let value: Value<()> = crate::object! {
            "name" => "Alice",
            "tags" => vec![Value::from(Symbol::new("admin"))],
            "nested" => json!({ "n": 1.5 }),
        };
        assert_eq!(
            value.to_json(),
            Some(json!({ "name": "Alice", "tags": ["admin"], "nested": { "n": 1.5 } }))
        );

        let with_fn: Value<()> = crate::object! {
            "f" => Value::state_fn(|_: &()| Ok(json!(null))),
        };
        assert_eq!(with_fn.to_json(), None);
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!("no")));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!({})));
        assert!(is_truthy(&json!([])));
    }

    #[test]
    fn test_debug_hides_functions() {
        let value: Value<()> = crate::object! {
            "ok" => Value::ok_fn(|_| Ok(true)),
        };
        assert_eq!(format!("{:?}", value), r#"{"ok": [Function: Ok]}"#);
    }

    #[tokio::test]
    async fn test_pending_value_resolves_repeatedly() {
        let value: Value<()> = Value::pending(async { Ok::<_, BoxError>(json!("later")) });
        let Value::Pending(pending) = value else {
            panic!("expected pending value");
        };
        assert_eq!(pending.clone().await, Ok(json!("later")));
        assert_eq!(pending.await, Ok(json!("later")));
    }
}

//! Structural validation of API call actions
//!
//! [`validate`] checks a record against the tagged-action schema and returns
//! every defect it finds, in a stable order. An empty list means the action
//! is a well-formed API call.

use crate::value::Value;

/// Reserved key marking an action as an API call
pub const CALL_API: &str = "@@api-dispatch/CALL_API";

/// Keys allowed at the root of a tagged action
pub const ROOT_KEYS: [&str; 3] = [CALL_API, "payload", "meta"];

/// Keys allowed inside a call descriptor
pub const DESCRIPTOR_KEYS: [&str; 10] = [
    "endpoint",
    "method",
    "body",
    "headers",
    "options",
    "credentials",
    "bailout",
    "types",
    "fetch",
    "ok",
];

/// Keys allowed inside an object type descriptor
pub const TYPE_DESCRIPTOR_KEYS: [&str; 3] = ["type", "payload", "meta"];

const METHODS: [&str; 7] = ["GET", "HEAD", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"];

const CREDENTIALS: [&str; 3] = ["omit", "same-origin", "include"];

const LIFECYCLE: [&str; 3] = ["request", "success", "failure"];

/// Whether `action` is a plain object carrying the [`CALL_API`] key.
///
/// Says nothing about whether the descriptor is well-formed.
pub fn is_tagged<S>(action: &Value<S>) -> bool {
    action
        .as_object()
        .is_some_and(|object| object.contains_key(CALL_API))
}

/// Whether `value` is a bare type or a well-formed `{ type, payload?, meta? }` object
pub fn is_valid_type_descriptor<S>(value: &Value<S>) -> bool {
    match value {
        Value::String(_) | Value::Symbol(_) => true,
        Value::Object(object) => {
            object
                .keys()
                .all(|key| TYPE_DESCRIPTOR_KEYS.contains(&key.as_str()))
                && matches!(object.get("type"), Some(Value::String(_) | Value::Symbol(_)))
        }
        _ => false,
    }
}

/// Check `action` against the API call schema.
///
/// Returns one message per defect, in a stable order.
pub fn validate<S>(action: &Value<S>) -> Vec<String> {
    let mut defects = Vec::new();

    let Some(root) = action.as_object() else {
        defects.push("API call actions must be plain objects".to_string());
        return defects;
    };
    let Some(descriptor) = root.get(CALL_API) else {
        defects.push("API call actions must have a [CALL_API] property".to_string());
        return defects;
    };

    for key in root.keys() {
        if !ROOT_KEYS.contains(&key.as_str()) {
            defects.push(format!("Invalid root key: {}", key));
        }
    }

    let Some(descriptor) = descriptor.as_object() else {
        defects.push("[CALL_API] property must be a plain object".to_string());
        return defects;
    };

    for key in descriptor.keys() {
        if !DESCRIPTOR_KEYS.contains(&key.as_str()) {
            defects.push(format!("Invalid [CALL_API] key: {}", key));
        }
    }

    match descriptor.get("endpoint") {
        None => defects.push("[CALL_API] must have an endpoint property".to_string()),
        Some(Value::String(_) | Value::Function(_)) => {}
        Some(_) => {
            defects.push("[CALL_API].endpoint property must be a string or a function".to_string())
        }
    }

    match descriptor.get("method") {
        None => defects.push("[CALL_API] must have a method property".to_string()),
        Some(Value::String(method)) => {
            let method = method.to_uppercase();
            if !METHODS.contains(&method.as_str()) {
                defects.push(format!("Invalid [CALL_API].method: {}", method));
            }
        }
        Some(_) => defects.push("[CALL_API].method property must be a string".to_string()),
    }

    for field in ["headers", "options", "body"] {
        if let Some(value) = descriptor.get(field) {
            if !value.is_object() && !value.is_function() {
                defects.push(format!(
                    "[CALL_API].{} property must be undefined, a plain object, or a function",
                    field
                ));
            }
        }
    }

    match descriptor.get("credentials") {
        None => {}
        Some(Value::String(credentials)) => {
            if !CREDENTIALS.contains(&credentials.as_str()) {
                defects.push(format!("Invalid [CALL_API].credentials: {}", credentials));
            }
        }
        Some(_) => {
            defects.push("[CALL_API].credentials property must be undefined, or a string".to_string())
        }
    }

    match descriptor.get("bailout") {
        None | Some(Value::Bool(_) | Value::Function(_)) => {}
        Some(_) => defects.push(
            "[CALL_API].bailout property must be undefined, a boolean, or a function".to_string(),
        ),
    }

    match descriptor.get("types") {
        None => defects.push("[CALL_API] must have a types property".to_string()),
        Some(Value::Array(types)) if types.len() == 3 => {
            for (stage, value) in LIFECYCLE.iter().zip(types) {
                if !is_valid_type_descriptor(value) {
                    defects.push(format!("Invalid {} type", stage));
                }
            }
        }
        Some(_) => {
            defects.push("[CALL_API].types property must be an array of length 3".to_string())
        }
    }

    for field in ["fetch", "ok"] {
        if let Some(value) = descriptor.get(field) {
            if !value.is_function() {
                defects.push(format!("[CALL_API].{} property must be a function", field));
            }
        }
    }

    defects
}

/// Whether `action` is a well-formed API call
pub fn is_valid<S>(action: &Value<S>) -> bool {
    validate(action).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Symbol;
    use crate::object;
    use serde_json::json;

    type V = Value<()>;

    fn call(descriptor: V) -> V {
        object! { CALL_API => descriptor }
    }

    fn valid_descriptor() -> V {
        object! {
            "endpoint" => "",
            "method" => "GET",
            "types" => vec!["REQUEST", "SUCCESS", "FAILURE"],
        }
    }

    #[test]
    fn test_is_tagged() {
        assert!(!is_tagged(&V::from("")));
        assert!(!is_tagged::<()>(&object! {}));
        assert!(!is_tagged::<()>(&object! { "type" => "PLAIN" }));
        assert!(is_tagged(&call(object! {})));
        assert!(is_tagged(&object! { CALL_API => V::Null }));
    }

    #[test]
    fn test_is_valid_type_descriptor() {
        assert!(is_valid_type_descriptor(&V::from("REQUEST")));
        assert!(is_valid_type_descriptor(&V::from(Symbol::new("REQUEST"))));
        assert!(is_valid_type_descriptor::<()>(&object! { "type" => "REQUEST" }));
        assert!(is_valid_type_descriptor::<()>(&object! {
            "type" => "REQUEST",
            "payload" => "somePayload",
            "meta" => "someMeta",
        }));
        assert!(!is_valid_type_descriptor(&V::from(42)));
        assert!(!is_valid_type_descriptor::<()>(&object! {}));
        assert!(!is_valid_type_descriptor::<()>(&object! { "type" => 7 }));
        assert!(!is_valid_type_descriptor::<()>(&object! {
            "type" => "REQUEST",
            "invalidKey" => "",
        }));
    }

    #[test]
    fn test_not_an_object() {
        assert_eq!(validate(&V::from("")), vec!["API call actions must be plain objects"]);
    }

    #[test]
    fn test_missing_marker() {
        assert_eq!(
            validate::<()>(&object! { "type" => "PLAIN" }),
            vec!["API call actions must have a [CALL_API] property"]
        );
    }

    #[test]
    fn test_invalid_root_keys_are_all_reported() {
        let mut action = call(valid_descriptor());
        if let Value::Object(root) = &mut action {
            root.insert("invalidKey1".into(), V::from(""));
            root.insert("payload".into(), V::from(""));
            root.insert("invalidKey2".into(), V::from(""));
        }
        assert_eq!(
            validate(&action),
            vec!["Invalid root key: invalidKey1", "Invalid root key: invalidKey2"]
        );
    }

    #[test]
    fn test_descriptor_must_be_object() {
        let action: V = object! {
            CALL_API => "",
            "invalidKey" => "",
        };
        assert_eq!(
            validate(&action),
            vec![
                "Invalid root key: invalidKey",
                "[CALL_API] property must be a plain object",
            ]
        );
    }

    #[test]
    fn test_empty_descriptor() {
        assert_eq!(
            validate(&call(object! {})),
            vec![
                "[CALL_API] must have an endpoint property",
                "[CALL_API] must have a method property",
                "[CALL_API] must have a types property",
            ]
        );
    }

    #[test]
    fn test_invalid_descriptor_keys() {
        let mut descriptor = valid_descriptor();
        if let Value::Object(object) = &mut descriptor {
            object.insert("invalidKey".into(), V::from(""));
            object.insert("schema".into(), V::from(""));
        }
        assert_eq!(
            validate(&call(descriptor)),
            vec!["Invalid [CALL_API] key: invalidKey", "Invalid [CALL_API] key: schema"]
        );
    }

    #[test]
    fn test_endpoint_type() {
        let action = call(object! {
            "endpoint" => json!({}),
            "method" => "GET",
            "types" => vec!["REQUEST", "SUCCESS", "FAILURE"],
        });
        assert_eq!(
            validate(&action),
            vec!["[CALL_API].endpoint property must be a string or a function"]
        );

        let action = call(object! {
            "endpoint" => V::state_fn(|_| Ok(json!(""))),
            "method" => "GET",
            "types" => vec!["REQUEST", "SUCCESS", "FAILURE"],
        });
        assert!(validate(&action).is_empty());
    }

    #[test]
    fn test_method_checks() {
        let with_method = |method: V| {
            call(object! {
                "endpoint" => "",
                "method" => method,
                "types" => vec!["REQUEST", "SUCCESS", "FAILURE"],
            })
        };
        assert_eq!(
            validate(&with_method(json!({}).into())),
            vec!["[CALL_API].method property must be a string"]
        );
        assert_eq!(
            validate(&with_method("invalid".into())),
            vec!["Invalid [CALL_API].method: INVALID"]
        );
        assert!(validate(&with_method("patch".into())).is_empty());
    }

    #[test]
    fn test_optional_object_or_function_fields() {
        for field in ["headers", "options", "body"] {
            let mut descriptor = valid_descriptor();
            if let Value::Object(object) = &mut descriptor {
                object.insert(field.into(), V::from(""));
            }
            assert_eq!(
                validate(&call(descriptor)),
                vec![format!(
                    "[CALL_API].{} property must be undefined, a plain object, or a function",
                    field
                )]
            );

            let mut descriptor = valid_descriptor();
            if let Value::Object(object) = &mut descriptor {
                object.insert(field.into(), object! {});
            }
            assert!(validate(&call(descriptor)).is_empty());

            let mut descriptor = valid_descriptor();
            if let Value::Object(object) = &mut descriptor {
                object.insert(field.into(), V::state_fn(|_| Ok(json!({}))));
            }
            assert!(validate(&call(descriptor)).is_empty());
        }
    }

    #[test]
    fn test_credentials() {
        let with_credentials = |credentials: V| {
            let mut descriptor = valid_descriptor();
            if let Value::Object(object) = &mut descriptor {
                object.insert("credentials".into(), credentials);
            }
            call(descriptor)
        };
        assert_eq!(
            validate(&with_credentials(json!({}).into())),
            vec!["[CALL_API].credentials property must be undefined, or a string"]
        );
        assert_eq!(
            validate(&with_credentials("InvalidValue".into())),
            vec!["Invalid [CALL_API].credentials: InvalidValue"]
        );
        assert!(validate(&with_credentials("include".into())).is_empty());
    }

    #[test]
    fn test_bailout() {
        let with_bailout = |bailout: V| {
            let mut descriptor = valid_descriptor();
            if let Value::Object(object) = &mut descriptor {
                object.insert("bailout".into(), bailout);
            }
            call(descriptor)
        };
        assert_eq!(
            validate(&with_bailout("".into())),
            vec!["[CALL_API].bailout property must be undefined, a boolean, or a function"]
        );
        assert!(validate(&with_bailout(false.into())).is_empty());
        assert!(validate(&with_bailout(V::state_fn(|_| Ok(json!(false))))).is_empty());
    }

    #[test]
    fn test_types_shape() {
        let with_types = |types: V| {
            call(object! {
                "endpoint" => "",
                "method" => "GET",
                "types" => types,
            })
        };
        assert_eq!(
            validate(&with_types(json!({}).into())),
            vec!["[CALL_API].types property must be an array of length 3"]
        );
        assert_eq!(
            validate(&with_types(vec!["REQUEST"].into())),
            vec!["[CALL_API].types property must be an array of length 3"]
        );
        assert_eq!(
            validate(&with_types(V::Array(vec![
                V::from(0),
                object! { "type" => "SUCCESS", "invalidKey" => "" },
                V::from("FAILURE"),
            ]))),
            vec!["Invalid request type", "Invalid success type"]
        );
    }

    #[test]
    fn test_fetch_and_ok_must_be_functions() {
        let mut descriptor = valid_descriptor();
        if let Value::Object(object) = &mut descriptor {
            object.insert("fetch".into(), V::from(""));
            object.insert("ok".into(), V::from(true));
        }
        assert_eq!(
            validate(&call(descriptor)),
            vec![
                "[CALL_API].fetch property must be a function",
                "[CALL_API].ok property must be a function",
            ]
        );

        let mut descriptor = valid_descriptor();
        if let Value::Object(object) = &mut descriptor {
            object.insert("ok".into(), V::ok_fn(|res| Ok(res.ok())));
        }
        assert!(validate(&call(descriptor)).is_empty());
    }

    #[test]
    fn test_valid_with_symbols_and_descriptors() {
        let action: V = object! {
            CALL_API => object! {
                "endpoint" => "",
                "method" => "GET",
                "types" => V::Array(vec![
                    V::from(Symbol::new("REQUEST")),
                    object! { "type" => "SUCCESS", "payload" => V::payload_fn(|_, _, _| Ok(json!(1))) },
                    object! { "type" => Symbol::new("FAILURE"), "meta" => "m" },
                ]),
            },
            "payload" => "",
            "meta" => "",
        };
        assert!(is_valid(&action));
    }

    #[test]
    fn test_validate_is_idempotent() {
        let action = call(object! { "method" => "fetch", "types" => vec!["ONE"] });
        let first = validate(&action);
        assert_eq!(first, validate(&action));
        assert_eq!(first.is_empty(), is_valid(&action));
    }
}

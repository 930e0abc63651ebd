//! Error values carried in lifecycle action payloads

use serde::Serialize;

/// Error type returned by user-supplied callbacks
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// An HTTP response whose status did not pass the `ok` check
#[derive(Clone, Debug, PartialEq, Serialize, thiserror::Error)]
#[error("{status} - {status_text}")]
pub struct ApiError {
    /// HTTP status code
    pub status: u16,
    /// HTTP reason phrase
    pub status_text: String,
    /// Parsed body when the response declared a JSON content type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
}

impl ApiError {
    /// Create an API error from response parts
    pub fn new(
        status: u16,
        status_text: impl Into<String>,
        response: Option<serde_json::Value>,
    ) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            response,
        }
    }
}

/// Errors surfaced through lifecycle actions.
///
/// None of these escape the middleware; each one ends up as the payload of
/// an action whose `error` flag is set.
#[derive(Clone, Debug, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "name")]
pub enum CallError {
    /// A tagged action failed validation
    #[serde(rename = "InvalidCallAction")]
    #[error("Invalid API call action")]
    Malformed {
        /// Every structural defect found, in validation order
        defects: Vec<String>,
    },

    /// A `payload`, `meta` or `ok` function failed
    #[serde(rename = "InternalError")]
    #[error("{message}")]
    Internal {
        /// Description of the failure
        message: String,
    },

    /// The request could not be made: a field function failed or the
    /// transport rejected
    #[serde(rename = "RequestError")]
    #[error("{message}")]
    Request {
        /// Description of the failure
        message: String,
    },

    /// The server answered with a non-ok response
    #[serde(rename = "ApiError")]
    #[error(transparent)]
    Api(ApiError),
}

impl CallError {
    /// Internal error with the given message
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Request error with the given message
    pub fn request(message: impl Into<String>) -> Self {
        Self::Request {
            message: message.into(),
        }
    }

    /// Request error naming a descriptor field whose function failed
    pub fn field_failed(field: &str) -> Self {
        Self::request(format!("[CALL_API].{} function failed", field))
    }

    /// The validation defects, for a malformed action
    pub fn defects(&self) -> Option<&[String]> {
        match self {
            Self::Malformed { defects } => Some(defects),
            _ => None,
        }
    }

    /// The API error, for a non-ok response
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(error) => Some(error),
            _ => None,
        }
    }
}

impl From<ApiError> for CallError {
    fn from(error: ApiError) -> Self {
        Self::Api(error)
    }
}

/// Failure raised by a [`Transport`](crate::transport::Transport)
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    /// Create a transport error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        Self::new(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_api_error_message() {
        let error = ApiError::new(404, "Not Found", Some(json!({ "error": "Resource not found" })));
        assert_eq!(error.to_string(), "404 - Not Found");
        assert_eq!(CallError::from(error).to_string(), "404 - Not Found");
    }

    #[test]
    fn test_field_failed_message() {
        let error = CallError::field_failed("endpoint");
        assert_eq!(error.to_string(), "[CALL_API].endpoint function failed");
    }

    #[test]
    fn test_serialized_names() {
        let malformed = CallError::Malformed {
            defects: vec!["Invalid root key: foo".into()],
        };
        assert_eq!(
            serde_json::to_value(&malformed).unwrap(),
            json!({ "name": "InvalidCallAction", "defects": ["Invalid root key: foo"] })
        );

        let api = CallError::Api(ApiError::new(500, "Internal Server Error", None));
        assert_eq!(
            serde_json::to_value(&api).unwrap(),
            json!({ "name": "ApiError", "status": 500, "status_text": "Internal Server Error" })
        );

        let internal = CallError::internal("boom");
        assert_eq!(
            serde_json::to_value(&internal).unwrap(),
            json!({ "name": "InternalError", "message": "boom" })
        );
    }
}

//! Client-side error classification
//!
//! Every failed call is sorted into a category that carries a canned,
//! user-facing message. Server-provided messages replace the canned text only
//! where they are meant for the user (validation and unclassified failures).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::wizard::WizardError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Validation,
    Authentication,
    Authorization,
    Timeout,
    Server,
    Network,
    Unknown,
}

impl ErrorCategory {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 | 422 => Self::Validation,
            401 => Self::Authentication,
            403 => Self::Authorization,
            408 | 504 => Self::Timeout,
            500..=599 => Self::Server,
            _ => Self::Unknown,
        }
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            Self::Validation => "Please check your input and try again.",
            Self::Authentication => "Your session has expired. Please log in again.",
            Self::Authorization => "You do not have permission to perform this action.",
            Self::Timeout => "The request timed out. Please try again.",
            Self::Server => "Something went wrong on our end. Please try again later.",
            Self::Network => "Unable to reach the server. Check your internet connection.",
            Self::Unknown => "An unexpected error occurred.",
        }
    }

    fn prefers_server_message(&self) -> bool {
        matches!(self, Self::Validation | Self::Unknown)
    }
}

/// One entry of an `errors` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMessage {
    pub field: Option<String>,
    pub message: String,
}

impl FieldMessage {
    fn new(field: Option<&str>, message: &str) -> Self {
        Self {
            field: field.map(str::to_string),
            message: message.to_string(),
        }
    }
}

/// Flatten the shapes an `errors` field arrives in: a list of strings, a list
/// of `{field|param|path, message|msg}` objects, or a map of field to one or
/// more messages.
pub fn parse_error_messages(errors: &Value) -> Vec<FieldMessage> {
    match errors {
        Value::String(message) => vec![FieldMessage::new(None, message)],
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(message) => Some(FieldMessage::new(None, message)),
                Value::Object(obj) => {
                    let message = ["message", "msg"]
                        .iter()
                        .find_map(|k| obj.get(*k).and_then(Value::as_str))?;
                    let field = ["field", "param", "path"]
                        .iter()
                        .find_map(|k| obj.get(*k).and_then(Value::as_str));
                    Some(FieldMessage::new(field, message))
                }
                _ => None,
            })
            .collect(),
        Value::Object(map) => map
            .iter()
            .flat_map(|(field, value)| {
                let messages: Vec<&str> = match value {
                    Value::String(m) => vec![m.as_str()],
                    Value::Array(ms) => ms.iter().filter_map(Value::as_str).collect(),
                    _ => Vec::new(),
                };
                messages
                    .into_iter()
                    .map(move |m| FieldMessage::new(Some(field), m))
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    /// The API answered with a non-success status.
    #[error("API error {status}: {}", message.as_deref().unwrap_or(category.default_message()))]
    Api {
        status: u16,
        category: ErrorCategory,
        message: Option<String>,
        errors: Vec<FieldMessage>,
    },

    /// A form failed local validation; nothing was sent.
    #[error("{message}")]
    Form {
        message: String,
        errors: Vec<FieldMessage>,
    },

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("client configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Build from a failed response's status and JSON body.
    pub fn from_response(status: u16, body: &Value) -> Self {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string);
        let errors = body.get("errors").map(parse_error_messages).unwrap_or_default();

        Self::Api {
            status,
            category: ErrorCategory::from_status(status),
            message,
            errors,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Api { category, .. } => *category,
            Self::Form { .. } => ErrorCategory::Validation,
            Self::Timeout => ErrorCategory::Timeout,
            Self::Network(_) => ErrorCategory::Network,
            Self::Decode(_) | Self::Config(_) => ErrorCategory::Unknown,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Field errors sent by the server.
    pub fn field_errors(&self) -> &[FieldMessage] {
        match self {
            Self::Api { errors, .. } | Self::Form { errors, .. } => errors,
            _ => &[],
        }
    }

    /// The text to show the user.
    pub fn user_message(&self) -> String {
        let category = self.category();
        match self {
            Self::Api {
                message: Some(message),
                ..
            } if category.prefers_server_message() => message.clone(),
            Self::Form { message, .. } => message.clone(),
            _ => category.default_message().to_string(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

impl From<WizardError> for ClientError {
    fn from(e: WizardError) -> Self {
        match e {
            WizardError::Invalid(_, errors) => Self::Form {
                message: "Please fix the highlighted fields".to_string(),
                errors: errors
                    .iter()
                    .map(|(field, message)| FieldMessage::new(Some(field), message))
                    .collect(),
            },
            other => Self::Form {
                message: other.to_string(),
                errors: Vec::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn statuses_map_to_categories() {
        assert_eq!(ErrorCategory::from_status(400), ErrorCategory::Validation);
        assert_eq!(ErrorCategory::from_status(422), ErrorCategory::Validation);
        assert_eq!(ErrorCategory::from_status(401), ErrorCategory::Authentication);
        assert_eq!(ErrorCategory::from_status(403), ErrorCategory::Authorization);
        assert_eq!(ErrorCategory::from_status(408), ErrorCategory::Timeout);
        assert_eq!(ErrorCategory::from_status(504), ErrorCategory::Timeout);
        assert_eq!(ErrorCategory::from_status(502), ErrorCategory::Server);
        assert_eq!(ErrorCategory::from_status(404), ErrorCategory::Unknown);
    }

    #[test]
    fn server_message_overrides_only_user_facing_categories() {
        let body = json!({"message": "Email is already registered"});
        assert_eq!(
            ClientError::from_response(409, &body).user_message(),
            "Email is already registered"
        );
        assert_eq!(
            ClientError::from_response(422, &body).user_message(),
            "Email is already registered"
        );

        let internal = json!({"message": "An internal error occurred"});
        assert_eq!(
            ClientError::from_response(500, &internal).user_message(),
            ErrorCategory::Server.default_message()
        );
        assert_eq!(
            ClientError::Timeout.user_message(),
            ErrorCategory::Timeout.default_message()
        );
    }

    #[test]
    fn error_payload_shapes_are_flattened() {
        let strings = parse_error_messages(&json!(["Name is required", 3]));
        assert_eq!(strings, vec![FieldMessage::new(None, "Name is required")]);

        let objects = parse_error_messages(&json!([
            {"param": "email", "msg": "Invalid email"},
            {"path": "phone", "message": "Invalid phone"},
            {"field": "ignored"}
        ]));
        assert_eq!(
            objects,
            vec![
                FieldMessage::new(Some("email"), "Invalid email"),
                FieldMessage::new(Some("phone"), "Invalid phone"),
            ]
        );

        let map = parse_error_messages(&json!({
            "password": ["Too short", "Needs a digit"],
            "name": "Name is required"
        }));
        assert_eq!(map.len(), 3);
        assert!(map.contains(&FieldMessage::new(Some("password"), "Needs a digit")));
    }

    #[test]
    fn wizard_failures_become_form_errors() {
        let mut errors = crate::validation::ValidationErrors::default();
        errors.add("shop_name", "Shop name is required");
        let err = ClientError::from(WizardError::Invalid("basic_details".into(), errors));

        assert_eq!(err.category(), ErrorCategory::Validation);
        assert_eq!(
            err.field_errors(),
            &[FieldMessage::new(Some("shop_name"), "Shop name is required")]
        );

        let err = ClientError::from(WizardError::SkipNotAllowed("shop_timing".into()));
        assert_eq!(err.user_message(), "step 'shop_timing' cannot be skipped");
    }
}

//! Error types for Janus.
//!
//! Every failure a handler or a transport adapter can produce is expressed as
//! a variant of [`Error`]. Each variant maps to exactly one HTTP status code
//! through its [`ErrorKind`], which is what error serialization relies on.
//!
//! Handlers that need to attach an arbitrary status to their own failures use
//! [`StatusError`], which can sit anywhere in an error's source chain.

use std::collections::BTreeMap;
use std::fmt;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

mod sealed {
    pub trait Sealed {}

    impl Sealed for super::Error {}
    impl Sealed for super::StatusError {}
}

/// An error that knows which response status it should produce.
///
/// Error serialization classifies causes by downcasting, so only the types
/// it knows about implement this trait. To give your own error type a
/// status, wrap it with [`StatusError::with_source`].
///
/// ```compile_fail
/// use janus_core::ErrorWithStatus;
/// use http::StatusCode;
///
/// #[derive(Debug)]
/// struct OutOfStock;
///
/// impl ErrorWithStatus for OutOfStock {
///     fn status_code(&self) -> StatusCode {
///         StatusCode::CONFLICT
///     }
/// }
/// ```
pub trait ErrorWithStatus: sealed::Sealed {
    /// Returns the HTTP status code this error maps to.
    fn status_code(&self) -> StatusCode;
}

/// Classification of [`Error`] variants.
///
/// The kind provides the machine-readable code written into error envelopes
/// and the default status code of the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed request payload.
    Decode,
    /// Well-formed payload violating declared constraints.
    Validation,
    /// Body normalization could not complete.
    Transform,
    /// Path, query or header parameter of the wrong type.
    ParamType,
    /// Missing cookie or resource.
    NotFound,
    /// Template resolution or execution failure.
    Template,
    /// Request content type cannot be decoded.
    UnsupportedMediaType,
    /// Request body exceeds the configured limit.
    PayloadTooLarge,
    /// Error carrying an explicit status.
    Status,
    /// Capability missing from a transport adapter.
    NotImplemented,
    /// Underlying transport failed (disconnect, read error).
    Transport,
    /// Anything else.
    Internal,
}

impl ErrorKind {
    /// Returns the default HTTP status code for this kind.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::Decode
            | Self::Validation
            | Self::Transform
            | Self::ParamType
            | Self::Transport => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotImplemented => StatusCode::NOT_IMPLEMENTED,
            Self::Template | Self::Status | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the machine-readable error code used in error envelopes.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Decode => "DECODE_ERROR",
            Self::Validation => "VALIDATION_ERROR",
            Self::Transform => "TRANSFORM_ERROR",
            Self::ParamType => "INVALID_PARAMETER",
            Self::NotFound => "NOT_FOUND",
            Self::Template => "TEMPLATE_ERROR",
            Self::UnsupportedMediaType => "UNSUPPORTED_MEDIA_TYPE",
            Self::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            Self::Status => "HTTP_ERROR",
            Self::NotImplemented => "NOT_IMPLEMENTED",
            Self::Transport => "TRANSPORT_ERROR",
            Self::Internal => "INTERNAL_ERROR",
        }
    }
}

/// Where a parameter was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamLocation {
    /// Path segment (e.g. `/recipes/{id}`).
    Path,
    /// Query string.
    Query,
    /// Request header.
    Header,
}

impl fmt::Display for ParamLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path => write!(f, "path"),
            Self::Query => write!(f, "query"),
            Self::Header => write!(f, "header"),
        }
    }
}

/// Standard error type for Janus.
#[derive(Error, Debug)]
pub enum Error {
    /// The request payload could not be decoded into the declared shape.
    #[error("failed to decode request body: {message}")]
    Decode {
        /// Decoder message.
        message: String,
    },

    /// The decoded body failed validation.
    #[error("validation failed: {fields}")]
    Validation {
        /// Failed constraints, by field.
        fields: FieldErrors,
    },

    /// The body transformation step failed.
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// A parameter could not be converted to the requested type.
    #[error("invalid {location} parameter '{name}': expected {expected}, got '{value}'")]
    ParamType {
        /// Where the parameter came from.
        location: ParamLocation,
        /// Parameter name.
        name: String,
        /// Raw value received.
        value: String,
        /// Expected type, e.g. `integer`.
        expected: &'static str,
    },

    /// A cookie or resource was not found.
    #[error("{message}")]
    NotFound {
        /// Human-readable message.
        message: String,
    },

    /// A template could not be resolved or executed.
    #[error("template '{name}' failed: {message}")]
    Template {
        /// Template name.
        name: String,
        /// Engine message.
        message: String,
    },

    /// The request content type has no decoder.
    #[error("unsupported content type: '{content_type}'")]
    UnsupportedMediaType {
        /// The offending content type.
        content_type: String,
    },

    /// The request body exceeded the configured limit.
    #[error("payload too large: limit is {limit} bytes")]
    PayloadTooLarge {
        /// Configured limit in bytes.
        limit: usize,
    },

    /// An error with an explicit status.
    #[error(transparent)]
    Status(#[from] StatusError),

    /// The transport adapter does not provide this capability.
    #[error("{capability} is not implemented by the {engine} adapter")]
    NotImplemented {
        /// Adapter engine name.
        engine: &'static str,
        /// Capability name.
        capability: &'static str,
    },

    /// The underlying transport failed.
    #[error("transport error: {message}")]
    Transport {
        /// Transport message.
        message: String,
    },

    /// Unclassified internal error.
    #[error("{message}")]
    Internal {
        /// Human-readable message.
        message: String,
        /// The underlying error (not exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl Error {
    /// Creates a decode error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates a parameter type error.
    #[must_use]
    pub fn param_type(
        location: ParamLocation,
        name: impl Into<String>,
        value: impl Into<String>,
        expected: &'static str,
    ) -> Self {
        Self::ParamType {
            location,
            name: name.into(),
            value: value.into(),
            expected,
        }
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates a template error.
    #[must_use]
    pub fn template(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Template {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates a not implemented error for an adapter capability.
    #[must_use]
    pub const fn not_implemented(engine: &'static str, capability: &'static str) -> Self {
        Self::NotImplemented { engine, capability }
    }

    /// Creates a transport error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Decode { .. } => ErrorKind::Decode,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Transform(_) => ErrorKind::Transform,
            Self::ParamType { .. } => ErrorKind::ParamType,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Template { .. } => ErrorKind::Template,
            Self::UnsupportedMediaType { .. } => ErrorKind::UnsupportedMediaType,
            Self::PayloadTooLarge { .. } => ErrorKind::PayloadTooLarge,
            Self::Status(_) => ErrorKind::Status,
            Self::NotImplemented { .. } => ErrorKind::NotImplemented,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Returns structured detail for the error envelope, if any.
    #[must_use]
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::Validation { fields } => serde_json::to_value(fields).ok(),
            Self::ParamType {
                location, name, ..
            } => Some(serde_json::json!({
                "location": location,
                "name": name,
            })),
            Self::Template { name, .. } => Some(serde_json::json!({ "template": name })),
            Self::PayloadTooLarge { limit } => Some(serde_json::json!({ "limit": limit })),
            Self::Status(err) => err.details.clone(),
            _ => None,
        }
    }
}

impl ErrorWithStatus for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Status(err) => err.status_code(),
            other => other.kind().default_status_code(),
        }
    }
}

/// An error carrying an explicit response status.
///
/// # Example
///
/// ```
/// use janus_core::{ErrorWithStatus, StatusError};
/// use http::StatusCode;
///
/// let err = StatusError::not_found("recipe not found");
/// assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
/// assert_eq!(err.to_string(), "recipe not found");
/// ```
#[derive(Error, Debug)]
#[error("{message}")]
pub struct StatusError {
    status: StatusCode,
    message: String,
    details: Option<serde_json::Value>,
    #[source]
    source: Option<anyhow::Error>,
}

impl StatusError {
    /// Creates an error with the given status and message.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Creates a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Creates a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    /// Creates a 403 Forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    /// Creates a 404 Not Found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Creates a 409 Conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    /// Attaches structured detail written into the error envelope.
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Attaches the underlying cause.
    ///
    /// This is how a domain error gets a response status: the envelope
    /// takes its status from this wrapper and keeps the cause in the
    /// source chain.
    ///
    /// ```
    /// use janus_core::{ErrorWithStatus, StatusError};
    /// use http::StatusCode;
    ///
    /// #[derive(Debug, thiserror::Error)]
    /// #[error("out of leeks")]
    /// struct OutOfStock;
    ///
    /// let err = StatusError::conflict("cannot cook soup").with_source(OutOfStock);
    /// assert_eq!(err.status_code(), StatusCode::CONFLICT);
    /// ```
    #[must_use]
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the structured detail, if any.
    #[must_use]
    pub fn details(&self) -> Option<&serde_json::Value> {
        self.details.as_ref()
    }
}

impl ErrorWithStatus for StatusError {
    fn status_code(&self) -> StatusCode {
        self.status
    }
}

/// Failure of the transformation step of the validation pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("transform failed: {message}")]
pub struct TransformError {
    /// Why the value could not be normalized.
    pub message: String,
}

impl TransformError {
    /// Creates a transform error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Field-specific validation errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors {
    /// Map of field path to list of failed constraints.
    pub fields: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    /// Creates a new empty `FieldErrors`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an error for a field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Returns the messages recorded for a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    /// Returns `true` if there are no field errors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the number of fields with errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.fields {
            if !first {
                write!(f, "; ")?;
            }
            first = false;
            write!(f, "{field}: {}", messages.join(", "))?;
        }
        Ok(())
    }
}

impl From<validator::ValidationErrors> for FieldErrors {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = Self::new();
        collect_validation(&mut fields, None, &errors);
        fields
    }
}

/// Flattens nested validation failures into dotted field paths such as
/// `inner.name` and `items[0].name`.
fn collect_validation(
    fields: &mut FieldErrors,
    prefix: Option<&str>,
    errors: &validator::ValidationErrors,
) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path = match prefix {
            Some(prefix) => format!("{prefix}.{field}"),
            None => field.to_string(),
        };
        match kind {
            ValidationErrorsKind::Field(failures) => {
                for failure in failures {
                    let message = failure
                        .message
                        .as_ref()
                        .map_or_else(|| failure.code.to_string(), ToString::to_string);
                    fields.add(path.clone(), message);
                }
            }
            ValidationErrorsKind::Struct(inner) => collect_validation(fields, Some(&path), inner),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_validation(fields, Some(&format!("{path}[{index}]")), inner);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_status_codes() {
        assert_eq!(Error::decode("bad").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            Error::not_found("missing").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::not_implemented("test", "render").status_code(),
            StatusCode::NOT_IMPLEMENTED
        );
        assert_eq!(
            Error::PayloadTooLarge { limit: 10 }.status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            Error::internal("boom").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_status_variant_uses_inner_status() {
        let err = Error::from(StatusError::conflict("already exists"));
        assert_eq!(err.kind(), ErrorKind::Status);
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "already exists");
    }

    #[test]
    fn test_param_type_message() {
        let err = Error::param_type(ParamLocation::Path, "id", "abc", "integer");
        let message = err.to_string();
        assert!(message.contains("path parameter 'id'"));
        assert!(message.contains("abc"));
        assert_eq!(err.kind().code(), "INVALID_PARAMETER");
    }

    #[test]
    fn test_field_errors_display_is_sorted() {
        let mut fields = FieldErrors::new();
        fields.add("name", "must not be empty");
        fields.add("email", "invalid format");
        fields.add("email", "too long");

        assert_eq!(fields.len(), 2);
        assert_eq!(
            fields.to_string(),
            "email: invalid format, too long; name: must not be empty"
        );
    }

    #[test]
    fn test_validation_details() {
        let mut fields = FieldErrors::new();
        fields.add("name", "length");
        let err = Error::Validation { fields };

        let details = err.details().expect("validation carries details");
        assert_eq!(details["fields"]["name"][0], "length");
    }

    #[test]
    fn test_nested_validation_paths() {
        use validator::Validate;

        #[derive(Debug, Validate)]
        struct Step {
            #[validate(length(min = 1, message = "step must not be empty"))]
            text: String,
        }

        #[derive(Debug, Validate)]
        struct Menu {
            #[validate(length(min = 1))]
            title: String,
            #[validate(nested)]
            starter: Step,
            #[validate(nested)]
            steps: Vec<Step>,
        }

        let menu = Menu {
            title: String::new(),
            starter: Step {
                text: String::new(),
            },
            steps: vec![
                Step {
                    text: "chop".to_string(),
                },
                Step {
                    text: String::new(),
                },
            ],
        };
        let fields = FieldErrors::from(menu.validate().unwrap_err());

        assert_eq!(fields.len(), 3);
        assert_eq!(fields.get("title").unwrap(), ["length"]);
        assert_eq!(
            fields.get("starter.text").unwrap(),
            ["step must not be empty"]
        );
        assert_eq!(
            fields.get("steps[1].text").unwrap(),
            ["step must not be empty"]
        );
        assert!(fields.get("steps[0].text").is_none());
    }

    #[test]
    fn test_status_error_details() {
        let err = Error::from(
            StatusError::not_found("recipe not found")
                .with_details(serde_json::json!({ "id": "42" })),
        );
        assert_eq!(err.details().unwrap()["id"], "42");
    }

    #[test]
    fn test_all_kinds_map_to_error_status() {
        let kinds = [
            ErrorKind::Decode,
            ErrorKind::Validation,
            ErrorKind::Transform,
            ErrorKind::ParamType,
            ErrorKind::NotFound,
            ErrorKind::Template,
            ErrorKind::UnsupportedMediaType,
            ErrorKind::PayloadTooLarge,
            ErrorKind::Status,
            ErrorKind::NotImplemented,
            ErrorKind::Transport,
            ErrorKind::Internal,
        ];

        for kind in kinds {
            let status = kind.default_status_code();
            assert!(
                status.is_client_error() || status.is_server_error(),
                "{kind:?} should map to an error status, got {status}"
            );
        }
    }
}

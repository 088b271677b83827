//! Turning errors into responses.
//!
//! Every error leaving a handler goes through [`write_error`], which picks
//! one status and writes one body. Error bodies use the same negotiated
//! structured format as successful ones.

use std::error::Error as StdError;
use std::iter;

use bytes::Bytes;
use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::{codec, Context, Error, ErrorKind, ErrorWithStatus, Format, StatusError};

/// Wire shape of an error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error.
    pub error: ErrorDetail,
    /// Id of the failed request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Error detail within an envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable code, e.g. `VALIDATION_ERROR`.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Response status, repeated for clients that only see the body.
    pub status: u16,
    /// Structured detail, e.g. failed fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// The error in a chain that decided the response.
enum Resolved<'a> {
    Janus(&'a Error),
    Status(&'a StatusError),
    Unclassified,
}

fn resolve<'a>(err: &'a (dyn StdError + 'static)) -> Resolved<'a> {
    for cause in iter::successors(Some(err), |&cause| cause.source()) {
        if let Some(status_err) = cause.downcast_ref::<StatusError>() {
            return Resolved::Status(status_err);
        }
        if let Some(janus_err) = cause.downcast_ref::<Error>() {
            // An internal error may wrap something more specific.
            if janus_err.kind() != ErrorKind::Internal {
                return Resolved::Janus(janus_err);
            }
        }
    }
    Resolved::Unclassified
}

/// Walks the source chain for an error that carries a status.
///
/// Returns `500 Internal Server Error` when none does.
///
/// ```
/// use janus_core::error_response::status_of;
/// use janus_core::StatusError;
/// use http::StatusCode;
///
/// let err = anyhow::Error::from(StatusError::not_found("not found")).context("loading recipe");
/// assert_eq!(status_of(err.as_ref()), StatusCode::NOT_FOUND);
///
/// let plain = std::io::Error::other("disk on fire");
/// assert_eq!(status_of(&plain), StatusCode::INTERNAL_SERVER_ERROR);
/// ```
#[must_use]
pub fn status_of(err: &(dyn StdError + 'static)) -> StatusCode {
    match resolve(err) {
        Resolved::Janus(err) => err.status_code(),
        Resolved::Status(err) => err.status_code(),
        Resolved::Unclassified => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Builds the envelope and status for an error.
#[must_use]
pub fn envelope_for(err: &(dyn StdError + 'static), request_id: Option<&str>) -> (StatusCode, ErrorEnvelope) {
    let (status, code, details) = match resolve(err) {
        Resolved::Janus(janus_err) => (
            janus_err.status_code(),
            janus_err.kind().code(),
            janus_err.details(),
        ),
        Resolved::Status(status_err) => (
            status_err.status_code(),
            ErrorKind::Status.code(),
            status_err.details().cloned(),
        ),
        Resolved::Unclassified => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::Internal.code(),
            None,
        ),
    };

    let envelope = ErrorEnvelope {
        error: ErrorDetail {
            code: code.to_string(),
            message: err.to_string(),
            status: status.as_u16(),
            details,
        },
        request_id: request_id.map(ToString::to_string),
    };
    (status, envelope)
}

/// Writes an error response into the context.
///
/// Whatever the handler already wrote to the body is discarded. If the
/// envelope cannot be encoded in the negotiated format, it is written as
/// JSON instead; this function never fails.
pub fn write_error<C: Context + ?Sized>(ctx: &mut C, err: &(dyn StdError + 'static)) {
    let request_id = ctx.request_id().to_string();
    let (status, envelope) = envelope_for(err, Some(&request_id));

    if status.is_server_error() {
        tracing::error!(
            engine = ctx.engine(),
            request_id = %request_id,
            status = status.as_u16(),
            error = %err,
            "request failed"
        );
    } else {
        tracing::warn!(
            engine = ctx.engine(),
            request_id = %request_id,
            status = status.as_u16(),
            error = %err,
            "request rejected"
        );
    }

    let format = ctx.format().structured();
    let (format, body) = match codec::encode(format, &envelope) {
        Ok(body) => (format, body),
        Err(_) => (
            Format::Json,
            serde_json::to_vec(&envelope).map_or_else(|_| Bytes::new(), Bytes::from),
        ),
    };

    let response = ctx.response_mut();
    response.reset_for_error();
    response.write(status, format.content_type(), body);
}

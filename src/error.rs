//! Error Handling
//!
//! This module defines the crate's error taxonomy. The webhook pipeline has two
//! failure policies and the types follow them:
//!
//! - **Fail fast**: [`PayloadError`] (the envelope itself is unusable) and
//!   [`ProcessError`] (a message could not be built, or a subscriber failed).
//!   Either one stops the request.
//! - **Fail soft**: [`ChangeError`] (one change did not match its schema). The
//!   change is dropped and its siblings keep going; the error is collected in
//!   the [`ProcessReport`](crate::ProcessReport) and logged.

use std::error::Error as StdError;

use reqwest::StatusCode;

use crate::{EventType, MetaError};

/// The **top-level error enum** for the `whatsapp-webhook-rs` crate.
///
/// It uses `#[non_exhaustive]` to allow for future additions of error variants
/// without breaking client code.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A network error (connection issues, DNS resolution failures, TLS errors)
    /// from the outbound requester or the listener.
    #[error("A network error occurred: {0}")]
    Network(#[from] BoxError),

    /// The Graph API answered an outbound request with an error or with a body
    /// we could not understand.
    #[error("An API service error occurred: {0}")]
    Service(#[from] ServiceError),

    /// An **I/O error**, typically from binding the listener.
    #[error("An I/O error occurred: {0}")]
    Io(#[from] std::io::Error),

    /// The inbound payload could not be decoded at all.
    #[error("The webhook payload was rejected: {0}")]
    Payload(#[from] PayloadError),

    /// Processing of a decoded payload was aborted.
    #[error("Webhook processing was aborted: {0}")]
    Process(#[from] ProcessError),

    /// An **internal logic error** or misconfiguration (for example a missing
    /// verify token, or an invalid request being built).
    #[error("An internal library error occurred: {0}")]
    Internal(BoxError),
}

impl Error {
    pub(crate) fn network(err: BoxError) -> Self {
        Self::Network(err)
    }

    pub(crate) fn internal(err: BoxError) -> Self {
        Self::Internal(err)
    }
}

/// Envelope-level failures. Fatal for the request (HTTP 400), nothing is published.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum PayloadError {
    /// The body is not JSON, or a required top-level field is missing.
    #[error("malformed webhook payload: {0}")]
    Json(#[from] serde_json::Error),

    /// `object` is not `whatsapp_business_account`.
    #[error("unexpected webhook object '{0}'")]
    UnexpectedObject(String),

    /// An entry carries an empty account id.
    #[error("entry #{index} has no account id")]
    MissingAccountId { index: usize },
}

/// A single change whose value did not decode into the schema its `field` names.
///
/// Only that change is dropped; sibling changes and entries are still processed.
#[derive(thiserror::Error, Debug)]
#[error("change '{field}' of account '{account_id}' did not match its schema: {source}")]
#[non_exhaustive]
pub struct ChangeError {
    pub field: String,
    pub account_id: String,
    #[source]
    pub source: serde_json::Error,
}

/// Failure to build a typed message component from an inbound message.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum BuildError {
    /// The message says it is of `kind` but carries no `kind` object.
    #[error("{kind} message has no {kind} payload")]
    MissingPayload { kind: &'static str },

    /// A field the component cannot exist without is absent or empty.
    #[error("{kind} message is missing required field '{field}'")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },

    /// Coordinates outside of [-90, 90] / [-180, 180].
    #[error("location ({latitude}, {longitude}) is out of range")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    /// The message object does not match the inbound message schema.
    #[error("message could not be decoded: {reason}")]
    Malformed { reason: String },
}

/// A subscriber returned an error while an event was being delivered.
#[derive(thiserror::Error, Debug)]
#[error("subscriber for '{event_type}' failed: {source}")]
#[non_exhaustive]
pub struct SubscriberError {
    pub event_type: EventType,
    #[source]
    pub source: BoxError,
}

/// Request-level hard failures raised while normalizing and publishing.
///
/// Any of these aborts the remainder of the request and maps to HTTP 500.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum ProcessError {
    /// An inbound message failed to build; the rest of its batch was skipped.
    #[error("message '{message_id}' could not be built: {source}")]
    Build {
        message_id: String,
        #[source]
        source: BuildError,
    },

    /// A subscriber failed.
    #[error(transparent)]
    Subscriber(#[from] SubscriberError),
}

/// Errors from the Graph API for outbound requests (reply, react).
#[derive(thiserror::Error, Debug)]
#[error("Service error at '{endpoint}': {kind} (HTTP status {status})")]
#[non_exhaustive]
pub struct ServiceError {
    pub(crate) status: StatusCode,
    pub(crate) kind: ServiceErrorKind,
    pub(crate) endpoint: String,
}

impl ServiceError {
    /// Returns the HTTP status code associated with this service error.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the API path where this service error occurred.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the specific kind of service error.
    pub fn kind(&self) -> &ServiceErrorKind {
        &self.kind
    }

    pub(crate) fn api(error: MetaError) -> ServiceErrorKind {
        ServiceErrorKind::Api(ApiError {
            error: Box::new(error),
        })
    }

    pub(crate) fn parse(source: BoxError, body: String) -> ServiceErrorKind {
        ServiceErrorKind::Parse(ParseError {
            source: Some(source),
            body,
        })
    }
}

/// The granular cause of a [`ServiceError`].
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum ServiceErrorKind {
    /// Meta reported an error in the response body.
    #[error("The API returned an error: {0}")]
    Api(#[from] ApiError),

    /// The response body was not in the expected shape.
    #[error("Failed to parse the API response: {0}")]
    Parse(#[from] ParseError),
}

impl ServiceErrorKind {
    pub(crate) fn service(self, endpoint: impl Into<String>, status: StatusCode) -> ServiceError {
        ServiceError {
            status,
            kind: self,
            endpoint: endpoint.into(),
        }
    }
}

/// An API error with the [`MetaError`] details from the response body.
#[derive(thiserror::Error, Debug)]
#[error("Meta API error: {error}")]
#[non_exhaustive]
pub struct ApiError {
    pub error: Box<MetaError>,
}

/// A response body we failed to deserialize.
#[derive(thiserror::Error, Debug)]
#[error("Failed to parse the response body. Raw body content was: '{}'.", body)]
#[non_exhaustive]
pub struct ParseError {
    #[source]
    pub(crate) source: Option<BoxError>,
    pub body: String,
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        if value.is_builder() || value.is_redirect() {
            Self::internal(value.into())
        } else {
            Self::network(value.into())
        }
    }
}

/// A boxed, thread-safe trait-object error.
///
/// Subscriber callbacks and the network layer report through this type.
pub type BoxError = Box<dyn StdError + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_errors_name_the_missing_piece() {
        let err = BuildError::MissingField {
            kind: "document",
            field: "filename",
        };
        assert_eq!(
            err.to_string(),
            "document message is missing required field 'filename'"
        );

        let err = ProcessError::Build {
            message_id: "wamid.1".into(),
            source: BuildError::MissingPayload { kind: "image" },
        };
        assert_eq!(
            err.to_string(),
            "message 'wamid.1' could not be built: image message has no image payload"
        );
    }

    #[test]
    fn subscriber_error_is_transparent_in_process_error() {
        let err: ProcessError = SubscriberError {
            event_type: EventType::TextMessage,
            source: "boom".into(),
        }
        .into();
        assert_eq!(err.to_string(), "subscriber for 'text_message' failed: boom");
    }
}

//! EMR error types.
//!
//! Every fallible operation in this crate returns [`EmrResult`]. Configuration
//! problems surface when a session is built, provider rejections surface from
//! `submit`, and transport or decoding failures are converted from their
//! foreign error types at the boundary.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Broad category of an [`EmrError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmrErrorKind {
    /// No access key or secret key could be resolved.
    MissingCredentials,
    /// A region was supplied but left blank.
    MissingRegion,
    /// The service rejected the request (HTTP 4xx).
    InvalidArgument,
    /// The service failed to process the request (HTTP 5xx or other non-2xx).
    ServiceError,
    /// The parameter tree could not be marshalled into wire parameters.
    InvalidParameter,
    /// Transport-level failure (connect, TLS, body read).
    Http,
    /// A body that had to be XML was not well formed.
    XmlParse,
    /// JSON decoding failure.
    Serialization,
}

/// Top-level error type for all EMR operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmrError {
    pub kind: EmrErrorKind,
    /// Human-readable message. For rejections this is the provider's own text.
    pub message: String,
    /// Provider error code (e.g. "ValidationException"), when one was returned.
    pub code: Option<String>,
    /// HTTP status code, 0 when no response was received.
    pub status_code: u16,
    /// Provider request ID, when one was returned.
    pub request_id: Option<String>,
}

impl fmt::Display for EmrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(ref code) => write!(f, "[{:?}] {}: {}", self.kind, code, self.message)?,
            None => write!(f, "[{:?}] {}", self.kind, self.message)?,
        }
        if self.status_code != 0 {
            write!(f, " (HTTP {})", self.status_code)?;
        }
        if let Some(ref req_id) = self.request_id {
            write!(f, " [RequestId: {}]", req_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for EmrError {}

impl EmrError {
    pub fn new(kind: EmrErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            code: None,
            status_code: 0,
            request_id: None,
        }
    }

    pub fn missing_credentials(message: impl Into<String>) -> Self {
        Self::new(EmrErrorKind::MissingCredentials, message)
    }

    pub fn missing_region() -> Self {
        Self::new(
            EmrErrorKind::MissingRegion,
            "A valid region is required to connect to EMR",
        )
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::new(EmrErrorKind::InvalidParameter, message)
    }

    pub fn xml(message: impl Into<String>) -> Self {
        Self::new(EmrErrorKind::XmlParse, message)
    }

    /// With HTTP status.
    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    /// With provider error code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// With request ID.
    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    /// Whether this error was raised by the provider rejecting the request.
    pub fn is_rejection(&self) -> bool {
        self.kind == EmrErrorKind::InvalidArgument
    }
}

impl From<reqwest::Error> for EmrError {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16()).unwrap_or(0);
        Self::new(EmrErrorKind::Http, err.to_string()).with_status(status)
    }
}

impl From<quick_xml::Error> for EmrError {
    fn from(err: quick_xml::Error) -> Self {
        Self::xml(err.to_string())
    }
}

impl From<serde_json::Error> for EmrError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(EmrErrorKind::Serialization, err.to_string())
    }
}

/// Convert EmrError to a plain String error for command-style callers.
impl From<EmrError> for String {
    fn from(err: EmrError) -> String {
        err.to_string()
    }
}

/// Convenience result type for EMR operations.
pub type EmrResult<T> = Result<T, EmrError>;

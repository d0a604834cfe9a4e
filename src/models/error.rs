//! Error types for the function URL adapter.
//!
//! `Decode`, `Construction`, `ResponseNotStarted` and `Service` end the
//! invocation they occur in. `QueryDecode` is only ever logged: the offending
//! parameter falls back to its raw value.

use lambda_runtime::Diagnostic;
use thiserror::Error;

/// Errors raised while translating an event or finalizing a response.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The event body was flagged as base64 but did not decode
    #[error("could not decode base64 body: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Method or URL rejected while building the HTTP request
    #[error("could not construct request: {0}")]
    Construction(#[from] http::Error),

    /// Malformed percent-encoding in a single query parameter
    #[error("could not unescape query parameter {0:?}")]
    QueryDecode(String),

    #[error("status code not set on response")]
    ResponseNotStarted,

    /// A tower service failed or its response body could not be read
    #[error("service error: {0}")]
    Service(String),
}

impl AdapterError {
    /// Stable error type name reported to the Lambda service.
    #[must_use]
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::Decode(_) => "DecodeError",
            Self::Construction(_) => "ConstructionError",
            Self::QueryDecode(_) => "QueryDecodeError",
            Self::ResponseNotStarted => "ResponseNotStartedError",
            Self::Service(_) => "ServiceError",
        }
    }
}

impl From<AdapterError> for Diagnostic {
    fn from(error: AdapterError) -> Self {
        Self {
            error_type: error.error_type().to_string(),
            error_message: error.to_string(),
        }
    }
}

//! Lambda function URL request/response payloads (format version 2.0).
//!
//! These types mirror the JSON the Lambda service sends to, and expects back
//! from, a function invoked through its function URL.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Event delivered for each HTTP call made to the function URL
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct FunctionUrlRequest {
    pub version: Option<String>,
    pub raw_path: String,
    pub raw_query_string: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookies: Option<Vec<String>>,
    pub headers: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_string_parameters: Option<HashMap<String, String>>,
    pub request_context: FunctionUrlRequestContext,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub is_base64_encoded: bool,
}

/// Per-request metadata block, passed through to handlers untouched
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FunctionUrlRequestContext {
    pub account_id: String,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorizer: Option<Value>,
    pub api_id: String,
    pub domain_name: String,
    pub domain_prefix: String,
    pub time: String,
    pub time_epoch: i64,
    pub http: FunctionUrlHttpDescription,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct FunctionUrlHttpDescription {
    pub method: String,
    pub path: String,
    pub protocol: String,
    pub source_ip: String,
    pub user_agent: String,
}

/// Response returned to the Lambda service for a function URL invocation
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FunctionUrlResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl FunctionUrlResponse {
    /// Generic failure response returned when an invocation cannot be served.
    #[must_use]
    pub fn gateway_timeout() -> Self {
        Self {
            status_code: http::StatusCode::GATEWAY_TIMEOUT.as_u16(),
            ..Self::default()
        }
    }
}

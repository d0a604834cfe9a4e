//! Translation of function URL events into in-process HTTP requests.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use http::{HeaderName, HeaderValue, Method, Request};
use lambda_runtime::Context;
use lambda_runtime::tracing::{debug, error, warn};
use std::collections::HashMap;
use std::io::{self, Cursor, Read};
use url::form_urlencoded;

use crate::models::{AdapterError, FunctionUrlRequest, FunctionUrlRequestContext};

/// Environment variable overriding the server address used in request URLs.
pub const CUSTOM_HOST_VARIABLE: &str = "SERVERLESS_API_HOST";

/// Placeholder origin used when no override is configured. Requests are
/// served in-process, this host is never dialed.
pub const DEFAULT_SERVER_ADDRESS: &str = "https://aws-serverless-go-api.com";

/// Request body handed to handlers: a reader over the decoded event payload.
#[derive(Debug, Clone, Default)]
pub struct Body(Cursor<Bytes>);

impl Body {
    /// The complete payload, regardless of how much has been read.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.get_ref()
    }

    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.0.into_inner()
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Cursor::new(Bytes::from(bytes)))
    }
}

impl Read for Body {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

/// Invocation metadata attached to requests built with
/// [`EventTranslator::event_to_request_with_context`].
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub lambda_context: Context,
    pub function_url_context: FunctionUrlRequestContext,
}

/// Access to the [`RequestContext`] stored in a request's extensions.
pub trait RequestContextExt {
    fn request_context(&self) -> Option<&RequestContext>;

    fn lambda_context(&self) -> Option<&Context> {
        self.request_context().map(|rc| &rc.lambda_context)
    }

    fn function_url_context(&self) -> Option<&FunctionUrlRequestContext> {
        self.request_context().map(|rc| &rc.function_url_context)
    }
}

impl<B> RequestContextExt for Request<B> {
    fn request_context(&self) -> Option<&RequestContext> {
        self.extensions().get::<RequestContext>()
    }
}

/// Converts function URL events into `http::Request`s.
///
/// Each translator owns its base path, so independent translators can be
/// configured differently within one process.
#[derive(Debug, Clone, Default)]
pub struct EventTranslator {
    strip_base_path: String,
    server_address: Option<String>,
}

impl EventTranslator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the origin used in request URLs. An empty address, or none at all,
    /// means [`DEFAULT_SERVER_ADDRESS`]. [`Config`](crate::config::Config)
    /// resolves [`CUSTOM_HOST_VARIABLE`] into this value at cold start.
    #[must_use]
    pub fn with_server_address(mut self, address: impl Into<String>) -> Self {
        self.server_address = Some(address.into());
        self
    }

    /// Sets the prefix removed from every inbound path and returns its
    /// normalized form: one leading `/`, no trailing `/`. Blank input disables
    /// stripping and returns an empty string.
    pub fn strip_base_path(&mut self, base_path: &str) -> String {
        let trimmed = base_path.trim();
        if trimmed.is_empty() {
            self.strip_base_path.clear();
            return String::new();
        }

        let normalized = format!("/{}", trimmed.trim_start_matches('/').trim_end_matches('/'));
        self.strip_base_path.clone_from(&normalized);
        normalized
    }

    /// The currently configured base path, empty when stripping is disabled.
    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.strip_base_path
    }

    /// Converts an event into a request for framework adapters that do not
    /// need invocation metadata.
    ///
    /// # Errors
    ///
    /// See [`Self::event_to_request`].
    pub fn proxy_event_to_http_request(
        &self,
        event: &FunctionUrlRequest,
    ) -> Result<Request<Body>, AdapterError> {
        self.event_to_request(event)
    }

    /// Converts an event into a request and attaches a [`RequestContext`]
    /// carrying the Lambda context and the event's request context block.
    ///
    /// # Errors
    ///
    /// See [`Self::event_to_request`].
    pub fn event_to_request_with_context(
        &self,
        ctx: &Context,
        event: &FunctionUrlRequest,
    ) -> Result<Request<Body>, AdapterError> {
        let mut request = self.event_to_request(event)?;

        request.extensions_mut().insert(RequestContext {
            lambda_context: ctx.clone(),
            function_url_context: event.request_context.clone(),
        });
        Ok(request)
    }

    /// Converts an event into a request.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::Decode` when a base64-flagged body does not
    /// decode and `AdapterError::Construction` when the method or URL is
    /// rejected by the HTTP crate. Malformed query parameters are not errors.
    pub fn event_to_request(&self, event: &FunctionUrlRequest) -> Result<Request<Body>, AdapterError> {
        let raw_body = event.body.as_deref().unwrap_or_default();
        let body = if event.is_base64_encoded {
            STANDARD.decode(raw_body).inspect_err(|e| {
                error!(error = %e, "Could not decode base64 body");
            })?
        } else {
            raw_body.as_bytes().to_vec()
        };

        let mut url = self.server_address();
        url.push_str(&self.resolve_path(&event.raw_path));
        if let Some(query) = event
            .query_string_parameters
            .as_ref()
            .and_then(encode_query)
        {
            url.push('?');
            url.push_str(&query);
        }

        let method = match event.request_context.http.method.as_str() {
            "" => Method::GET.to_string(),
            method => method.to_uppercase(),
        };

        debug!(method = %method, url = %url, "Translated function URL event");

        let mut request = Request::builder()
            .method(method.as_str())
            .uri(url.as_str())
            .body(Body::from(body))
            .inspect_err(|e| {
                error!(
                    error = %e,
                    "Could not convert request {}:{} to http::Request",
                    event.request_context.http.method,
                    event.raw_path
                );
            })?;

        let headers = request.headers_mut();
        for (name, value) in &event.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.append(name, value);
                }
                _ => warn!(header = %name, "Skipping invalid header"),
            }
        }

        Ok(request)
    }

    fn server_address(&self) -> String {
        self.server_address
            .as_deref()
            .filter(|address| !address.is_empty())
            .unwrap_or(DEFAULT_SERVER_ADDRESS)
            .to_string()
    }

    fn resolve_path(&self, raw_path: &str) -> String {
        let mut path = raw_path;
        if self.strip_base_path.len() > 1
            && let Some(stripped) = path.strip_prefix(self.strip_base_path.as_str())
        {
            path = stripped;
        }

        if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        }
    }
}

/// Re-encodes query parameters as a form-encoded string sorted by decoded
/// name, then value. Returns `None` when there is nothing to encode.
fn encode_query(params: &HashMap<String, String>) -> Option<String> {
    if params.is_empty() {
        return None;
    }

    let mut pairs: Vec<(Vec<u8>, Vec<u8>)> = params
        .iter()
        .map(|(name, value)| (unescape_or_raw(name), unescape_or_raw(value)))
        .collect();
    pairs.sort();

    let encoded: Vec<String> = pairs
        .iter()
        .map(|(name, value)| {
            format!(
                "{}={}",
                form_urlencoded::byte_serialize(name).collect::<String>(),
                form_urlencoded::byte_serialize(value).collect::<String>()
            )
        })
        .collect();
    Some(encoded.join("&"))
}

fn unescape_or_raw(escaped: &str) -> Vec<u8> {
    query_unescape(escaped).unwrap_or_else(|e| {
        warn!(error = %e, "Using raw query parameter");
        escaped.as_bytes().to_vec()
    })
}

/// Decodes a form-encoded query component to bytes: `+` becomes a space and
/// every `%` must introduce two hex digits. The result need not be UTF-8.
///
/// # Errors
///
/// Returns `AdapterError::QueryDecode` on a malformed escape.
pub fn query_unescape(escaped: &str) -> Result<Vec<u8>, AdapterError> {
    let bytes = escaped.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
            if !valid {
                return Err(AdapterError::QueryDecode(escaped.to_string()));
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    Ok(urlencoding::decode_binary(escaped.replace('+', " ").as_bytes()).into_owned())
}

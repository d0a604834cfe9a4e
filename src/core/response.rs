//! Capture of handler output into a function URL response.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::BytesMut;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, StatusCode};
use lambda_runtime::tracing::debug;
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};

use super::sniff::detect_content_type;
use crate::models::{AdapterError, FunctionUrlResponse};

/// The surface handler code writes a response through.
///
/// Bodies are written with [`std::io::Write`]; the first write commits a
/// `200 OK` unless a status was set before it.
pub trait ResponseWriter: Write {
    /// Response headers, freely editable until the response is finalized.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Sets the status code. The last call before finalization wins.
    fn write_status(&mut self, status: StatusCode);

    /// Returns a receiver that gets `true` once the response is closed for
    /// writing. The signal is delivered synchronously, so the receiver must be
    /// drained promptly.
    fn close_notify(&mut self) -> Receiver<bool>;
}

/// Accumulates everything a handler writes during one invocation.
///
/// A capture is single-use: [`ResponseCapture::finalize`] consumes it.
///
/// The `Content-Type` is sniffed from the first chunk written only. A short
/// first chunk can therefore yield a less specific type than the full body
/// would; set the header explicitly when that matters.
#[derive(Debug)]
pub struct ResponseCapture {
    headers: HeaderMap,
    body: BytesMut,
    status: Option<StatusCode>,
    wrote: bool,
    observers: Vec<SyncSender<bool>>,
}

impl Default for ResponseCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseCapture {
    #[must_use]
    pub fn new() -> Self {
        Self {
            headers: HeaderMap::new(),
            body: BytesMut::new(),
            status: None,
            wrote: false,
            observers: Vec::new(),
        }
    }

    /// Status set so far, `None` until the handler writes a status or body.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        self.status
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn notify_closed(&self) {
        for observer in &self.observers {
            // blocks until the subscriber receives
            if observer.send(true).is_err() {
                debug!("Close subscriber dropped before notification");
            }
        }
    }

    /// Flattens each header's values into one comma-separated string.
    fn headers_to_map(&self) -> HashMap<String, String> {
        self.headers
            .keys()
            .map(|name| {
                let joined = self
                    .headers
                    .get_all(name)
                    .iter()
                    .map(|value| String::from_utf8_lossy(value.as_bytes()))
                    .collect::<Vec<_>>()
                    .join(",");
                (name.to_string(), joined)
            })
            .collect()
    }

    /// Closes the response and converts it to the function URL format.
    ///
    /// Every close subscriber is notified first, one blocking send each, with
    /// no timeout: a subscriber that never receives stalls this call, and with
    /// it the invocation, until the Lambda deadline.
    ///
    /// Bodies that are valid UTF-8 are returned as text, anything else is
    /// base64-encoded.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::ResponseNotStarted` if the handler neither set a
    /// status nor wrote a body.
    pub fn finalize(self) -> Result<FunctionUrlResponse, AdapterError> {
        self.notify_closed();

        let status = self.status.ok_or(AdapterError::ResponseNotStarted)?;

        let (body, is_base64_encoded) = match std::str::from_utf8(&self.body) {
            Ok(text) => (text.to_string(), false),
            Err(_) => (STANDARD.encode(&self.body), true),
        };

        Ok(FunctionUrlResponse {
            status_code: status.as_u16(),
            headers: self.headers_to_map(),
            body,
            is_base64_encoded,
        })
    }
}

impl Write for ResponseCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.wrote {
            self.wrote = true;
            if self.status.is_none() {
                self.status = Some(StatusCode::OK);
            }
            if !self.headers.contains_key(CONTENT_TYPE) {
                self.headers.append(
                    CONTENT_TYPE,
                    HeaderValue::from_static(detect_content_type(buf)),
                );
            }
        }

        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ResponseWriter for ResponseCapture {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    fn close_notify(&mut self) -> Receiver<bool> {
        let (tx, rx) = sync_channel(0);
        self.observers.push(tx);
        rx
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn first_write_sets_ok_and_sniffs() {
        let mut capture = ResponseCapture::new();
        capture.write_all(b"<html></html>").unwrap();

        assert_eq!(capture.status(), Some(StatusCode::OK));
        assert_eq!(
            capture.headers().get(CONTENT_TYPE).unwrap(),
            "text/html; charset=utf-8"
        );
    }

    #[test]
    fn explicit_status_survives_first_write() {
        let mut capture = ResponseCapture::new();
        capture.write_status(StatusCode::CREATED);
        capture.write_all(b"done").unwrap();
        assert_eq!(capture.status(), Some(StatusCode::CREATED));
    }

    #[test]
    fn status_after_write_overrides_default() {
        let mut capture = ResponseCapture::new();
        capture.write_all(b"oops").unwrap();
        capture.write_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            capture.finalize().unwrap().status_code,
            StatusCode::INTERNAL_SERVER_ERROR.as_u16()
        );
    }

    #[test]
    fn sniffing_only_uses_first_chunk() {
        let mut capture = ResponseCapture::new();
        capture.write_all(b"plain ").unwrap();
        capture.headers_mut().remove(CONTENT_TYPE);
        capture.write_all(b"<html></html>").unwrap();
        assert!(capture.headers().get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn declared_content_type_is_kept() {
        let mut capture = ResponseCapture::new();
        capture
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        capture.write_all(b"{}").unwrap();

        let values: Vec<_> = capture.headers().get_all(CONTENT_TYPE).iter().collect();
        assert_eq!(values, vec!["application/json"]);
    }

    #[test]
    fn headers_are_joined_in_insertion_order() {
        let mut capture = ResponseCapture::new();
        capture.write_status(StatusCode::OK);
        let headers = capture.headers_mut();
        headers.append("x-multi", HeaderValue::from_static("one"));
        headers.append("x-multi", HeaderValue::from_static("two"));
        headers.append("x-single", HeaderValue::from_static("only"));

        let response = capture.finalize().unwrap();
        assert_eq!(response.headers["x-multi"], "one,two");
        assert_eq!(response.headers["x-single"], "only");
    }

    #[test]
    fn write_reports_full_length() {
        let mut capture = ResponseCapture::new();
        assert_eq!(capture.write(b"abc").unwrap(), 3);
        assert_eq!(capture.write(b"").unwrap(), 0);
    }
}

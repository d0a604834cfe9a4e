//! Runs an in-process handler against function URL events.

use http::Request;
use lambda_runtime::Context;
use lambda_runtime::tracing::error;
use std::ops::{Deref, DerefMut};

use crate::core::{Body, EventTranslator, ResponseCapture, ResponseWriter};
use crate::models::{AdapterError, FunctionUrlRequest, FunctionUrlResponse};

/// Handler-shaped application code: writes one response for one request.
pub trait Handler {
    fn serve_http(&self, writer: &mut dyn ResponseWriter, request: Request<Body>);
}

impl<F> Handler for F
where
    F: Fn(&mut dyn ResponseWriter, Request<Body>),
{
    fn serve_http(&self, writer: &mut dyn ResponseWriter, request: Request<Body>) {
        self(writer, request);
    }
}

/// Pairs an [`EventTranslator`] with a [`Handler`].
///
/// Dereferences to the translator, so the base path is configured directly on
/// the adapter:
///
/// ```
/// use aws_lambda_url_adapter::adapter::HandlerAdapter;
/// use aws_lambda_url_adapter::core::{Body, ResponseWriter};
/// use http::{Request, StatusCode};
///
/// fn no_content(writer: &mut dyn ResponseWriter, _request: Request<Body>) {
///     writer.write_status(StatusCode::NO_CONTENT);
/// }
///
/// let mut adapter = HandlerAdapter::new(no_content);
/// assert_eq!(adapter.strip_base_path("api/"), "/api");
/// ```
#[derive(Debug, Clone)]
pub struct HandlerAdapter<H> {
    translator: EventTranslator,
    handler: H,
}

impl<H: Handler> HandlerAdapter<H> {
    #[must_use]
    pub fn new(handler: H) -> Self {
        Self::with_translator(EventTranslator::new(), handler)
    }

    #[must_use]
    pub const fn with_translator(translator: EventTranslator, handler: H) -> Self {
        Self {
            translator,
            handler,
        }
    }

    /// Serves one event without invocation metadata.
    ///
    /// # Errors
    ///
    /// Returns the translation or finalization error; the caller decides what
    /// response to send instead, usually
    /// [`FunctionUrlResponse::gateway_timeout`].
    pub fn proxy(&self, event: &FunctionUrlRequest) -> Result<FunctionUrlResponse, AdapterError> {
        let request = self.translator.proxy_event_to_http_request(event);
        self.proxy_internal(request)
    }

    /// Serves one event, exposing the Lambda context and the event's request
    /// context to the handler through
    /// [`RequestContextExt`](crate::core::RequestContextExt).
    ///
    /// # Errors
    ///
    /// See [`Self::proxy`].
    pub fn proxy_with_context(
        &self,
        ctx: &Context,
        event: &FunctionUrlRequest,
    ) -> Result<FunctionUrlResponse, AdapterError> {
        let request = self.translator.event_to_request_with_context(ctx, event);
        self.proxy_internal(request)
    }

    fn proxy_internal(
        &self,
        request: Result<Request<Body>, AdapterError>,
    ) -> Result<FunctionUrlResponse, AdapterError> {
        let request = request.inspect_err(|e| {
            error!(error = %e, "Could not convert proxy event to request");
        })?;

        let mut capture = ResponseCapture::new();
        self.handler.serve_http(&mut capture, request);

        capture.finalize().inspect_err(|e| {
            error!(error = %e, "Error while generating proxy response");
        })
    }
}

impl<H> Deref for HandlerAdapter<H> {
    type Target = EventTranslator;

    fn deref(&self) -> &Self::Target {
        &self.translator
    }
}

impl<H> DerefMut for HandlerAdapter<H> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.translator
    }
}

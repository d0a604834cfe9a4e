//! Serves function URL events through a `tower::Service`, such as an axum
//! `Router`, so existing routers run unchanged behind a function URL.

use axum::body::HttpBody;
use http::{Request, Response};
use http_body_util::BodyExt;
use lambda_runtime::Context;
use lambda_runtime::tracing::error;
use std::fmt::Display;
use std::io::Write;
use std::ops::{Deref, DerefMut};
use tower::{Service, ServiceExt};

use crate::core::{Body, EventTranslator, ResponseCapture, ResponseWriter};
use crate::models::{AdapterError, FunctionUrlRequest, FunctionUrlResponse};

/// Pairs an [`EventTranslator`] with a cloneable service. Each event is
/// served by a fresh clone through [`ServiceExt::oneshot`].
///
/// ```
/// use aws_lambda_url_adapter::service::ServiceAdapter;
/// use axum::{Router, routing::get};
///
/// let router: Router = Router::new().route("/", get(|| async { "ok" }));
/// let mut adapter = ServiceAdapter::new(router);
/// assert_eq!(adapter.strip_base_path("/v1/"), "/v1");
/// ```
#[derive(Debug, Clone)]
pub struct ServiceAdapter<S> {
    translator: EventTranslator,
    service: S,
}

impl<S, B> ServiceAdapter<S>
where
    S: Service<Request<axum::body::Body>, Response = Response<B>> + Clone + Send + Sync,
    S::Future: Send,
    S::Error: Display,
    B: HttpBody + Send,
    B::Data: Send,
    B::Error: Display,
{
    #[must_use]
    pub fn new(service: S) -> Self {
        Self::with_translator(EventTranslator::new(), service)
    }

    #[must_use]
    pub const fn with_translator(translator: EventTranslator, service: S) -> Self {
        Self {
            translator,
            service,
        }
    }

    /// Serves one event without invocation metadata.
    ///
    /// # Errors
    ///
    /// Returns the translation or finalization error, or
    /// `AdapterError::Service` when the service or its response body fails.
    pub async fn proxy(
        &self,
        event: &FunctionUrlRequest,
    ) -> Result<FunctionUrlResponse, AdapterError> {
        let request = self.translator.proxy_event_to_http_request(event);
        self.proxy_internal(request).await
    }

    /// Serves one event with the Lambda and function URL contexts attached to
    /// the request extensions.
    ///
    /// # Errors
    ///
    /// See [`Self::proxy`].
    pub async fn proxy_with_context(
        &self,
        ctx: &Context,
        event: &FunctionUrlRequest,
    ) -> Result<FunctionUrlResponse, AdapterError> {
        let request = self.translator.event_to_request_with_context(ctx, event);
        self.proxy_internal(request).await
    }

    async fn proxy_internal(
        &self,
        request: Result<Request<Body>, AdapterError>,
    ) -> Result<FunctionUrlResponse, AdapterError> {
        let request = request.inspect_err(|e| {
            error!(error = %e, "Could not convert proxy event to request");
        })?;

        let (parts, body) = request.into_parts();
        let request = Request::from_parts(parts, axum::body::Body::from(body.into_bytes()));

        let response = self
            .service
            .clone()
            .oneshot(request)
            .await
            .map_err(|e| AdapterError::Service(e.to_string()))
            .inspect_err(|e| error!(error = %e, "Service failed to answer"))?;

        let (parts, body) = response.into_parts();
        let bytes = body
            .collect()
            .await
            .map_err(|e| AdapterError::Service(e.to_string()))
            .inspect_err(|e| error!(error = %e, "Could not read response body"))?
            .to_bytes();

        let mut capture = ResponseCapture::new();
        capture.headers_mut().extend(parts.headers);
        capture.write_status(parts.status);
        if !bytes.is_empty() {
            capture
                .write_all(&bytes)
                .map_err(|e| AdapterError::Service(e.to_string()))?;
        }

        capture.finalize().inspect_err(|e| {
            error!(error = %e, "Error while generating proxy response");
        })
    }
}

impl<S> Deref for ServiceAdapter<S> {
    type Target = EventTranslator;

    fn deref(&self) -> &Self::Target {
        &self.translator
    }
}

impl<S> DerefMut for ServiceAdapter<S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.translator
    }
}

use anyhow::{Context as _, Result};
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Request, StatusCode};
use lambda_runtime::tracing::{debug, error, info};
use lambda_runtime::{Diagnostic, LambdaEvent};
use serde_json::json;
use std::collections::BTreeMap;
use std::io::Read;
use std::sync::LazyLock;

use crate::adapter::HandlerAdapter;
use crate::config::Config;
use crate::core::{Body, RequestContextExt, ResponseWriter};
use crate::models::{FunctionUrlRequest, FunctionUrlResponse};

type EchoHandler = fn(&mut dyn ResponseWriter, Request<Body>);

/// Adapter shared by every invocation of this execution environment
static ADAPTER: LazyLock<HandlerAdapter<EchoHandler>> = LazyLock::new(|| {
    HandlerAdapter::with_translator(Config::from_env().translator(), echo as EchoHandler)
});

/// Sample handler: answers with a JSON description of the request it received.
pub fn echo(writer: &mut dyn ResponseWriter, mut request: Request<Body>) {
    match render_echo(&mut request) {
        Ok(payload) => {
            writer
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            if let Err(e) = writer.write_all(&payload) {
                error!(error = %e, "Failed to write echo response");
            }
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "Failed to render echo response");
            writer.write_status(StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}

fn render_echo(request: &mut Request<Body>) -> Result<Vec<u8>> {
    let mut body = String::new();
    request
        .body_mut()
        .read_to_string(&mut body)
        .context("request body is not UTF-8")?;

    let headers: BTreeMap<&str, &str> = request
        .headers()
        .iter()
        .filter_map(|(name, value)| Some((name.as_str(), value.to_str().ok()?)))
        .collect();

    let payload = json!({
        "method": request.method().as_str(),
        "path": request.uri().path(),
        "query": request.uri().query(),
        "headers": headers,
        "body": body,
        "requestId": request.function_url_context().map(|ctx| ctx.request_id.as_str()),
    });

    serde_json::to_vec(&payload).context("failed to serialize echo payload")
}

/// Lambda event handler for function URL invocations.
///
/// The adapter runs on a blocking thread since handlers are synchronous and
/// finalization may wait on close subscribers. Events that cannot be served
/// are answered with a 504; the cause has already been logged by the adapter.
///
/// # Errors
///
/// Never fails; the `Diagnostic` type satisfies the runtime's handler shape.
pub async fn function_handler(
    event: LambdaEvent<FunctionUrlRequest>,
) -> Result<FunctionUrlResponse, Diagnostic> {
    let (payload, context) = event.into_parts();

    info!(
        request_id = %context.request_id,
        path = %payload.raw_path,
        "Invoking function URL handler"
    );

    let served =
        tokio::task::spawn_blocking(move || ADAPTER.proxy_with_context(&context, &payload)).await;

    let response = match served {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            debug!(error_type = e.error_type(), "Answering with gateway timeout");
            FunctionUrlResponse::gateway_timeout()
        }
        Err(e) => {
            error!(error = %e, "Handler task failed");
            FunctionUrlResponse::gateway_timeout()
        }
    };

    Ok(response)
}

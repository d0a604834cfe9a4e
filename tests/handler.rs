// Tests for the Lambda entry point and the sample echo handler
#![allow(clippy::unwrap_used)]

use aws_lambda_url_adapter::handler::function_handler;
use aws_lambda_url_adapter::models::FunctionUrlRequest;
use lambda_runtime::{Context, LambdaEvent};
use serde_json::{Value, json};

fn create_test_lambda_event(payload: Value) -> LambdaEvent<FunctionUrlRequest> {
    LambdaEvent {
        payload: serde_json::from_value(payload).unwrap(),
        context: Context::default(),
    }
}

#[tokio::test]
async fn test_echo_round_trip() {
    let event = create_test_lambda_event(json!({
        "version": "2.0",
        "rawPath": "/orders",
        "headers": { "x-tenant": "acme" },
        "queryStringParameters": { "limit": "10", "sort": "desc" },
        "requestContext": {
            "requestId": "req-1",
            "http": { "method": "post" }
        },
        "body": "{\"item\":\"book\"}",
        "isBase64Encoded": false
    }));

    let response = function_handler(event).await.unwrap();

    assert_eq!(response.status_code, 200);
    assert_eq!(response.headers["content-type"], "application/json");
    assert!(!response.is_base64_encoded);

    let echoed: Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(echoed["method"], "POST");
    assert_eq!(echoed["path"], "/orders");
    assert_eq!(echoed["query"], "limit=10&sort=desc");
    assert_eq!(echoed["headers"]["x-tenant"], "acme");
    assert_eq!(echoed["body"], "{\"item\":\"book\"}");
    assert_eq!(echoed["requestId"], "req-1");
}

#[tokio::test]
async fn test_undecodable_body_yields_gateway_timeout() {
    let event = create_test_lambda_event(json!({
        "rawPath": "/upload",
        "requestContext": { "http": { "method": "PUT" } },
        "body": "***",
        "isBase64Encoded": true
    }));

    let response = function_handler(event).await.unwrap();
    assert_eq!(response.status_code, 504);
    assert!(response.body.is_empty());
}

#[tokio::test]
async fn test_binary_body_is_reported_as_server_error() {
    // base64 of 0xFF 0xFE, which is not UTF-8 and cannot be echoed as text
    let event = create_test_lambda_event(json!({
        "rawPath": "/binary",
        "requestContext": { "http": { "method": "POST" } },
        "body": "//4=",
        "isBase64Encoded": true
    }));

    let response = function_handler(event).await.unwrap();
    assert_eq!(response.status_code, 500);
}

#[test]
fn test_response_serializes_in_function_url_shape() {
    let response = aws_lambda_url_adapter::models::FunctionUrlResponse::gateway_timeout();
    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(value["statusCode"], 504);
    assert_eq!(value["isBase64Encoded"], false);
    assert_eq!(value["body"], "");
}

//! Runs HTTP-handler-shaped code behind an AWS Lambda function URL.
//!
//! [`EventTranslator`](crate::core::EventTranslator) turns each function URL event into an
//! `http::Request`, [`ResponseCapture`](crate::core::ResponseCapture) records what the handler writes
//! and converts it into the response the Lambda service expects.
//! [`HandlerAdapter`](crate::adapter::HandlerAdapter) wires the two around a [`Handler`](crate::adapter::Handler);
//! [`ServiceAdapter`](crate::service::ServiceAdapter) does the same for a `tower::Service` such as
//! an axum `Router`.

pub mod adapter;
pub mod config;
pub mod core;
pub mod handler;
pub mod models;
pub mod service;

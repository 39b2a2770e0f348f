//! HTTP request handlers
//!
//! Contains handlers for all HTTP endpoints.

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error, instrument};

use super::AppState;
use crate::policy::ConfigPolicy;
use crate::processor::PluginMeta;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    /// Health status
    status: String,
    /// Application version
    version: String,
}

/// Root endpoint - displays basic info
pub async fn root(State(state): State<AppState>) -> Html<String> {
    let meta = state.processor.meta();
    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>ns-filter</title>
</head>
<body>
    <h1>ns-filter</h1>
    <p>Version: {} (processor v{})</p>
    <ul>
        <li><a href="/health">Health Check</a></li>
        <li><a href="/meta">Metadata</a></li>
        <li><a href="/policy">Configuration Policy</a></li>
        <li>POST {} ({})</li>
    </ul>
</body>
</html>"#,
        env!("CARGO_PKG_VERSION"),
        meta.version,
        state.config.server.path,
        meta.accept_content_types.join(", ")
    );
    Html(html)
}

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Processor metadata
pub async fn meta(State(state): State<AppState>) -> Json<PluginMeta> {
    Json(state.processor.meta())
}

/// Configuration policy
pub async fn policy(State(state): State<AppState>) -> Json<ConfigPolicy> {
    Json(state.processor.config_policy().clone())
}

/// Process endpoint - runs one invocation over the request body
///
/// The `Content-Type` header labels the body, query parameters are the
/// invocation options layered over the configured defaults.
#[instrument(skip_all, name = "process_handler")]
pub async fn process(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let options = state.config.processor_options(params);

    debug!(
        content_type = %content_type,
        body_len = body.len(),
        options = options.len(),
        "Process request received"
    );

    // CPU bound, runs on the blocking pool.
    let processor = state.processor.clone();
    let result =
        tokio::task::spawn_blocking(move || processor.process(&content_type, &body, &options))
            .await;

    match result {
        Ok(Ok(output)) => (
            [(header::CONTENT_TYPE, output.content_type)],
            output.content,
        )
            .into_response(),
        Ok(Err(e)) => e.into_response(),
        Err(e) => {
            error!(error = %e, "Process task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
        }
    }
}

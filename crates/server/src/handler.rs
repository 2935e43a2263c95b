//! HTTP routes for the export service.
//!
//! - `GET /`: query form
//! - `POST /query`: run a query and download the result as CSV
//! - `GET /health`: liveness check

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Form, Router,
    extract::{State, rejection::FormRejection},
    http::{HeaderName, StatusCode, header},
    middleware::map_response,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::error::ApiError;
use crate::export::{Export, Exporter};

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>sqlexport</title></head>
<body>
  <h1>Export query to CSV</h1>
  <form method="post" action="/query">
    <textarea name="query" rows="10" cols="80" placeholder="SELECT ..."></textarea>
    <br>
    <button type="submit">Download CSV</button>
  </form>
</body>
</html>
"#;

const ATTACHMENT: &str = "attachment; filename=\"result.csv\"";

static X_CACHE: HeaderName = HeaderName::from_static("x-cache");

/// Form body for `POST /query`.
#[derive(Debug, Deserialize)]
pub struct QueryForm {
    #[serde(default)]
    pub query: String,
}

/// Build the application router.
pub fn router(exporter: Arc<Exporter>, request_timeout: Duration) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/query", post(query).fallback(method_not_allowed))
        .with_state(exporter)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, request_timeout))
        .layer(map_response(timeout_body))
}

/// Give the timeout layer's bare 408 the same JSON body as other errors.
async fn timeout_body(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        ApiError::TimedOut.into_response()
    } else {
        response
    }
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> &'static str {
    "ok"
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

async fn query(
    State(exporter): State<Arc<Exporter>>, form: Result<Form<QueryForm>, FormRejection>,
) -> Result<Response, ApiError> {
    let Form(form) = form.map_err(|e| {
        tracing::debug!(error = %e, "rejected query form");
        ApiError::InvalidInput("Failed to parse form".into())
    })?;

    let export = exporter.export(&form.query).await?;
    Ok(csv_attachment(export))
}

fn csv_attachment(export: Export) -> Response {
    tracing::info!(bytes = export.document.len(), cache = export.cache.as_str(), "streaming payload to client");
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv"),
            (header::CONTENT_DISPOSITION, ATTACHMENT),
            (X_CACHE.clone(), export.cache.as_str()),
        ],
        export.document,
    )
        .into_response()
}

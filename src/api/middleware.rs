//! API Middleware
//!
//! Request context extraction and request logging.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::domain::OperationContext;

/// Request user from X-Request-User-Id header
#[derive(Debug, Clone)]
pub struct RequestUser {
    pub user_id: Uuid,
}

/// Extract the operation context from request headers.
///
/// X-Request-User-Id is optional here; endpoints that require it check for
/// the RequestUser extension themselves. X-Correlation-Id is propagated if
/// present, generated otherwise.
pub async fn context_middleware(
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let headers = request.headers().clone();

    if let Some(user_id_str) = headers.get("X-Request-User-Id").and_then(|v| v.to_str().ok()) {
        match Uuid::parse_str(user_id_str) {
            Ok(user_id) => {
                request.extensions_mut().insert(RequestUser { user_id });
            }
            Err(_) => {
                return Err((
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "Invalid X-Request-User-Id header format",
                        "error_code": "invalid_user_id"
                    })),
                )
                    .into_response());
            }
        }
    }

    let correlation_id = headers
        .get("X-Correlation-Id")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);

    let context = OperationContext::new().with_correlation_id(correlation_id);
    request.extensions_mut().insert(context);

    Ok(next.run(request).await)
}

/// Log each request with method, path, status and latency
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = std::time::Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    tracing::info!(
        %method,
        %path,
        status = response.status().as_u16(),
        latency_ms = latency.as_millis() as u64,
        "request completed"
    );

    response
}

//! HTTP endpoint for metrics requests
//!
//! One route, one operation: `POST` a [`MetricsRequest`] body, receive the
//! per-region mapping. Cross-origin calls are allowed from any origin;
//! `OPTIONS` answers CORS preflights. Every other method is rejected.
//!
//! | outcome                 | status |
//! |-------------------------|--------|
//! | success                 | 200    |
//! | schema error            | 400    |
//! | wrong method            | 405    |
//! | malformed request body  | 422    |
//! | request body too large  | 413    |
//! | telemetry load failure  | 500    |

use crate::engine::MetricsEngine;
use crate::error::MetricsError;
use crate::request::MetricsRequest;
use hyper::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, ACCESS_CONTROL_REQUEST_HEADERS, ALLOW,
    CONTENT_TYPE,
};
use hyper::body::HttpBody;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use serde::Serialize;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

/// Largest accepted request body in bytes
pub const DEFAULT_BODY_LIMIT: usize = 64 * 1024;

/// Request handler shared by every connection
#[derive(Debug, Clone)]
pub struct MetricsService {
    engine: Arc<MetricsEngine>,
    route: String,
    body_limit: usize,
}

impl MetricsService {
    pub fn new(engine: MetricsEngine, route: impl Into<String>) -> Self {
        Self {
            engine: Arc::new(engine),
            route: route.into(),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    pub fn with_body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = bytes;
        self
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    /// Dispatch one HTTP request
    pub async fn handle(&self, req: Request<Body>) -> Response<Body> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        let response = if path != self.route {
            json_error(StatusCode::NOT_FOUND, "Not Found")
        } else {
            match method {
                Method::POST => self.metrics(req).await,
                Method::OPTIONS => preflight(&req),
                _ => {
                    let mut resp = json_error(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
                    resp.headers_mut()
                        .insert(ALLOW, HeaderValue::from_static("POST, OPTIONS"));
                    resp
                }
            }
        };

        tracing::info!("{} {} -> {}", method, path, response.status().as_u16());
        with_cors(response)
    }

    async fn metrics(&self, req: Request<Body>) -> Response<Body> {
        let body = match read_body(req.into_body(), self.body_limit).await {
            Ok(body) => body,
            Err(resp) => return resp,
        };
        let request = match MetricsRequest::from_json(&body) {
            Ok(request) => request,
            Err(e) => return json_error(StatusCode::UNPROCESSABLE_ENTITY, &e.to_string()),
        };

        // Loading and aggregation are blocking file I/O plus CPU work
        let engine = Arc::clone(&self.engine);
        match tokio::task::spawn_blocking(move || engine.compute(&request)).await {
            Ok(Ok(report)) => json_response(StatusCode::OK, &report),
            Ok(Err(err)) => {
                let status = status_for(&err);
                tracing::warn!("Metrics request failed ({}): {}", status.as_u16(), err);
                json_error(status, &err.to_string())
            }
            Err(e) => {
                tracing::warn!("Metrics worker failed: {}", e);
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        }
    }
}

/// Collect the body, refusing anything past `limit` bytes
///
/// A declared length over the limit is rejected before reading; chunked
/// bodies are cut off as soon as they cross it.
async fn read_body(mut body: Body, limit: usize) -> Result<Vec<u8>, Response<Body>> {
    let too_large = || {
        json_error(
            StatusCode::PAYLOAD_TOO_LARGE,
            &format!("Request body exceeds {} bytes", limit),
        )
    };

    if body.size_hint().lower() > limit as u64 {
        return Err(too_large());
    }

    let mut buf = Vec::new();
    while let Some(chunk) = body.data().await {
        let chunk = chunk.map_err(|e| json_error(StatusCode::BAD_REQUEST, &e.to_string()))?;
        if buf.len() + chunk.len() > limit {
            return Err(too_large());
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

/// HTTP status for a request-fatal engine error
pub fn status_for(err: &MetricsError) -> StatusCode {
    match err {
        MetricsError::Schema(_) => StatusCode::BAD_REQUEST,
        MetricsError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
        MetricsError::Load(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn preflight(req: &Request<Body>) -> Response<Body> {
    let allow_headers = req
        .headers()
        .get(ACCESS_CONTROL_REQUEST_HEADERS)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("*"));

    let mut resp = Response::new(Body::empty());
    let headers = resp.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("POST"));
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, allow_headers);
    headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("600"));
    resp
}

fn with_cors(mut resp: Response<Body>) -> Response<Body> {
    resp.headers_mut()
        .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    resp
}

fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Response<Body> {
    match serde_json::to_vec(value) {
        Ok(bytes) => {
            let mut resp = Response::new(Body::from(bytes));
            *resp.status_mut() = status;
            resp.headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            resp
        }
        Err(e) => json_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

fn json_error(status: StatusCode, detail: &str) -> Response<Body> {
    let body = serde_json::json!({ "detail": detail }).to_string();
    let mut resp = Response::new(Body::from(body));
    *resp.status_mut() = status;
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    resp
}

/// Serve `service` on `addr` until the process is stopped
pub async fn run(addr: SocketAddr, service: MetricsService) -> anyhow::Result<()> {
    let service = Arc::new(service);
    let make = make_service_fn(move |_conn| {
        let service = Arc::clone(&service);
        async move {
            Ok::<_, Infallible>(service_fn(move |req: Request<Body>| {
                let service = Arc::clone(&service);
                async move { Ok::<_, Infallible>(service.handle(req).await) }
            }))
        }
    });

    let server = Server::try_bind(&addr)?.serve(make);
    tracing::info!("Serving metrics on http://{}", server.local_addr());
    server.await?;
    Ok(())
}

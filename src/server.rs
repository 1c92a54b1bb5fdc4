//! Standalone HTTP server.
//!
//! Resolves route values from the request path (`/{controller}/{action}`),
//! runs every request through the [`MockInterceptor`] and answers
//! pass-through requests with the configured default response.

use crate::config::DefaultResponse;
use crate::interceptor::{BufferedResponse, Interception, MockInterceptor, MockResponse};
use crate::route::{RouteSource, ACTION, CONTROLLER};
use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

/// Route values taken from a request path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteValues {
    values: HashMap<String, String>,
}

impl RouteValues {
    /// `/Application/Get` yields controller `Application` and action `Get`.
    /// Missing segments stay unset; extra segments are ignored.
    pub fn from_path(path: &str) -> Self {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let mut values = HashMap::new();
        if let Some(controller) = segments.next() {
            values.insert(CONTROLLER.to_string(), controller.to_string());
        }
        if let Some(action) = segments.next() {
            values.insert(ACTION.to_string(), action.to_string());
        }
        Self { values }
    }
}

impl RouteSource for RouteValues {
    fn route_value(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

/// HTTP front end for a [`MockInterceptor`].
pub struct MockServer {
    addr: SocketAddr,
    interceptor: Arc<MockInterceptor>,
    default_response: Option<Arc<DefaultResponse>>,
}

impl MockServer {
    pub fn new(
        addr: SocketAddr,
        interceptor: Arc<MockInterceptor>,
        default_response: Option<DefaultResponse>,
    ) -> Self {
        Self {
            addr,
            interceptor,
            default_response: default_response.map(Arc::new),
        }
    }

    /// Serve until ctrl-c.
    pub async fn run(self) -> Result<(), anyhow::Error> {
        let listener = TcpListener::bind(self.addr).await?;
        info!(address = %self.addr, "Mock server listening");

        loop {
            let (stream, peer) = tokio::select! {
                accepted = listener.accept() => accepted?,
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                    return Ok(());
                }
            };
            let io = TokioIo::new(stream);
            let interceptor = Arc::clone(&self.interceptor);
            let default_response = self.default_response.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req| {
                    let interceptor = Arc::clone(&interceptor);
                    let default_response = default_response.clone();
                    async move { handle(req, &interceptor, default_response.as_deref()).await }
                });

                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    debug!(peer = %peer, error = %e, "Connection error");
                }
            });
        }
    }
}

/// Answer one request.
pub async fn handle<B>(
    req: Request<B>,
    interceptor: &MockInterceptor,
    default_response: Option<&DefaultResponse>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let route = RouteValues::from_path(req.uri().path());
    let mut buffer = BufferedResponse::new();

    let result = interceptor
        .intercept(&route, &mut buffer, move || async move {
            fallback_response(default_response)
        })
        .await;

    let response = match result {
        Ok(Interception::PassedThrough(response)) => response,
        Ok(Interception::Mocked(key)) => match buffer.take() {
            Some(mock) => mock_response(mock),
            None => {
                warn!(route = %key, "Mock was not buffered");
                error_response(StatusCode::INTERNAL_SERVER_ERROR)
            }
        },
        Err(e) => {
            warn!(path = %req.uri().path(), error = %e, "Failed to emit mock");
            error_response(StatusCode::INTERNAL_SERVER_ERROR)
        }
    };
    Ok(response)
}

fn mock_response(mock: MockResponse) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(mock.body));
    if let Ok(value) = HeaderValue::from_str(&mock.content_type) {
        response.headers_mut().insert(CONTENT_TYPE, value);
    }
    response
}

fn fallback_response(default_response: Option<&DefaultResponse>) -> Response<Full<Bytes>> {
    let Some(default) = default_response else {
        return error_response(StatusCode::NOT_FOUND);
    };

    let body = default
        .body
        .as_ref()
        .and_then(|b| serde_json::to_vec(b).ok())
        .unwrap_or_default();
    let mut response = json_response(Bytes::from(body));
    *response.status_mut() = StatusCode::from_u16(default.status).unwrap_or(StatusCode::NOT_FOUND);
    response
}

fn error_response(status: StatusCode) -> Response<Full<Bytes>> {
    let body = match status {
        StatusCode::NOT_FOUND => {
            r#"{"error": "not_found", "message": "No handler for this route"}"#
        }
        _ => r#"{"error": "internal", "message": "Failed to write mock response"}"#,
    };
    let mut response = json_response(Bytes::from_static(body.as_bytes()));
    *response.status_mut() = status;
    response
}

fn json_response(body: Bytes) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

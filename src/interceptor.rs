//! Per-request mock interception.

use crate::condition::{Condition, Outcome};
use crate::config::GlobalSettings;
use crate::error::MockError;
use crate::registry::{MockDescriptor, Registry};
use crate::route::{RouteKey, RouteSource};
use async_trait::async_trait;
use bytes::Bytes;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

/// Why a request was handed to the real handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassReason {
    /// Route values were missing or empty
    Unresolved,
    /// No mock registered for the route
    Unregistered,
    /// Registered with [`Condition::Never`]
    ConditionNever,
}

/// Outcome of the routing decision for one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision<'a> {
    PassThrough(PassReason),
    Mock {
        key: RouteKey,
        descriptor: &'a MockDescriptor,
    },
}

/// What happened to an intercepted request.
#[derive(Debug, Clone, PartialEq)]
pub enum Interception<T> {
    /// The continuation ran and produced `T`.
    PassedThrough(T),
    /// The mock for this route was written; the continuation never ran.
    Mocked(RouteKey),
}

impl<T> Interception<T> {
    pub fn is_mocked(&self) -> bool {
        matches!(self, Interception::Mocked(_))
    }
}

/// An encoded mock ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct MockResponse {
    pub content_type: String,
    pub body: Bytes,
}

/// Transport seam for writing a mock as the full response.
#[async_trait]
pub trait ResponseWriter: Send {
    async fn write_response(&mut self, response: MockResponse) -> std::io::Result<()>;
}

/// Writes the mock body to an async byte sink.
pub struct BodyWriter<W> {
    inner: W,
}

impl<W> BodyWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[async_trait]
impl<W> ResponseWriter for BodyWriter<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn write_response(&mut self, response: MockResponse) -> std::io::Result<()> {
        self.inner.write_all(&response.body).await?;
        self.inner.flush().await
    }
}

/// Keeps the written mock in memory for the caller to turn into a response.
#[derive(Debug, Default)]
pub struct BufferedResponse {
    response: Option<MockResponse>,
}

impl BufferedResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&mut self) -> Option<MockResponse> {
        self.response.take()
    }
}

#[async_trait]
impl ResponseWriter for BufferedResponse {
    async fn write_response(&mut self, response: MockResponse) -> std::io::Result<()> {
        self.response = Some(response);
        Ok(())
    }
}

/// Mock interceptor
///
/// Sits in front of the real handlers. For each request it resolves the
/// route, consults the registry and either runs the continuation or writes
/// the route's mock instead. The registry is passed in and never changes.
pub struct MockInterceptor {
    registry: Arc<Registry>,
    settings: GlobalSettings,
    /// Total requests intercepted.
    requests_total: AtomicU64,
    /// Requests answered with a mock.
    requests_mocked: AtomicU64,
    /// Requests handed to the continuation.
    requests_passed: AtomicU64,
}

impl MockInterceptor {
    /// Create an interceptor over a built registry.
    pub fn new(registry: Arc<Registry>, settings: GlobalSettings) -> Self {
        info!(
            routes = registry.len(),
            content_type = %settings.content_type,
            "Mock interceptor initialized"
        );

        Self {
            registry,
            settings,
            requests_total: AtomicU64::new(0),
            requests_mocked: AtomicU64::new(0),
            requests_passed: AtomicU64::new(0),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Get total requests intercepted.
    pub fn total_requests(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    /// Get total requests answered with a mock.
    pub fn total_mocked(&self) -> u64 {
        self.requests_mocked.load(Ordering::Relaxed)
    }

    /// Get total requests passed through.
    pub fn total_passed_through(&self) -> u64 {
        self.requests_passed.load(Ordering::Relaxed)
    }

    /// Decide between pass-through and mock for a request.
    pub fn decide<S>(&self, request: &S) -> Decision<'_>
    where
        S: RouteSource + ?Sized,
    {
        let Some(key) = RouteKey::resolve(request) else {
            if self.settings.log_unmatched {
                debug!("Route values unresolved, passing through");
            }
            return Decision::PassThrough(PassReason::Unresolved);
        };

        let Some(descriptor) = self.registry.lookup(&key) else {
            if self.settings.log_unmatched {
                debug!(route = %key, "No mockable route found");
            }
            return Decision::PassThrough(PassReason::Unregistered);
        };

        let condition = descriptor.condition();
        debug!(route = %key, condition = %condition, "Matched mockable route");
        if !condition.should_mock(Outcome::Pending) {
            if self.settings.log_unmatched {
                info!(
                    route = %key,
                    "Condition set to `never` for matched route, continuing request pipeline"
                );
            }
            return Decision::PassThrough(PassReason::ConditionNever);
        }

        if condition != Condition::Always {
            debug!(
                route = %key,
                condition = %condition,
                "Handler outcome not observable before dispatch, mocking"
            );
        }
        Decision::Mock { key, descriptor }
    }

    /// Encode a descriptor's mock for the wire.
    pub fn render(&self, descriptor: &MockDescriptor) -> Result<MockResponse, MockError> {
        let body = serde_json::to_vec(descriptor.mock())?;
        Ok(MockResponse {
            content_type: self.settings.content_type.clone(),
            body: Bytes::from(body),
        })
    }

    /// Intercept one request.
    ///
    /// Either awaits `next` and returns its output, or writes the mock to
    /// `writer` without calling `next`. Never both.
    pub async fn intercept<S, W, F, Fut>(
        &self,
        request: &S,
        writer: &mut W,
        next: F,
    ) -> Result<Interception<Fut::Output>, MockError>
    where
        S: RouteSource + ?Sized,
        W: ResponseWriter + ?Sized,
        F: FnOnce() -> Fut,
        Fut: Future,
    {
        self.requests_total.fetch_add(1, Ordering::Relaxed);

        match self.decide(request) {
            Decision::PassThrough(_) => {
                self.requests_passed.fetch_add(1, Ordering::Relaxed);
                Ok(Interception::PassedThrough(next().await))
            }
            Decision::Mock { key, descriptor } => {
                let response = self.render(descriptor)?;
                let bytes = response.body.len();
                writer.write_response(response).await?;
                self.requests_mocked.fetch_add(1, Ordering::Relaxed);

                if self.settings.log_matches {
                    info!(route = %key, bytes, "Mock emitted");
                }
                Ok(Interception::Mocked(key))
            }
        }
    }
}

//! Profiling middleware for `tower` service stacks.
//!
//! Adapts the profiler to services: each request is resolved to a
//! [`CallDescriptor`] by a caller-supplied function, then the inner service's
//! future runs under the full profiling protocol (admission, timing, fault
//! classification). The resolver is the seam where declarative configuration
//! lives; the profiler itself only ever sees resolved scalars.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tower::{Layer, Service};

use crate::config::CallDescriptor;
use crate::profiler::Profiler;

/// Resolves the call descriptor for one request.
pub type DescriptorFn<Req> = Arc<dyn Fn(&Req) -> CallDescriptor + Send + Sync>;

// ---------------------------------------------------------------------------
// ProfileLayer
// ---------------------------------------------------------------------------

/// Tower layer that wraps services with invocation profiling.
pub struct ProfileLayer<Req> {
    profiler: Arc<Profiler>,
    resolve: DescriptorFn<Req>,
}

impl<Req> ProfileLayer<Req> {
    /// Create a layer recording through `profiler`, naming each request via
    /// `resolve`.
    pub fn new(
        profiler: Arc<Profiler>,
        resolve: impl Fn(&Req) -> CallDescriptor + Send + Sync + 'static,
    ) -> Self {
        Self {
            profiler,
            resolve: Arc::new(resolve),
        }
    }
}

impl<Req> Clone for ProfileLayer<Req> {
    fn clone(&self) -> Self {
        Self {
            profiler: self.profiler.clone(),
            resolve: self.resolve.clone(),
        }
    }
}

impl<S, Req> Layer<S> for ProfileLayer<Req> {
    type Service = ProfileService<S, Req>;

    fn layer(&self, inner: S) -> Self::Service {
        ProfileService {
            inner,
            profiler: self.profiler.clone(),
            resolve: self.resolve.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// ProfileService
// ---------------------------------------------------------------------------

/// Service wrapper that drives every call through the profiling protocol.
pub struct ProfileService<S, Req> {
    inner: S,
    profiler: Arc<Profiler>,
    resolve: DescriptorFn<Req>,
}

impl<S: Clone, Req> Clone for ProfileService<S, Req> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            profiler: self.profiler.clone(),
            resolve: self.resolve.clone(),
        }
    }
}

impl<S, Req> Service<Req> for ProfileService<S, Req>
where
    S: Service<Req, Error = anyhow::Error> + Send,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
{
    type Response = S::Response;
    type Error = anyhow::Error;
    type Future = Pin<Box<dyn Future<Output = Result<S::Response, anyhow::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let descriptor = (self.resolve)(&req);
        // The inner future is created eagerly but does no work until the
        // profiler polls it, after admission.
        let fut = self.inner.call(req);
        let profiler = self.profiler.clone();
        Box::pin(async move { profiler.profile(&descriptor, move || fut).await })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Observed, throttle-aware provider calls
//!
//! [`Provider`] bundles an [`AutoScalingApi`] with the query observer and the
//! throttling policy shared by the fetcher, discovery and the cache.

use crate::aws::{AutoScalingApi, ProviderError};
use crate::metrics::{QueryObserver, TracingObserver};
use asg_cache_common::defaults::{PROVIDER_NAME, THROTTLE_RETRIES};
use backon::{ConstantBuilder, Retryable};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

/// Handle to the provider API shared by all resolution components
pub struct Provider<P> {
    api: Arc<P>,
    observer: Arc<dyn QueryObserver>,
    throttle_retry_delay: Duration,
}

impl<P> Clone for Provider<P> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            observer: Arc::clone(&self.observer),
            throttle_retry_delay: self.throttle_retry_delay,
        }
    }
}

impl<P: AutoScalingApi> Provider<P> {
    pub fn new(api: P) -> Self {
        Self::from_arc(Arc::new(api))
    }

    pub fn from_arc(api: Arc<P>) -> Self {
        Self {
            api,
            observer: Arc::new(TracingObserver),
            throttle_retry_delay: Duration::ZERO,
        }
    }

    /// Report queries to a different observer
    pub fn with_observer(mut self, observer: Arc<dyn QueryObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Wait this long before the single throttling retry
    pub fn with_throttle_retry_delay(mut self, delay: Duration) -> Self {
        self.throttle_retry_delay = delay;
        self
    }

    pub fn api(&self) -> &P {
        &self.api
    }

    /// Run one provider call and report it to the observer.
    pub async fn observe<T, Fut>(&self, operation: &'static str, call: Fut) -> Result<T, ProviderError>
    where
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let start = Instant::now();
        let result = call.await;
        self.observer
            .observe_query(PROVIDER_NAME, operation, result.as_ref().err(), start);
        result
    }

    /// Run a provider call, retrying exactly once if it is throttled.
    ///
    /// `call` is invoked again for the retry, so it must rebuild the request
    /// rather than reuse a consumed future. Non-throttling errors and a
    /// second throttle are returned as-is.
    pub async fn call_with_throttle_retry<T, F, Fut>(
        &self,
        operation: &'static str,
        mut call: F,
    ) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        (|| self.observe(operation, call()))
            .retry(
                ConstantBuilder::default()
                    .with_delay(self.throttle_retry_delay)
                    .with_max_times(THROTTLE_RETRIES),
            )
            .when(ProviderError::is_throttled)
            .notify(|e, delay| {
                warn!(operation, delay = ?delay, error = %e, "Provider throttled request, retrying");
            })
            .await
    }
}

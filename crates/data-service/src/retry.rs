// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Bounded retry with exponential backoff for cached queries

use std::time::Duration;

use tokio_retry::{RetryIf, strategy::ExponentialBackoff};
use tracing::debug;

use crate::{ResourceKind, ServiceError, ServiceResult};

/// Retry policy for query fetches
///
/// Delays double from `base_delay` and are capped at `max_delay`. Only errors
/// for which [`ServiceError::is_retryable`] holds are retried: upstream 5xx,
/// transport and timeout failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: usize,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, used by manual refreshes
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delays between attempts
    pub fn delays(&self) -> impl Iterator<Item = Duration> + Send + use<> {
        // from_millis(2) doubles per step; factor scales the first step to base_delay
        let factor = u64::try_from(self.base_delay.as_millis() / 2).unwrap_or(u64::MAX);
        ExponentialBackoff::from_millis(2)
            .factor(factor)
            .max_delay(self.max_delay)
            .take(self.max_retries)
    }

    /// Run `action` until it succeeds, fails with a non-retryable error or
    /// the retries are exhausted
    pub async fn run<T, A, Fut>(&self, resource: ResourceKind, action: A) -> ServiceResult<T>
    where
        A: FnMut() -> Fut,
        Fut: Future<Output = ServiceResult<T>>,
    {
        RetryIf::spawn(self.delays(), action, |error: &ServiceError| {
            let retryable = error.is_retryable();
            if retryable {
                debug!(resource = %resource, error = %error, "retrying failed fetch");
            }
            retryable
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use api_client::ApiError;

    use super::*;

    fn fast(max_retries: usize) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    fn upstream(status: u16) -> ServiceError {
        ServiceError::Upstream(ApiError::Status {
            status,
            message: String::new(),
        })
    }

    #[test]
    fn delays_double_and_cap() {
        let policy = RetryPolicy {
            max_retries: 6,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(5000),
        };
        let delays: Vec<_> = policy.delays().map(|d| d.as_millis()).collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 5000, 5000, 5000]);
        assert_eq!(RetryPolicy::none().delays().count(), 0);
    }

    #[tokio::test]
    async fn server_errors_retry_until_success() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let result = fast(3)
            .run(ResourceKind::Users, || {
                let counter = Arc::clone(&counter);
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(upstream(503))
                    } else {
                        Ok(7)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retries_are_bounded() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let result: ServiceResult<()> = fast(3)
            .run(ResourceKind::Users, || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(upstream(500))
                }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn client_errors_fail_immediately() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let result: ServiceResult<()> = fast(3)
            .run(ResourceKind::Users, || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(upstream(404))
                }
            })
            .await;
        assert!(matches!(
            result,
            Err(ServiceError::Upstream(ApiError::Status { status: 404, .. }))
        ));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}

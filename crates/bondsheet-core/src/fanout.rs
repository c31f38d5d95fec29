//! Fan-out coordinator.
//!
//! Runs one task per symbol under a single configurable policy: a semaphore
//! bounds how many fetches are in flight, and an optional rate quota spaces
//! request starts to respect an upstream requests-per-window ceiling. The
//! unbounded-parallel and serial-with-fixed-delay strategies of earlier
//! iterations are both expressible as configurations of this one mechanism.

use std::future::Future;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::error;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Requests-per-window ceiling applied before each task starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateQuota {
    pub limit: u32,
    pub window: Duration,
}

/// Coordinator policy.
#[derive(Debug, Clone)]
pub struct FanoutConfig {
    /// Maximum fetches in flight at once. Clamped to at least 1.
    pub max_in_flight: usize,
    /// Optional start-rate ceiling. `None` means no spacing.
    pub quota: Option<RateQuota>,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            max_in_flight: 8,
            quota: None,
        }
    }
}

impl FanoutConfig {
    /// One-at-a-time execution with a fixed delay between request starts,
    /// the shape the historical serial variant used to stay under an
    /// external rate limit.
    pub fn serial(delay: Duration) -> Self {
        Self {
            max_in_flight: 1,
            quota: Some(RateQuota {
                limit: 1,
                window: delay,
            }),
        }
    }
}

/// Runs a task per input item and collects one result per item.
///
/// A task's failure is its own result; it never cancels or blocks the other
/// tasks. Output order matches input order.
#[derive(Clone)]
pub struct Coordinator {
    semaphore: Arc<Semaphore>,
    limiter: Option<Arc<DirectRateLimiter>>,
}

impl Coordinator {
    pub fn new(config: FanoutConfig) -> Self {
        let permits = config.max_in_flight.max(1);
        let limiter = config.quota.map(|quota| {
            Arc::new(RateLimiter::direct(quota_from_window(
                quota.window,
                quota.limit,
            )))
        });

        Self {
            semaphore: Arc::new(Semaphore::new(permits)),
            limiter,
        }
    }

    pub async fn run<S, T, F, Fut>(&self, items: Vec<S>, task: F) -> Vec<T>
    where
        S: Send + 'static,
        T: Send + 'static,
        F: Fn(S) -> Fut + Clone + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        let total = items.len();
        let mut join_set = JoinSet::new();

        for (index, item) in items.into_iter().enumerate() {
            let semaphore = self.semaphore.clone();
            let limiter = self.limiter.clone();
            let task = task.clone();

            join_set.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("coordinator semaphore is never closed");
                if let Some(limiter) = limiter {
                    limiter.until_ready().await;
                }
                (index, task(item).await)
            });
        }

        let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(total).collect();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, value)) => slots[index] = Some(value),
                Err(join_error) => {
                    // A panicked task loses its slot; the rest of the batch
                    // is unaffected.
                    error!(error = %join_error, "fan-out task aborted");
                }
            }
        }

        slots.into_iter().flatten().collect()
    }
}

fn quota_from_window(window: Duration, limit: u32) -> Quota {
    let safe_limit = limit.max(1);
    let burst = NonZeroU32::new(safe_limit).expect("safe limit is non-zero");

    let seconds_per_cell = (window.as_secs_f64() / f64::from(safe_limit)).max(0.001);
    let period = Duration::from_secs_f64(seconds_per_cell);

    Quota::with_period(period)
        .expect("period is always greater than zero")
        .allow_burst(burst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn returns_one_result_per_item_in_input_order() {
        let coordinator = Coordinator::new(FanoutConfig::default());
        let items: Vec<u32> = (0..20).collect();

        let results = coordinator
            .run(items, |item| async move { item * 2 })
            .await;

        assert_eq!(results.len(), 20);
        for (index, value) in results.iter().enumerate() {
            assert_eq!(*value, (index as u32) * 2);
        }
    }

    #[tokio::test]
    async fn per_item_failures_do_not_remove_rows() {
        let coordinator = Coordinator::new(FanoutConfig::default());
        let items: Vec<u32> = (0..10).collect();

        // Odd items "fail"; the failure is encoded in the result.
        let results = coordinator
            .run(items, |item| async move {
                if item % 2 == 1 {
                    Err(item)
                } else {
                    Ok(item)
                }
            })
            .await;

        assert_eq!(results.len(), 10);
        assert_eq!(results.iter().filter(|result| result.is_err()).count(), 5);
    }

    #[tokio::test]
    async fn semaphore_bounds_concurrency() {
        let coordinator = Coordinator::new(FanoutConfig {
            max_in_flight: 3,
            quota: None,
        });

        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let items: Vec<u32> = (0..30).collect();
        let in_flight_ref = in_flight.clone();
        let peak_ref = peak.clone();

        let results = coordinator
            .run(items, move |item| {
                let in_flight = in_flight_ref.clone();
                let peak = peak_ref.clone();
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    item
                }
            })
            .await;

        assert_eq!(results.len(), 30);
        assert!(peak.load(Ordering::SeqCst) <= 3, "peak={}", peak.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn quota_limited_batch_still_completes() {
        // Tight window so the test does not sleep for real.
        let coordinator = Coordinator::new(FanoutConfig {
            max_in_flight: 2,
            quota: Some(RateQuota {
                limit: 100,
                window: Duration::from_millis(10),
            }),
        });

        let items: Vec<u32> = (0..8).collect();
        let results = coordinator.run(items, |item| async move { item }).await;

        assert_eq!(results, (0..8).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn serial_config_is_one_at_a_time() {
        let config = FanoutConfig::serial(Duration::from_millis(1));
        assert_eq!(config.max_in_flight, 1);
        assert_eq!(
            config.quota,
            Some(RateQuota {
                limit: 1,
                window: Duration::from_millis(1)
            })
        );
    }

    #[tokio::test]
    async fn empty_input_yields_empty_output() {
        let coordinator = Coordinator::new(FanoutConfig::default());
        let results: Vec<u32> = coordinator.run(Vec::new(), |item| async move { item }).await;
        assert!(results.is_empty());
    }
}

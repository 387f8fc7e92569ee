//! Downstream admission gate
//!
//! Bounds the number of in-flight downstream model calls with a counting
//! semaphore. Arrivals beyond the limit wait in FIFO order; nothing is
//! rejected at admission. Each end-to-end query additionally runs under a
//! deadline so a stalled downstream cannot pin a permit forever.

use agora_common::config::DownstreamConfig;
use agora_common::errors::{AppError, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

/// Counting gate in front of the downstream model
pub struct DownstreamGate {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
}

impl DownstreamGate {
    pub fn new(config: &DownstreamConfig) -> Self {
        let max_concurrent = config.max_concurrent_calls.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
        }
    }

    /// Wait for a slot. The returned permit releases its slot on drop, so
    /// holders cannot leak capacity on early return or panic.
    pub async fn admit(&self) -> Result<OwnedSemaphorePermit> {
        let available = self.semaphore.available_permits();
        if available == 0 {
            debug!(
                max_concurrent = self.max_concurrent,
                "Downstream gate saturated, queueing"
            );
        }
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| AppError::Internal {
                message: "downstream gate closed".to_string(),
            })
    }

    /// Slots currently free
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }
}

/// Run a future under a deadline. Queue time spent waiting inside `future`
/// counts against the deadline, so the bound holds end to end.
pub async fn run_with_timeout<F, T>(timeout: Duration, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(AppError::QueryTimeout {
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn gate(max: usize) -> DownstreamGate {
        DownstreamGate::new(&DownstreamConfig {
            max_concurrent_calls: max,
            query_timeout_secs: 30,
        })
    }

    #[tokio::test]
    async fn test_gate_bounds_concurrency() {
        let gate = Arc::new(gate(2));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let gate = gate.clone();
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            handles.push(tokio::spawn(async move {
                let _permit = gate.admit().await.unwrap();
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(gate.available(), 2);
    }

    #[tokio::test]
    async fn test_permit_released_on_drop() {
        let gate = gate(1);
        {
            let _permit = gate.admit().await.unwrap();
            assert_eq!(gate.available(), 0);
        }
        assert_eq!(gate.available(), 1);
    }

    #[tokio::test]
    async fn test_timeout_maps_to_query_timeout() {
        let result: Result<()> = run_with_timeout(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        match result {
            Err(AppError::QueryTimeout { timeout_ms }) => assert_eq!(timeout_ms, 10),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fast_future_passes_through() {
        let result = run_with_timeout(Duration::from_secs(1), async { Ok(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_queue_wait_counts_against_deadline() {
        let gate = Arc::new(gate(1));
        let _held = gate.admit().await.unwrap();

        let gate2 = gate.clone();
        let result: Result<()> = run_with_timeout(Duration::from_millis(20), async move {
            let _permit = gate2.admit().await?;
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(AppError::QueryTimeout { .. })));
    }
}

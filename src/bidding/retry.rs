/// 저장소 장애(StoreUnavailable)에 한해 지수 백오프로 재시도
/// 충돌, 금액 오류 등 나머지 거절은 그대로 반환한다.
use super::error::BidError;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(50),
        }
    }
}

impl RetryPolicy {
    fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

pub async fn with_backoff<T, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, BidError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, BidError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Err(e) if e.is_retryable() && attempt < policy.max_attempts => {
                let delay = policy.delay_for(attempt);
                warn!(
                    "{:<12} --> 저장소 오류로 재시도 ({}/{}), {:?} 후: {}",
                    "Retry", attempt, policy.max_attempts, delay, e
                );
                sleep(delay).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_retries_store_failures_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = with_backoff(fast_policy(3), || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(BidError::StoreUnavailable("connection reset".into()))
            } else {
                Ok(42)
            }
        })
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = with_backoff(fast_policy(2), || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(BidError::StoreUnavailable("down".into()))
        })
        .await;

        assert!(matches!(result, Err(BidError::StoreUnavailable(_))));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_conflict_is_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = with_backoff(fast_policy(5), || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(BidError::Conflict {
                min_next: Decimal::from(1150),
            })
        })
        .await;

        assert!(matches!(result, Err(BidError::Conflict { .. })));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_delay_doubles() {
        let policy = RetryPolicy {
            max_attempts: 4,
            base_delay: Duration::from_millis(10),
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(10));
        assert_eq!(policy.delay_for(2), Duration::from_millis(20));
        assert_eq!(policy.delay_for(3), Duration::from_millis(40));
    }
}

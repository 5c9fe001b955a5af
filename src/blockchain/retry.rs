use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use super::ChainQuerier;
use crate::types::{MonitorResult, PageCursor, StatePage};

/// 전송 계층 실패만 재시도하는 조회 래퍼
///
/// `max_attempts = 1` 이면 재시도 없이 그대로 통과시킨다. 쿼리 실패(컨트랙트
/// 에러 응답)는 재시도하지 않는다. 대기 시간은 시도마다 두 배로 늘어난다.
pub struct RetryingQuerier<Q> {
    inner: Q,
    max_attempts: u32,
    initial_backoff: Duration,
}

impl<Q: ChainQuerier> RetryingQuerier<Q> {
    pub fn new(inner: Q, max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.max(1),
            initial_backoff,
        }
    }

    pub fn inner(&self) -> &Q {
        &self.inner
    }

    async fn with_retry<T, F, Fut>(&self, operation: &str, mut call: F) -> MonitorResult<T>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = MonitorResult<T>> + Send,
        T: Send,
    {
        let mut backoff = self.initial_backoff;
        let mut attempt = 1;

        loop {
            match call().await {
                Err(e) if e.is_transport() && attempt < self.max_attempts => {
                    warn!(
                        "🔁 {} failed (attempt {}/{}), retrying in {:?}: {}",
                        operation, attempt, self.max_attempts, backoff, e
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

#[async_trait]
impl<Q: ChainQuerier> ChainQuerier for RetryingQuerier<Q> {
    async fn get_height(&self) -> MonitorResult<u64> {
        self.with_retry("get_height", || self.inner.get_height()).await
    }

    async fn query_all_state(
        &self,
        contract: &str,
        cursor: &PageCursor,
        limit: u64,
    ) -> MonitorResult<StatePage> {
        self.with_retry("query_all_state", || {
            self.inner.query_all_state(contract, cursor, limit)
        })
        .await
    }

    async fn query_contract_smart(
        &self,
        contract: &str,
        msg: &serde_json::Value,
    ) -> MonitorResult<serde_json::Value> {
        self.with_retry("query_contract_smart", || {
            self.inner.query_contract_smart(contract, msg)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::MockChainQuerier;
    use crate::types::MonitorError;
    use serde_json::json;

    #[tokio::test(start_paused = true)]
    async fn test_single_attempt_passes_errors_through() {
        let mock = MockChainQuerier::new().with_height_failures(1).with_heights(vec![7]);
        let querier = RetryingQuerier::new(mock, 1, Duration::from_millis(100));

        assert!(querier.get_height().await.is_err());
        assert_eq!(querier.get_height().await.unwrap(), 7);
        assert_eq!(querier.inner().height_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failures_are_retried_with_backoff() {
        let mock = MockChainQuerier::new().with_height_failures(2).with_heights(vec![42]);
        let querier = RetryingQuerier::new(mock, 3, Duration::from_millis(100));

        let started = tokio::time::Instant::now();
        assert_eq!(querier.get_height().await.unwrap(), 42);

        // 100ms + 200ms
        assert_eq!(started.elapsed(), Duration::from_millis(300));
        assert_eq!(querier.inner().height_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let mock = MockChainQuerier::new().with_height_failures(5).with_heights(vec![42]);
        let querier = RetryingQuerier::new(mock, 3, Duration::from_millis(10));

        let err = querier.get_height().await.unwrap_err();
        assert!(err.is_transport());
        assert_eq!(querier.inner().height_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_failures_are_not_retried() {
        let mock = MockChainQuerier::new();
        let querier = RetryingQuerier::new(mock, 5, Duration::from_millis(10));

        // 등록되지 않은 스마트 쿼리는 Query 에러
        let err = querier
            .query_contract_smart("osmo1oracle", &json!({"price": {"denom": "uatom"}}))
            .await
            .unwrap_err();

        assert!(matches!(err, MonitorError::Query { .. }));
        assert_eq!(querier.inner().smart_calls(), 1);
    }
}

use std::sync::Arc;

use futures::stream::{self, Stream, TryStreamExt};
use tracing::debug;

use crate::blockchain::ChainQuerier;
use crate::config::ScannerConfig;
use crate::types::{MonitorError, MonitorResult, PageCursor, StatePage, StorageEntry};

/// 컨트랙트 저장소 전체 스캐너
///
/// 빈 커서에서 시작해 응답 커서가 빌 때까지 페이지를 순서대로 요청한다.
/// 다음 페이지는 소비자가 현재 페이지를 다 쓴 뒤에야 요청된다.
/// 실패하면 스트림이 그 자리에서 끝나며 재시작은 처음부터다.
pub struct StateScanner {
    querier: Arc<dyn ChainQuerier>,
    page_limit: u64,
    max_pages: u32,
}

impl StateScanner {
    pub fn new(querier: Arc<dyn ChainQuerier>, config: &ScannerConfig) -> Self {
        Self {
            querier,
            page_limit: config.page_limit,
            max_pages: config.max_pages,
        }
    }

    /// 페이지 단위 스트림
    pub fn pages<'a>(
        &'a self,
        contract: &'a str,
    ) -> impl Stream<Item = MonitorResult<StatePage>> + Send + 'a {
        stream::try_unfold(
            Some((PageCursor::start(), 0u32)),
            move |state| async move {
                match state {
                    Some((cursor, fetched)) => self.next_page(contract, cursor, fetched).await.map(Some),
                    None => Ok(None),
                }
            },
        )
    }

    /// 한 페이지를 가져오고 다음 상태를 돌려준다. 마지막 페이지면 다음 상태는 `None`.
    async fn next_page(
        &self,
        contract: &str,
        cursor: PageCursor,
        fetched: u32,
    ) -> MonitorResult<(StatePage, Option<(PageCursor, u32)>)> {
        if fetched >= self.max_pages {
            return Err(MonitorError::PaginationLimitExceeded {
                contract: contract.to_string(),
                max_pages: self.max_pages,
            });
        }

        let page = self
            .querier
            .query_all_state(contract, &cursor, self.page_limit)
            .await?;

        debug!(
            "📄 page {} of {}: {} entries, next {}",
            fetched + 1,
            contract,
            page.entries.len(),
            page.next_cursor
        );

        if page.next_cursor.is_end() {
            return Ok((page, None));
        }
        if page.next_cursor == cursor {
            return Err(MonitorError::StalledCursor {
                contract: contract.to_string(),
                cursor: cursor.to_string(),
            });
        }

        let next = (page.next_cursor.clone(), fetched + 1);
        Ok((page, Some(next)))
    }

    /// 엔트리 단위 스트림
    pub fn scan<'a>(
        &'a self,
        contract: &'a str,
    ) -> impl Stream<Item = MonitorResult<StorageEntry>> + Send + 'a {
        self.pages(contract)
            .map_ok(|page| stream::iter(page.entries.into_iter().map(Ok::<_, MonitorError>)))
            .try_flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::MockChainQuerier;
    use futures::StreamExt;
    use tokio_test::assert_err;

    const CONTRACT: &str = "osmo1redbank";

    fn entry(key: &str) -> StorageEntry {
        StorageEntry::new(key.as_bytes().to_vec(), b"{}".to_vec())
    }

    fn scanner(mock: Arc<MockChainQuerier>, max_pages: u32) -> StateScanner {
        StateScanner::new(
            mock,
            &ScannerConfig {
                page_limit: 100,
                max_pages,
            },
        )
    }

    #[tokio::test]
    async fn test_visits_every_entry_once() {
        let mock = Arc::new(MockChainQuerier::new().with_pages(
            CONTRACT,
            vec![
                vec![entry("a"), entry("b")],
                vec![],
                vec![entry("c")],
            ],
        ));
        let scanner = scanner(mock.clone(), 10);

        let entries: Vec<StorageEntry> = scanner.scan(CONTRACT).try_collect().await.unwrap();

        let keys: Vec<Vec<u8>> = entries.into_iter().map(|e| e.key).collect();
        assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
        assert_eq!(mock.page_calls(), 3);
    }

    #[tokio::test]
    async fn test_empty_contract() {
        let mock = Arc::new(MockChainQuerier::new().with_pages(CONTRACT, vec![vec![]]));
        let scanner = scanner(mock, 10);

        let entries: Vec<StorageEntry> = scanner.scan(CONTRACT).try_collect().await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_pages_are_fetched_lazily() {
        let mock = Arc::new(MockChainQuerier::new().with_pages(
            CONTRACT,
            vec![vec![entry("a")], vec![entry("b")]],
        ));
        let scanner = scanner(mock.clone(), 10);

        let pages = scanner.pages(CONTRACT);
        futures::pin_mut!(pages);

        assert!(pages.next().await.is_some());
        assert_eq!(mock.page_calls(), 1);
    }

    #[tokio::test]
    async fn test_repeated_cursor_is_stalled() {
        let cursor = PageCursor::new(vec![0x01]);
        let mock = Arc::new(
            MockChainQuerier::new()
                .with_page(
                    CONTRACT,
                    PageCursor::start(),
                    StatePage {
                        entries: vec![entry("a")],
                        next_cursor: cursor.clone(),
                    },
                )
                .with_page(
                    CONTRACT,
                    cursor.clone(),
                    StatePage {
                        entries: vec![entry("b")],
                        next_cursor: cursor.clone(),
                    },
                ),
        );
        let scanner = scanner(mock, 1_000);

        let err = assert_err!(scanner.scan(CONTRACT).try_collect::<Vec<_>>().await);
        assert!(matches!(err, MonitorError::StalledCursor { ref cursor, .. } if cursor == "0x01"));
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_page_cap_bounds_a_cycle() {
        let a = PageCursor::new(vec![0x0a]);
        let b = PageCursor::new(vec![0x0b]);
        let mock = Arc::new(
            MockChainQuerier::new()
                .with_page(
                    CONTRACT,
                    PageCursor::start(),
                    StatePage {
                        entries: vec![],
                        next_cursor: a.clone(),
                    },
                )
                .with_page(
                    CONTRACT,
                    a.clone(),
                    StatePage {
                        entries: vec![entry("x")],
                        next_cursor: b.clone(),
                    },
                )
                .with_page(
                    CONTRACT,
                    b,
                    StatePage {
                        entries: vec![entry("y")],
                        next_cursor: a,
                    },
                ),
        );
        let scanner = scanner(mock.clone(), 5);

        let err = assert_err!(scanner.pages(CONTRACT).try_collect::<Vec<_>>().await);
        assert!(matches!(
            err,
            MonitorError::PaginationLimitExceeded { max_pages: 5, .. }
        ));
        assert_eq!(mock.page_calls(), 5);
    }

    #[tokio::test]
    async fn test_query_failure_aborts_scan() {
        // 두 번째 페이지가 등록되어 있지 않다
        let mock = Arc::new(MockChainQuerier::new().with_page(
            CONTRACT,
            PageCursor::start(),
            StatePage {
                entries: vec![entry("a")],
                next_cursor: PageCursor::new(vec![0x02]),
            },
        ));
        let scanner = scanner(mock, 10);

        let results: Vec<MonitorResult<StorageEntry>> = scanner.scan(CONTRACT).collect().await;

        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }
}

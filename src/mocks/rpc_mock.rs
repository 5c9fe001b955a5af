use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::Instant;
use tracing::debug;

use crate::blockchain::ChainQuerier;
use crate::types::{MonitorError, MonitorResult, PageCursor, StatePage, StorageEntry};

/// 스마트 쿼리 응답 스크립트
enum SmartReply {
    Ok(Value),
    TransportFailure,
}

#[derive(Default)]
struct MockState {
    heights: VecDeque<u64>,
    height_failures: u32,
    block_clock: Option<(u64, Instant, Duration)>,
    pages: HashMap<(String, Vec<u8>), StatePage>,
    smart: Vec<(String, Value, SmartReply)>,
}

/// 인메모리 체인 조회 목
///
/// 높이 시퀀스(마지막 값 반복), 커서별 상태 페이지, 메시지별 스마트 쿼리 응답을
/// 미리 등록해 두고 호출 횟수를 센다. 같은 메시지를 다시 등록하면 나중 것이 이긴다.
#[derive(Default)]
pub struct MockChainQuerier {
    state: Mutex<MockState>,
    height_calls: AtomicU64,
    page_calls: AtomicU64,
    smart_calls: AtomicU64,
}

impl MockChainQuerier {
    pub fn new() -> Self {
        Self::default()
    }

    /// 높이 시퀀스. 마지막 값은 계속 반복된다.
    pub fn with_heights(self, heights: Vec<u64>) -> Self {
        self.lock().heights = heights.into();
        self
    }

    /// 처음 `count` 번의 높이 조회를 전송 실패로 만든다
    pub fn with_height_failures(self, count: u32) -> Self {
        self.lock().height_failures = count;
        self
    }

    /// `interval` 마다 한 블록씩 올라가는 높이
    pub fn with_block_clock(self, start_height: u64, interval: Duration) -> Self {
        self.lock().block_clock = Some((start_height, Instant::now(), interval));
        self
    }

    /// 엔트리 묶음을 순서대로 페이지로 등록한다 (커서는 자동 생성)
    pub fn with_pages(self, contract: &str, pages: Vec<Vec<StorageEntry>>) -> Self {
        let count = pages.len();
        let mut cursor = PageCursor::start();

        for (index, entries) in pages.into_iter().enumerate() {
            let next_cursor = if index + 1 == count {
                PageCursor::start()
            } else {
                PageCursor::new(format!("page-{}", index + 1).into_bytes())
            };

            self.lock().pages.insert(
                (contract.to_string(), cursor.as_bytes().to_vec()),
                StatePage {
                    entries,
                    next_cursor: next_cursor.clone(),
                },
            );
            cursor = next_cursor;
        }

        self
    }

    /// 특정 커서에 대한 페이지를 그대로 등록한다
    pub fn with_page(self, contract: &str, cursor: PageCursor, page: StatePage) -> Self {
        self.lock()
            .pages
            .insert((contract.to_string(), cursor.into_bytes()), page);
        self
    }

    pub fn with_smart_response(self, contract: &str, msg: Value, response: Value) -> Self {
        self.lock()
            .smart
            .push((contract.to_string(), msg, SmartReply::Ok(response)));
        self
    }

    /// 해당 메시지를 전송 실패로 응답한다
    pub fn with_smart_failure(self, contract: &str, msg: Value) -> Self {
        self.lock()
            .smart
            .push((contract.to_string(), msg, SmartReply::TransportFailure));
        self
    }

    pub fn height_calls(&self) -> u64 {
        self.height_calls.load(Ordering::SeqCst)
    }

    pub fn page_calls(&self) -> u64 {
        self.page_calls.load(Ordering::SeqCst)
    }

    pub fn smart_calls(&self) -> u64 {
        self.smart_calls.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        // 목 상태는 패닉으로 오염돼도 계속 쓴다
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ChainQuerier for MockChainQuerier {
    async fn get_height(&self) -> MonitorResult<u64> {
        self.height_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();

        if state.height_failures > 0 {
            state.height_failures -= 1;
            return Err(MonitorError::Transport("🎭 [MOCK] height unavailable".to_string()));
        }

        if let Some((start_height, started, interval)) = state.block_clock {
            let blocks = started.elapsed().as_millis() / interval.as_millis().max(1);
            return Ok(start_height + blocks as u64);
        }

        let height = if state.heights.len() > 1 {
            state.heights.pop_front()
        } else {
            state.heights.front().copied()
        };

        height.ok_or_else(|| MonitorError::Transport("🎭 [MOCK] no height scripted".to_string()))
    }

    async fn query_all_state(
        &self,
        contract: &str,
        cursor: &PageCursor,
        _limit: u64,
    ) -> MonitorResult<StatePage> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        debug!("🎭 [MOCK] AllContractState {} from {}", contract, cursor);

        self.lock()
            .pages
            .get(&(contract.to_string(), cursor.as_bytes().to_vec()))
            .cloned()
            .ok_or_else(|| {
                MonitorError::Transport(format!("🎭 [MOCK] no page for {} at {}", contract, cursor))
            })
    }

    async fn query_contract_smart(&self, contract: &str, msg: &Value) -> MonitorResult<Value> {
        self.smart_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.lock();

        let reply = state
            .smart
            .iter()
            .rev()
            .find(|(registered, registered_msg, _)| registered == contract && registered_msg == msg)
            .map(|(_, _, reply)| reply);

        match reply {
            Some(SmartReply::Ok(response)) => Ok(response.clone()),
            Some(SmartReply::TransportFailure) => Err(MonitorError::Transport(format!(
                "🎭 [MOCK] connection reset while querying {}",
                contract
            ))),
            None => Err(MonitorError::Query {
                codespace: "wasm".to_string(),
                code: 9,
                log: format!("🎭 [MOCK] no response for {} on {}", msg, contract),
            }),
        }
    }
}

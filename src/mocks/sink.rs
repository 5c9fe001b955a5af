use std::sync::Mutex;

use crate::monitoring::ResultSink;
use crate::types::CollateralizationResult;

/// 기록된 결과를 메모리에 모아 두는 싱크
#[derive(Debug, Default)]
pub struct CollectingSink {
    results: Mutex<Vec<CollateralizationResult>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn results(&self) -> Vec<CollateralizationResult> {
        self.results
            .lock()
            .map(|results| results.clone())
            .unwrap_or_default()
    }

    pub fn wallets(&self) -> Vec<String> {
        self.results().into_iter().map(|r| r.wallet).collect()
    }
}

impl ResultSink for CollectingSink {
    fn record(&self, result: &CollateralizationResult) {
        if let Ok(mut results) = self.results.lock() {
            results.push(result.clone());
        }
    }
}

use std::sync::Arc;
use std::time::Duration;

use futures::TryStreamExt;
use tokio::time::Instant;
use tracing::{info, warn};

use super::account_extractor::AccountExtractor;
use super::position_aggregator::PositionAggregator;
use super::state_scanner::StateScanner;
use super::stats::{ScanReport, ScanStats};
use crate::monitoring::ResultSink;
use crate::types::{MonitorResult, StorageEntry};

/// 스캔 한 번: 저장소 전체 → 차입자 추출 → 집계 → 싱크
///
/// 차입자는 한 명씩 처리하며 처리 후마다 `borrower_delay` 만큼 쉰다.
/// 페이지 조회 실패는 패스 전체를 중단하고, 차입자 단위 실패는 로그만 남긴다.
#[derive(Clone)]
pub struct ScanPass {
    contract: Arc<str>,
    scanner: Arc<StateScanner>,
    extractor: AccountExtractor,
    aggregator: Arc<PositionAggregator>,
    sink: Arc<dyn ResultSink>,
    borrower_delay: Duration,
}

impl ScanPass {
    pub fn new(
        contract: &str,
        scanner: Arc<StateScanner>,
        aggregator: Arc<PositionAggregator>,
        sink: Arc<dyn ResultSink>,
        borrower_delay: Duration,
    ) -> Self {
        Self {
            contract: Arc::from(contract),
            scanner,
            extractor: AccountExtractor::default(),
            aggregator,
            sink,
            borrower_delay,
        }
    }

    pub async fn run(&self, height: u64) -> MonitorResult<ScanReport> {
        let started = Instant::now();
        let mut stats = ScanStats::default();
        info!("🔍 Scanning {} at height {}", self.contract, height);

        let pages = self.scanner.pages(&self.contract);
        futures::pin_mut!(pages);

        while let Some(page) = pages.try_next().await? {
            stats.record_page(page.entries.len());

            for entry in &page.entries {
                self.process_entry(entry, &mut stats).await;
            }
        }

        let report = stats.finish(height, started);
        report.log();
        Ok(report)
    }

    async fn process_entry(&self, entry: &StorageEntry, stats: &mut ScanStats) {
        let wallet = match self.extractor.extract(entry) {
            Ok(Some(wallet)) => wallet,
            Ok(None) => return,
            Err(e) => {
                warn!("⚠️ Skipping storage entry: {}", e);
                stats.record_skipped_entry();
                return;
            }
        };

        match self.aggregator.aggregate(&wallet).await {
            Ok(result) => {
                self.sink.record(&result);
                stats.record_borrower(true);
            }
            Err(e) => {
                warn!("⚠️ Failed to aggregate {}: {}", wallet, e);
                stats.record_borrower(false);
            }
        }

        if !self.borrower_delay.is_zero() {
            tokio::time::sleep(self.borrower_delay).await;
        }
    }
}

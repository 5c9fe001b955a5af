use std::time::Duration;

use tokio::time::Instant;
use tracing::info;

/// 스캔 패스 진행 중 카운터
#[derive(Debug, Clone, Default)]
pub struct ScanStats {
    pages: u64,
    entries: u64,
    borrowers: u64,
    succeeded: u64,
    failed: u64,
    skipped_entries: u64,
}

/// 끝난 패스 요약
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub height: u64,
    pub pages: u64,
    pub entries: u64,
    pub borrowers: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub skipped_entries: u64,
    pub elapsed: Duration,
}

impl ScanStats {
    pub fn record_page(&mut self, entries: usize) {
        self.pages += 1;
        self.entries += entries as u64;
    }

    pub fn record_skipped_entry(&mut self) {
        self.skipped_entries += 1;
    }

    pub fn record_borrower(&mut self, succeeded: bool) {
        self.borrowers += 1;
        if succeeded {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn finish(self, height: u64, started: Instant) -> ScanReport {
        ScanReport {
            height,
            pages: self.pages,
            entries: self.entries,
            borrowers: self.borrowers,
            succeeded: self.succeeded,
            failed: self.failed,
            skipped_entries: self.skipped_entries,
            elapsed: started.elapsed(),
        }
    }
}

impl ScanReport {
    pub fn log(&self) {
        info!(
            "✅ Scan at height {} done in {:.2?}: {} pages, {} entries, {} borrowers ({} ok, {} failed), {} skipped entries",
            self.height,
            self.elapsed,
            self.pages,
            self.entries,
            self.borrowers,
            self.succeeded,
            self.failed,
            self.skipped_entries
        );
    }
}

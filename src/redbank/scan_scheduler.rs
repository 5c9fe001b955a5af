use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::OptionFuture;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::scan_pass::ScanPass;
use super::stats::ScanReport;
use crate::blockchain::ChainQuerier;
use crate::config::SchedulerConfig;
use crate::types::MonitorResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Scanning,
}

/// 스케줄러 루프만 소유하고 바꾸는 상태
#[derive(Debug)]
struct SchedulerState {
    last_processed_height: u64,
    phase: Phase,
    scans_started: u64,
}

impl SchedulerState {
    fn new(last_processed_height: u64) -> Self {
        Self {
            last_processed_height,
            phase: Phase::Idle,
            scans_started: 0,
        }
    }

    /// IDLE 이고 높이가 올랐으면 SCANNING 으로 바꾸고 스캔할 높이를 돌려준다
    fn observe_height(&mut self, height: u64) -> Option<u64> {
        if self.phase != Phase::Idle || height <= self.last_processed_height {
            return None;
        }

        self.last_processed_height = height;
        self.phase = Phase::Scanning;
        self.scans_started += 1;
        Some(height)
    }

    fn finish_scan(&mut self) {
        self.phase = Phase::Idle;
    }
}

/// 블록 높이 기반 스캔 스케줄러
///
/// 고정 주기로 높이를 폴링하고, 새 높이가 보이면서 진행 중인 스캔이 없을
/// 때만 패스를 하나 띄운다. 스캔 중에도 폴링은 계속되며, 그 사이 관측된
/// 높이는 쌓아 두지 않는다. 스캔이 끝나면 성공/실패와 상관없이 IDLE.
pub struct ScanScheduler {
    querier: Arc<dyn ChainQuerier>,
    pass: ScanPass,
    poll_interval: Duration,
    state: SchedulerState,
}

impl ScanScheduler {
    pub fn new(querier: Arc<dyn ChainQuerier>, pass: ScanPass, config: &SchedulerConfig) -> Self {
        Self {
            querier,
            pass,
            poll_interval: config.poll_interval(),
            state: SchedulerState::new(0),
        }
    }

    /// 이미 처리한 높이에서 시작
    pub fn with_initial_height(mut self, height: u64) -> Self {
        self.state.last_processed_height = height;
        self
    }

    pub fn last_processed_height(&self) -> u64 {
        self.state.last_processed_height
    }

    pub fn scans_started(&self) -> u64 {
        self.state.scans_started
    }

    pub fn is_scanning(&self) -> bool {
        self.state.phase == Phase::Scanning
    }

    /// 현재 높이에서 패스를 한 번 실행
    pub async fn run_once(&mut self) -> MonitorResult<ScanReport> {
        let height = self.querier.get_height().await?;
        self.state.last_processed_height = height;
        self.state.scans_started += 1;

        self.pass
            .run(height)
            .instrument(info_span!("scan", pass_id = %Uuid::new_v4(), height))
            .await
    }

    /// `shutdown` 이 끝날 때까지 폴링 루프를 돈다. 진행 중인 스캔은 중단된다.
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!(
            "⏱️ Scheduler started (poll every {:?}, last height {})",
            self.poll_interval, self.state.last_processed_height
        );

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut in_flight: Option<JoinHandle<MonitorResult<ScanReport>>> = None;
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("🛑 Scheduler stopping");
                    break;
                }
                Some(joined) = OptionFuture::from(in_flight.as_mut()), if in_flight.is_some() => {
                    in_flight = None;
                    self.state.finish_scan();

                    match joined {
                        Ok(Ok(_report)) => {}
                        Ok(Err(e)) => error!("❌ Scan failed: {}", e),
                        Err(e) => error!("❌ Scan task panicked: {}", e),
                    }
                }
                _ = ticker.tick() => {
                    match self.querier.get_height().await {
                        Ok(height) => {
                            if let Some(height) = self.state.observe_height(height) {
                                in_flight = Some(self.spawn_pass(height));
                            }
                        }
                        Err(e) => warn!("⚠️ Failed to fetch block height: {}", e),
                    }
                }
            }
        }

        if let Some(handle) = in_flight.take() {
            handle.abort();
            self.state.finish_scan();
        }
    }

    fn spawn_pass(&self, height: u64) -> JoinHandle<MonitorResult<ScanReport>> {
        let pass = self.pass.clone();
        let span = info_span!("scan", pass_id = %Uuid::new_v4(), height);

        tokio::spawn(async move { pass.run(height).await }.instrument(span))
    }
}

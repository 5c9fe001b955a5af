//! 집계 결과 출력

use chrono::SecondsFormat;
use tracing::info;

use crate::types::CollateralizationResult;

/// 집계 결과 수신자
///
/// 차입자 한 명당 패스마다 한 번 호출된다.
pub trait ResultSink: Send + Sync {
    fn record(&self, result: &CollateralizationResult);
}

/// 결과를 tracing 로그로 남기는 기본 싱크
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ResultSink for TracingSink {
    fn record(&self, result: &CollateralizationResult) {
        info!("👤 User: {}", result.wallet);
        info!("💸 Total Debt: {} USD", result.total_debt_usd);
        info!("🏦 Total Collateral: {} USD", result.total_collateral_usd);
        info!("📊 Collateralization Ratio: {}", result.ratio);
        info!("{}", position_summary(result));
        info!("==============================");
    }
}

/// 포지션 수와 관측 시각 한 줄 요약
pub fn position_summary(result: &CollateralizationResult) -> String {
    format!(
        "🧾 Positions: {} debt / {} collateral (observed at {})",
        result.debt_positions,
        result.collateral_positions,
        result.observed_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    )
}

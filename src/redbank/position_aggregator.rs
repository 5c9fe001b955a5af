use std::sync::Arc;

use chrono::Utc;
use futures::future::try_join_all;
use rust_decimal::Decimal;
use tracing::debug;

use super::client::RedBankClient;
use crate::oracle::PriceOracle;
use crate::types::{CollateralizationResult, MonitorResult, Position};
use crate::utils::{collateralization_ratio, position_value_usd, sum_values};

/// 차입자 한 명의 부채/담보를 USD 로 환산해 담보 비율을 계산한다
///
/// 포지션마다 가격과 소수점 지수를 동시에 조회하고, 하나라도 실패하면
/// 해당 차입자 전체가 실패한다.
pub struct PositionAggregator {
    redbank: RedBankClient,
    oracle: Arc<dyn PriceOracle>,
}

impl PositionAggregator {
    pub fn new(redbank: RedBankClient, oracle: Arc<dyn PriceOracle>) -> Self {
        Self { redbank, oracle }
    }

    pub async fn aggregate(&self, wallet: &str) -> MonitorResult<CollateralizationResult> {
        let (debts, collaterals) = tokio::try_join!(
            self.redbank.user_debts(wallet),
            self.redbank.user_collaterals(wallet)
        )?;

        let (total_debt_usd, total_collateral_usd) = tokio::try_join!(
            self.total_value_usd(&debts),
            self.total_value_usd(&collaterals)
        )?;

        let ratio = collateralization_ratio(total_collateral_usd, total_debt_usd)?;

        Ok(CollateralizationResult {
            wallet: wallet.to_string(),
            total_debt_usd,
            total_collateral_usd,
            ratio,
            debt_positions: debts.len(),
            collateral_positions: collaterals.len(),
            observed_at: Utc::now(),
        })
    }

    async fn total_value_usd<P: Position>(&self, positions: &[P]) -> MonitorResult<Decimal> {
        let values = try_join_all(positions.iter().map(|p| self.position_value_usd(p))).await?;
        sum_values(values)
    }

    async fn position_value_usd<P: Position>(&self, position: &P) -> MonitorResult<Decimal> {
        let denom = position.denom();
        let (price, decimals) = tokio::try_join!(
            self.oracle.get_asset_price(denom),
            self.oracle.get_asset_decimals(denom)
        )?;

        let value = position_value_usd(denom, position.amount(), decimals.decimal_exponent, price.price)?;
        debug!(
            "  {} {} {} @ {} (10^{}) = {} USD",
            position.kind(),
            position.amount(),
            denom,
            price.price,
            decimals.decimal_exponent,
            value
        );

        Ok(value)
    }
}

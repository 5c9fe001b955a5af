use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::blockchain::{query_smart, ChainQuerier};
use crate::types::{AssetDecimals, AssetPrice, MonitorResult, PriceSourceResponse};

/// 가격 오라클 트레이트
#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// 자산 1 whole unit 의 USD 가격
    async fn get_asset_price(&self, denom: &str) -> MonitorResult<AssetPrice>;

    /// 자산의 소수점 지수
    async fn get_asset_decimals(&self, denom: &str) -> MonitorResult<AssetDecimals>;
}

/// Mars 오라클 컨트랙트 쿼리 메시지
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OracleQueryMsg {
    Price { denom: String },
    PriceSource { denom: String },
}

/// Mars 오라클 컨트랙트 클라이언트
pub struct MarsOracle {
    querier: Arc<dyn ChainQuerier>,
    address: String,
}

impl MarsOracle {
    pub fn new(querier: Arc<dyn ChainQuerier>, address: impl Into<String>) -> Self {
        Self {
            querier,
            address: address.into(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

#[async_trait]
impl PriceOracle for MarsOracle {
    async fn get_asset_price(&self, denom: &str) -> MonitorResult<AssetPrice> {
        let msg = OracleQueryMsg::Price {
            denom: denom.to_string(),
        };
        let price: AssetPrice = query_smart(self.querier.as_ref(), &self.address, &msg).await?;

        debug!("💲 {} = {} USD", price.denom, price.price);
        Ok(price)
    }

    async fn get_asset_decimals(&self, denom: &str) -> MonitorResult<AssetDecimals> {
        let msg = OracleQueryMsg::PriceSource {
            denom: denom.to_string(),
        };
        let source: PriceSourceResponse =
            query_smart(self.querier.as_ref(), &self.address, &msg).await?;

        AssetDecimals::try_from(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::MockChainQuerier;
    use crate::types::MonitorError;
    use rust_decimal::Decimal;
    use serde_json::json;
    use std::str::FromStr;

    const ORACLE: &str = "osmo1oracle";

    #[test]
    fn test_query_msg_shape() {
        let msg = OracleQueryMsg::PriceSource {
            denom: "uatom".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"price_source": {"denom": "uatom"}})
        );
    }

    #[tokio::test]
    async fn test_price_and_decimals() {
        let mock = MockChainQuerier::new()
            .with_smart_response(
                ORACLE,
                json!({"price": {"denom": "uatom"}}),
                json!({"denom": "uatom", "price": "1.5"}),
            )
            .with_smart_response(
                ORACLE,
                json!({"price_source": {"denom": "uatom"}}),
                json!({
                    "denom": "uatom",
                    "price_source": {"pyth": {"contract_addr": "osmo1pyth", "denom_decimals": 6}}
                }),
            );
        let oracle = MarsOracle::new(Arc::new(mock), ORACLE);

        let price = oracle.get_asset_price("uatom").await.unwrap();
        assert_eq!(price.price, Decimal::from_str("1.5").unwrap());

        let decimals = oracle.get_asset_decimals("uatom").await.unwrap();
        assert_eq!(decimals.decimal_exponent, 6);
    }

    #[tokio::test]
    async fn test_unknown_denom_is_query_failure() {
        let oracle = MarsOracle::new(Arc::new(MockChainQuerier::new()), ORACLE);

        let err = oracle.get_asset_price("ufoo").await.unwrap_err();
        assert!(matches!(err, MonitorError::Query { .. }));
    }

    #[tokio::test]
    async fn test_malformed_price_is_unexpected_response() {
        let mock = MockChainQuerier::new().with_smart_response(
            ORACLE,
            json!({"price": {"denom": "uatom"}}),
            json!({"denom": "uatom", "price": "not-a-number"}),
        );
        let oracle = MarsOracle::new(Arc::new(mock), ORACLE);

        let err = oracle.get_asset_price("uatom").await.unwrap_err();
        assert!(matches!(err, MonitorError::UnexpectedResponse(_)));
    }
}

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::blockchain::{query_smart, ChainQuerier};
use crate::config::AggregatorConfig;
use crate::types::{MonitorError, MonitorResult, Position, PositionKind, UserCollateral, UserDebt};

/// Red Bank 컨트랙트 쿼리 메시지
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RedBankQueryMsg {
    UserDebts {
        user: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        start_after: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        limit: Option<u32>,
    },
    UserCollaterals {
        user: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        start_after: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        limit: Option<u32>,
    },
}

impl RedBankQueryMsg {
    /// 포지션 목록 한 페이지 요청
    pub fn page(kind: PositionKind, user: &str, start_after: Option<String>, limit: u32) -> Self {
        let user = user.to_string();
        let limit = Some(limit);

        match kind {
            PositionKind::Debt => RedBankQueryMsg::UserDebts {
                user,
                start_after,
                limit,
            },
            PositionKind::Collateral => RedBankQueryMsg::UserCollaterals {
                user,
                start_after,
                limit,
            },
        }
    }
}

/// Red Bank 포지션 조회 클라이언트
///
/// 컨트랙트는 `limit` 개씩 잘라서 응답하므로 `start_after` 로 빈 페이지가 나올
/// 때까지 이어서 조회한다.
pub struct RedBankClient {
    querier: Arc<dyn ChainQuerier>,
    address: String,
    page_limit: u32,
    max_pages: u32,
}

impl RedBankClient {
    pub fn new(
        querier: Arc<dyn ChainQuerier>,
        address: impl Into<String>,
        config: &AggregatorConfig,
    ) -> Self {
        Self {
            querier,
            address: address.into(),
            page_limit: config.position_page_limit,
            max_pages: config.max_position_pages,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub async fn user_debts(&self, user: &str) -> MonitorResult<Vec<UserDebt>> {
        self.fetch_all(user, PositionKind::Debt).await
    }

    pub async fn user_collaterals(&self, user: &str) -> MonitorResult<Vec<UserCollateral>> {
        self.fetch_all(user, PositionKind::Collateral).await
    }

    async fn fetch_all<T>(&self, user: &str, kind: PositionKind) -> MonitorResult<Vec<T>>
    where
        T: DeserializeOwned + Position,
    {
        let mut positions: Vec<T> = Vec::new();
        let mut start_after: Option<String> = None;

        for _ in 0..self.max_pages {
            let msg = RedBankQueryMsg::page(kind, user, start_after.clone(), self.page_limit);
            let page: Vec<T> = query_smart(self.querier.as_ref(), &self.address, &msg).await?;

            let Some(last) = page.last() else {
                debug!("📋 {} {} positions: {}", user, kind, positions.len());
                return Ok(positions);
            };

            let last_denom = last.denom().to_string();
            if start_after.as_deref() == Some(last_denom.as_str()) {
                return Err(MonitorError::UnexpectedResponse(format!(
                    "{} pagination for {} repeated start_after {}",
                    kind, user, last_denom
                )));
            }

            positions.extend(page);
            start_after = Some(last_denom);
        }

        Err(MonitorError::UnexpectedResponse(format!(
            "{} pagination for {} exceeded {} pages",
            kind, user, self.max_pages
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{collateral, debt, MockChainQuerier};
    use serde_json::json;

    const REDBANK: &str = "osmo1redbank";
    const USER: &str = "osmo1user";

    fn config(limit: u32) -> AggregatorConfig {
        AggregatorConfig {
            position_page_limit: limit,
            max_position_pages: 100,
        }
    }

    #[test]
    fn test_query_msg_omits_missing_fields() {
        let first = RedBankQueryMsg::page(PositionKind::Debt, USER, None, 10);
        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            json!({"user_debts": {"user": USER, "limit": 10}})
        );

        let next = RedBankQueryMsg::page(PositionKind::Collateral, USER, Some("uatom".into()), 10);
        assert_eq!(
            serde_json::to_value(&next).unwrap(),
            json!({"user_collaterals": {"user": USER, "start_after": "uatom", "limit": 10}})
        );
    }

    #[tokio::test]
    async fn test_follows_pages_until_empty() {
        let debts = vec![
            debt("uatom", "1"),
            debt("uosmo", "2"),
            debt("uusdc", "3"),
            debt("uweth", "4"),
            debt("uwbtc", "5"),
        ];
        let mock = Arc::new(MockChainQuerier::new().with_user_debts(REDBANK, USER, &debts, 2));
        let client = RedBankClient::new(mock.clone(), REDBANK, &config(2));

        let fetched = client.user_debts(USER).await.unwrap();

        assert_eq!(fetched, debts);
        // 2 + 2 + 1 + 빈 페이지
        assert_eq!(mock.smart_calls(), 4);
    }

    #[tokio::test]
    async fn test_no_positions() {
        let mock = MockChainQuerier::new().with_user_collaterals(REDBANK, USER, &[], 10);
        let client = RedBankClient::new(Arc::new(mock), REDBANK, &config(10));

        assert!(client.user_collaterals(USER).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_page_is_rejected() {
        let page = json!([collateral("uatom", "1")]);
        let mock = MockChainQuerier::new()
            .with_smart_response(
                REDBANK,
                json!({"user_collaterals": {"user": USER, "limit": 1}}),
                page.clone(),
            )
            .with_smart_response(
                REDBANK,
                json!({"user_collaterals": {"user": USER, "start_after": "uatom", "limit": 1}}),
                page,
            );
        let client = RedBankClient::new(Arc::new(mock), REDBANK, &config(1));

        let err = client.user_collaterals(USER).await.unwrap_err();
        assert!(matches!(err, MonitorError::UnexpectedResponse(_)));
    }

    #[tokio::test]
    async fn test_page_cap() {
        let debts = vec![debt("uatom", "1"), debt("uosmo", "2"), debt("uusdc", "3")];
        let mock = MockChainQuerier::new().with_user_debts(REDBANK, USER, &debts, 1);
        let client = RedBankClient::new(
            Arc::new(mock),
            REDBANK,
            &AggregatorConfig {
                position_page_limit: 1,
                max_position_pages: 2,
            },
        );

        let err = client.user_debts(USER).await.unwrap_err();
        assert!(err.to_string().contains("exceeded 2 pages"));
    }

    #[tokio::test]
    async fn test_contract_error_propagates() {
        let client = RedBankClient::new(Arc::new(MockChainQuerier::new()), REDBANK, &config(10));

        let err = client.user_debts(USER).await.unwrap_err();
        assert!(matches!(err, MonitorError::Query { .. }));
    }
}

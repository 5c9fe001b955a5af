pub mod proto;
pub mod retry;
pub mod rpc;

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::types::{MonitorResult, PageCursor, StatePage};

pub use retry::RetryingQuerier;
pub use rpc::CosmosRpcClient;

/// 체인 조회 트레이트
///
/// 스캐너/집계기가 의존하는 외부 조회 세 가지: 현재 높이, 원시 상태 페이지,
/// 스마트 컨트랙트 쿼리. 각 호출은 서로 다른 블록 높이에서 응답할 수 있다.
#[async_trait]
pub trait ChainQuerier: Send + Sync {
    /// 최신 블록 높이
    async fn get_height(&self) -> MonitorResult<u64>;

    /// 컨트랙트 저장소 한 페이지 조회
    async fn query_all_state(
        &self,
        contract: &str,
        cursor: &PageCursor,
        limit: u64,
    ) -> MonitorResult<StatePage>;

    /// 스마트 쿼리 (JSON 요청 → JSON 응답)
    async fn query_contract_smart(
        &self,
        contract: &str,
        msg: &serde_json::Value,
    ) -> MonitorResult<serde_json::Value>;
}

#[async_trait]
impl<T: ChainQuerier + ?Sized> ChainQuerier for Arc<T> {
    async fn get_height(&self) -> MonitorResult<u64> {
        (**self).get_height().await
    }

    async fn query_all_state(
        &self,
        contract: &str,
        cursor: &PageCursor,
        limit: u64,
    ) -> MonitorResult<StatePage> {
        (**self).query_all_state(contract, cursor, limit).await
    }

    async fn query_contract_smart(
        &self,
        contract: &str,
        msg: &serde_json::Value,
    ) -> MonitorResult<serde_json::Value> {
        (**self).query_contract_smart(contract, msg).await
    }
}

/// 타입이 있는 스마트 쿼리 헬퍼
pub async fn query_smart<Q, M, T>(querier: &Q, contract: &str, msg: &M) -> MonitorResult<T>
where
    Q: ChainQuerier + ?Sized,
    M: Serialize + ?Sized,
    T: DeserializeOwned,
{
    let msg = serde_json::to_value(msg)?;
    let response = querier.query_contract_smart(contract, &msg).await?;
    Ok(serde_json::from_value(response)?)
}

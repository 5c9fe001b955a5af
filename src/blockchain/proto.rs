//! `cosmwasm.wasm.v1` 쿼리 메시지 (protobuf)
//!
//! 필요한 필드만 정의한다. 태그 번호는 `cosmos/base/query/v1beta1/pagination.proto`
//! 와 `cosmwasm/wasm/v1/query.proto` 를 따른다.

use prost::Message;

use crate::types::{PageCursor, StatePage, StorageEntry};

#[derive(Clone, PartialEq, Message)]
pub struct PageRequest {
    #[prost(bytes = "vec", tag = "1")]
    pub key: Vec<u8>,
    #[prost(uint64, tag = "2")]
    pub offset: u64,
    #[prost(uint64, tag = "3")]
    pub limit: u64,
    #[prost(bool, tag = "4")]
    pub count_total: bool,
    #[prost(bool, tag = "5")]
    pub reverse: bool,
}

#[derive(Clone, PartialEq, Message)]
pub struct PageResponse {
    #[prost(bytes = "vec", tag = "1")]
    pub next_key: Vec<u8>,
    #[prost(uint64, tag = "2")]
    pub total: u64,
}

#[derive(Clone, PartialEq, Message)]
pub struct Model {
    #[prost(bytes = "vec", tag = "1")]
    pub key: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub value: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct QueryAllContractStateRequest {
    #[prost(string, tag = "1")]
    pub address: String,
    #[prost(message, optional, tag = "2")]
    pub pagination: Option<PageRequest>,
}

#[derive(Clone, PartialEq, Message)]
pub struct QueryAllContractStateResponse {
    #[prost(message, repeated, tag = "1")]
    pub models: Vec<Model>,
    #[prost(message, optional, tag = "2")]
    pub pagination: Option<PageResponse>,
}

#[derive(Clone, PartialEq, Message)]
pub struct QuerySmartContractStateRequest {
    #[prost(string, tag = "1")]
    pub address: String,
    #[prost(bytes = "vec", tag = "2")]
    pub query_data: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct QuerySmartContractStateResponse {
    #[prost(bytes = "vec", tag = "1")]
    pub data: Vec<u8>,
}

impl QueryAllContractStateRequest {
    /// 전체 개수 없이 정방향으로 `limit` 개씩 조회
    pub fn page(contract: &str, cursor: &PageCursor, limit: u64) -> Self {
        Self {
            address: contract.to_string(),
            pagination: Some(PageRequest {
                key: cursor.as_bytes().to_vec(),
                offset: 0,
                limit,
                count_total: false,
                reverse: false,
            }),
        }
    }
}

impl From<QueryAllContractStateResponse> for StatePage {
    fn from(response: QueryAllContractStateResponse) -> Self {
        let entries = response
            .models
            .into_iter()
            .map(|model| StorageEntry::new(model.key, model.value))
            .collect();

        // pagination 이 없으면 마지막 페이지
        let next_cursor = response
            .pagination
            .map(|p| PageCursor::new(p.next_key))
            .unwrap_or_default();

        StatePage {
            entries,
            next_cursor,
        }
    }
}

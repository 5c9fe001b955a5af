//! 저장소 키에서 차입자 주소 추출
//!
//! CosmWasm 복합 키 레이아웃:
//! `[u16 BE ns_len][namespace][u16 BE user_len][user key JSON][denom]`

use serde::{Deserialize, Serialize};

use crate::constants::COLLATERALS_NAMESPACE;
use crate::types::{MonitorError, MonitorResult, StorageEntry};

/// 담보 맵 키의 사용자 부분
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserKey {
    pub addr: String,
    #[serde(default)]
    pub acc_id: Option<String>,
}

/// 디코딩된 담보 맵 키
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollateralKey {
    pub user: UserKey,
    pub denom: String,
}

impl CollateralKey {
    /// 저장소와 같은 레이아웃으로 인코딩
    pub fn encode(&self, namespace: &str) -> MonitorResult<Vec<u8>> {
        let user = serde_json::to_vec(&self.user)?;
        let mut key = Vec::with_capacity(4 + namespace.len() + user.len() + self.denom.len());

        push_length_prefixed(&mut key, namespace.as_bytes())?;
        push_length_prefixed(&mut key, &user)?;
        key.extend_from_slice(self.denom.as_bytes());

        Ok(key)
    }
}

fn push_length_prefixed(buf: &mut Vec<u8>, part: &[u8]) -> MonitorResult<()> {
    let len = u16::try_from(part.len())
        .map_err(|_| MonitorError::KeyDecode(format!("key part of {} bytes", part.len())))?;
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(part);
    Ok(())
}

/// `[u16 BE len][part][rest]` 를 `(part, rest)` 로 나눈다
fn split_length_prefixed(bytes: &[u8]) -> Option<(&[u8], &[u8])> {
    if bytes.len() < 2 {
        return None;
    }
    let (len, rest) = bytes.split_at(2);
    let len = u16::from_be_bytes([len[0], len[1]]) as usize;

    (rest.len() >= len).then(|| rest.split_at(len))
}

/// 담보 맵 엔트리만 골라 차입자 주소를 꺼낸다
#[derive(Debug, Clone)]
pub struct AccountExtractor {
    namespace: Vec<u8>,
}

impl Default for AccountExtractor {
    fn default() -> Self {
        Self::new(COLLATERALS_NAMESPACE)
    }
}

impl AccountExtractor {
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.as_bytes().to_vec(),
        }
    }

    /// 다른 맵의 엔트리면 `Ok(None)`, 담보 맵인데 깨진 키면 `KeyDecode`
    pub fn extract(&self, entry: &StorageEntry) -> MonitorResult<Option<String>> {
        Ok(self.decode_key(&entry.key)?.map(|key| key.user.addr))
    }

    pub fn decode_key(&self, key: &[u8]) -> MonitorResult<Option<CollateralKey>> {
        // 싱글톤 Item 키는 길이 접두사가 없다
        let Some((namespace, rest)) = split_length_prefixed(key) else {
            return Ok(None);
        };
        if namespace != self.namespace.as_slice() {
            return Ok(None);
        }

        let (user, denom) = split_length_prefixed(rest).ok_or_else(|| {
            MonitorError::KeyDecode(format!("truncated user key in 0x{}", hex::encode(key)))
        })?;

        let user: UserKey = serde_json::from_slice(user).map_err(|e| {
            MonitorError::KeyDecode(format!("invalid user key in 0x{}: {}", hex::encode(key), e))
        })?;
        if user.addr.is_empty() {
            return Err(MonitorError::KeyDecode(format!(
                "empty address in 0x{}",
                hex::encode(key)
            )));
        }

        let denom = String::from_utf8(denom.to_vec()).map_err(|_| {
            MonitorError::KeyDecode(format!("non-utf8 denom in 0x{}", hex::encode(key)))
        })?;

        Ok(Some(CollateralKey { user, denom }))
    }
}

pub mod fixtures;
pub mod rpc_mock;
pub mod sink;

pub use fixtures::{collateral, collateral_key, debt};
pub use rpc_mock::MockChainQuerier;
pub use sink::CollectingSink;

use std::env;
use std::time::Duration;

use crate::config::Config;
use crate::types::StorageEntry;

/// Check if mock mode is enabled
pub fn is_mock_mode() -> bool {
    env::var("API_MODE").unwrap_or_default() == "mock"
}

/// Get mock configuration values
pub fn get_mock_config() -> MockConfig {
    MockConfig {
        start_height: env::var("MOCK_START_HEIGHT")
            .unwrap_or_else(|_| "1000000".to_string())
            .parse()
            .unwrap_or(1_000_000),
        block_time: env::var("MOCK_BLOCK_TIME")
            .unwrap_or_else(|_| "6".to_string())
            .parse()
            .unwrap_or(6),
    }
}

#[derive(Debug, Clone)]
pub struct MockConfig {
    pub start_height: u64,
    /// 블록 간격 (초)
    pub block_time: u64,
}

const SAMPLE_BORROWERS: [&str; 4] = [
    "osmo1620c4dabb83896090883c62b6c1a2ab5ee0413",
    "osmo19b3fc3930c28c71e89d2f033265cec2f203785",
    "osmo163ea91f2b69fe254480d630cbc43f772d2c44f",
    "osmo13fc71013e66f39e08af5c4b4620afb23c240eb",
];

/// 샘플 차입자 집합을 가진 목 체인
///
/// 네 번째 차입자는 가격 소스가 없는 자산을 담보로 잡고 있어 매 패스 실패한다.
pub fn sample_querier(config: &Config, mock_config: &MockConfig) -> MockChainQuerier {
    let redbank = config.contracts.redbank.as_str();
    let oracle = config.contracts.oracle.as_str();
    let limit = config.aggregator.position_page_limit;
    let [a, b, c, d] = SAMPLE_BORROWERS;

    let state_pages = vec![
        vec![
            StorageEntry::new(b"config".to_vec(), br#"{"owner":"osmo1owner"}"#.to_vec()),
            StorageEntry::new(collateral_key(a, "uatom"), br#"{"amount_scaled":"2000000"}"#.to_vec()),
            StorageEntry::new(collateral_key(b, "uosmo"), br#"{"amount_scaled":"5000000"}"#.to_vec()),
        ],
        vec![
            StorageEntry::new(collateral_key(b, "uusdc"), br#"{"amount_scaled":"1"}"#.to_vec()),
            StorageEntry::new(collateral_key(c, "uatom"), br#"{"amount_scaled":"800000"}"#.to_vec()),
            StorageEntry::new(collateral_key(d, "ufoo"), br#"{"amount_scaled":"1"}"#.to_vec()),
        ],
    ];

    MockChainQuerier::new()
        .with_block_clock(
            mock_config.start_height,
            Duration::from_secs(mock_config.block_time.max(1)),
        )
        .with_pages(redbank, state_pages)
        .with_asset(oracle, "uatom", "9.5", 6)
        .with_asset(oracle, "uosmo", "0.75", 6)
        .with_asset(oracle, "uusdc", "1", 6)
        .with_user_debts(redbank, a, &[debt("uusdc", "10000000")], limit)
        .with_user_collaterals(redbank, a, &[collateral("uatom", "2000000")], limit)
        .with_user_debts(redbank, b, &[], limit)
        .with_user_collaterals(
            redbank,
            b,
            &[collateral("uosmo", "5000000"), collateral("uusdc", "1")],
            limit,
        )
        .with_user_debts(
            redbank,
            c,
            &[debt("uosmo", "9000000"), debt("uusdc", "1250000")],
            limit,
        )
        .with_user_collaterals(redbank, c, &[collateral("uatom", "800000")], limit)
        .with_user_debts(redbank, d, &[debt("uusdc", "1")], limit)
        .with_user_collaterals(redbank, d, &[collateral("ufoo", "1")], limit)
}

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::types::{MonitorError, MonitorResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub contracts: ContractsConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub aggregator: AggregatorConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub rpc_url: String,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractsConfig {
    /// Red Bank 컨트랙트 주소
    pub redbank: String,
    /// 오라클 컨트랙트 주소
    pub oracle: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// AllContractState 페이지 크기
    pub page_limit: u64,
    /// 한 번의 스캔에서 허용하는 최대 페이지 수
    pub max_pages: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// user_debts / user_collaterals 페이지 크기 (컨트랙트 최대값 이하)
    pub position_page_limit: u32,
    pub max_position_pages: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub poll_interval_ms: u64,
    /// 차입자 한 명 처리 후 대기 시간
    pub borrower_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// 1 이면 재시도하지 않는다
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub log_level: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            request_timeout_ms: REQUEST_TIMEOUT_MS,
        }
    }
}

impl Default for ContractsConfig {
    fn default() -> Self {
        Self {
            redbank: REDBANK_ADDRESS.to_string(),
            oracle: ORACLE_ADDRESS.to_string(),
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            page_limit: STATE_PAGE_LIMIT,
            max_pages: MAX_STATE_PAGES,
        }
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            position_page_limit: POSITION_PAGE_LIMIT,
            max_position_pages: MAX_POSITION_PAGES,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: POLL_INTERVAL_MS,
            borrower_delay_ms: BORROWER_DELAY_MS,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: RETRY_MAX_ATTEMPTS,
            initial_backoff_ms: RETRY_INITIAL_BACKOFF_MS,
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl NetworkConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl SchedulerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn borrower_delay(&self) -> Duration {
        Duration::from_millis(self.borrower_delay_ms)
    }
}

impl RetryConfig {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }
}

impl Config {
    /// TOML 파일에서 설정 로드
    pub async fn load(path: &str) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read config file {}", path))?;
        let config: Config =
            toml::from_str(&content).with_context(|| format!("failed to parse {}", path))?;

        Ok(config)
    }

    /// `RPC` 환경변수가 있으면 RPC 엔드포인트를 덮어쓴다
    pub fn apply_env_overrides(&mut self) {
        if let Ok(rpc_url) = std::env::var(RPC_ENV_VAR) {
            if !rpc_url.trim().is_empty() {
                self.network.rpc_url = rpc_url.trim().to_string();
            }
        }
    }

    pub fn validate(&self) -> MonitorResult<()> {
        if self.network.rpc_url.trim().is_empty() {
            return Err(MonitorError::Config("network.rpc_url cannot be empty".to_string()));
        }

        if self.network.request_timeout_ms == 0 {
            return Err(MonitorError::Config(
                "network.request_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.contracts.redbank.trim().is_empty() || self.contracts.oracle.trim().is_empty() {
            return Err(MonitorError::Config(
                "contracts.redbank and contracts.oracle must be set".to_string(),
            ));
        }

        if self.scanner.page_limit == 0 || self.scanner.max_pages == 0 {
            return Err(MonitorError::Config(
                "scanner.page_limit and scanner.max_pages must be greater than 0".to_string(),
            ));
        }

        if self.aggregator.position_page_limit == 0 || self.aggregator.max_position_pages == 0 {
            return Err(MonitorError::Config(
                "aggregator.position_page_limit and aggregator.max_position_pages must be greater than 0"
                    .to_string(),
            ));
        }

        if self.scheduler.poll_interval_ms == 0 {
            return Err(MonitorError::Config(
                "scheduler.poll_interval_ms must be greater than 0".to_string(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(MonitorError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

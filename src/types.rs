use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 컨트랙트 저장소의 원시 키/값 쌍
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEntry {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl StorageEntry {
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// 페이지네이션 커서. 빈 커서는 열거의 끝을 의미한다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PageCursor(Vec<u8>);

impl PageCursor {
    /// 첫 페이지 요청용 빈 커서
    pub fn start() -> Self {
        Self(Vec::new())
    }

    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn is_end(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl fmt::Display for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "<end>")
        } else {
            write!(f, "0x{}", hex::encode(&self.0))
        }
    }
}

/// 원시 상태 조회 한 페이지
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatePage {
    pub entries: Vec<StorageEntry>,
    pub next_cursor: PageCursor,
}

/// 포지션 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PositionKind {
    Debt,
    Collateral,
}

impl fmt::Display for PositionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionKind::Debt => write!(f, "debt"),
            PositionKind::Collateral => write!(f, "collateral"),
        }
    }
}

/// 부채/담보 포지션 공통 인터페이스
pub trait Position: Send + Sync {
    fn kind(&self) -> PositionKind;
    fn denom(&self) -> &str;
    /// 자산의 원시 단위(base unit) 수량
    fn amount(&self) -> &str;
}

/// Red Bank `user_debts` 응답 항목
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDebt {
    pub denom: String,
    pub amount: String,
    pub amount_scaled: String,
    #[serde(default)]
    pub uncollateralized: bool,
}

impl Position for UserDebt {
    fn kind(&self) -> PositionKind {
        PositionKind::Debt
    }

    fn denom(&self) -> &str {
        &self.denom
    }

    fn amount(&self) -> &str {
        &self.amount
    }
}

/// Red Bank `user_collaterals` 응답 항목
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCollateral {
    pub denom: String,
    pub amount: String,
    pub amount_scaled: String,
    #[serde(default)]
    pub enabled: bool,
}

impl Position for UserCollateral {
    fn kind(&self) -> PositionKind {
        PositionKind::Collateral
    }

    fn denom(&self) -> &str {
        &self.denom
    }

    fn amount(&self) -> &str {
        &self.amount
    }
}

/// 오라클 `price` 응답 (1 whole unit 당 USD 가격)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPrice {
    pub denom: String,
    pub price: Decimal,
}

/// Pyth 가격 소스 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PythPriceSource {
    pub contract_addr: String,
    pub denom_decimals: u32,
    #[serde(default)]
    pub price_feed_id: Option<String>,
    #[serde(default)]
    pub max_staleness: Option<u64>,
}

/// 오라클 가격 소스. `denom_decimals` 를 가진 건 pyth 소스뿐이다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OraclePriceSource {
    Pyth { pyth: PythPriceSource },
    Other(serde_json::Value),
}

/// 오라클 `price_source` 응답
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSourceResponse {
    pub denom: String,
    pub price_source: OraclePriceSource,
}

/// 자산의 소수점 지수 (raw amount / 10^decimal_exponent = whole unit)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDecimals {
    pub denom: String,
    pub decimal_exponent: u32,
}

impl TryFrom<PriceSourceResponse> for AssetDecimals {
    type Error = MonitorError;

    fn try_from(response: PriceSourceResponse) -> Result<Self, Self::Error> {
        match response.price_source {
            OraclePriceSource::Pyth { pyth } => Ok(Self {
                denom: response.denom,
                decimal_exponent: pyth.denom_decimals,
            }),
            OraclePriceSource::Other(_) => Err(MonitorError::MissingDecimals {
                denom: response.denom,
            }),
        }
    }
}

/// 담보 비율. 총 부채가 정확히 0 이면 `Infinite`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollateralizationRatio {
    Finite(Decimal),
    Infinite,
}

impl CollateralizationRatio {
    pub fn is_infinite(&self) -> bool {
        matches!(self, CollateralizationRatio::Infinite)
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            CollateralizationRatio::Finite(ratio) => Some(*ratio),
            CollateralizationRatio::Infinite => None,
        }
    }
}

impl fmt::Display for CollateralizationRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollateralizationRatio::Finite(ratio) => write!(f, "{}", ratio),
            CollateralizationRatio::Infinite => write!(f, "Infinite"),
        }
    }
}

/// 차입자 한 명의 집계 결과
#[derive(Debug, Clone, PartialEq)]
pub struct CollateralizationResult {
    pub wallet: String,
    pub total_debt_usd: Decimal,
    pub total_collateral_usd: Decimal,
    pub ratio: CollateralizationRatio,
    pub debt_positions: usize,
    pub collateral_positions: usize,
    pub observed_at: DateTime<Utc>,
}

/// Error types
#[derive(thiserror::Error, Debug)]
pub enum MonitorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Protobuf decode error: {0}")]
    Protobuf(#[from] prost::DecodeError),

    #[error("Pagination of {contract} exceeded {max_pages} pages")]
    PaginationLimitExceeded { contract: String, max_pages: u32 },

    #[error("Pagination of {contract} stalled at cursor {cursor}")]
    StalledCursor { contract: String, cursor: String },

    #[error("Key decode error: {0}")]
    KeyDecode(String),

    #[error("Query failed (codespace={codespace}, code={code}): {log}")]
    Query { codespace: String, code: u32, log: String },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Price source for {denom} has no decimal exponent")]
    MissingDecimals { denom: String },

    #[error("Invalid amount '{amount}' for {denom}")]
    InvalidAmount { denom: String, amount: String },

    #[error("Arithmetic overflow: {0}")]
    ArithmeticOverflow(String),

    #[error("Precision loss beyond 28 digits: {0}")]
    PrecisionLoss(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl MonitorError {
    /// RPC 전송 계층 실패 여부 (재시도 대상)
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            MonitorError::Http(_)
                | MonitorError::Transport(_)
                | MonitorError::Protobuf(_)
                | MonitorError::PaginationLimitExceeded { .. }
                | MonitorError::StalledCursor { .. }
        )
    }
}

impl From<serde_json::Error> for MonitorError {
    fn from(err: serde_json::Error) -> Self {
        MonitorError::UnexpectedResponse(err.to_string())
    }
}

/// Result type alias
pub type MonitorResult<T> = Result<T, MonitorError>;

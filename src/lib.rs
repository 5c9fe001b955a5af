// Red Bank collateralization monitor library

pub mod blockchain;
pub mod config;
pub mod constants;
pub mod mocks;
pub mod monitoring;
pub mod oracle;
pub mod redbank;
pub mod types;
pub mod utils;

// Re-exports for convenience
pub use blockchain::{ChainQuerier, CosmosRpcClient, RetryingQuerier};
pub use config::Config;
pub use monitoring::{ResultSink, TracingSink};
pub use oracle::{MarsOracle, PriceOracle};
pub use redbank::{PositionAggregator, RedBankClient, ScanPass, ScanReport, ScanScheduler, StateScanner};
pub use types::{CollateralizationRatio, CollateralizationResult, MonitorError, MonitorResult};

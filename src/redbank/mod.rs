//! Red Bank 저장소 스캔과 차입자별 담보 비율 계산

pub mod account_extractor;
pub mod client;
pub mod position_aggregator;
pub mod scan_pass;
pub mod scan_scheduler;
pub mod state_scanner;
pub mod stats;

pub use account_extractor::{AccountExtractor, CollateralKey, UserKey};
pub use client::{RedBankClient, RedBankQueryMsg};
pub use position_aggregator::PositionAggregator;
pub use scan_pass::ScanPass;
pub use scan_scheduler::ScanScheduler;
pub use state_scanner::StateScanner;
pub use stats::{ScanReport, ScanStats};

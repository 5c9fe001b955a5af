// Network
pub const DEFAULT_RPC_URL: &str = "https://rpc-osmosis.blockfrost.io:443"; // Osmosis RPC
pub const RPC_ENV_VAR: &str = "RPC";
pub const REQUEST_TIMEOUT_MS: u64 = 30_000;

// Contracts (Osmosis mainnet)
pub const REDBANK_ADDRESS: &str = "osmo1c3ljch9dfw5kf52nfwpxd2zmj2ese7agnx0p9tenkrryasrle5sqf3ftpg";
pub const ORACLE_ADDRESS: &str = "osmo1mhznfr60vjdp2gejhyv2gax9nvyyzhd3z0qcwseyetkfustjauzqycsy2g";

// gRPC-over-ABCI query paths
pub const ALL_CONTRACT_STATE_PATH: &str = "/cosmwasm.wasm.v1.Query/AllContractState";
pub const SMART_CONTRACT_STATE_PATH: &str = "/cosmwasm.wasm.v1.Query/SmartContractState";

// Pagination
pub const STATE_PAGE_LIMIT: u64 = 100;
pub const MAX_STATE_PAGES: u32 = 10_000;
pub const POSITION_PAGE_LIMIT: u32 = 10;
pub const MAX_POSITION_PAGES: u32 = 100;

// Scheduling (in milliseconds)
pub const POLL_INTERVAL_MS: u64 = 1_000;
pub const BORROWER_DELAY_MS: u64 = 1_000;

// Retry (1 = single attempt, no retry)
pub const RETRY_MAX_ATTEMPTS: u32 = 1;
pub const RETRY_INITIAL_BACKOFF_MS: u64 = 500;

// Red Bank storage layout
pub const COLLATERALS_NAMESPACE: &str = "colls";

// Ratio precision (fractional digits, banker's rounding)
pub const RATIO_DECIMAL_PLACES: u32 = 18;

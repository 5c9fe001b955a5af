use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Arg, Command};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use redbank_monitor::blockchain::{ChainQuerier, CosmosRpcClient, RetryingQuerier};
use redbank_monitor::mocks::{get_mock_config, is_mock_mode, sample_querier};
use redbank_monitor::oracle::MarsOracle;
use redbank_monitor::redbank::{
    PositionAggregator, RedBankClient, ScanPass, ScanScheduler, StateScanner,
};
use redbank_monitor::{Config, TracingSink};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("redbank-monitor")
        .version(env!("CARGO_PKG_VERSION"))
        .about("🏦 Mars Red Bank 담보 비율 모니터")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("설정 파일 경로")
                .default_value("config/default.toml"),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("로그 레벨 (trace, debug, info, warn, error)"),
        )
        .arg(
            Arg::new("once")
                .long("once")
                .help("현재 높이에서 한 번만 스캔하고 종료")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    dotenvy::dotenv().ok();

    // 로깅보다 먼저 읽고, 결과는 로깅 초기화 후에 남긴다
    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("config/default.toml");
    let loaded = Config::load(config_path).await;

    let log_level = matches
        .get_one::<String>("log-level")
        .cloned()
        .or_else(|| loaded.as_ref().ok().map(|c| c.monitoring.log_level.clone()))
        .unwrap_or_else(|| "info".to_string());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    print_banner();

    let mut config = match loaded {
        Ok(config) => {
            info!("✅ Configuration loaded from: {}", config_path);
            config
        }
        Err(e) => {
            warn!("⚠️ Failed to load config from {}: {:#}", config_path, e);
            info!("🔧 Using default configuration...");
            Config::default()
        }
    };
    config.apply_env_overrides();

    if let Err(e) = config.validate() {
        error!("❌ Configuration validation failed: {}", e);
        return Err(e.into());
    }

    let querier = build_querier(&config)?;
    let mut scheduler = build_scheduler(&config, querier);

    if matches.get_flag("once") {
        let report = scheduler.run_once().await.context("scan failed")?;
        info!("🏁 Single pass finished at height {}", report.height);
        return Ok(());
    }

    scheduler
        .run_until(async {
            match signal::ctrl_c().await {
                Ok(()) => warn!("🛑 Shutdown signal received"),
                Err(e) => error!("❌ Signal handler error: {}", e),
            }
        })
        .await;

    info!("👋 Red Bank monitor stopped");
    Ok(())
}

fn build_querier(config: &Config) -> Result<Arc<dyn ChainQuerier>> {
    let base: Arc<dyn ChainQuerier> = if is_mock_mode() {
        info!("🎭 API_MODE=mock: using in-memory sample chain");
        Arc::new(sample_querier(config, &get_mock_config()))
    } else {
        let client = CosmosRpcClient::new(&config.network.rpc_url, config.network.request_timeout())
            .context("failed to build RPC client")?;
        Arc::new(client)
    };

    if config.retry.max_attempts > 1 {
        info!(
            "🔁 Retrying transport failures up to {} attempts",
            config.retry.max_attempts
        );
    }

    Ok(Arc::new(RetryingQuerier::new(
        base,
        config.retry.max_attempts,
        config.retry.initial_backoff(),
    )))
}

fn build_scheduler(config: &Config, querier: Arc<dyn ChainQuerier>) -> ScanScheduler {
    let scanner = StateScanner::new(querier.clone(), &config.scanner);
    let redbank = RedBankClient::new(querier.clone(), &config.contracts.redbank, &config.aggregator);
    let oracle = MarsOracle::new(querier.clone(), &config.contracts.oracle);
    let aggregator = PositionAggregator::new(redbank, Arc::new(oracle));

    info!("🏦 Red Bank: {}", config.contracts.redbank);
    info!("🔮 Oracle: {}", config.contracts.oracle);

    let pass = ScanPass::new(
        &config.contracts.redbank,
        Arc::new(scanner),
        Arc::new(aggregator),
        Arc::new(TracingSink),
        config.scheduler.borrower_delay(),
    );

    ScanScheduler::new(querier, pass, &config.scheduler)
}

fn print_banner() {
    println!(r#"
    ╔══════════════════════════════════════════════════════════════╗
    ║                                                              ║
    ║  🏦 Red Bank Monitor                                         ║
    ║                                                              ║
    ║  Mars Red Bank 차입자별 담보 비율 모니터                     ║
    ║                                                              ║
    ║  • 블록 높이가 오를 때마다 전체 저장소 스캔                  ║
    ║  • 부채/담보를 오라클 가격으로 USD 환산                      ║
    ║  • 읽기 전용: 트랜잭션을 보내지 않음                         ║
    ║                                                              ║
    ╚══════════════════════════════════════════════════════════════╝
    "#);
}

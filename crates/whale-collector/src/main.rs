//! WhaleTrack 13F 수집기 CLI.

use clap::{Parser, Subcommand};
use whale_collector::modules::{self, CheckpointStore};
use whale_collector::CollectorConfig;
use whale_core::logging::LogConfig;
use whale_data::{DisclosureSource, ThirteenFClient};

#[derive(Parser)]
#[command(name = "whale-collector")]
#[command(about = "WhaleTrack 13F Disclosure Collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// 기관 목록 동기화 (인덱스 페이지 a-z, 0)
    SyncManagers,

    /// 공시 목록이 없는 기관의 13F-HR 공시 동기화
    SyncFilings,

    /// 보유 내역이 없는 공시의 보유 종목 수집
    CollectHoldings {
        /// 특정 기관만 수집 (쉼표로 구분한 기관 ID)
        #[arg(long)]
        managers: Option<String>,
    },

    /// 전체 워크플로우 실행 (기관 → 공시 → 보유 내역 → 리포트)
    RunAll,

    /// 체크포인트에서 분기 비교 리포트 생성
    Report {
        /// 출력 CSV 경로 (기본: OUTPUT_PATH 설정값)
        #[arg(long)]
        output: Option<String>,
    },

    /// 데몬 모드: 주기적으로 전체 워크플로우 실행
    Daemon,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // 로깅 초기화 (RUST_LOG가 설정되어 있으면 우선)
    let mut log_config = LogConfig::from_env();
    log_config.level = cli.log_level.clone();
    whale_core::logging::init_logging(log_config)?;

    tracing::info!("WhaleTrack 13F Collector 시작");

    let config = CollectorConfig::from_env()?;
    tracing::debug!(
        checkpoint_path = %config.checkpoint_path,
        base_url = %config.base_url,
        "설정 로드 완료"
    );

    let source = ThirteenFClient::with_options(
        &config.base_url,
        config.fetch.request_delay(),
        config.fetch.max_retries,
    );
    let mut store = CheckpointStore::load(&config.checkpoint_path);

    match cli.command {
        Commands::SyncManagers => {
            let stats = modules::sync_managers(&source, &mut store, &config).await?;
            stats.log_summary("기관 동기화");
            store.save();
        }

        Commands::SyncFilings => {
            let stats = modules::sync_filings(&source, &mut store, &config).await?;
            stats.log_summary("공시 동기화");
            store.save();
        }

        Commands::CollectHoldings { managers } => {
            let stats = modules::collect_holdings(&source, &mut store, &config, managers).await?;
            stats.log_summary("보유 내역 수집");
            store.save();
        }

        Commands::RunAll => {
            let interrupted = tokio::select! {
                _ = tokio::signal::ctrl_c() => true,
                result = run_all(&source, &mut store, &config) => {
                    result?;
                    false
                }
            };

            if interrupted {
                tracing::info!("종료 신호 수신, 체크포인트 저장 후 중단");
                store.save();
            }
        }

        Commands::Report { output } => {
            let output_path = output.unwrap_or_else(|| config.output_path.clone());
            write_quarterly_report(&store, &output_path)?;
        }

        Commands::Daemon => {
            tracing::info!(
                "=== 데몬 모드 시작 (주기: {}분) ===",
                config.daemon.interval_minutes
            );

            let mut interval = tokio::time::interval(config.daemon.interval());
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("종료 신호 수신, 데몬 종료 중...");
                        break;
                    }
                    _ = interval.tick() => {
                        if let Err(e) = run_all(&source, &mut store, &config).await {
                            tracing::error!(error = %e, "워크플로우 실패");
                        }

                        let next_run = chrono::Local::now()
                            + chrono::Duration::minutes(config.daemon.interval_minutes as i64);
                        tracing::info!(
                            next_run = %next_run.format("%Y-%m-%d %H:%M:%S"),
                            "다음 실행 대기"
                        );
                    }
                }
            }

            store.save();
        }
    }

    tracing::info!("WhaleTrack 13F Collector 종료");
    Ok(())
}

/// 전체 워크플로우: 기관 → 공시 → 보유 내역 → 리포트.
async fn run_all(
    source: &dyn DisclosureSource,
    store: &mut CheckpointStore,
    config: &CollectorConfig,
) -> whale_collector::Result<()> {
    tracing::info!("=== 전체 워크플로우 시작 ===");

    tracing::info!("Step 1/4: 기관 동기화");
    let stats = modules::sync_managers(source, store, config).await?;
    stats.log_summary("기관 동기화");

    tracing::info!("Step 2/4: 공시 동기화");
    let stats = modules::sync_filings(source, store, config).await?;
    stats.log_summary("공시 동기화");

    tracing::info!("Step 3/4: 보유 내역 수집");
    let stats = modules::collect_holdings(source, store, config, None).await?;
    stats.log_summary("보유 내역 수집");

    store.save();

    tracing::info!("Step 4/4: 리포트 생성");
    write_quarterly_report(store, &config.output_path)?;

    tracing::info!("=== 전체 워크플로우 완료 ===");
    Ok(())
}

/// 체크포인트 트리에서 분기 비교 리포트를 생성합니다.
fn write_quarterly_report(
    store: &CheckpointStore,
    output_path: &str,
) -> whale_collector::Result<()> {
    let deltas = whale_analytics::diff_tree(store.tree());
    if deltas.is_empty() {
        tracing::warn!("리포트로 만들 보유 내역이 없습니다");
    }

    whale_analytics::write_report(&deltas, output_path)?;
    Ok(())
}

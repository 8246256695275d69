//! 환경변수 기반 설정 모듈.

use std::time::Duration;

use crate::error::CollectorError;
use crate::Result;

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 체크포인트 파일 경로
    pub checkpoint_path: String,
    /// 리포트 출력 경로 (CSV)
    pub output_path: String,
    /// 13f.info 베이스 URL
    pub base_url: String,
    /// HTTP 요청 설정
    pub fetch: FetchConfig,
    /// 공시 목록 동기화 설정
    pub filing_sync: FilingSyncConfig,
    /// 데몬 모드 설정
    pub daemon: DaemonConfig,
}

/// HTTP 요청 설정
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// 요청 간 딜레이 (밀리초)
    pub request_delay_ms: u64,
    /// 동시 요청 수
    pub concurrency: usize,
    /// 일시적 오류에 대한 최대 재시도 횟수
    pub max_retries: u32,
    /// 딜레이 랜덤화 여부 (0.5~1.5배 범위)
    pub randomize_delay: bool,
}

/// 공시 목록 동기화 설정
#[derive(Debug, Clone)]
pub struct FilingSyncConfig {
    /// 기관당 유지할 최근 13F-HR 공시 수
    pub max_filings_per_manager: usize,
}

/// 데몬 모드 설정
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// 워크플로우 실행 주기 (분 단위)
    pub interval_minutes: u64,
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        // .env 파일 로드 (없어도 무시)
        dotenvy::dotenv().ok();

        let config = Self {
            checkpoint_path: env_var_string("CHECKPOINT_PATH", "checkpoints/13f-info.json"),
            output_path: env_var_string("OUTPUT_PATH", "data/processed_data.csv"),
            base_url: env_var_string("BASE_URL", "https://13f.info"),
            fetch: FetchConfig {
                request_delay_ms: env_var_parse("FETCH_REQUEST_DELAY_MS", 250),
                concurrency: env_var_parse("FETCH_CONCURRENCY", 8),
                max_retries: env_var_parse("FETCH_MAX_RETRIES", 3),
                randomize_delay: env_var_bool("FETCH_RANDOMIZE_DELAY", false),
            },
            filing_sync: FilingSyncConfig {
                max_filings_per_manager: env_var_parse("MAX_FILINGS_PER_MANAGER", 2),
            },
            daemon: DaemonConfig {
                interval_minutes: env_var_parse("DAEMON_INTERVAL_MINUTES", 360),
            },
        };

        if config.fetch.concurrency == 0 {
            return Err(CollectorError::Config(
                "FETCH_CONCURRENCY는 1 이상이어야 합니다".to_string(),
            ));
        }
        if config.filing_sync.max_filings_per_manager == 0 {
            return Err(CollectorError::Config(
                "MAX_FILINGS_PER_MANAGER는 1 이상이어야 합니다".to_string(),
            ));
        }

        Ok(config)
    }
}

impl FetchConfig {
    /// 요청 간 딜레이를 Duration으로 반환
    ///
    /// 랜덤화가 켜져 있으면 0.5~1.5배 범위에서 흔들어 요청 패턴을
    /// 불규칙하게 만듭니다.
    pub fn request_delay(&self) -> Duration {
        if self.randomize_delay {
            use rand::Rng;
            let factor = rand::thread_rng().gen_range(0.5..1.5);
            Duration::from_millis((self.request_delay_ms as f64 * factor) as u64)
        } else {
            Duration::from_millis(self.request_delay_ms)
        }
    }
}

impl DaemonConfig {
    /// 워크플로우 실행 주기를 Duration으로 반환
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// 환경변수에서 불린 값 로드 ("true"/"1"만 참)
fn env_var_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}

/// 환경변수에서 문자열 로드 (미설정 시 기본값 사용)
fn env_var_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

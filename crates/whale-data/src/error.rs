//! 데이터 모듈 오류 타입 정의.

use thiserror::Error;

/// 데이터 수집 관련 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// HTTP 전송 오류 (연결 실패, 타임아웃 등)
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// 재시도 후에도 남은 비정상 응답 상태
    #[error("Unexpected status {code} for {url}")]
    Status { code: u16, url: String },

    /// 응답 본문 파싱 오류
    #[error("Parse error: {0}")]
    Parse(String),

    /// Rate limit 초과 (HTTP 429)
    #[error("Rate limited")]
    RateLimited,
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::Parse(err.to_string())
    }
}

/// 데이터 모듈 Result 타입
pub type Result<T> = std::result::Result<T, DataError>;

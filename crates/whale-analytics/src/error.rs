//! 분석 모듈 오류 타입 정의.

use thiserror::Error;

/// 분석/리포트 관련 오류.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// 리포트 쓰기 입출력 오류 (디렉토리 생성 실패 포함)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// 분석 모듈 Result 타입
pub type Result<T> = std::result::Result<T, AnalyticsError>;

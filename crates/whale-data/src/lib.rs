//! # Whale Data
//!
//! 13f.info 데이터 소스 crate입니다.
//!
//! 이 crate는 다음을 제공합니다:
//! - 기관 인덱스(HTML) / 공시 목록(HTML) / 보유 내역(JSON) 수집 클라이언트
//! - 재시도와 User-Agent 로테이션이 포함된 HTTP 계층
//! - 오프라인에서 테스트 가능한 파싱 함수
//! - 수집 단계가 의존하는 `DisclosureSource` trait

pub mod error;
pub mod provider;

// 에러 타입
pub use error::{DataError, Result};

// 13f.info 클라이언트
pub use provider::{DisclosureSource, ThirteenFClient, DISCOVERY_PREFIXES};

//! Standalone 13F disclosure collector.
//!
//! 13f.info에서 공시 데이터를 단계별로 수집하는 독립 실행 바이너리입니다:
//! - 기관 목록 동기화 (인덱스 페이지 a-z, 0)
//! - 기관별 13F-HR 공시 목록 동기화
//! - 공시별 보유 내역 수집
//! - 분기 비교 리포트 생성
//!
//! 모든 진행 상태는 파일 하나의 체크포인트 트리에 저장되며, 각 단계는
//! 트리의 빈 곳만 채우므로 언제 중단해도 재실행으로 이어갈 수 있습니다.

pub mod config;
pub mod error;
pub mod modules;
pub mod stats;

pub use config::CollectorConfig;
pub use error::{CollectorError, Result};
pub use stats::CollectionStats;

//! # Whale Analytics
//!
//! 체크포인트 트리의 분기 간 보유 변화를 분석하고 리포트를 생성합니다.
//!
//! 이 crate는 다음을 제공합니다:
//! - 기관별 최근 공시 vs 직전 공시의 종목 단위 비교
//! - new/buy/sell/hold 거래 유형 추론
//! - 고정 스키마 CSV 리포트 출력

pub mod error;
pub mod position_diff;
pub mod report;

pub use error::{AnalyticsError, Result};
pub use position_diff::{diff_tree, PositionDelta, TransactionType};
pub use report::{write_report, REPORT_HEADER};

//! 데이터 수집 모듈.
//!
//! 세 단계가 체크포인트 트리의 빈 곳을 순서대로 채웁니다:
//! 기관 발견 → 공시 목록 → 보유 내역.

pub mod checkpoint;
pub mod filing_sync;
pub mod holdings_collect;
pub mod manager_sync;

pub use checkpoint::{Applied, CheckpointStore};
pub use filing_sync::{filing_frontier, sync_filings};
pub use holdings_collect::{collect_holdings, holdings_frontier};
pub use manager_sync::sync_managers;

//! # Whale Core
//!
//! 13F 공시 수집 파이프라인의 공통 기반 crate입니다.
//!
//! 이 crate는 파이프라인 전반에서 사용되는 기본 요소를 제공합니다:
//! - 기관 → 공시 → 보유 종목 3계층 도메인 모델
//! - 체크포인트 트리 타입
//! - 수집 단계가 생산하는 공시 엔티티 레코드
//! - 스크랩 원문 숫자 문자열의 강제 변환
//! - 로깅 초기화

pub mod domain;
pub mod logging;
pub mod numeric;

pub use domain::*;
pub use logging::*;
pub use numeric::*;

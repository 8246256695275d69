//! 데이터 Provider 모듈.
//!
//! 13f.info에서 공시 계층의 각 단계 데이터를 가져오는 Provider를
//! 정의합니다.
//!
//! ## 13f.info 클라이언트
//! - `ThirteenFClient`: 기관 인덱스(HTML), 공시 목록(HTML), 보유 내역(JSON)
//! - 재시도 가능한 상태 코드에 대한 지수 백오프
//! - 요청마다 무작위 User-Agent 적용
//!
//! ## 소스 추상화
//! - `DisclosureSource`: 수집 단계가 소비하는 trait.
//!   테스트에서는 인메모리 스크립트 소스로 대체할 수 있습니다.

pub mod thirteenf;

pub use thirteenf::{DisclosureSource, ThirteenFClient, DISCOVERY_PREFIXES};

//! 기관(운용사) 모델.
//!
//! 체크포인트 트리의 최상위 계층을 정의합니다:
//! - `Manager` - 13F 공시를 제출하는 기관
//! - `CheckpointTree` - 기관 ID로 키잉된 전체 수집 트리

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::Filing;

/// 기관 ID로 키잉된 수집 트리 전체.
///
/// `BTreeMap`을 사용하므로 직렬화 결과의 키 순서가 항상 동일하고
/// diff로 비교 가능한 체크포인트 파일이 만들어집니다.
pub type CheckpointTree = BTreeMap<String, Manager>;

/// 13F 공시를 제출하는 기관(운용사).
///
/// 인덱스 페이지에서 처음 발견될 때 빈 공시 목록을 가진 스텁으로
/// 삽입되며, 이후에는 공시가 추가되기만 합니다. 기관이 트리에서
/// 제거되는 일은 없습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manager {
    /// 기관 ID (목록 링크 마지막 경로 조각의 첫 `-` 앞 부분)
    pub id: String,
    /// 기관 이름
    pub name: String,
    /// 공시 목록 페이지 URL (사이트 상대 경로)
    pub filing_url: String,
    /// 수집된 공시 (공시 ID 키)
    #[serde(default)]
    pub filings: BTreeMap<String, Filing>,
}

impl Manager {
    /// 빈 공시 목록을 가진 스텁 기관을 생성합니다.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        filing_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            filing_url: filing_url.into(),
            filings: BTreeMap::new(),
        }
    }

    /// 공시 목록이 아직 수집되지 않았는지 확인합니다.
    pub fn filings_empty(&self) -> bool {
        self.filings.is_empty()
    }
}

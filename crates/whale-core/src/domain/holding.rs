//! 공시에 보고된 개별 보유 종목 모델.

use serde::{Deserialize, Serialize};

/// 공시 한 건에 포함된 단일 보유 종목.
///
/// 숫자 필드는 스크랩한 원문 그대로 보존합니다 (천 단위 구분자 포함 가능).
/// 수치 해석은 리포트 생성 시점에 [`crate::numeric::parse_share_count`]로
/// 수행합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    /// 보유 주식 수 (원문)
    pub shares: String,
    /// 평가액, 천 달러 단위 (원문)
    pub value: String,
    /// 주식 클래스 (예: "COM", "CL A"). 이 필드가 없던 시기의
    /// 체크포인트 파일도 로드되도록 기본값을 허용합니다.
    #[serde(default)]
    pub class: String,
}

impl Holding {
    /// 새 보유 종목을 생성합니다.
    pub fn new(
        shares: impl Into<String>,
        value: impl Into<String>,
        class: impl Into<String>,
    ) -> Self {
        Self {
            shares: shares.into(),
            value: value.into(),
            class: class.into(),
        }
    }
}

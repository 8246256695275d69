//! 분기별 13F 공시 모델.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::Holding;

/// 단일 분기의 13F-HR 공시.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filing {
    /// 공시 외부 ID (보유 내역 조회 키)
    pub filing_id: String,
    /// 분기 라벨 (예: "Q2 2024")
    pub quarter: String,
    /// 공시 상세 페이지 URL (사이트 상대 경로)
    pub filing_url: String,
    /// 제출일 (사이트 표기 그대로)
    pub filing_date: String,
    /// 발견 순서 스탬프. 저장소가 삽입 시 부여하며 단조 증가합니다.
    ///
    /// 공시 목록 페이지는 최신 분기부터 나열되므로 한 기관 안에서는
    /// 가장 작은 `seq`가 가장 최근 분기입니다. 분기 비교는
    /// `filing_date` 문자열이 아니라 항상 이 값으로 정렬합니다.
    pub seq: u64,
    /// 보유 종목 (종목 심볼 키)
    #[serde(default)]
    pub holdings: BTreeMap<String, Holding>,
}

impl Filing {
    /// 빈 보유 목록을 가진 스텁 공시를 생성합니다.
    pub fn new(
        filing_id: impl Into<String>,
        quarter: impl Into<String>,
        filing_url: impl Into<String>,
        filing_date: impl Into<String>,
        seq: u64,
    ) -> Self {
        Self {
            filing_id: filing_id.into(),
            quarter: quarter.into(),
            filing_url: filing_url.into(),
            filing_date: filing_date.into(),
            seq,
            holdings: BTreeMap::new(),
        }
    }

    /// 보유 내역이 아직 수집되지 않았는지 확인합니다.
    pub fn holdings_empty(&self) -> bool {
        self.holdings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_filing_starts_empty() {
        let filing = Filing::new("000123", "Q1 2024", "/13f/000123", "2024-02-14", 0);

        assert!(filing.holdings_empty());
        assert_eq!(filing.seq, 0);
    }

    #[test]
    fn test_roundtrip_keeps_seq_and_holdings() {
        let mut filing = Filing::new("000123", "Q1 2024", "/13f/000123", "2024-02-14", 7);
        filing
            .holdings
            .insert("AAPL".to_string(), Holding::new("1,200", "350000", "COM"));

        let json = serde_json::to_string(&filing).unwrap();
        let restored: Filing = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, filing);
        assert_eq!(restored.seq, 7);
    }
}

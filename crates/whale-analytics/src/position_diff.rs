//! 분기 간 포지션 비교 엔진.
//!
//! 기관별로 가장 최근 공시와 직전 공시의 보유 내역을 비교하여
//! 종목 단위의 매수/매도/신규/유지를 추론합니다.
//!
//! # 비교 규칙
//!
//! - 공시는 발견 순서(`seq`) 오름차순으로 정렬합니다. 공시 목록은
//!   최신 분기부터 발견되므로 첫 번째가 최근 분기, 두 번째가 직전
//!   분기입니다. `filing_date` 문자열은 정렬에 사용하지 않습니다.
//! - 직전 공시가 없으면 최근 공시의 모든 종목을 신규로 처리합니다.
//! - 직전 공시에만 있는 종목(전량 매도)은 출력하지 않습니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use whale_core::{parse_share_count, CheckpointTree, Filing};

/// 추론된 거래 유형.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// 직전 공시에 없던 신규 편입
    New,
    /// 주식 수 증가
    Buy,
    /// 주식 수 감소
    Sell,
    /// 변동 없음
    Hold,
}

impl TransactionType {
    /// 리포트 표기 문자열.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Buy => "buy",
            Self::Sell => "sell",
            Self::Hold => "hold",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 종목 하나의 분기 간 변화.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionDelta {
    /// 기관(펀드) 이름
    pub fund_name: String,
    /// 최근 공시 제출일
    pub filing_date: String,
    /// 최근 공시 분기 라벨
    pub quarter: String,
    /// 종목 심볼
    pub symbol: String,
    /// 주식 클래스
    pub class: String,
    /// 평가액 (천 달러)
    pub value: i64,
    /// 보유 주식 수
    pub shares: i64,
    /// 직전 공시 대비 주식 수 변화
    pub change: i64,
    /// 변화율 (%, 소수점 둘째 자리 반올림, 직전 보유가 0이면 0)
    pub pct_change: Decimal,
    /// 추론된 거래 유형
    pub transaction_type: TransactionType,
}

/// 체크포인트 트리 전체의 분기 간 변화를 계산합니다.
///
/// 공시가 없는 기관은 건너뜁니다. 보유 내역이 아직 수집되지 않은
/// 공시는 빈 보유 목록으로 취급되므로, 수집이 끝나지 않은 트리에서도
/// 호출은 안전합니다.
pub fn diff_tree(tree: &CheckpointTree) -> Vec<PositionDelta> {
    let mut deltas = Vec::new();

    for manager in tree.values() {
        if manager.filings.is_empty() {
            continue;
        }

        let mut filings: Vec<&Filing> = manager.filings.values().collect();
        filings.sort_by_key(|filing| filing.seq);

        let latest = filings[0];
        let previous = filings.get(1).copied();

        for (symbol, holding) in &latest.holdings {
            let shares = parse_share_count(&holding.shares);
            let value = parse_share_count(&holding.value);

            let prev_shares = previous
                .and_then(|filing| filing.holdings.get(symbol))
                .map(|prev| parse_share_count(&prev.shares))
                .unwrap_or(0);

            let change = shares - prev_shares;

            let pct_change = if prev_shares == 0 {
                Decimal::ZERO
            } else {
                (Decimal::from(change) / Decimal::from(prev_shares) * Decimal::from(100))
                    .round_dp(2)
            };

            let transaction_type = if prev_shares == 0 {
                TransactionType::New
            } else if change > 0 {
                TransactionType::Buy
            } else if change < 0 {
                TransactionType::Sell
            } else {
                TransactionType::Hold
            };

            deltas.push(PositionDelta {
                fund_name: manager.name.clone(),
                filing_date: latest.filing_date.clone(),
                quarter: latest.quarter.clone(),
                symbol: symbol.clone(),
                class: holding.class.clone(),
                value,
                shares,
                change,
                pct_change,
                transaction_type,
            });
        }
    }

    deltas
}

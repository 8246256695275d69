//! 수집 통계 구조체.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 수집 작업 통계
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionStats {
    /// 총 시도 횟수 (단계별 단위: 프리픽스/기관/공시)
    pub total: usize,
    /// 성공 횟수
    pub success: usize,
    /// 에러 횟수
    pub errors: usize,
    /// 건너뛴 횟수 (이미 수집된 항목)
    pub skipped: usize,
    /// 빈 응답 (조회 성공, 데이터 없음)
    pub empty: usize,
    /// 저장된 총 보유 종목 수
    pub total_holdings: usize,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl CollectionStats {
    /// 새 통계 객체 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 성공률 계산 (%)
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.success as f64 / self.total as f64) * 100.0
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            total = self.total,
            success = self.success,
            errors = self.errors,
            skipped = self.skipped,
            empty = self.empty,
            total_holdings = self.total_holdings,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "수집 완료"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_rate() {
        let mut stats = CollectionStats::new();
        stats.total = 4;
        stats.success = 3;

        assert_eq!(stats.success_rate(), 75.0);
    }

    #[test]
    fn test_success_rate_with_empty_frontier() {
        // 프론티어가 비어 조기 반환된 통계도 요약 가능해야 한다
        let stats = CollectionStats::new();

        assert_eq!(stats.success_rate(), 0.0);
    }
}

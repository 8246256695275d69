//! 보유 내역 수집 모듈 (3단계).
//!
//! 보유 내역이 아직 없는 공시의 JSON 데이터를 가져와 종목을 채웁니다.
//! 공시 단위로 실패가 격리되므로 일부 공시가 실패해도 나머지는
//! 정상 수집되고, 실패한 공시는 다음 실행에서 다시 시도됩니다.

use std::time::Instant;

use futures::stream::{self, StreamExt};
use whale_core::{CheckpointTree, DisclosureEntity};
use whale_data::DisclosureSource;

use crate::modules::{Applied, CheckpointStore};
use crate::{CollectionStats, CollectorConfig, Result};

/// 보유 내역이 비어 있는 (기관 ID, 공시 ID) 목록을 계산합니다.
pub fn holdings_frontier(tree: &CheckpointTree) -> Vec<(String, String)> {
    tree.values()
        .flat_map(|manager| {
            manager
                .filings
                .values()
                .filter(|filing| filing.holdings_empty())
                .map(|filing| (manager.id.clone(), filing.filing_id.clone()))
        })
        .collect()
}

/// 프론티어에 있는 공시들의 보유 내역을 수집합니다.
///
/// `managers`에 쉼표로 구분한 기관 ID를 주면 해당 기관의 공시만
/// 수집합니다 (없으면 전체).
pub async fn collect_holdings(
    source: &dyn DisclosureSource,
    store: &mut CheckpointStore,
    config: &CollectorConfig,
    managers: Option<String>,
) -> Result<CollectionStats> {
    let start = Instant::now();
    let mut stats = CollectionStats::new();

    let frontier = match managers {
        Some(ref list) => {
            let wanted: Vec<String> = list
                .split(',')
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .collect();
            tracing::info!(managers = wanted.len(), "지정한 기관의 보유 내역만 수집");
            holdings_frontier(store.tree())
                .into_iter()
                .filter(|(manager_id, _)| wanted.iter().any(|w| w == manager_id))
                .collect()
        }
        None => holdings_frontier(store.tree()),
    };

    if frontier.is_empty() {
        tracing::info!("보유 내역을 수집할 공시가 없습니다");
        stats.elapsed = start.elapsed();
        return Ok(stats);
    }

    tracing::info!(
        source = source.name(),
        filings = frontier.len(),
        "보유 내역 수집 시작"
    );

    let fetches = frontier.into_iter().map(|(manager_id, filing_id)| {
        let delay = config.fetch.request_delay();
        async move {
            let result = source.fetch_holdings(&manager_id, &filing_id).await;
            tokio::time::sleep(delay).await;
            (manager_id, filing_id, result)
        }
    });

    let mut results = stream::iter(fetches).buffer_unordered(config.fetch.concurrency);
    let mut last_error = None;

    while let Some((manager_id, filing_id, result)) = results.next().await {
        stats.total += 1;
        match result {
            Ok(records) if !records.is_empty() => {
                let mut applied = 0usize;
                for record in records {
                    if store.apply(DisclosureEntity::Holding(record)) == Applied::Inserted {
                        applied += 1;
                    }
                }
                stats.success += 1;
                stats.total_holdings += applied;
                tracing::info!(
                    manager_id = %manager_id,
                    filing_id = %filing_id,
                    holdings = applied,
                    "보유 내역 처리 완료"
                );
            }
            Ok(_) => {
                stats.empty += 1;
                tracing::debug!(filing_id = %filing_id, "보유 종목 없음");
            }
            Err(e) => {
                stats.errors += 1;
                tracing::error!(
                    manager_id = %manager_id,
                    filing_id = %filing_id,
                    error = %e,
                    "보유 내역 조회 실패"
                );
                last_error = Some(e);
            }
        }
    }

    stats.elapsed = start.elapsed();

    // 공시 단위 실패는 다음 실행에서 메워지지만, 전부 실패면 중단
    if let Some(e) = last_error {
        if stats.errors == stats.total {
            tracing::error!(errors = stats.errors, "보유 내역 조회가 모두 실패했습니다");
            return Err(e.into());
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use whale_core::{Filing, Holding, Manager};

    #[test]
    fn test_holdings_frontier_only_empty_filings() {
        let mut manager = Manager::new("m1", "Fund One", "/manager/m1-fund-one");

        let mut done = Filing::new("f1", "Q2 2024", "/13f/f1", "2024-08-14", 0);
        done.holdings
            .insert("AAPL".to_string(), Holding::new("100", "1000", "COM"));
        manager.filings.insert("f1".to_string(), done);
        manager.filings.insert(
            "f2".to_string(),
            Filing::new("f2", "Q1 2024", "/13f/f2", "2024-05-15", 1),
        );

        let mut tree = CheckpointTree::new();
        tree.insert("m1".to_string(), manager);

        let frontier = holdings_frontier(&tree);

        assert_eq!(frontier, vec![("m1".to_string(), "f2".to_string())]);
    }
}

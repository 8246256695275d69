//! 공시 목록 동기화 모듈 (2단계).
//!
//! 공시 목록이 아직 없는 기관의 목록 페이지를 가져와 13F-HR 공시를
//! 스텁으로 추가합니다. 기관당 최근 공시 몇 건만 유지합니다.

use std::time::Instant;

use futures::stream::{self, StreamExt};
use whale_core::{CheckpointTree, DisclosureEntity};
use whale_data::DisclosureSource;

use crate::modules::{Applied, CheckpointStore};
use crate::{CollectionStats, CollectorConfig, Result};

/// 공시 목록이 비어 있는 기관의 (기관 ID, 목록 URL) 목록을 계산합니다.
///
/// 트리의 빈 곳이 곧 작업 목록입니다. 별도 작업 큐를 유지하지 않으므로
/// 중단된 실행을 이어갈 때도 같은 계산을 그대로 사용합니다.
pub fn filing_frontier(tree: &CheckpointTree) -> Vec<(String, String)> {
    tree.values()
        .filter(|manager| manager.filings_empty())
        .map(|manager| (manager.id.clone(), manager.filing_url.clone()))
        .collect()
}

/// 프론티어에 있는 기관들의 13F-HR 공시 목록을 수집합니다.
///
/// 페이지 표기 순서(최신 분기부터)대로 앞에서
/// `max_filings_per_manager`건만 적용합니다. 공시가 하나도 없는 기관은
/// 빈 응답으로 기록되고 다음 실행에서 다시 시도됩니다.
pub async fn sync_filings(
    source: &dyn DisclosureSource,
    store: &mut CheckpointStore,
    config: &CollectorConfig,
) -> Result<CollectionStats> {
    let start = Instant::now();
    let mut stats = CollectionStats::new();

    let frontier = filing_frontier(store.tree());
    if frontier.is_empty() {
        tracing::info!("공시 목록을 수집할 기관이 없습니다");
        stats.elapsed = start.elapsed();
        return Ok(stats);
    }

    tracing::info!(
        source = source.name(),
        managers = frontier.len(),
        "공시 목록 동기화 시작"
    );

    let max_filings = config.filing_sync.max_filings_per_manager;

    let fetches = frontier.into_iter().map(|(manager_id, filing_url)| {
        let delay = config.fetch.request_delay();
        async move {
            let result = source.fetch_filings(&manager_id, &filing_url).await;
            tokio::time::sleep(delay).await;
            (manager_id, result)
        }
    });

    let mut results = stream::iter(fetches).buffer_unordered(config.fetch.concurrency);
    let mut last_error = None;

    while let Some((manager_id, result)) = results.next().await {
        stats.total += 1;
        match result {
            Ok(records) if !records.is_empty() => {
                let mut applied = 0usize;
                for record in records.into_iter().take(max_filings) {
                    tracing::debug!(
                        manager_id = %manager_id,
                        filing_id = %record.filing_id,
                        quarter = %record.quarter,
                        holdings_count = %record.holdings_count,
                        value = %record.value,
                        top_holdings = %record.top_holdings,
                        "공시 발견"
                    );
                    if store.apply(DisclosureEntity::Filing(record)) == Applied::Inserted {
                        applied += 1;
                    }
                }
                stats.success += 1;
                tracing::info!(manager_id = %manager_id, filings = applied, "공시 목록 처리 완료");
            }
            Ok(_) => {
                stats.empty += 1;
                tracing::debug!(manager_id = %manager_id, "13F-HR 공시 없음");
            }
            Err(e) => {
                stats.errors += 1;
                tracing::error!(manager_id = %manager_id, error = %e, "공시 목록 조회 실패");
                last_error = Some(e);
            }
        }
    }

    stats.elapsed = start.elapsed();

    // 기관 단위 실패는 다음 실행에서 메워지지만, 전부 실패면 중단
    if let Some(e) = last_error {
        if stats.errors == stats.total {
            tracing::error!(errors = stats.errors, "공시 목록 조회가 모두 실패했습니다");
            return Err(e.into());
        }
    }

    Ok(stats)
}

//! 기관 목록 동기화 모듈 (1단계).
//!
//! 기관 인덱스 페이지(a-z, 0)를 순회하며 새 기관을 발견하고
//! 빈 공시 목록을 가진 스텁으로 트리에 추가합니다.

use std::time::Instant;

use futures::stream::{self, StreamExt};
use whale_core::DisclosureEntity;
use whale_data::{DisclosureSource, DISCOVERY_PREFIXES};

use crate::modules::{Applied, CheckpointStore};
use crate::{CollectionStats, CollectorConfig, Result};

/// 인덱스 페이지 전체에서 기관을 발견합니다.
///
/// 이미 발견된 기관은 건너뛰므로 재실행해도 중복이 생기지 않습니다.
/// 페이지 단위 실패는 통계에 기록하고 계속 진행하며, 모든 페이지가
/// 실패한 경우에만 오류를 반환합니다.
pub async fn sync_managers(
    source: &dyn DisclosureSource,
    store: &mut CheckpointStore,
    config: &CollectorConfig,
) -> Result<CollectionStats> {
    let start = Instant::now();
    let mut stats = CollectionStats::new();

    tracing::info!(
        source = source.name(),
        prefixes = DISCOVERY_PREFIXES.len(),
        "기관 목록 동기화 시작"
    );

    let fetches = DISCOVERY_PREFIXES.iter().map(|prefix| {
        let delay = config.fetch.request_delay();
        async move {
            let result = source.fetch_manager_index(prefix).await;
            tokio::time::sleep(delay).await;
            (*prefix, result)
        }
    });

    let mut results = stream::iter(fetches).buffer_unordered(config.fetch.concurrency);
    let mut last_error = None;

    while let Some((prefix, result)) = results.next().await {
        stats.total += 1;
        match result {
            Ok(records) if !records.is_empty() => {
                let mut new_managers = 0usize;
                for record in records {
                    match store.apply(DisclosureEntity::Manager(record)) {
                        Applied::Inserted => new_managers += 1,
                        Applied::Skipped => stats.skipped += 1,
                    }
                }
                stats.success += 1;
                tracing::info!(
                    prefix = prefix,
                    new_managers = new_managers,
                    "인덱스 페이지 처리 완료"
                );
            }
            Ok(_) => {
                stats.empty += 1;
                tracing::debug!(prefix = prefix, "기관 없음");
            }
            Err(e) => {
                stats.errors += 1;
                tracing::error!(prefix = prefix, error = %e, "인덱스 페이지 조회 실패");
                last_error = Some(e);
            }
        }
    }

    stats.elapsed = start.elapsed();

    // 페이지 단위 실패는 다음 실행에서 메워지지만, 전부 실패면 중단
    if let Some(e) = last_error {
        if stats.errors == stats.total {
            tracing::error!(errors = stats.errors, "기관 인덱스 조회가 모두 실패했습니다");
            return Err(e.into());
        }
    }

    Ok(stats)
}

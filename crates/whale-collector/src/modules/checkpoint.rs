//! 체크포인트 저장소 모듈.
//!
//! 수집 진행 상태 전체를 JSON 파일 하나에 보관하여 장시간 수집의
//! 중단/재개를 지원합니다.
//!
//! # 주요 기능
//!
//! - **단일 병합 지점**: 모든 단계의 결과가 [`CheckpointStore::apply`] 하나로 합류
//! - **자동 저장**: 적용된 변경 N건마다 디스크에 반영
//! - **관대한 로드**: 파일이 없거나 손상돼도 빈 트리로 시작 (실패하지 않음)
//! - **발견 순서 스탬프**: 공시 삽입 시 단조 증가 `seq` 부여

use std::path::PathBuf;

use whale_core::{CheckpointTree, DisclosureEntity, Filing, Holding, Manager};

/// 적용된 변경 N건마다 자동 저장
pub const AUTOSAVE_EVERY: u64 = 10;

/// 엔티티 적용 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// 트리에 삽입되거나 갱신됨
    Inserted,
    /// 이미 존재하거나 부모가 없어 건너뜀
    Skipped,
}

/// 파일 기반 체크포인트 저장소.
///
/// 단일 인스턴스가 트리를 소유하고, 수집 단계와 분석기는 이를 빌려
/// 사용합니다. 쓰기 경로가 하나뿐이므로 동시 수정 문제가 없습니다.
#[derive(Debug)]
pub struct CheckpointStore {
    /// 체크포인트 파일 경로
    path: PathBuf,
    /// 기관 → 공시 → 보유 종목 트리
    tree: CheckpointTree,
    /// 적용된 변경 수 (자동 저장 주기 판단용)
    writes: u64,
    /// 다음 공시에 부여할 발견 순서 스탬프
    next_seq: u64,
}

impl CheckpointStore {
    /// 파일에서 체크포인트를 로드합니다.
    ///
    /// 파일이 없으면 빈 트리로 시작합니다. 읽기나 파싱에 실패해도
    /// 경고만 남기고 빈 트리로 시작합니다. 어떤 경우에도 프로세스를
    /// 중단시키지 않습니다.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let tree: CheckpointTree = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(tree) => tree,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "체크포인트 파싱 실패, 빈 트리로 시작"
                    );
                    CheckpointTree::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "체크포인트 파일 없음, 빈 트리로 시작");
                CheckpointTree::new()
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "체크포인트 읽기 실패, 빈 트리로 시작"
                );
                CheckpointTree::new()
            }
        };

        // 기존 공시의 최대 스탬프 다음부터 이어서 부여
        let next_seq = tree
            .values()
            .flat_map(|manager| manager.filings.values())
            .map(|filing| filing.seq + 1)
            .max()
            .unwrap_or(0);

        tracing::info!(
            path = %path.display(),
            managers = tree.len(),
            next_seq = next_seq,
            "체크포인트 로드 완료"
        );

        Self {
            path,
            tree,
            writes: 0,
            next_seq,
        }
    }

    /// 기관이 이미 발견되었는지 확인합니다.
    pub fn contains(&self, manager_id: &str) -> bool {
        self.tree.contains_key(manager_id)
    }

    /// 기관을 조회합니다.
    pub fn get(&self, manager_id: &str) -> Option<&Manager> {
        self.tree.get(manager_id)
    }

    /// 트리의 읽기 전용 뷰를 반환합니다.
    pub fn tree(&self) -> &CheckpointTree {
        &self.tree
    }

    /// 발견된 기관 수를 반환합니다.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// 트리가 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// 엔티티를 트리에 병합합니다.
    ///
    /// - **기관**: 이미 존재하면 건너뜀 (멱등). 없으면 빈 공시 목록의 스텁 삽입.
    /// - **공시**: 부모 기관이 없으면 건너뜀. 이미 존재하면 덮어쓰지 않고
    ///   건너뜀. 없으면 발견 순서 스탬프를 부여해 스텁 삽입.
    /// - **보유 종목**: 부모 기관/공시가 없으면 건너뜀. 심볼 키로 삽입하거나
    ///   덮어씀 (재수집 시 최신 값 유지).
    ///
    /// 적용된 변경은 [`AUTOSAVE_EVERY`]건마다 자동 저장을 트리거합니다.
    pub fn apply(&mut self, entity: DisclosureEntity) -> Applied {
        let applied = match entity {
            DisclosureEntity::Manager(record) => {
                if self.tree.contains_key(&record.id) {
                    tracing::debug!(manager_id = %record.id, "이미 발견된 기관, 건너뜀");
                    Applied::Skipped
                } else {
                    self.tree.insert(
                        record.id.clone(),
                        Manager::new(record.id, record.name, record.filing_url),
                    );
                    Applied::Inserted
                }
            }
            DisclosureEntity::Filing(record) => match self.tree.get_mut(&record.manager_id) {
                None => {
                    tracing::warn!(
                        manager_id = %record.manager_id,
                        filing_id = %record.filing_id,
                        "부모 기관이 없는 공시, 건너뜀"
                    );
                    Applied::Skipped
                }
                Some(manager) => {
                    if manager.filings.contains_key(&record.filing_id) {
                        tracing::debug!(filing_id = %record.filing_id, "이미 수집된 공시, 건너뜀");
                        Applied::Skipped
                    } else {
                        let seq = self.next_seq;
                        self.next_seq += 1;
                        manager.filings.insert(
                            record.filing_id.clone(),
                            Filing::new(
                                record.filing_id,
                                record.quarter,
                                record.filing_url,
                                record.filing_date,
                                seq,
                            ),
                        );
                        Applied::Inserted
                    }
                }
            },
            DisclosureEntity::Holding(record) => {
                let filing = self
                    .tree
                    .get_mut(&record.manager_id)
                    .and_then(|manager| manager.filings.get_mut(&record.filing_id));

                match filing {
                    None => {
                        tracing::warn!(
                            manager_id = %record.manager_id,
                            filing_id = %record.filing_id,
                            symbol = %record.symbol,
                            "부모 공시가 없는 보유 종목, 건너뜀"
                        );
                        Applied::Skipped
                    }
                    Some(filing) => {
                        filing.holdings.insert(
                            record.symbol,
                            Holding::new(record.shares, record.value, record.class),
                        );
                        Applied::Inserted
                    }
                }
            }
        };

        if applied == Applied::Inserted {
            self.writes += 1;
            if self.writes % AUTOSAVE_EVERY == 0 {
                self.save();
            }
        }

        applied
    }

    /// 트리를 디스크에 저장합니다.
    ///
    /// 출력 디렉토리가 없으면 생성합니다. 쓰기 오류는 경고만 남기고
    /// 흡수합니다. 메모리의 트리가 항상 기준이고, 실패한 저장은 다음
    /// 자동 저장 주기에 다시 시도됩니다.
    pub fn save(&self) {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %e,
                        "체크포인트 디렉토리 생성 실패"
                    );
                    return;
                }
            }
        }

        match serde_json::to_string_pretty(&self.tree) {
            Ok(json) => match std::fs::write(&self.path, json) {
                Ok(_) => {
                    tracing::debug!(
                        path = %self.path.display(),
                        managers = self.tree.len(),
                        "체크포인트 저장 완료"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %e,
                        "체크포인트 저장 실패"
                    );
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "체크포인트 직렬화 실패");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use whale_core::{FilingRecord, HoldingRecord, ManagerRecord};

    fn manager_record(id: &str) -> ManagerRecord {
        ManagerRecord {
            id: id.to_string(),
            name: format!("Fund {}", id),
            filing_url: format!("/manager/{}-fund", id),
        }
    }

    fn filing_record(manager_id: &str, filing_id: &str) -> FilingRecord {
        FilingRecord {
            manager_id: manager_id.to_string(),
            filing_id: filing_id.to_string(),
            quarter: "Q2 2024".to_string(),
            filing_url: format!("/13f/{}", filing_id),
            filing_date: "2024-08-14".to_string(),
            holdings_count: "41".to_string(),
            value: "279,969,062".to_string(),
            top_holdings: "AAPL, BAC".to_string(),
        }
    }

    fn holding_record(
        manager_id: &str,
        filing_id: &str,
        symbol: &str,
        shares: &str,
    ) -> HoldingRecord {
        HoldingRecord {
            manager_id: manager_id.to_string(),
            filing_id: filing_id.to_string(),
            symbol: symbol.to_string(),
            issuer: "ISSUER".to_string(),
            class: "COM".to_string(),
            cusip: "000000000".to_string(),
            value: "1000".to_string(),
            percentage: "1.0".to_string(),
            shares: shares.to_string(),
            principal: "SH".to_string(),
            option: String::new(),
        }
    }

    #[test]
    fn test_manager_apply_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CheckpointStore::load(dir.path().join("cp.json"));

        assert_eq!(
            store.apply(DisclosureEntity::Manager(manager_record("m1"))),
            Applied::Inserted
        );
        assert_eq!(
            store.apply(DisclosureEntity::Manager(manager_record("m1"))),
            Applied::Skipped
        );
        assert_eq!(store.len(), 1);
        assert!(store.contains("m1"));
    }

    #[test]
    fn test_filing_requires_parent_and_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CheckpointStore::load(dir.path().join("cp.json"));

        // Parent manager missing: skipped
        assert_eq!(
            store.apply(DisclosureEntity::Filing(filing_record("m1", "f1"))),
            Applied::Skipped
        );

        store.apply(DisclosureEntity::Manager(manager_record("m1")));
        assert_eq!(
            store.apply(DisclosureEntity::Filing(filing_record("m1", "f1"))),
            Applied::Inserted
        );

        // Re-applying the same filing keeps the original entry
        let mut changed = filing_record("m1", "f1");
        changed.quarter = "Q4 1999".to_string();
        assert_eq!(
            store.apply(DisclosureEntity::Filing(changed)),
            Applied::Skipped
        );
        let filing = &store.get("m1").unwrap().filings["f1"];
        assert_eq!(filing.quarter, "Q2 2024");
    }

    #[test]
    fn test_holding_requires_parents_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CheckpointStore::load(dir.path().join("cp.json"));

        assert_eq!(
            store.apply(DisclosureEntity::Holding(holding_record(
                "m1", "f1", "AAPL", "100"
            ))),
            Applied::Skipped
        );

        store.apply(DisclosureEntity::Manager(manager_record("m1")));
        store.apply(DisclosureEntity::Filing(filing_record("m1", "f1")));

        assert_eq!(
            store.apply(DisclosureEntity::Holding(holding_record(
                "m1", "f1", "AAPL", "100"
            ))),
            Applied::Inserted
        );

        // Holdings are overwritten on re-collection
        assert_eq!(
            store.apply(DisclosureEntity::Holding(holding_record(
                "m1", "f1", "AAPL", "120"
            ))),
            Applied::Inserted
        );
        let filing = &store.get("m1").unwrap().filings["f1"];
        assert_eq!(filing.holdings["AAPL"].shares, "120");
    }

    #[test]
    fn test_seq_follows_discovery_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CheckpointStore::load(dir.path().join("cp.json"));

        store.apply(DisclosureEntity::Manager(manager_record("m1")));
        store.apply(DisclosureEntity::Manager(manager_record("m2")));
        store.apply(DisclosureEntity::Filing(filing_record("m1", "f1")));
        store.apply(DisclosureEntity::Filing(filing_record("m1", "f2")));
        store.apply(DisclosureEntity::Filing(filing_record("m2", "f3")));

        assert_eq!(store.get("m1").unwrap().filings["f1"].seq, 0);
        assert_eq!(store.get("m1").unwrap().filings["f2"].seq, 1);
        assert_eq!(store.get("m2").unwrap().filings["f3"].seq, 2);
    }

    #[test]
    fn test_roundtrip_restores_tree_and_continues_seq() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cp.json");

        let mut store = CheckpointStore::load(&path);
        store.apply(DisclosureEntity::Manager(manager_record("m1")));
        store.apply(DisclosureEntity::Filing(filing_record("m1", "f1")));
        store.apply(DisclosureEntity::Filing(filing_record("m1", "f2")));
        store.apply(DisclosureEntity::Holding(holding_record(
            "m1", "f1", "AAPL", "100",
        )));
        store.save();

        let mut restored = CheckpointStore::load(&path);
        assert_eq!(restored.tree(), store.tree());

        // The stamp continues after the highest loaded value
        restored.apply(DisclosureEntity::Filing(filing_record("m1", "f9")));
        assert_eq!(restored.get("m1").unwrap().filings["f9"].seq, 2);
    }

    #[test]
    fn test_malformed_checkpoint_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cp.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = CheckpointStore::load(&path);

        assert!(store.is_empty());
    }

    #[test]
    fn test_autosave_after_every_tenth_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cp.json");

        let mut store = CheckpointStore::load(&path);
        for i in 0..9 {
            store.apply(DisclosureEntity::Manager(manager_record(&format!(
                "m{}",
                i
            ))));
        }
        assert!(!path.exists());

        store.apply(DisclosureEntity::Manager(manager_record("m9")));
        assert!(path.exists());

        let restored = CheckpointStore::load(&path);
        assert_eq!(restored.len(), 10);
    }

    #[test]
    fn test_skipped_entities_do_not_count_as_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cp.json");

        let mut store = CheckpointStore::load(&path);
        store.apply(DisclosureEntity::Manager(manager_record("m1")));
        for _ in 0..20 {
            store.apply(DisclosureEntity::Manager(manager_record("m1")));
        }

        // Only one applied write so far: no autosave yet
        assert!(!path.exists());
    }
}

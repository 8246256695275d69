//! End-to-end integration tests for the staged collection pipeline.
//!
//! These tests drive the real stages and checkpoint store against a
//! scripted in-memory disclosure source:
//! 1. Discover managers from the fixed index prefixes
//! 2. Sync 13F-HR filings for managers without filings
//! 3. Collect holdings for filings without holdings
//! 4. Diff the two most recent filings and write the CSV report

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use whale_collector::config::{CollectorConfig, DaemonConfig, FetchConfig, FilingSyncConfig};
use whale_collector::modules::{self, CheckpointStore};
use whale_core::{FilingRecord, HoldingRecord, ManagerRecord};
use whale_data::{DataError, DisclosureSource};

/// In-memory disclosure source with scripted responses.
struct ScriptedSource {
    /// prefix -> manager records
    managers: HashMap<String, Vec<ManagerRecord>>,
    /// manager_id -> filing records (listing order, newest first)
    filings: HashMap<String, Vec<FilingRecord>>,
    /// filing_id -> holding records
    holdings: HashMap<String, Vec<HoldingRecord>>,
    /// filing ids whose holdings fetch fails
    failing_filings: Vec<String>,
    /// when set, every index page fetch fails
    index_failure: bool,
    /// total fetch calls across all endpoints
    fetch_calls: AtomicUsize,
}

impl ScriptedSource {
    fn new() -> Self {
        Self {
            managers: HashMap::new(),
            filings: HashMap::new(),
            holdings: HashMap::new(),
            failing_filings: Vec::new(),
            index_failure: false,
            fetch_calls: AtomicUsize::new(0),
        }
    }

    fn with_manager(mut self, prefix: &str, id: &str, name: &str) -> Self {
        let slug = name.to_lowercase().replace(' ', "-");
        self.managers
            .entry(prefix.to_string())
            .or_default()
            .push(ManagerRecord {
                id: id.to_string(),
                name: name.to_string(),
                filing_url: format!("/manager/{}-{}", id, slug),
            });
        self
    }

    fn with_filing(
        mut self,
        manager_id: &str,
        filing_id: &str,
        quarter: &str,
        filing_date: &str,
    ) -> Self {
        self.filings
            .entry(manager_id.to_string())
            .or_default()
            .push(FilingRecord {
                manager_id: manager_id.to_string(),
                filing_id: filing_id.to_string(),
                quarter: quarter.to_string(),
                filing_url: format!("/13f/{}", filing_id),
                filing_date: filing_date.to_string(),
                holdings_count: "1".to_string(),
                value: "1000".to_string(),
                top_holdings: "AAPL".to_string(),
            });
        self
    }

    fn with_holding(mut self, manager_id: &str, filing_id: &str, symbol: &str, shares: &str) -> Self {
        self.holdings
            .entry(filing_id.to_string())
            .or_default()
            .push(HoldingRecord {
                manager_id: manager_id.to_string(),
                filing_id: filing_id.to_string(),
                symbol: symbol.to_string(),
                issuer: format!("{} INC", symbol),
                class: "COM".to_string(),
                cusip: "000000000".to_string(),
                value: "1000".to_string(),
                percentage: "10.0".to_string(),
                shares: shares.to_string(),
                principal: "SH".to_string(),
                option: String::new(),
            });
        self
    }

    fn with_failing_filing(mut self, filing_id: &str) -> Self {
        self.failing_filings.push(filing_id.to_string());
        self
    }

    fn with_index_failure(mut self) -> Self {
        self.index_failure = true;
        self
    }

    fn calls(&self) -> usize {
        self.fetch_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl DisclosureSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch_manager_index(
        &self,
        prefix: &str,
    ) -> whale_data::Result<Vec<ManagerRecord>> {
        self.fetch_calls.fetch_add(1, Ordering::Relaxed);
        if self.index_failure {
            return Err(DataError::Status {
                code: 503,
                url: format!("/managers/{}", prefix),
            });
        }
        Ok(self.managers.get(prefix).cloned().unwrap_or_default())
    }

    async fn fetch_filings(
        &self,
        manager_id: &str,
        _filing_url: &str,
    ) -> whale_data::Result<Vec<FilingRecord>> {
        self.fetch_calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.filings.get(manager_id).cloned().unwrap_or_default())
    }

    async fn fetch_holdings(
        &self,
        _manager_id: &str,
        filing_id: &str,
    ) -> whale_data::Result<Vec<HoldingRecord>> {
        self.fetch_calls.fetch_add(1, Ordering::Relaxed);
        if self.failing_filings.iter().any(|f| f == filing_id) {
            return Err(DataError::Parse("scripted failure".to_string()));
        }
        Ok(self.holdings.get(filing_id).cloned().unwrap_or_default())
    }
}

fn test_config(dir: &Path) -> CollectorConfig {
    CollectorConfig {
        checkpoint_path: dir.join("checkpoint.json").to_string_lossy().into_owned(),
        output_path: dir.join("report.csv").to_string_lossy().into_owned(),
        base_url: "https://13f.invalid".to_string(),
        fetch: FetchConfig {
            request_delay_ms: 0,
            concurrency: 4,
            max_retries: 0,
            randomize_delay: false,
        },
        filing_sync: FilingSyncConfig {
            max_filings_per_manager: 2,
        },
        daemon: DaemonConfig {
            interval_minutes: 360,
        },
    }
}

/// Two-quarter Berkshire-like fixture: AAPL goes 80 -> 100 shares.
fn berkshire_source() -> ScriptedSource {
    ScriptedSource::new()
        .with_manager("b", "0001067983", "BERKSHIRE HATHAWAY INC")
        .with_filing("0001067983", "f-q2", "Q2 2024", "2024-08-14")
        .with_filing("0001067983", "f-q1", "Q1 2024", "2024-05-15")
        .with_holding("0001067983", "f-q2", "AAPL", "100")
        .with_holding("0001067983", "f-q1", "AAPL", "80")
}

#[tokio::test]
async fn test_full_pipeline_produces_report() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let config = test_config(dir.path());
    let source = berkshire_source();
    let mut store = CheckpointStore::load(&config.checkpoint_path);

    // 1. Discover managers across all index prefixes
    let stats = modules::sync_managers(&source, &mut store, &config)
        .await
        .expect("manager sync failed");
    assert_eq!(stats.success, 1);
    assert_eq!(store.len(), 1);

    // 2. Sync filings: both quarters become stubs, stamped in listing order
    let stats = modules::sync_filings(&source, &mut store, &config)
        .await
        .expect("filing sync failed");
    assert_eq!(stats.success, 1);
    let manager = store.get("0001067983").expect("manager missing");
    assert_eq!(manager.filings.len(), 2);
    assert_eq!(manager.filings["f-q2"].seq, 0);
    assert_eq!(manager.filings["f-q1"].seq, 1);

    // 3. Collect holdings for both filings
    let stats = modules::collect_holdings(&source, &mut store, &config, None)
        .await
        .expect("holdings collect failed");
    assert_eq!(stats.success, 2);
    assert_eq!(stats.total_holdings, 2);

    // 4. Diff and report: Q2 vs Q1 is a 25% buy
    let deltas = whale_analytics::diff_tree(store.tree());
    assert_eq!(deltas.len(), 1);
    assert_eq!(deltas[0].symbol, "AAPL");
    assert_eq!(deltas[0].shares, 100);
    assert_eq!(deltas[0].change, 20);
    assert_eq!(deltas[0].transaction_type.as_str(), "buy");

    whale_analytics::write_report(&deltas, &config.output_path).expect("report write failed");
    let report = std::fs::read_to_string(&config.output_path).expect("report file missing");
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("fund_name,filing_date,quarter,stock_symbol"));
    assert!(lines[1].contains("BERKSHIRE HATHAWAY INC"));
    assert!(lines[1].contains(",25.00,buy"));
}

#[tokio::test]
async fn test_second_run_fetches_nothing_new() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let config = test_config(dir.path());
    let source = berkshire_source();
    let mut store = CheckpointStore::load(&config.checkpoint_path);

    modules::sync_managers(&source, &mut store, &config)
        .await
        .expect("manager sync failed");
    modules::sync_filings(&source, &mut store, &config)
        .await
        .expect("filing sync failed");
    modules::collect_holdings(&source, &mut store, &config, None)
        .await
        .expect("holdings collect failed");

    let snapshot = store.tree().clone();
    let calls_after_first = source.calls();

    // Second pass: the known manager is skipped, both frontiers are empty
    let stats = modules::sync_managers(&source, &mut store, &config)
        .await
        .expect("manager resync failed");
    assert_eq!(stats.skipped, 1);

    let stats = modules::sync_filings(&source, &mut store, &config)
        .await
        .expect("filing resync failed");
    assert_eq!(stats.total, 0);

    let stats = modules::collect_holdings(&source, &mut store, &config, None)
        .await
        .expect("holdings recollect failed");
    assert_eq!(stats.total, 0);

    // Only the index pages were fetched again
    assert_eq!(source.calls() - calls_after_first, 27);
    assert_eq!(store.tree(), &snapshot);
}

#[tokio::test]
async fn test_resume_from_persisted_checkpoint() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let config = test_config(dir.path());
    let source = berkshire_source();

    // First process: managers and filings only, then flush and drop
    {
        let mut store = CheckpointStore::load(&config.checkpoint_path);
        modules::sync_managers(&source, &mut store, &config)
            .await
            .expect("manager sync failed");
        modules::sync_filings(&source, &mut store, &config)
            .await
            .expect("filing sync failed");
        store.save();
    }

    // Second process: reload and finish holdings
    let mut store = CheckpointStore::load(&config.checkpoint_path);
    assert_eq!(store.len(), 1);
    assert!(store.contains("0001067983"));

    let frontier = modules::holdings_frontier(store.tree());
    assert_eq!(frontier.len(), 2);

    let stats = modules::collect_holdings(&source, &mut store, &config, None)
        .await
        .expect("holdings collect failed");
    assert_eq!(stats.success, 2);

    let manager = store.get("0001067983").expect("manager missing");
    assert_eq!(manager.filings["f-q2"].holdings["AAPL"].shares, "100");
    assert_eq!(manager.filings["f-q1"].holdings["AAPL"].shares, "80");
}

#[tokio::test]
async fn test_failed_filing_is_retried_on_next_run() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let config = test_config(dir.path());
    let source = berkshire_source().with_failing_filing("f-q1");
    let mut store = CheckpointStore::load(&config.checkpoint_path);

    modules::sync_managers(&source, &mut store, &config)
        .await
        .expect("manager sync failed");
    modules::sync_filings(&source, &mut store, &config)
        .await
        .expect("filing sync failed");

    // One filing fails, the other is collected
    let stats = modules::collect_holdings(&source, &mut store, &config, None)
        .await
        .expect("holdings collect failed");
    assert_eq!(stats.success, 1);
    assert_eq!(stats.errors, 1);

    let frontier = modules::holdings_frontier(store.tree());
    assert_eq!(frontier, vec![("0001067983".to_string(), "f-q1".to_string())]);

    // A later run against a healthy source fills only the gap
    let fixed = berkshire_source();
    let stats = modules::collect_holdings(&fixed, &mut store, &config, None)
        .await
        .expect("holdings recollect failed");
    assert_eq!(stats.total, 1);
    assert_eq!(stats.success, 1);
    assert!(modules::holdings_frontier(store.tree()).is_empty());
}

#[tokio::test]
async fn test_filing_cap_keeps_most_recent() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let config = test_config(dir.path());

    // Three listed quarters with a cap of two: the oldest is dropped
    let source = ScriptedSource::new()
        .with_manager("b", "m1", "BIG FUND")
        .with_filing("m1", "f-q3", "Q3 2024", "2024-11-14")
        .with_filing("m1", "f-q2", "Q2 2024", "2024-08-14")
        .with_filing("m1", "f-q1", "Q1 2024", "2024-05-15");
    let mut store = CheckpointStore::load(&config.checkpoint_path);

    modules::sync_managers(&source, &mut store, &config)
        .await
        .expect("manager sync failed");
    modules::sync_filings(&source, &mut store, &config)
        .await
        .expect("filing sync failed");

    let manager = store.get("m1").expect("manager missing");
    assert_eq!(manager.filings.len(), 2);
    assert!(manager.filings.contains_key("f-q3"));
    assert!(manager.filings.contains_key("f-q2"));
    assert!(!manager.filings.contains_key("f-q1"));
}

#[tokio::test]
async fn test_managers_filter_limits_holdings_scope() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let config = test_config(dir.path());

    let source = ScriptedSource::new()
        .with_manager("a", "m1", "ALPHA FUND")
        .with_manager("b", "m2", "BETA FUND")
        .with_filing("m1", "f-a", "Q2 2024", "2024-08-14")
        .with_filing("m2", "f-b", "Q2 2024", "2024-08-14")
        .with_holding("m1", "f-a", "AAPL", "100")
        .with_holding("m2", "f-b", "KO", "200");
    let mut store = CheckpointStore::load(&config.checkpoint_path);

    modules::sync_managers(&source, &mut store, &config)
        .await
        .expect("manager sync failed");
    modules::sync_filings(&source, &mut store, &config)
        .await
        .expect("filing sync failed");

    let stats = modules::collect_holdings(&source, &mut store, &config, Some("m1".to_string()))
        .await
        .expect("holdings collect failed");
    assert_eq!(stats.total, 1);

    // The other manager's filing is still waiting
    let frontier = modules::holdings_frontier(store.tree());
    assert_eq!(frontier, vec![("m2".to_string(), "f-b".to_string())]);
}

#[tokio::test]
async fn test_total_index_failure_is_fatal() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let config = test_config(dir.path());
    let source = ScriptedSource::new().with_index_failure();
    let mut store = CheckpointStore::load(&config.checkpoint_path);

    let result = modules::sync_managers(&source, &mut store, &config).await;

    let err = result.expect_err("total failure should escalate");
    assert!(err.to_string().contains("Data source error"));
    assert!(store.is_empty());
}

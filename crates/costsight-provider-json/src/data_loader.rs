//! Data loader module for saved Cost Explorer responses
//!
//! Every `*.json` file below the data directory is one snapshot: the body of
//! a `GetCostAndUsage` response, optionally annotated with the grouping and
//! filter it was requested with.
//!
//! ```json
//! {
//!   "GroupDefinitions": [{"Type": "DIMENSION", "Key": "SERVICE"}],
//!   "ResultsByTime": [
//!     {
//!       "TimePeriod": {"Start": "2021-01-01", "End": "2021-01-02"},
//!       "Total": {},
//!       "Groups": [
//!         {"Keys": ["Amazon Simple Storage Service"],
//!          "Metrics": {"UnblendedCost": {"Amount": "1.5", "Unit": "USD"}}}
//!       ],
//!       "Estimated": false
//!     }
//!   ]
//! }
//! ```
//!
//! Snapshots are parsed once per loader, in parallel, and then matched
//! against each query.

use async_trait::async_trait;
use costsight_core::error::{CostsightError, Result};
use costsight_core::provider::{CostDataSource, CostQuery};
use costsight_core::types::{CostFilter, DailyDate, GroupDefinition, MetricMap, RawPeriodRecord};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Environment variable overriding the data directory
pub const DATA_PATH_ENV: &str = "COSTSIGHT_DATA_PATH";

/// One saved Cost Explorer response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Snapshot {
    #[serde(skip)]
    path: PathBuf,
    #[serde(default)]
    group_definitions: Vec<GroupDefinition>,
    #[serde(default)]
    filter: Option<CostFilter>,
    #[serde(default)]
    results_by_time: Vec<RawPeriodRecord>,
}

impl Snapshot {
    fn matches(&self, query: &CostQuery) -> bool {
        self.group_definitions.as_slice() == query.group_by.as_slice()
            && self.filter == query.filter
    }
}

/// Cost data source backed by a directory of JSON snapshots
#[derive(Debug)]
pub struct DataLoader {
    data_path: PathBuf,
    show_progress: bool,
    snapshots: OnceCell<Vec<Snapshot>>,
}

impl DataLoader {
    /// Create a loader for the default data directory
    ///
    /// `COSTSIGHT_DATA_PATH` wins over the platform data directory
    /// (`<data_dir>/costsight/exports`).
    ///
    /// # Errors
    ///
    /// Returns `NoDataDirectory` if neither location exists
    pub fn new() -> Result<Self> {
        let path = Self::discover_data_path().ok_or(CostsightError::NoDataDirectory)?;
        debug!("Using billing exports from {}", path.display());
        Ok(Self::from_path(path))
    }

    /// Create a loader for an explicit directory
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: path.into(),
            show_progress: false,
            snapshots: OnceCell::new(),
        }
    }

    fn discover_data_path() -> Option<PathBuf> {
        if let Ok(custom_path) = std::env::var(DATA_PATH_ENV) {
            let path = PathBuf::from(custom_path);
            if path.is_dir() {
                return Some(path);
            }
            warn!(
                "{} points at {}, which is not a directory",
                DATA_PATH_ENV,
                path.display()
            );
        }

        dirs::data_dir()
            .map(|dir| dir.join("costsight").join("exports"))
            .filter(|path| path.is_dir())
    }

    /// Enable or disable progress bars
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Find all snapshot files, sorted by path
    ///
    /// # Errors
    ///
    /// Returns `Upstream` if the data directory does not exist
    pub async fn find_snapshot_files(&self) -> Result<Vec<PathBuf>> {
        if !self.data_path.is_dir() {
            return Err(CostsightError::Upstream(format!(
                "export directory {} does not exist",
                self.data_path.display()
            )));
        }

        let root = self.data_path.clone();
        let mut files = tokio::task::spawn_blocking(move || {
            use walkdir::WalkDir;
            WalkDir::new(root)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("json"))
                .collect::<Vec<_>>()
        })
        .await
        .map_err(|e| CostsightError::Upstream(format!("snapshot scan failed: {e}")))?;

        files.sort();
        info!("Found {} snapshot files to process", files.len());
        Ok(files)
    }

    async fn snapshots(&self) -> Result<&[Snapshot]> {
        self.snapshots
            .get_or_try_init(|| self.load_snapshots())
            .await
            .map(Vec::as_slice)
    }

    async fn load_snapshots(&self) -> Result<Vec<Snapshot>> {
        let files = self.find_snapshot_files().await?;
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let progress = if self.show_progress {
            let pb = ProgressBar::new(files.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} files")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            pb.set_message("Loading billing exports");
            Some(pb)
        } else {
            None
        };

        let progress_clone = progress.clone();
        let snapshots = tokio::task::spawn_blocking(move || {
            files
                .par_iter()
                .map(|path| {
                    let snapshot = parse_snapshot(path);
                    if let Some(ref pb) = progress_clone {
                        pb.inc(1);
                    }
                    snapshot
                })
                .collect::<Result<Vec<_>>>()
        })
        .await
        .map_err(|e| CostsightError::Upstream(format!("snapshot parsing failed: {e}")))??;

        if let Some(pb) = progress {
            pb.finish_with_message("Billing exports loaded");
        }

        debug!(
            "Parsed {} snapshots with {} periods",
            snapshots.len(),
            snapshots
                .iter()
                .map(|s| s.results_by_time.len())
                .sum::<usize>()
        );
        Ok(snapshots)
    }
}

fn parse_snapshot(path: &Path) -> Result<Snapshot> {
    let parse_error = |error: String| CostsightError::Parse {
        file: path.to_path_buf(),
        error,
    };

    let content = std::fs::read_to_string(path).map_err(|e| parse_error(e.to_string()))?;
    let mut snapshot: Snapshot =
        serde_json::from_str(&content).map_err(|e| parse_error(e.to_string()))?;
    if snapshot.group_definitions.len() > 1 {
        warn!(
            "{} groups by {} keys and cannot match any query",
            path.display(),
            snapshot.group_definitions.len()
        );
    }
    snapshot.path = path.to_path_buf();
    Ok(snapshot)
}

fn restrict_metrics(metrics: &mut MetricMap, wanted: &[String]) {
    if !wanted.is_empty() {
        metrics.retain(|name, _| wanted.iter().any(|w| w == name));
    }
}

#[async_trait]
impl CostDataSource for DataLoader {
    async fn fetch(&self, query: &CostQuery) -> Result<Vec<RawPeriodRecord>> {
        let snapshots = self.snapshots().await?;

        let mut periods: BTreeMap<DailyDate, (&Path, RawPeriodRecord)> = BTreeMap::new();
        for snapshot in snapshots.iter().filter(|s| s.matches(query)) {
            for record in &snapshot.results_by_time {
                if !query.covers(record.start()) {
                    continue;
                }
                if let Some((first, _)) = periods.get(&record.start()) {
                    warn!(
                        "Period {} appears in both {} and {}, keeping the first",
                        record.start(),
                        first.display(),
                        snapshot.path.display()
                    );
                    continue;
                }

                let mut record = record.clone();
                restrict_metrics(&mut record.total, &query.metrics);
                for group in &mut record.groups {
                    restrict_metrics(&mut group.metrics, &query.metrics);
                }
                periods.insert(record.start(), (snapshot.path.as_path(), record));
            }
        }

        debug!(
            "Matched {} periods for {}..{} ({})",
            periods.len(),
            query.start,
            query.end,
            query
                .group_by
                .as_ref()
                .map_or_else(|| "ungrouped".to_string(), |g| g.to_string())
        );
        Ok(periods.into_values().map(|(_, record)| record).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ENV_MUTEX, EnvVarGuard};
    use costsight_core::types::{DIMENSION_LINKED_ACCOUNT, DIMENSION_SERVICE};
    use tempfile::TempDir;

    fn date(s: &str) -> DailyDate {
        DailyDate::parse(s).unwrap()
    }

    const UNGROUPED: &str = r#"{
        "ResultsByTime": [
            {"TimePeriod": {"Start": "2021-01-02", "End": "2021-01-03"},
             "Total": {"UnblendedCost": {"Amount": "20", "Unit": "USD"},
                       "NetAmortizedCost": {"Amount": "18", "Unit": "USD"}}},
            {"TimePeriod": {"Start": "2021-01-01", "End": "2021-01-02"},
             "Total": {"UnblendedCost": {"Amount": "10", "Unit": "USD"},
                       "NetAmortizedCost": {"Amount": "9", "Unit": "USD"}}},
            {"TimePeriod": {"Start": "2021-01-03", "End": "2021-01-04"},
             "Total": {"UnblendedCost": {"Amount": "30", "Unit": "USD"}}}
        ]
    }"#;

    const BY_SERVICE: &str = r#"{
        "GroupDefinitions": [{"Type": "DIMENSION", "Key": "SERVICE"}],
        "ResultsByTime": [
            {"TimePeriod": {"Start": "2021-01-01", "End": "2021-01-02"},
             "Groups": [
                {"Keys": ["Amazon Elastic Compute Cloud - Compute"],
                 "Metrics": {"UnblendedCost": {"Amount": "7", "Unit": "USD"}}},
                {"Keys": ["Amazon Simple Storage Service"],
                 "Metrics": {"UnblendedCost": {"Amount": "3", "Unit": "USD"}}}
             ]}
        ]
    }"#;

    async fn write_exports(files: &[(&str, &str)]) -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        for (name, content) in files {
            let path = temp_dir.path().join(name);
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await.unwrap();
            }
            tokio::fs::write(path, content).await.unwrap();
        }
        temp_dir
    }

    #[tokio::test]
    async fn test_find_snapshot_files() {
        let temp_dir = write_exports(&[
            ("b.json", "{}"),
            ("nested/a.json", "{}"),
            ("notes.txt", ""),
        ])
        .await;

        let loader = DataLoader::from_path(temp_dir.path());
        let files = loader.find_snapshot_files().await.unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.extension().unwrap() == "json"));
    }

    #[tokio::test]
    async fn test_fetch_ungrouped_sorted_and_windowed() {
        let temp_dir = write_exports(&[("daily.json", UNGROUPED), ("service.json", BY_SERVICE)]).await;
        let loader = DataLoader::from_path(temp_dir.path());

        let query = CostQuery::new(date("2021-01-01"), date("2021-01-03"));
        let periods = loader.fetch(&query).await.unwrap();

        let starts: Vec<_> = periods.iter().map(|p| p.start().to_string()).collect();
        assert_eq!(starts, vec!["2021-01-01", "2021-01-02"]);
        assert!(periods.iter().all(|p| p.groups.is_empty()));
    }

    #[tokio::test]
    async fn test_fetch_grouped_matches_definition() {
        let temp_dir = write_exports(&[("daily.json", UNGROUPED), ("service.json", BY_SERVICE)]).await;
        let loader = DataLoader::from_path(temp_dir.path());

        let query = CostQuery::new(date("2021-01-01"), date("2021-02-01"))
            .with_group_by(GroupDefinition::dimension(DIMENSION_SERVICE));
        let periods = loader.fetch(&query).await.unwrap();
        assert_eq!(periods.len(), 1);
        assert_eq!(periods[0].groups.len(), 2);

        let by_account = CostQuery::new(date("2021-01-01"), date("2021-02-01"))
            .with_group_by(GroupDefinition::dimension(DIMENSION_LINKED_ACCOUNT));
        assert!(loader.fetch(&by_account).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_restricts_metrics() {
        let temp_dir = write_exports(&[("daily.json", UNGROUPED)]).await;
        let loader = DataLoader::from_path(temp_dir.path());

        let query = CostQuery::new(date("2021-01-01"), date("2021-01-02"))
            .with_metrics(vec!["NetAmortizedCost".to_string()]);
        let periods = loader.fetch(&query).await.unwrap();
        assert_eq!(periods[0].metric_amount("NetAmortizedCost"), Some("9"));
        assert_eq!(periods[0].metric_amount("UnblendedCost"), None);
    }

    #[tokio::test]
    async fn test_fetch_filtered_snapshot() {
        let filtered = r#"{
            "GroupDefinitions": [{"Type": "TAG", "Key": "Product"}],
            "Filter": {"Dimensions": {"Key": "SERVICE", "Values": ["Amazon Simple Storage Service"]}},
            "ResultsByTime": [
                {"TimePeriod": {"Start": "2021-01-01", "End": "2021-01-02"},
                 "Groups": [{"Keys": ["Product$api"],
                             "Metrics": {"UnblendedCost": {"Amount": "2", "Unit": "USD"}}}]}
            ]
        }"#;
        let temp_dir = write_exports(&[("s3.json", filtered)]).await;
        let loader = DataLoader::from_path(temp_dir.path());

        let base = CostQuery::new(date("2021-01-01"), date("2021-01-02"))
            .with_group_by(GroupDefinition::tag("Product"));
        assert!(loader.fetch(&base).await.unwrap().is_empty());

        let query = base.with_filter(CostFilter::dimension(
            DIMENSION_SERVICE,
            vec!["Amazon Simple Storage Service".to_string()],
        ));
        let periods = loader.fetch(&query).await.unwrap();
        assert_eq!(periods[0].groups[0].key(), Some("Product$api"));
    }

    #[tokio::test]
    async fn test_duplicate_periods_keep_first_file() {
        let later = r#"{"ResultsByTime": [
            {"TimePeriod": {"Start": "2021-01-01", "End": "2021-01-02"},
             "Total": {"UnblendedCost": {"Amount": "999", "Unit": "USD"}}}
        ]}"#;
        let temp_dir = write_exports(&[("a.json", UNGROUPED), ("b.json", later)]).await;
        let loader = DataLoader::from_path(temp_dir.path());

        let query = CostQuery::new(date("2021-01-01"), date("2021-01-02"));
        let periods = loader.fetch(&query).await.unwrap();
        assert_eq!(periods.len(), 1);
        assert_eq!(periods[0].metric_amount("UnblendedCost"), Some("10"));
    }

    #[tokio::test]
    async fn test_invalid_snapshot_reports_file() {
        let temp_dir = write_exports(&[("broken.json", "{\"ResultsByTime\": [")]).await;
        let loader = DataLoader::from_path(temp_dir.path());

        let err = loader
            .fetch(&CostQuery::new(date("2021-01-01"), date("2021-01-02")))
            .await
            .unwrap_err();
        match err {
            CostsightError::Parse { file, .. } => assert!(file.ends_with("broken.json")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_empty_directory_yields_no_periods() {
        let temp_dir = TempDir::new().unwrap();
        let loader = DataLoader::from_path(temp_dir.path()).with_progress(true);
        let periods = loader
            .fetch(&CostQuery::new(date("2021-01-01"), date("2021-01-02")))
            .await
            .unwrap();
        assert!(periods.is_empty());
    }

    #[tokio::test]
    async fn test_missing_directory_is_a_source_failure() {
        let temp_dir = TempDir::new().unwrap();
        let loader = DataLoader::from_path(temp_dir.path().join("gone"));
        let err = loader
            .fetch(&CostQuery::new(date("2021-01-01"), date("2021-01-02")))
            .await
            .unwrap_err();
        assert!(matches!(err, CostsightError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_discover_data_path_with_env_override() {
        let _lock = ENV_MUTEX.lock().await;

        let temp_dir = TempDir::new().unwrap();
        let _env = EnvVarGuard::set(DATA_PATH_ENV, temp_dir.path().to_str().unwrap());

        let loader = DataLoader::new().unwrap();
        assert_eq!(loader.data_path(), temp_dir.path());
    }

    #[tokio::test]
    async fn test_env_override_must_be_a_directory() {
        let _lock = ENV_MUTEX.lock().await;

        let _env = EnvVarGuard::set(DATA_PATH_ENV, "/nonexistent/costsight/exports");

        let discovered = DataLoader::discover_data_path();
        assert_ne!(
            discovered.as_deref(),
            Some(Path::new("/nonexistent/costsight/exports"))
        );
    }
}

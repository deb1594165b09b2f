use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::core::MatchRun;
use crate::models::{MatchConfig, ScoredProperty};

/// A completed matching run together with its projected output rows
#[derive(Debug, Clone)]
pub struct ScoredRun {
    pub run_id: String,
    pub config: MatchConfig,
    pub run: MatchRun,
    /// Rows in output order
    pub rows: Vec<ScoredProperty>,
}

impl ScoredRun {
    pub fn new(config: MatchConfig, run: MatchRun, rows: Vec<ScoredProperty>) -> Self {
        Self {
            run_id: CacheKey::run(&config),
            config,
            run,
            rows,
        }
    }
}

/// In-memory cache of scored runs
///
/// The catalogs never change while the process runs, so a run is fully
/// determined by its configuration and is cached under a key derived from it.
pub struct RunCache {
    runs: moka::future::Cache<String, Arc<ScoredRun>>,
    latest: RwLock<Option<String>>,
}

impl RunCache {
    pub fn new(max_runs: u64, ttl_secs: u64) -> Self {
        let runs = moka::future::CacheBuilder::new(max_runs)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self {
            runs,
            latest: RwLock::new(None),
        }
    }

    /// Look up a run by id
    pub async fn get(&self, run_id: &str) -> Option<Arc<ScoredRun>> {
        let run = self.runs.get(run_id).await;
        if run.is_some() {
            tracing::trace!("Run cache hit: {}", run_id);
        } else {
            tracing::trace!("Run cache miss: {}", run_id);
        }
        run
    }

    /// Look up the run for a configuration
    pub async fn get_for(&self, config: &MatchConfig) -> Option<Arc<ScoredRun>> {
        self.get(&CacheKey::run(config)).await
    }

    /// Store a run and make it the latest one
    pub async fn insert(&self, run: ScoredRun) -> Arc<ScoredRun> {
        let run = Arc::new(run);
        self.runs.insert(run.run_id.clone(), Arc::clone(&run)).await;
        *self.latest.write().await = Some(run.run_id.clone());

        tracing::debug!("Cached run {} ({} rows)", run.run_id, run.rows.len());
        run
    }

    /// Make an already cached run the latest one
    pub async fn mark_latest(&self, run_id: &str) {
        *self.latest.write().await = Some(run_id.to_string());
    }

    /// The most recently stored run, if it is still cached
    pub async fn latest(&self) -> Option<Arc<ScoredRun>> {
        let run_id = self.latest.read().await.clone()?;
        self.get(&run_id).await
    }

    pub fn entry_count(&self) -> u64 {
        self.runs.entry_count()
    }
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Build the key for a run from the exact bits of its parameters
    pub fn run(config: &MatchConfig) -> String {
        format!(
            "run-{:016x}-{:016x}-{:016x}-{:016x}",
            config.min_hail_size_in.to_bits(),
            config.base_radius_mi.to_bits(),
            config.radius_per_inch_mi.to_bits(),
            config.max_radius_mi.to_bits()
        )
    }
}

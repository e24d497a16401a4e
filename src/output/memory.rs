//! In-memory sink, useful for embedding the engine and for tests

use crate::output::ResultSink;
use crate::types::RunResults;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;

#[derive(Default)]
pub struct MemorySink {
    results: Mutex<HashMap<String, RunResults>>,
    prepared: Mutex<HashSet<String>>,
    rejected: HashSet<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `prepare` fail for `seed`, as an unwritable location would
    pub fn reject(mut self, seed: &str) -> Self {
        self.rejected.insert(seed.to_string());
        self
    }

    /// Pre-load results so the seed counts as already done
    pub async fn insert(&self, results: RunResults) {
        self.results.lock().await.insert(results.seed.clone(), results);
    }

    pub async fn get(&self, seed: &str) -> Option<RunResults> {
        self.results.lock().await.get(seed).cloned()
    }

    pub async fn len(&self) -> usize {
        self.results.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.results.lock().await.is_empty()
    }

    pub async fn was_prepared(&self, seed: &str) -> bool {
        self.prepared.lock().await.contains(seed)
    }
}

#[async_trait]
impl ResultSink for MemorySink {
    async fn prepare(&self, seed: &str) -> anyhow::Result<()> {
        if self.rejected.contains(seed) {
            anyhow::bail!("Location for {} is not writable", seed);
        }
        self.prepared.lock().await.insert(seed.to_string());
        Ok(())
    }

    async fn is_done(&self, seed: &str) -> bool {
        self.results
            .lock()
            .await
            .get(seed)
            .is_some_and(|r| !r.subdomains.is_empty())
    }

    async fn persist(&self, results: &RunResults) -> anyhow::Result<()> {
        self.insert(results.clone()).await;
        Ok(())
    }
}

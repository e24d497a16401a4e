// src/ct_search/dispatcher.rs
use anyhow::{Context, Result};
use futures_util::future::join_all;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error, info};

use super::enumerator::Enumerator;
use crate::config::EnumConfig;
use crate::output::ResultSink;
use crate::progress::ProgressIndicator;
use crate::stats::StatsCollector;
use crate::types::{DomainReport, RunStatus};

/// Runs one enumeration per seed domain with a bounded number of workers
#[derive(Clone)]
pub struct Dispatcher {
    enumerator: Arc<Enumerator>,
    sink: Arc<dyn ResultSink>,
    workers: usize,
    skip_done: bool,
    stats: StatsCollector,
    progress: ProgressIndicator,
}

impl Dispatcher {
    pub fn new(
        enumerator: Arc<Enumerator>,
        sink: Arc<dyn ResultSink>,
        config: &EnumConfig,
        stats: StatsCollector,
        progress: ProgressIndicator,
    ) -> Self {
        Self {
            enumerator,
            sink,
            workers: config.workers,
            skip_done: config.skip_done,
            stats,
            progress,
        }
    }

    /// Process every seed and return one report per seed, in input order.
    ///
    /// A failing seed never stops the others.
    pub async fn run(&self, seeds: Vec<String>) -> Vec<DomainReport> {
        let total = seeds.len();

        if self.workers <= 1 || total <= 1 {
            let mut reports = Vec::with_capacity(total);
            for (index, seed) in seeds.into_iter().enumerate() {
                reports.push(self.process_domain(index, seed).await);
            }
            return reports;
        }

        let pool_size = self.workers.min(total);
        info!("Using {} workers for {} domains", pool_size, total);

        // Pre-fill the queue so workers only ever drain it
        let (seed_tx, seed_rx) = mpsc::channel(total);
        for item in seeds.iter().cloned().enumerate() {
            if seed_tx.send(item).await.is_err() {
                break;
            }
        }
        drop(seed_tx);

        let seed_rx = Arc::new(Mutex::new(seed_rx));
        let (report_tx, mut report_rx) = mpsc::unbounded_channel();

        let mut handles = Vec::with_capacity(pool_size);
        for worker_id in 0..pool_size {
            let dispatcher = self.clone();
            let seed_rx = Arc::clone(&seed_rx);
            let report_tx = report_tx.clone();

            handles.push(tokio::spawn(async move {
                loop {
                    let next = seed_rx.lock().await.recv().await;
                    let Some((index, seed)) = next else {
                        break;
                    };

                    let report = dispatcher.process_domain(index, seed).await;
                    if report_tx.send(report).is_err() {
                        break;
                    }
                }
                debug!("Worker {} finished", worker_id);
            }));
        }

        // Drop original sender so the channel closes when all workers finish
        drop(report_tx);

        for result in join_all(handles).await {
            if let Err(e) = result {
                error!("Worker task failed: {}", e);
            }
        }

        let mut slots: Vec<Option<DomainReport>> = (0..total).map(|_| None).collect();
        while let Some(report) = report_rx.recv().await {
            let index = report.index;
            slots[index] = Some(report);
        }

        // A worker that panicked mid-seed never reported it
        slots
            .into_iter()
            .zip(seeds)
            .enumerate()
            .map(|(index, (slot, seed))| {
                slot.unwrap_or_else(|| {
                    error!("No result for {}: its worker stopped unexpectedly", seed);
                    self.stats.increment_domain_failures();
                    DomainReport {
                        index,
                        seed,
                        status: RunStatus::Failed("worker stopped before finishing".to_string()),
                    }
                })
            })
            .collect()
    }

    async fn process_domain(&self, index: usize, seed: String) -> DomainReport {
        info!("Processing {}", seed);

        let status = match self.execute(&seed).await {
            Ok(status) => status,
            Err(e) => {
                error!("Error processing {}: {:#}", seed, e);
                self.stats.increment_domain_failures();
                RunStatus::Failed(format!("{:#}", e))
            }
        };

        self.progress
            .set_message(format!("{} | last: {}", self.stats.format_stats(), seed));

        DomainReport {
            index,
            seed,
            status,
        }
    }

    async fn execute(&self, seed: &str) -> Result<RunStatus> {
        self.sink
            .prepare(seed)
            .await
            .with_context(|| format!("Failed to prepare output for {}", seed))?;

        if self.skip_done && self.sink.is_done(seed).await {
            info!("Skipping {} (results already exist)", seed);
            self.stats.increment_skipped();
            return Ok(RunStatus::Skipped);
        }

        let results = self.enumerator.run(seed).await;

        // Persist whatever was gathered, even if parts of the tree failed
        self.sink
            .persist(&results)
            .await
            .with_context(|| format!("Failed to write results for {}", seed))?;

        self.stats.increment_completed();
        info!(
            "Done {}: {} subdomains, {} wildcard roots",
            seed,
            results.subdomains.len(),
            results.wildcard_roots.len()
        );

        Ok(RunStatus::Completed {
            subdomains: results.subdomains.len(),
            wildcard_roots: results.wildcard_roots.len(),
            queries: results.queried,
        })
    }
}

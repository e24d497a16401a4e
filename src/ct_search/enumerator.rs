// src/ct_search/enumerator.rs
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::CertSource;
use super::classify::classify;
use crate::stats::StatsCollector;
use crate::types::RunResults;

/// Breadth-first expansion of one seed domain.
///
/// Every wildcard root found in a response is queued for its own query unless
/// it has already been queried in this run. Each hostname is queried at most
/// once, so cyclic upstream data still terminates.
pub struct Enumerator {
    source: Arc<dyn CertSource>,
    max_queries: Option<usize>,
    stats: StatsCollector,
}

impl Enumerator {
    pub fn new(
        source: Arc<dyn CertSource>,
        max_queries: Option<usize>,
        stats: StatsCollector,
    ) -> Self {
        Self {
            source,
            max_queries,
            stats,
        }
    }

    /// Enumerate `seed` until no unvisited wildcard roots remain
    pub async fn run(&self, seed: &str) -> RunResults {
        let mut results = RunResults::new(seed);
        let mut pending = VecDeque::from([seed.to_string()]);
        let mut visited: HashSet<String> = HashSet::new();

        while let Some(current) = pending.pop_front() {
            if visited.contains(&current) {
                continue;
            }

            if let Some(limit) = self.max_queries {
                if visited.len() >= limit {
                    warn!(
                        "{}: query limit of {} reached, {} hostnames left unexpanded",
                        seed,
                        limit,
                        pending.len() + 1
                    );
                    results.truncated = true;
                    break;
                }
            }

            visited.insert(current.clone());
            info!("Querying CT logs for *.{}", current);

            let body = match self.source.fetch(&current).await {
                Ok(body) => body,
                Err(e) => {
                    warn!("Giving up on {}: {:#}", current, e);
                    self.stats.increment_abandoned();
                    results.abandoned += 1;
                    continue;
                }
            };

            let found = match classify(&body) {
                Ok(found) => found,
                Err(e) => {
                    warn!("Invalid response for {} (skipping): {:#}", current, e);
                    self.stats.increment_abandoned();
                    results.abandoned += 1;
                    continue;
                }
            };

            if found.is_empty() {
                debug!("No results for {}", current);
                continue;
            }

            debug!(
                "{}: {} names, {} wildcard roots",
                current,
                found.subdomains.len(),
                found.wildcard_roots.len()
            );

            results.subdomains.extend(found.subdomains);

            for root in found.wildcard_roots {
                if !visited.contains(&root) {
                    pending.push_back(root.clone());
                }
                results.wildcard_roots.insert(root);
            }
        }

        results.queried = visited.len();
        results
    }
}

//! One directory per seed domain holding `subs.txt` and `wildcards_clean.txt`

use crate::output::{ResultSink, render_lines};
use crate::types::RunResults;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tracing::debug;

pub const SUBDOMAINS_FILE: &str = "subs.txt";
pub const WILDCARDS_FILE: &str = "wildcards_clean.txt";

/// Distinguishes temp files of writes racing on the same target
static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory for `seed`, rejecting anything that is not a plain name
    pub fn domain_dir(&self, seed: &str) -> Result<PathBuf> {
        let mut components = Path::new(seed).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) if name == seed => Ok(self.root.join(seed)),
            _ => anyhow::bail!("'{}' cannot be used as an output directory name", seed),
        }
    }

    /// Write to a uniquely named temporary sibling, then rename into place
    async fn write_atomic(path: &Path, contents: String) -> Result<()> {
        let seq = WRITE_SEQ.fetch_add(1, Ordering::Relaxed);
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .with_context(|| format!("Invalid output path {:?}", path))?;
        let temp_path =
            path.with_file_name(format!(".{}.{}.{}.tmp", file_name, std::process::id(), seq));

        fs::write(&temp_path, contents)
            .await
            .with_context(|| format!("Failed to write {:?}", temp_path))?;

        fs::rename(&temp_path, path)
            .await
            .with_context(|| format!("Failed to rename {:?} to {:?}", temp_path, path))?;

        Ok(())
    }
}

#[async_trait]
impl ResultSink for DirectorySink {
    async fn prepare(&self, seed: &str) -> Result<()> {
        let dir = self.domain_dir(seed)?;
        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create directory {:?}", dir))?;
        Ok(())
    }

    async fn is_done(&self, seed: &str) -> bool {
        let Ok(dir) = self.domain_dir(seed) else {
            return false;
        };

        match fs::metadata(dir.join(SUBDOMAINS_FILE)).await {
            Ok(meta) => meta.is_file() && meta.len() > 0,
            Err(_) => false,
        }
    }

    async fn persist(&self, results: &RunResults) -> Result<()> {
        let dir = self.domain_dir(&results.seed)?;

        Self::write_atomic(&dir.join(SUBDOMAINS_FILE), render_lines(&results.subdomains)).await?;
        Self::write_atomic(&dir.join(WILDCARDS_FILE), render_lines(&results.wildcard_roots))
            .await?;

        debug!(
            "Wrote {} subdomains and {} wildcard roots to {:?}",
            results.subdomains.len(),
            results.wildcard_roots.len(),
            dir
        );

        Ok(())
    }
}

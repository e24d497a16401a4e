//! Persistence of per-domain results
//!
//! A sink owns the storage location of every seed domain and decides whether
//! a seed already has results worth keeping.

use crate::types::RunResults;
use async_trait::async_trait;

pub mod directory;
pub mod human;
pub mod memory;

/// Destination for the two result sets of each run
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Create the storage location for `seed`. Called before the run starts;
    /// an error aborts that run only.
    async fn prepare(&self, seed: &str) -> anyhow::Result<()>;

    /// Whether `seed` already has non-empty results
    async fn is_done(&self, seed: &str) -> bool;

    /// Store the sorted subdomain and wildcard-root lists
    async fn persist(&self, results: &RunResults) -> anyhow::Result<()>;
}

/// Render a set as newline-terminated lines; empty sets render as ""
pub fn render_lines<'a, I>(names: I) -> String
where
    I: IntoIterator<Item = &'a String>,
{
    let mut out = String::new();
    for name in names {
        out.push_str(name);
        out.push('\n');
    }
    out
}

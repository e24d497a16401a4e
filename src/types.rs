// src/types.rs
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;

/// One record from the CT search endpoint.
///
/// `name_value` collapses every name of a certificate into a single
/// newline-delimited string.
#[derive(Debug, Deserialize)]
pub struct CertRecord {
    #[serde(default)]
    pub name_value: String,
}

/// Accumulated output of one seed-domain run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunResults {
    /// Seed domain the run started from
    pub seed: String,

    /// Literal hostnames seen in certificate names
    pub subdomains: BTreeSet<String>,

    /// Wildcard names with the `*.` prefix stripped
    pub wildcard_roots: BTreeSet<String>,

    /// Number of hostnames dequeued and queried
    pub queried: usize,

    /// Hostnames whose query failed or returned an unparsable payload
    pub abandoned: usize,

    /// Traversal stopped early because of the per-run query cap
    pub truncated: bool,
}

impl RunResults {
    pub fn new(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            ..Self::default()
        }
    }
}

/// Final state of one seed domain after dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Completed {
        subdomains: usize,
        wildcard_roots: usize,
        queries: usize,
    },
    Skipped,
    Failed(String),
}

impl RunStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, RunStatus::Failed(_))
    }
}

/// Per-domain outcome reported by the dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainReport {
    /// Position of the seed in the input list
    pub index: usize,
    pub seed: String,
    pub status: RunStatus,
}

impl fmt::Display for DomainReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            RunStatus::Completed {
                subdomains,
                wildcard_roots,
                queries,
            } => write!(
                f,
                "[+] {}: {} subdomains, {} wildcard roots ({} queries)",
                self.seed, subdomains, wildcard_roots, queries
            ),
            RunStatus::Skipped => write!(f, "[*] {}: skipped (results already exist)", self.seed),
            RunStatus::Failed(reason) => write!(f, "[!] {}: {}", self.seed, reason),
        }
    }
}

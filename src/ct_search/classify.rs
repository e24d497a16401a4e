// src/ct_search/classify.rs
//! Split CT search results into literal subdomains and wildcard roots

use anyhow::{Context, Result};
use std::collections::BTreeSet;

use crate::types::CertRecord;

const WILDCARD_PREFIX: &str = "*.";

/// Names found in one response, split by kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub subdomains: BTreeSet<String>,
    /// Wildcard names with `*.` removed
    pub wildcard_roots: BTreeSet<String>,
}

impl Classification {
    pub fn is_empty(&self) -> bool {
        self.subdomains.is_empty() && self.wildcard_roots.is_empty()
    }

    fn insert(&mut self, name: &str) {
        match name.strip_prefix(WILDCARD_PREFIX) {
            Some("") => {}
            Some(root) => {
                self.wildcard_roots.insert(root.to_string());
            }
            None => {
                self.subdomains.insert(name.to_string());
            }
        }
    }
}

/// Decode a JSON array of certificate records and classify every name in it.
///
/// An empty array or a JSON `null` is a valid empty result. Anything else
/// that does not decode as an array of records is an error and should not be
/// retried.
pub fn classify(raw: &[u8]) -> Result<Classification> {
    let records: Vec<CertRecord> = serde_json::from_slice::<Option<Vec<CertRecord>>>(raw)
        .context("Response is not a JSON array of certificate records")?
        .unwrap_or_default();

    let mut found = Classification::default();

    for record in &records {
        for name in record.name_value.split('\n').map(str::trim) {
            if !name.is_empty() {
                found.insert(name);
            }
        }
    }

    Ok(found)
}

//! Seed domain list loading

use anyhow::Context;
use std::fs;
use std::path::Path;

/// Parse seed domains, one per line.
///
/// Blank lines and lines starting with `#` are ignored; everything else is
/// trimmed and kept in file order.
pub fn parse_seed_domains(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Read seed domains from a file
pub fn load_seed_domains(path: &Path) -> anyhow::Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Could not read input file {:?}", path))?;
    Ok(parse_seed_domains(&content))
}

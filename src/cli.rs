// src/cli.rs
use clap::Parser;

use crate::config::Config;

/// ct-sweep: recursive Certificate Transparency enumeration
///
/// Queries a CT search endpoint for every seed domain, collects subdomains and
/// wildcard roots, and follows each wildcard root until nothing new appears.
#[derive(Parser, Debug, Clone)]
#[command(name = "ct-sweep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    // ===== Input & Configuration =====
    /// File with one seed domain per line (# starts a comment)
    #[arg(default_value = "domains.txt")]
    pub input: String,

    /// Optional TOML config file
    #[arg(short = 'c', long = "config")]
    pub config: Option<String>,

    /// Directory that receives one sub-directory per seed domain
    #[arg(short = 'o', long = "output-dir")]
    pub output_dir: Option<String>,

    // ===== Upstream =====
    /// CT search endpoint (crt.sh compatible)
    #[arg(long = "endpoint")]
    pub endpoint: Option<String>,

    /// Delay in seconds between requests
    #[arg(long = "rate")]
    pub rate: Option<u64>,

    /// Maximum attempts per request
    #[arg(long = "retries")]
    pub retries: Option<u32>,

    /// HTTP timeout in seconds
    #[arg(long = "timeout")]
    pub timeout: Option<u64>,

    // ===== Enumeration =====
    /// Number of concurrent workers (1 = no concurrency)
    #[arg(short = 'w', long = "workers")]
    pub workers: Option<usize>,

    /// Skip domains whose subs.txt already exists and is non-empty
    #[arg(long = "skip-done")]
    pub skip_done: bool,

    /// Re-run domains even if results already exist
    #[arg(long = "no-skip-done")]
    pub no_skip_done: bool,

    /// Stop expanding a domain after this many queries
    #[arg(long = "max-queries")]
    pub max_queries: Option<usize>,

    // ===== Display & Statistics =====
    /// Print statistics while running and at the end
    #[arg(long = "stats")]
    pub stats: bool,

    /// Stats update interval in seconds
    #[arg(long = "stats-interval", default_value = "10")]
    pub stats_interval: u64,

    /// Disable progress indicator
    #[arg(long = "no-progress")]
    pub no_progress: bool,

    // ===== Logging =====
    /// Verbose logging (set log level to debug)
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Quiet logging (set log level to warn)
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

impl Cli {
    /// Validate flag combinations and return errors for invalid usage
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.skip_done && self.no_skip_done {
            anyhow::bail!("Cannot specify both --skip-done and --no-skip-done");
        }

        if self.workers == Some(0) {
            anyhow::bail!("--workers must be at least 1");
        }

        if self.retries == Some(0) {
            anyhow::bail!("--retries must be at least 1");
        }

        if self.timeout == Some(0) {
            anyhow::bail!("--timeout must be greater than 0");
        }

        if self.max_queries == Some(0) {
            anyhow::bail!("--max-queries must be greater than 0");
        }

        if self.stats && self.stats_interval == 0 {
            anyhow::bail!("--stats-interval must be greater than 0");
        }

        if self.verbose && self.quiet {
            anyhow::bail!("Cannot specify both --verbose and --quiet");
        }

        Ok(())
    }

    /// Overlay explicitly given flags on top of the file config
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(ref endpoint) = self.endpoint {
            config.crtsh.endpoint = endpoint.clone();
        }
        if let Some(rate) = self.rate {
            config.crtsh.rate_delay_secs = rate;
        }
        if let Some(retries) = self.retries {
            config.crtsh.max_retries = retries;
        }
        if let Some(timeout) = self.timeout {
            config.crtsh.timeout_secs = timeout;
        }
        if let Some(workers) = self.workers {
            config.enumeration.workers = workers;
        }
        if self.skip_done {
            config.enumeration.skip_done = true;
        } else if self.no_skip_done {
            config.enumeration.skip_done = false;
        }
        if let Some(max_queries) = self.max_queries {
            config.enumeration.max_queries_per_domain = Some(max_queries);
        }
        if let Some(ref dir) = self.output_dir {
            config.output.directory = dir.clone();
        }
        if let Some(level) = self.log_level() {
            config.logging.level = level.to_string();
        }
    }

    /// Log level forced by -v / -q, if any
    pub fn log_level(&self) -> Option<&str> {
        if self.verbose {
            Some("debug")
        } else if self.quiet {
            Some("warn")
        } else {
            None
        }
    }

    pub fn should_show_progress(&self) -> bool {
        !self.no_progress && is_terminal::is_terminal(std::io::stderr())
    }
}

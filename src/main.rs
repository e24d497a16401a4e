// src/main.rs
use anyhow::Context;
use clap::Parser;
use ct_sweep::cli::Cli;
use ct_sweep::config::Config;
use ct_sweep::ct_search::{CrtShClient, Dispatcher, Enumerator};
use ct_sweep::domains::load_seed_domains;
use ct_sweep::output::directory::DirectorySink;
use ct_sweep::output::human::HumanReport;
use ct_sweep::progress::ProgressIndicator;
use ct_sweep::stats::StatsCollector;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cli.validate()?;

    let mut config = match cli.config {
        Some(ref path) => Config::from_file(Path::new(path))
            .with_context(|| format!("Failed to load config file '{}'", path))?,
        None => Config::default(),
    };

    // CLI flags override the config file
    cli.apply_to(&mut config);

    let enum_config = config.enum_config()?;

    let input = Path::new(&cli.input);
    if !input.exists() {
        anyhow::bail!("Input file '{}' not found", cli.input);
    }
    let seeds = load_seed_domains(input)?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    // Log lines share stderr with the spinner
    let progress = ProgressIndicator::new(cli.should_show_progress() && !seeds.is_empty());
    let log_progress = progress.clone();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(move || log_progress.log_writer())
        .init();

    if seeds.is_empty() {
        tracing::info!("No domains to process.");
        return Ok(());
    }
    tracing::info!("Loaded {} seed domains from {}", seeds.len(), cli.input);
    tracing::debug!("Runtime configuration: {:?}", enum_config);

    let stats = StatsCollector::new();

    if cli.stats {
        let stats_clone = stats.clone();
        let progress_clone = progress.clone();
        let interval = cli.stats_interval;

        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(interval)).await;
                let msg = stats_clone.format_stats();

                if progress_clone.is_enabled() {
                    progress_clone.set_message(msg);
                } else {
                    eprintln!("{}", msg);
                }
            }
        });
    }

    let client = CrtShClient::new(&enum_config, stats.clone())?;
    let enumerator = Enumerator::new(Arc::new(client), enum_config.max_queries, stats.clone());
    let sink = DirectorySink::new(config.output_directory());

    let dispatcher = Dispatcher::new(
        Arc::new(enumerator),
        Arc::new(sink),
        &enum_config,
        stats.clone(),
        progress.clone(),
    );

    let reports = dispatcher.run(seeds).await;
    progress.finish();

    HumanReport::new().print(&reports)?;

    if cli.stats {
        let snapshot = stats.snapshot();
        println!("\n📊 Final Statistics:");
        println!("  Domains completed: {}", snapshot.domains_completed);
        println!("  Domains skipped: {}", snapshot.domains_skipped);
        println!("  Domains failed: {}", snapshot.domains_failed);
        println!(
            "  Requests: {} ({} failed attempts)",
            snapshot.requests_sent, snapshot.requests_failed
        );
        println!("  Hostnames abandoned: {}", snapshot.hostnames_abandoned);
        println!("  Rate: {:.1} req/min", snapshot.requests_per_minute);
        println!("  Uptime: {}", StatsCollector::format_uptime(snapshot.uptime_secs));
    }

    Ok(())
}

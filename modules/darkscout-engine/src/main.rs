use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use darkscout_common::{Config, IdentifierType};
use darkscout_engine::{JsonFileSink, Registry, Scanner, SessionStore, TorFetcher};

#[derive(Parser)]
#[command(name = "darkscout", about = "Dark web identifier exposure scanner")]
struct Cli {
    /// Identifier to search for
    #[arg(required_unless_present = "list_targets")]
    query: Option<String>,

    /// Kind of identifier: email, domain, username, or phone
    #[arg(long, default_value = "email")]
    identifier_type: IdentifierType,

    /// Override the directory scan records are written to
    #[arg(long)]
    results_dir: Option<String>,

    /// Print the target catalogue and exit
    #[arg(long)]
    list_targets: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("darkscout_engine=info".parse()?)
                .add_directive("darkscout_common=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let registry = Registry::builtin();

    if cli.list_targets {
        for site in registry.targets() {
            println!(
                "{:<12} {:<38} {}",
                site.category.to_string(),
                site.name,
                site.description
            );
        }
        return Ok(());
    }

    info!("Darkscout starting...");

    // Load config
    let config = Config::from_env();
    let query = cli
        .query
        .expect("query is required unless --list-targets is set");

    let fetcher = Arc::new(TorFetcher::new(&config.socks_proxy)?);
    let results_dir = cli.results_dir.unwrap_or_else(|| config.results_dir.clone());
    let sink = Arc::new(JsonFileSink::new(results_dir));

    let scanner = Scanner::new(
        Arc::new(SessionStore::new()),
        fetcher,
        registry,
        config.scan.clone(),
        sink,
    );

    let (snapshot, summary) = scanner.run_scan(&query, cli.identifier_type).await?;

    info!(
        query = snapshot.query,
        findings = snapshot.findings.len(),
        mentions = snapshot.total_mentions(),
        "Scan finished"
    );
    println!("{summary}");

    Ok(())
}

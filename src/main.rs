use anyhow::Result;
use clap::{Parser, Subcommand};
use rental_scout::commands::CommandContext;
use rental_scout::config::Config;
use rental_scout::ingest::{shared_store, Ingestor};
use rental_scout::notify::{LogNotifier, Notifier, WebhookNotifier};
use rental_scout::render;
use rental_scout::schedule::Scheduler;
use rental_scout::scrapers::{http_client, RightmoveScraper, SearchHandle, UniHomesScraper};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "rental-scout")]
#[command(about = "Watches Rightmove and UniHomes for new rental listings")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape on a fixed interval and answer !commands read from stdin
    Run,
    /// Run a single ingestion cycle and print what was found
    Once,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    info!(search = ?config.search, interval_secs = config.interval.as_secs(), "🏠 Rental Scout");

    let client = http_client(&config.user_agent, config.http_timeout)?;
    let notifier: Arc<dyn Notifier> = match &config.webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(client.clone(), url.clone())),
        None => Arc::new(LogNotifier),
    };

    let store = shared_store();
    let search = SearchHandle::new(config.search.clone());
    let ingestor = Arc::new(
        Ingestor::new(store.clone(), notifier.clone())
            .with_scraper(Box::new(RightmoveScraper::new(client.clone(), search.clone())))
            .with_scraper(Box::new(UniHomesScraper::new(client, search.clone()))),
    );

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Once => {
            let report = ingestor.run_cycle().await?;
            println!("{}", render::table(&report.new_listings));
            info!(
                "✅ {} new listings ({} scraped, {} rejected)",
                report.new_listings.len(),
                report.scraped,
                report.rejected
            );
        }
        Commands::Run => run(config, ingestor, notifier, search).await?,
    }

    Ok(())
}

async fn run(
    config: Config,
    ingestor: Arc<Ingestor>,
    notifier: Arc<dyn Notifier>,
    search: SearchHandle,
) -> Result<()> {
    let scheduler = Scheduler::new(config.interval);
    let commands = CommandContext::new(ingestor.store().clone(), Some(scheduler.handle())).with_search(search);
    let (stop, shutdown) = watch::channel(false);

    let scheduler_task = tokio::spawn(async move { scheduler.run(ingestor, shutdown).await });

    // the scheduler is already running, so a dead channel must not end the process
    if let Err(e) = notifier
        .send_status("Scout ready! Set the budget with !initialise <max £/week> <bedrooms> <people>, or type !help.")
        .await
    {
        warn!(error = %e, "Failed to send startup message");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("stdin closed, running until Ctrl-C");
                    tokio::signal::ctrl_c().await?;
                    break;
                };
                if let Some(reply) = commands.handle_line(&line).await {
                    if let Err(e) = notifier.send_status(&reply).await {
                        warn!(error = %e, "Failed to send command reply");
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested");
                break;
            }
        }
    }

    let _ = stop.send(true);
    scheduler_task.await?;
    Ok(())
}

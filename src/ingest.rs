//! One ingestion cycle: scrape every source, fold the results into the
//! store, then tell the channel about whatever was new.

use crate::models::{Listing, RawListing, Source};
use crate::notify::Notifier;
use crate::scrapers::ScraperTrait;
use crate::store::ListingStore;
use anyhow::Result;
use chrono::Local;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

/// Store handle shared between the ingestion loop and command handlers
pub type SharedStore = Arc<RwLock<ListingStore>>;

pub fn shared_store() -> SharedStore {
    Arc::new(RwLock::new(ListingStore::new()))
}

/// Outcome of a single cycle
#[derive(Debug, Default, Clone)]
pub struct IngestReport {
    /// Raw records returned by the scrapers
    pub scraped: usize,
    /// Raw records that could not be turned into listings
    pub rejected: usize,
    /// Sources whose scrape failed and counted as empty
    pub failed_sources: Vec<Source>,
    /// Listings admitted during this cycle, in scrape order
    pub new_listings: Vec<Listing>,
    /// Whether the new listings reached the notifier; false when there was nothing to send
    pub notified: bool,
}

/// Build listings from one source's raw batch, skipping records that fail validation.
/// Returns the listings and the number of rejected records.
pub fn build_listings(source: Source, people_count: u32, raws: &[RawListing]) -> (Vec<Listing>, usize) {
    let mut listings = Vec::with_capacity(raws.len());
    let mut rejected = 0;

    for raw in raws {
        match Listing::build(source, raw, people_count) {
            Ok(listing) => listings.push(listing),
            Err(e) => {
                rejected += 1;
                warn!(source = source.name(), link = ?raw.link, error = %e, "Skipping listing");
            }
        }
    }

    (listings, rejected)
}

pub struct Ingestor {
    scrapers: Vec<Box<dyn ScraperTrait>>,
    store: SharedStore,
    notifier: Arc<dyn Notifier>,
}

impl Ingestor {
    pub fn new(store: SharedStore, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            scrapers: Vec::new(),
            store,
            notifier,
        }
    }

    pub fn with_scraper(mut self, scraper: Box<dyn ScraperTrait>) -> Self {
        self.scrapers.push(scraper);
        self
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Scrape all sources, admit what is new and notify
    pub async fn run_cycle(&self) -> Result<IngestReport> {
        let mut report = IngestReport::default();
        let mut candidates = Vec::new();

        for scraper in &self.scrapers {
            let raws = match scraper.scrape().await {
                Ok(raws) => raws,
                Err(e) => {
                    error!(source = scraper.source_name(), error = %e, "Scrape failed");
                    report.failed_sources.push(scraper.source());
                    continue;
                }
            };
            report.scraped += raws.len();

            let (listings, rejected) = build_listings(scraper.source(), scraper.people_count(), &raws);
            report.rejected += rejected;
            candidates.extend(listings);
        }

        // diff and admit under one write so no other writer slips in between
        report.new_listings = {
            let mut store = self.store.write().await;
            let fresh = store.diff_new(&candidates);
            store.admit(fresh.iter().cloned());
            fresh
        };

        info!(
            scraped = report.scraped,
            rejected = report.rejected,
            new = report.new_listings.len(),
            "Ingestion cycle finished"
        );

        if !report.new_listings.is_empty() {
            let title = format!(
                "New listings found at {}:",
                Local::now().format("%Y-%m-%d %H:%M:%S")
            );
            match self.notifier.send_listings(&title, &report.new_listings).await {
                Ok(()) => report.notified = true,
                Err(e) => error!(error = %e, "Failed to send new listings"),
            }
        }

        Ok(report)
    }
}

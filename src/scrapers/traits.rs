use crate::models::{RawListing, Source};
use anyhow::Result;
use async_trait::async_trait;

/// Common trait for all listing scrapers
#[async_trait]
pub trait ScraperTrait: Send + Sync {
    /// Scrape the raw listing fields currently published by the source
    async fn scrape(&self) -> Result<Vec<RawListing>>;

    /// Upstream this scraper reads from
    fn source(&self) -> Source;

    /// Number of tenants sharing the rent, used to derive monthly prices
    fn people_count(&self) -> u32;

    fn source_name(&self) -> &'static str {
        self.source().name()
    }
}

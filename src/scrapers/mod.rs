pub mod fields;
pub mod rightmove;
pub mod traits;
pub mod types;
pub mod unihomes;

pub use rightmove::RightmoveScraper;
pub use traits::ScraperTrait;
pub use types::{SearchHandle, SearchParams};
pub use unihomes::UniHomesScraper;

use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

/// Shared HTTP client settings for the scrapers
pub fn http_client(user_agent: &str, timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
        .context("Failed to create HTTP client")
}

pub(crate) async fn fetch_page(client: &Client, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to fetch {}", url))?;

    if !response.status().is_success() {
        anyhow::bail!("Failed to fetch {}: {}", url, response.status());
    }

    response.text().await.context("Failed to read response body")
}

use crate::models::{RawListing, Source, DATE_FORMAT};
use crate::scrapers::fields::{clean_price, selector, text_of};
use crate::scrapers::traits::ScraperTrait;
use crate::scrapers::types::SearchHandle;
use crate::scrapers::fetch_page;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use reqwest::Client;
use scraper::Html;
use tracing::{debug, info};

const SEARCH_URL: &str = "https://www.unihomes.co.uk/student-accommodation";

/// UniHomes student accommodation search near a campus.
///
/// UniHomes only publishes a weekly per-person price and no listing date, so
/// every card is dated the day it was scraped.
pub struct UniHomesScraper {
    client: Client,
    params: SearchHandle,
    city: String,
    area: String,
}

impl UniHomesScraper {
    pub fn new(client: Client, params: SearchHandle) -> Self {
        Self {
            client,
            params,
            city: "london".to_string(),
            area: "near-kings-college-london".to_string(),
        }
    }

    pub fn with_area(mut self, city: impl Into<String>, area: impl Into<String>) -> Self {
        self.city = city.into();
        self.area = area.into();
        self
    }

    pub(crate) fn search_url(&self) -> String {
        let p = self.params.get();
        format!(
            "{SEARCH_URL}/{}/{}?bedrooms={}&max-price={}",
            self.city, self.area, p.bedrooms, p.max_price_per_week
        )
    }
}

/// Extract listing cards from the search page
pub fn parse_listings(html: &str, today: NaiveDate) -> Result<Vec<RawListing>> {
    let document = Html::parse_document(html);
    let card_selector = selector("div.property-listing-column")?;
    let price_selector = selector("div.property_details span.font-weight-700")?;
    let link_selector = selector("a")?;
    let address_selector = selector("div.property_rooms_address p.font-size-14px")?;
    let date_added = today.format(DATE_FORMAT).to_string();

    let mut listings = Vec::new();
    for card in document.select(&card_selector) {
        let link = card
            .select(&link_selector)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(str::to_string);

        let raw = RawListing {
            price_per_month: None,
            price_per_week: text_of(&card, &price_selector).and_then(|t| clean_price(&t)),
            location: text_of(&card, &address_selector),
            link,
            date_added: Some(date_added.clone()),
        };
        debug!(?raw, "parsed UniHomes card");
        listings.push(raw);
    }

    Ok(listings)
}

#[async_trait]
impl ScraperTrait for UniHomesScraper {
    async fn scrape(&self) -> Result<Vec<RawListing>> {
        info!("Starting UniHomes scrape");
        let html = fetch_page(&self.client, &self.search_url()).await?;
        let listings = parse_listings(&html, Local::now().date_naive())?;
        info!("Scraped {} UniHomes listings", listings.len());
        Ok(listings)
    }

    fn source(&self) -> Source {
        Source::UniHomes
    }

    fn people_count(&self) -> u32 {
        self.params.get().people_count
    }
}

use crate::models::{RawListing, Source};
use crate::scrapers::fields::{clean_price, resolve_added_date, selector, text_of};
use crate::scrapers::traits::ScraperTrait;
use crate::scrapers::types::SearchHandle;
use crate::scrapers::fetch_page;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use reqwest::Client;
use scraper::Html;
use tracing::{debug, info, warn};

const ORIGIN: &str = "https://rightmove.co.uk";
const SEARCH_URL: &str = "https://www.rightmove.co.uk/property-to-rent/find.html";
const RESULTS_PER_PAGE: usize = 24;

/// Rightmove student-let search around a single station
pub struct RightmoveScraper {
    client: Client,
    params: SearchHandle,
    location_identifier: String,
    radius_miles: u32,
}

impl RightmoveScraper {
    pub fn new(client: Client, params: SearchHandle) -> Self {
        Self {
            client,
            params,
            location_identifier: "STATION%5E9662".to_string(),
            radius_miles: 5,
        }
    }

    /// Search around a different Rightmove location (e.g. `STATION%5E1234`)
    pub fn with_location(mut self, location_identifier: impl Into<String>, radius_miles: u32) -> Self {
        self.location_identifier = location_identifier.into();
        self.radius_miles = radius_miles;
        self
    }

    pub(crate) fn page_url(&self, page: usize) -> String {
        let p = self.params.get();
        format!(
            "{SEARCH_URL}?locationIdentifier={}&sortType=6&maxBedrooms={}&minBedrooms={}&maxPrice={}&minPrice={}&radius={}&includeLetAgreed=false&letType=student&furnishTypes=furnished&index={}",
            self.location_identifier,
            p.bedrooms,
            p.bedrooms,
            p.max_price_per_month,
            p.min_price_per_month,
            self.radius_miles,
            page * RESULTS_PER_PAGE,
        )
    }
}

/// Total number of results advertised in the search header
pub fn parse_result_count(html: &str) -> Result<Option<usize>> {
    let document = Html::parse_document(html);
    let count_selector = selector("span.searchHeader-resultCount")?;

    Ok(document
        .select(&count_selector)
        .next()
        .and_then(|el| clean_price(&el.text().collect::<String>()))
        .and_then(|digits| digits.parse().ok()))
}

pub fn page_count(result_count: usize) -> usize {
    result_count / RESULTS_PER_PAGE + 1
}

/// Extract listing cards from one result page
pub fn parse_listings(html: &str, today: NaiveDate) -> Result<Vec<RawListing>> {
    let document = Html::parse_document(html);
    let card_selector = selector("div.l-searchResult")?;
    let price_selector = selector("span.propertyCard-priceValue")?;
    let weekly_selector = selector("span.propertyCard-secondaryPriceValue")?;
    let link_selector = selector("a.propertyCard-link")?;
    let address_selector = selector("address.propertyCard-address")?;
    let date_selector = selector("span.propertyCard-branchSummary-addedOrReduced")?;

    let mut listings = Vec::new();
    for card in document.select(&card_selector) {
        let link = card
            .select(&link_selector)
            .next()
            .and_then(|a| a.value().attr("href"))
            .filter(|href| !href.is_empty())
            .map(|href| format!("{ORIGIN}{href}"));

        let raw = RawListing {
            price_per_month: text_of(&card, &price_selector).and_then(|t| clean_price(&t)),
            price_per_week: text_of(&card, &weekly_selector).and_then(|t| clean_price(&t)),
            location: text_of(&card, &address_selector),
            link,
            date_added: text_of(&card, &date_selector).map(|t| resolve_added_date(&t, today)),
        };
        debug!(?raw, "parsed Rightmove card");
        listings.push(raw);
    }

    Ok(listings)
}

#[async_trait]
impl ScraperTrait for RightmoveScraper {
    async fn scrape(&self) -> Result<Vec<RawListing>> {
        info!("Starting Rightmove scrape");
        let today = Local::now().date_naive();

        let first_page = fetch_page(&self.client, &self.page_url(0)).await?;
        let pages = match parse_result_count(&first_page)? {
            Some(count) => page_count(count),
            None => {
                warn!("Rightmove result count missing, scraping first page only");
                1
            }
        };
        debug!(pages, "Rightmove result pages");

        let mut listings = parse_listings(&first_page, today)?;
        for page in 1..pages {
            let html = fetch_page(&self.client, &self.page_url(page)).await?;
            listings.extend(parse_listings(&html, today)?);
        }

        info!("Scraped {} Rightmove listings across {} pages", listings.len(), pages);
        Ok(listings)
    }

    fn source(&self) -> Source {
        Source::Rightmove
    }

    fn people_count(&self) -> u32 {
        self.params.get().people_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::types::SearchParams;

    const PAGE: &str = r#"
        <html><body>
        <span class="searchHeader-resultCount">1,030</span>
        <div class="l-searchResult">
          <a class="propertyCard-link" href="/properties/1234#/"></a>
          <span class="propertyCard-priceValue">£1,200 pcm</span>
          <span class="propertyCard-secondaryPriceValue">£277 pw</span>
          <address class="propertyCard-address">
            Kings Cross,
            London
          </address>
          <span class="propertyCard-branchSummary-addedOrReduced">Added on 05/06/2024</span>
        </div>
        <div class="l-searchResult">
          <a class="propertyCard-link" href="/properties/5678#/"></a>
          <span class="propertyCard-priceValue"></span>
          <span class="propertyCard-secondaryPriceValue">£300 pw</span>
          <address class="propertyCard-address">Borough</address>
          <span class="propertyCard-branchSummary-addedOrReduced">Reduced yesterday</span>
        </div>
        </body></html>
    "#;

    #[test]
    fn parses_result_count_and_pages() {
        assert_eq!(parse_result_count(PAGE).expect("parses"), Some(1030));
        assert_eq!(page_count(1030), 43);
        assert_eq!(page_count(10), 1);
        assert_eq!(parse_result_count("<html></html>").expect("parses"), None);
    }

    #[test]
    fn parses_listing_cards() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).expect("valid date");
        let listings = parse_listings(PAGE, today).expect("parses");
        assert_eq!(listings.len(), 2);

        let first = &listings[0];
        assert_eq!(first.price_per_month.as_deref(), Some("1200"));
        assert_eq!(first.price_per_week.as_deref(), Some("277"));
        assert_eq!(first.location.as_deref(), Some("Kings Cross, London"));
        assert_eq!(first.link.as_deref(), Some("https://rightmove.co.uk/properties/1234#/"));
        assert_eq!(first.date_added.as_deref(), Some("05/06/2024"));

        let second = &listings[1];
        assert_eq!(second.price_per_month, None);
        assert_eq!(second.price_per_week.as_deref(), Some("300"));
        assert_eq!(second.date_added.as_deref(), Some("09/06/2024"));
    }

    #[test]
    fn page_url_carries_search_params() {
        let search = SearchHandle::new(SearchParams::default());
        let scraper = RightmoveScraper::new(Client::new(), search).with_location("STATION%5E1", 3);
        let url = scraper.page_url(2);
        assert!(url.contains("locationIdentifier=STATION%5E1"));
        assert!(url.contains("minBedrooms=4"));
        assert!(url.contains("maxPrice=4000"));
        assert!(url.contains("radius=3"));
        assert!(url.ends_with("index=48"));
    }
}

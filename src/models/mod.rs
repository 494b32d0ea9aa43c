use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Mean number of weeks in a calendar month
pub const WEEKS_PER_MONTH: f64 = 4.34524;

/// Date format used by every upstream source once relative phrases are resolved
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Upstream source of a listing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Source {
    Rightmove,
    UniHomes,
}

impl Source {
    /// Two-letter code used to qualify listing ids
    pub fn code(self) -> &'static str {
        match self {
            Source::Rightmove => "RM",
            Source::UniHomes => "UH",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_uppercase().as_str() {
            "RM" => Some(Source::Rightmove),
            "UH" => Some(Source::UniHomes),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Source::Rightmove => "Rightmove",
            Source::UniHomes => "UniHomes",
        }
    }
}

/// Errors raised while turning raw scraped fields into a [`Listing`]
#[derive(Debug, Error, PartialEq)]
pub enum ListingError {
    #[error("listing has neither a monthly nor a weekly price")]
    MissingPrice,
    #[error("listing is missing required field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` is not a valid price: {value:?}")]
    InvalidPrice { field: &'static str, value: String },
    #[error("date {0:?} is not in DD/MM/YYYY form")]
    InvalidDate(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum ListingIdError {
    #[error("listing id {0:?} must look like RM-0512KI")]
    Malformed(String),
    #[error("unknown source code {0:?}")]
    UnknownSource(String),
}

/// Stable identity of a listing across repeated scrapes.
///
/// The key is built from two-character slices of the day, the monthly price
/// and the location, so distinct listings sharing all three collide. The
/// source code keeps the two upstreams from colliding with each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListingId {
    source: Source,
    key: String,
}

impl ListingId {
    pub fn new(source: Source, key: impl Into<String>) -> Self {
        Self {
            source,
            key: key.into(),
        }
    }

    /// Derive the key from the fields that identify a posting.
    ///
    /// The day part is the two-digit day of the parsed date, not a slice of
    /// the scraped text, so it is always zero-padded. For `DD/MM/YYYY` input
    /// the two agree.
    pub fn derive(source: Source, date_added: NaiveDate, price_per_month: u32, location: &str) -> Self {
        let day = date_added.format("%d").to_string();
        let price: String = price_per_month.to_string().chars().take(2).collect();
        let area: String = location
            .chars()
            .filter(|c| *c != ' ')
            .flat_map(char::to_uppercase)
            .take(2)
            .collect();

        Self::new(source, format!("{}{}{}", day, price, area))
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.source.code(), self.key)
    }
}

impl FromStr for ListingId {
    type Err = ListingIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (code, key) = s
            .split_once('-')
            .filter(|(_, key)| !key.is_empty())
            .ok_or_else(|| ListingIdError::Malformed(s.to_string()))?;
        let source =
            Source::from_code(code).ok_or_else(|| ListingIdError::UnknownSource(code.to_string()))?;

        Ok(Self::new(source, key.to_uppercase()))
    }
}

impl Serialize for ListingId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ListingId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Raw fields as handed over by a scraper.
///
/// Prices arrive already stripped of currency symbols, separators and unit
/// suffixes; the date has been resolved to `DD/MM/YYYY`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawListing {
    #[serde(default)]
    pub price_per_month: Option<String>,
    #[serde(default)]
    pub price_per_week: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub date_added: Option<String>,
}

/// Monthly rent for `people` tenants paying `weekly` each, truncated to whole units
pub fn monthly_from_weekly(weekly: u32, people: u32) -> u32 {
    (weekly as f64 * WEEKS_PER_MONTH * people as f64).floor() as u32
}

fn serialize_date<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&date.format(DATE_FORMAT))
}

/// One normalized rental posting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Listing {
    id: ListingId,
    #[serde(serialize_with = "serialize_date")]
    date_added: NaiveDate,
    price_per_month: u32,
    price_per_week: Option<u32>,
    location: String,
    link: String,
}

impl Listing {
    /// Normalize raw scraped fields into a listing
    pub fn build(source: Source, raw: &RawListing, people_count: u32) -> Result<Self, ListingError> {
        let location = required(&raw.location, "location")?;
        let link = required(&raw.link, "link")?;
        let date_text = required(&raw.date_added, "date_added")?;
        let date_added = NaiveDate::parse_from_str(date_text, DATE_FORMAT)
            .map_err(|_| ListingError::InvalidDate(date_text.to_string()))?;

        let price_per_week = present(&raw.price_per_week)
            .map(parse_weekly)
            .transpose()?;
        let price_per_month = match (present(&raw.price_per_month), price_per_week) {
            (Some(text), _) => parse_monthly(text)?,
            (None, Some(weekly)) => monthly_from_weekly(weekly, people_count),
            (None, None) => return Err(ListingError::MissingPrice),
        };

        let id = ListingId::derive(source, date_added, price_per_month, location);

        Ok(Self {
            id,
            date_added,
            price_per_month,
            price_per_week,
            location: location.to_string(),
            link: link.to_string(),
        })
    }

    pub fn id(&self) -> &ListingId {
        &self.id
    }

    pub fn source(&self) -> Source {
        self.id.source()
    }

    pub fn date_added(&self) -> NaiveDate {
        self.date_added
    }

    pub fn price_per_month(&self) -> u32 {
        self.price_per_month
    }

    pub fn price_per_week(&self) -> Option<u32> {
        self.price_per_week
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn link(&self) -> &str {
        &self.link
    }
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn required<'a>(field: &'a Option<String>, name: &'static str) -> Result<&'a str, ListingError> {
    present(field).ok_or(ListingError::MissingField(name))
}

fn parse_monthly(text: &str) -> Result<u32, ListingError> {
    text.parse().map_err(|_| ListingError::InvalidPrice {
        field: "price_per_month",
        value: text.to_string(),
    })
}

// Weekly prices may carry pence; round up to a whole unit.
fn parse_weekly(text: &str) -> Result<u32, ListingError> {
    let invalid = || ListingError::InvalidPrice {
        field: "price_per_week",
        value: text.to_string(),
    };
    let value: f64 = text.parse().map_err(|_| invalid())?;
    if !value.is_finite() || value < 0.0 || value > u32::MAX as f64 {
        return Err(invalid());
    }
    Ok(value.ceil() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(month: Option<&str>, week: Option<&str>, location: &str, date: &str) -> RawListing {
        RawListing {
            price_per_month: month.map(str::to_string),
            price_per_week: week.map(str::to_string),
            location: Some(location.to_string()),
            link: Some("https://example.test/listing/1".to_string()),
            date_added: Some(date.to_string()),
        }
    }

    #[test]
    fn weekly_price_derives_monthly_with_ceiling() {
        let listing = Listing::build(Source::UniHomes, &raw(None, Some("200"), "Camberwell", "05/06/2024"), 1)
            .expect("valid listing");
        assert_eq!(listing.price_per_month(), 869);
        assert_eq!(listing.price_per_week(), Some(200));
    }

    #[test]
    fn weekly_price_scales_with_people() {
        let listing = Listing::build(Source::UniHomes, &raw(None, Some("200"), "Camberwell", "05/06/2024"), 4)
            .expect("valid listing");
        assert_eq!(listing.price_per_month(), 3476);
    }

    #[test]
    fn fractional_weekly_price_rounds_up_first() {
        let listing = Listing::build(Source::UniHomes, &raw(None, Some("199.50"), "Camberwell", "05/06/2024"), 1)
            .expect("valid listing");
        assert_eq!(listing.price_per_week(), Some(200));
        assert_eq!(listing.price_per_month(), 869);
    }

    #[test]
    fn monthly_price_is_used_verbatim() {
        let listing = Listing::build(Source::Rightmove, &raw(Some("1200"), Some("277"), "Kings Cross", "05/06/2024"), 3)
            .expect("valid listing");
        assert_eq!(listing.price_per_month(), 1200);
        assert_eq!(listing.price_per_week(), Some(277));

        let monthly_only = Listing::build(Source::Rightmove, &raw(Some("1200"), None, "Kings Cross", "05/06/2024"), 3)
            .expect("valid listing");
        assert_eq!(monthly_only.price_per_week(), None);
    }

    #[test]
    fn identity_is_derived_from_day_price_and_area() {
        let listing = Listing::build(Source::Rightmove, &raw(Some("1200"), None, "Kings Cross", "05/06/2024"), 1)
            .expect("valid listing");
        assert_eq!(listing.id().key(), "0512KI");
        assert_eq!(listing.id().to_string(), "RM-0512KI");
    }

    #[test]
    fn identity_is_deterministic() {
        let input = raw(Some("1200"), None, "Kings Cross", "05/06/2024");
        let a = Listing::build(Source::Rightmove, &input, 1).expect("valid listing");
        let b = Listing::build(Source::Rightmove, &input, 1).expect("valid listing");
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn short_fields_give_a_short_key() {
        let listing = Listing::build(Source::Rightmove, &raw(Some("9"), None, "E", "05/06/2024"), 1)
            .expect("valid listing");
        assert_eq!(listing.id().key(), "059E");
    }

    #[test]
    fn known_limitation_distinct_listings_can_share_an_id() {
        let a = Listing::build(Source::Rightmove, &raw(Some("1200"), None, "Kings Cross", "05/06/2024"), 1)
            .expect("valid listing");
        let b = Listing::build(Source::Rightmove, &raw(Some("1299"), None, "Kingsland Road", "05/07/2024"), 1)
            .expect("valid listing");
        assert_ne!(a, b);
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn sources_do_not_collide() {
        let input = raw(Some("1200"), None, "Kings Cross", "05/06/2024");
        let rm = Listing::build(Source::Rightmove, &input, 1).expect("valid listing");
        let uh = Listing::build(Source::UniHomes, &input, 1).expect("valid listing");
        assert_eq!(rm.id().key(), uh.id().key());
        assert_ne!(rm.id(), uh.id());
    }

    #[test]
    fn missing_price_is_rejected() {
        let err = Listing::build(Source::Rightmove, &raw(None, Some("  "), "Kings Cross", "05/06/2024"), 1)
            .expect_err("no price");
        assert_eq!(err, ListingError::MissingPrice);
    }

    #[test]
    fn empty_location_and_link_are_rejected() {
        let err = Listing::build(Source::Rightmove, &raw(Some("1200"), None, "", "05/06/2024"), 1)
            .expect_err("no location");
        assert_eq!(err, ListingError::MissingField("location"));

        let mut no_link = raw(Some("1200"), None, "Kings Cross", "05/06/2024");
        no_link.link = Some(String::new());
        let err = Listing::build(Source::Rightmove, &no_link, 1).expect_err("no link");
        assert_eq!(err, ListingError::MissingField("link"));
    }

    #[test]
    fn malformed_price_and_date_are_rejected() {
        let err = Listing::build(Source::Rightmove, &raw(Some("12k"), None, "Kings Cross", "05/06/2024"), 1)
            .expect_err("bad price");
        assert!(matches!(err, ListingError::InvalidPrice { field: "price_per_month", .. }));

        let err = Listing::build(Source::Rightmove, &raw(Some("1200"), None, "Kings Cross", "today"), 1)
            .expect_err("bad date");
        assert_eq!(err, ListingError::InvalidDate("today".to_string()));
    }

    #[test]
    fn listing_id_round_trips_through_text() {
        let id: ListingId = "uh-0512ki".parse().expect("valid id");
        assert_eq!(id, ListingId::new(Source::UniHomes, "0512KI"));
        assert!(matches!("0512KI".parse::<ListingId>(), Err(ListingIdError::Malformed(_))));
        assert!(matches!("ZZ-0512KI".parse::<ListingId>(), Err(ListingIdError::UnknownSource(_))));
    }

    #[test]
    fn raw_listing_reads_from_a_field_mapping() {
        let raw: RawListing = serde_json::from_value(serde_json::json!({
            "price_per_week": "210",
            "location": "Elephant and Castle",
            "link": "https://example.test/2",
            "date_added": "01/09/2024"
        }))
        .expect("mapping deserializes");
        let listing = Listing::build(Source::UniHomes, &raw, 2).expect("valid listing");
        assert_eq!(listing.price_per_month(), 1825);
        assert_eq!(listing.id().key(), "0118EL");
    }

    #[test]
    fn listing_serializes_as_plain_record() {
        let listing = Listing::build(Source::Rightmove, &raw(Some("1200"), None, "Kings Cross", "05/06/2024"), 1)
            .expect("valid listing");
        let value = serde_json::to_value(&listing).expect("serializes");
        assert_eq!(value["id"], "RM-0512KI");
        assert_eq!(value["price_per_month"], 1200);
        assert_eq!(value["location"], "Kings Cross");
        assert_eq!(value["date_added"], "05/06/2024");
    }
}

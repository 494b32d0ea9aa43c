use crate::models::monthly_from_weekly;
use crate::scrapers::SearchParams;
use anyhow::{Context, Result};
use std::str::FromStr;
use std::time::Duration;

/// Runtime configuration, read from the environment (and `.env` if present)
#[derive(Debug, Clone)]
pub struct Config {
    pub search: SearchParams,
    pub interval: Duration,
    pub webhook_url: Option<String>,
    pub user_agent: String,
    pub http_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // a missing .env file is fine
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = SearchParams::default();
        let max_price_per_week = parse_or(&lookup, "SCOUT_MAX_PRICE_PER_WEEK", defaults.max_price_per_week)?;
        let people_count = parse_or(&lookup, "SCOUT_PEOPLE", defaults.people_count)?;
        if people_count == 0 {
            anyhow::bail!("SCOUT_PEOPLE must be at least 1");
        }

        let search = SearchParams {
            min_price_per_month: parse_or(&lookup, "SCOUT_MIN_PRICE_PER_MONTH", defaults.min_price_per_month)?,
            max_price_per_month: parse_or(
                &lookup,
                "SCOUT_MAX_PRICE_PER_MONTH",
                monthly_from_weekly(max_price_per_week, people_count),
            )?,
            max_price_per_week,
            bedrooms: parse_or(&lookup, "SCOUT_BEDROOMS", defaults.bedrooms)?,
            people_count,
        };

        let interval_secs: u64 = parse_or(&lookup, "SCOUT_INTERVAL_SECS", 3600)?;
        if interval_secs == 0 {
            anyhow::bail!("SCOUT_INTERVAL_SECS must be positive");
        }

        Ok(Self {
            search,
            interval: Duration::from_secs(interval_secs),
            webhook_url: lookup("SCOUT_WEBHOOK_URL").filter(|url| !url.trim().is_empty()),
            user_agent: lookup("SCOUT_USER_AGENT").unwrap_or_else(|| {
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
            }),
            http_timeout: Duration::from_secs(parse_or(&lookup, "SCOUT_HTTP_TIMEOUT_SECS", 30)?),
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .with_context(|| format!("{key} has invalid value {value:?}")),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<Config> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let defaults = config(&[]).expect("defaults are valid");
        assert_eq!(defaults.interval, Duration::from_secs(3600));
        assert_eq!(defaults.search.bedrooms, 4);
        assert_eq!(defaults.search.max_price_per_week, 250);
        assert_eq!(defaults.search.max_price_per_month, 4345);
        assert!(defaults.webhook_url.is_none());
    }

    #[test]
    fn monthly_ceiling_follows_weekly_budget() {
        let derived = config(&[("SCOUT_MAX_PRICE_PER_WEEK", "200"), ("SCOUT_PEOPLE", "1")]).expect("valid");
        assert_eq!(derived.search.max_price_per_month, 869);

        let explicit = config(&[("SCOUT_MAX_PRICE_PER_MONTH", "5000")]).expect("valid");
        assert_eq!(explicit.search.max_price_per_month, 5000);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(config(&[("SCOUT_BEDROOMS", "many")]).is_err());
        assert!(config(&[("SCOUT_PEOPLE", "0")]).is_err());
        assert!(config(&[("SCOUT_INTERVAL_SECS", "0")]).is_err());
    }

    #[test]
    fn blank_webhook_is_ignored() {
        let blank = config(&[("SCOUT_WEBHOOK_URL", " ")]).expect("valid");
        assert!(blank.webhook_url.is_none());
    }
}

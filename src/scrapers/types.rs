use crate::models::monthly_from_weekly;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};

/// Search parameters shared by every scraper
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchParams {
    /// Minimum rent per month (GBP)
    pub min_price_per_month: u32,
    /// Maximum rent per month (GBP)
    pub max_price_per_month: u32,
    /// Maximum rent per person per week (GBP)
    pub max_price_per_week: u32,
    /// Exact number of bedrooms
    pub bedrooms: u32,
    /// Number of tenants sharing the property
    pub people_count: u32,
}

impl SearchParams {
    /// Parameters for a weekly per-person budget; the monthly ceiling is derived from it
    pub fn budgeted(max_price_per_week: u32, bedrooms: u32, people_count: u32) -> Self {
        Self {
            min_price_per_month: 0,
            max_price_per_month: monthly_from_weekly(max_price_per_week, people_count),
            max_price_per_week,
            bedrooms,
            people_count,
        }
    }
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            min_price_per_month: 0,
            max_price_per_month: 4000,
            max_price_per_week: 250,
            bedrooms: 4,
            people_count: 4,
        }
    }
}

/// Search parameters shared between the scrapers and the command layer.
///
/// Scrapers read the current value at the start of every request, so an
/// update is picked up by the next cycle.
#[derive(Debug, Clone, Default)]
pub struct SearchHandle {
    inner: Arc<RwLock<SearchParams>>,
}

impl SearchHandle {
    pub fn new(params: SearchParams) -> Self {
        Self {
            inner: Arc::new(RwLock::new(params)),
        }
    }

    pub fn get(&self) -> SearchParams {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, params: SearchParams) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = params;
    }
}

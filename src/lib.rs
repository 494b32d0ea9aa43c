pub mod commands;
pub mod config;
pub mod ingest;
pub mod models;
pub mod notify;
pub mod render;
pub mod schedule;
pub mod scrapers;
pub mod store;

pub use ingest::{IngestReport, Ingestor, SharedStore};
pub use models::{Listing, ListingError, ListingId, RawListing, Source};
pub use store::ListingStore;

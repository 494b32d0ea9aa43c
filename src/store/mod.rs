use crate::models::{Listing, ListingId};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Listings currently known to the store, kept in admission order
#[derive(Debug, Clone, Default)]
pub struct KnownListings {
    listings: Vec<Listing>,
    ids: HashSet<ListingId>,
}

impl KnownListings {
    pub fn contains(&self, id: &ListingId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    /// Listings newest first; ties keep admission order.
    ///
    /// `limit` keeps only the `limit` most recent entries.
    pub fn read(&self, limit: Option<usize>) -> Vec<Listing> {
        let mut sorted = self.listings.clone();
        sorted.sort_by(|a, b| b.date_added().cmp(&a.date_added()));
        if let Some(limit) = limit {
            sorted.truncate(limit);
        }
        sorted
    }

    fn insert(&mut self, listing: Listing) {
        self.ids.insert(listing.id().clone());
        self.listings.push(listing);
    }

    fn remove(&mut self, id: &ListingId) -> bool {
        if !self.ids.remove(id) {
            return false;
        }
        self.listings.retain(|listing| listing.id() != id);
        true
    }
}

/// Deduplicating collection of listings seen so far.
///
/// `known` is published as an immutable snapshot: every mutation swaps in a
/// new [`KnownListings`] (copy-on-write), so a snapshot taken by a reader is
/// never observed half-updated. Ids in `removed` are never admitted again.
#[derive(Debug, Default)]
pub struct ListingStore {
    known: Arc<KnownListings>,
    removed: HashSet<ListingId>,
    archived: Vec<Vec<Listing>>,
}

impl ListingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Candidates whose id is neither known nor removed, in their original order
    pub fn diff_new(&self, candidates: &[Listing]) -> Vec<Listing> {
        let mut seen = HashSet::new();
        candidates
            .iter()
            .filter(|listing| self.is_admissible(listing.id()))
            .filter(|listing| seen.insert(listing.id().clone()))
            .cloned()
            .collect()
    }

    /// Insert listings not yet known or removed. Returns how many were inserted.
    pub fn admit(&mut self, listings: impl IntoIterator<Item = Listing>) -> usize {
        let fresh: Vec<Listing> = listings
            .into_iter()
            .filter(|listing| self.is_admissible(listing.id()))
            .collect();
        if fresh.is_empty() {
            return 0;
        }

        let known = Arc::make_mut(&mut self.known);
        let mut admitted = 0;
        for listing in fresh {
            // the batch itself may repeat an id
            if known.contains(listing.id()) {
                continue;
            }
            known.insert(listing);
            admitted += 1;
        }

        debug!(admitted, known = known.len(), "admitted listings");
        admitted
    }

    /// Drop a listing and suppress its id for good. Returns whether it was known.
    pub fn remove(&mut self, id: &ListingId) -> bool {
        let was_known = self.known.contains(id) && Arc::make_mut(&mut self.known).remove(id);
        self.removed.insert(id.clone());
        debug!(%id, was_known, "suppressed listing");
        was_known
    }

    /// Archive every known listing, suppress their ids and empty the store.
    /// Returns the size of the archived batch.
    pub fn remove_all(&mut self) -> usize {
        let batch = self.known.read(None);
        let count = batch.len();
        self.removed
            .extend(batch.iter().map(|listing| listing.id().clone()));
        self.archived.push(batch);
        self.known = Arc::new(KnownListings::default());
        debug!(count, "archived all listings");
        count
    }

    pub fn read(&self, limit: Option<usize>) -> Vec<Listing> {
        self.known.read(limit)
    }

    pub fn get_recent(&self, n: usize) -> Vec<Listing> {
        self.read(Some(n))
    }

    pub fn get_all(&self) -> Vec<Listing> {
        self.read(None)
    }

    /// Current `known` set; unaffected by later mutations of the store
    pub fn snapshot(&self) -> Arc<KnownListings> {
        Arc::clone(&self.known)
    }

    pub fn contains(&self, id: &ListingId) -> bool {
        self.known.contains(id)
    }

    pub fn is_removed(&self, id: &ListingId) -> bool {
        self.removed.contains(id)
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    /// Batches archived by [`ListingStore::remove_all`], oldest first
    pub fn archived(&self) -> &[Vec<Listing>] {
        &self.archived
    }

    fn is_admissible(&self, id: &ListingId) -> bool {
        !self.known.contains(id) && !self.removed.contains(id)
    }
}

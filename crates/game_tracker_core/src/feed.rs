//! crates/game_tracker_core/src/feed.rs
//!
//! Accumulates listing pages into one feed that holds each title once.

use crate::domain::Listing;
use crate::title::normalize_title;
use std::collections::{HashSet, VecDeque};

/// Listings unique by normalized title, in first-seen order.
///
/// Page zero starts a fresh feed; any other page appends the titles not yet
/// seen. With a capacity set, the oldest listings are evicted once it is
/// exceeded and their titles may be accepted again later.
#[derive(Debug, Clone, Default)]
pub struct ListingFeed {
    listings: VecDeque<(String, Listing)>,
    keys: HashSet<String>,
    capacity: Option<usize>,
}

impl ListingFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bounded(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    /// Merges one page and returns how many listings were appended.
    pub fn merge_page(&mut self, page: u32, batch: impl IntoIterator<Item = Listing>) -> usize {
        if page == 0 {
            self.reset();
        }

        let mut appended = 0;
        for listing in batch {
            let key = normalize_title(&listing.title);
            if self.keys.insert(key.clone()) {
                self.listings.push_back((key, listing));
                appended += 1;
            }
        }
        self.evict_overflow();
        appended
    }

    pub fn reset(&mut self) {
        self.listings.clear();
        self.keys.clear();
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    pub fn listings(&self) -> impl Iterator<Item = &Listing> {
        self.listings.iter().map(|(_, listing)| listing)
    }

    fn evict_overflow(&mut self) {
        let Some(capacity) = self.capacity else {
            return;
        };
        while self.listings.len() > capacity {
            if let Some((key, _)) = self.listings.pop_front() {
                self.keys.remove(&key);
            }
        }
    }
}

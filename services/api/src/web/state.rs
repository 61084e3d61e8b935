//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the per-user mixed feeds.

use crate::config::Config;
use game_tracker_core::{
    AccountService, DatabaseService, DealsService, LibraryService, ListingFeed,
    ListingNormalizer, PriceResolver, StorefrontService,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub deals: Arc<dyn DealsService>,
    pub storefront: Arc<dyn StorefrontService>,
    pub normalizer: ListingNormalizer,
    pub library: LibraryService,
    pub accounts: AccountService,
    pub feeds: Arc<FeedRegistry>,
}

impl AppState {
    /// Wires the core services on top of the given ports.
    pub fn new(
        config: Arc<Config>,
        db: Arc<dyn DatabaseService>,
        deals: Arc<dyn DealsService>,
        storefront: Arc<dyn StorefrontService>,
    ) -> Self {
        let normalizer = ListingNormalizer::new(PriceResolver::new(storefront.clone()));
        let feeds = Arc::new(FeedRegistry::new(config.feed_max_listings));
        Self {
            library: LibraryService::new(db.clone()),
            accounts: AccountService::new(db),
            config,
            deals,
            storefront,
            normalizer,
            feeds,
        }
    }
}

//=========================================================================================
// FeedRegistry (One Mixed Feed per User)
//=========================================================================================

/// Holds each user's accumulated mixed feed. A user's feed is only touched
/// while its lock is held, so page merges for one user are applied in order.
pub struct FeedRegistry {
    capacity: usize,
    feeds: Mutex<HashMap<i64, Arc<Mutex<ListingFeed>>>>,
}

impl FeedRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            feeds: Mutex::new(HashMap::new()),
        }
    }

    /// The feed of `user_id`, created empty on first use.
    pub async fn feed_for(&self, user_id: i64) -> Arc<Mutex<ListingFeed>> {
        let mut feeds = self.feeds.lock().await;
        feeds
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(ListingFeed::bounded(self.capacity))))
            .clone()
    }

    /// Forgets a user's feed, e.g. when the account is deleted.
    pub async fn remove(&self, user_id: i64) {
        self.feeds.lock().await.remove(&user_id);
    }
}

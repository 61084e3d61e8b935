//! crates/game_tracker_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

//=========================================================================================
// Upstream Records (deals aggregator)
//=========================================================================================

/// A record from the aggregator's deal feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DealRecord {
    pub deal_id: Option<String>,
    pub game_id: Option<String>,
    pub store_id: Option<String>,
    pub title: Option<String>,
    pub thumb: Option<String>,
    pub header_image: Option<String>,
    pub sale_price: Option<String>,
    pub cheapest: Option<String>,
    pub normal_price: Option<String>,
    pub savings: Option<String>,
    pub steam_app_id: Option<String>,
    pub steamworks_url: Option<String>,
}

/// A record from the aggregator's title search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchRecord {
    pub game_id: Option<String>,
    pub steam_app_id: Option<String>,
    pub cheapest: Option<String>,
    pub cheapest_deal_id: Option<String>,
    pub external: Option<String>,
    pub thumb: Option<String>,
    pub header_image: Option<String>,
}

/// The two upstream record shapes a listing can be built from.
#[derive(Debug, Clone, PartialEq)]
pub enum RawRecord {
    Deal(DealRecord),
    Search(SearchRecord),
}

//=========================================================================================
// Listings and Prices
//=========================================================================================

/// A game's deal or search result after normalization. Never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Listing {
    pub deal_id: Option<String>,
    pub game_id: Option<String>,
    pub cheapest_deal_id: Option<String>,
    pub steam_app_id: Option<String>,
    pub store_id: Option<String>,
    pub title: String,
    pub thumb: Option<String>,
    /// Display price: the regional amount when `is_regional_price`, the
    /// aggregator's USD text otherwise.
    pub price: Option<String>,
    pub normal_price: Option<String>,
    pub savings: Option<String>,
    pub is_regional_price: bool,
}

/// Outcome of a regional price lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResolvedPrice {
    /// Amount in the regional currency, in major units. Zero means free.
    Regional(f64),
    /// No regional data; the caller keeps the USD price and converts it.
    Unavailable,
}

impl ResolvedPrice {
    pub fn amount(&self) -> Option<f64> {
        match self {
            ResolvedPrice::Regional(amount) => Some(*amount),
            ResolvedPrice::Unavailable => None,
        }
    }
}

/// The pricing slice of a storefront catalog entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppPricing {
    pub is_free: bool,
    /// Final (sale) price in minor units, e.g. cents.
    pub final_minor: Option<i64>,
}

/// One store's offer for a title.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreOffer {
    pub store_id: String,
    pub deal_id: String,
    pub price: String,
    pub retail_price: String,
    pub savings: String,
}

impl StoreOffer {
    /// Numeric price; unparseable values sort after every real price.
    pub fn price_value(&self) -> f64 {
        self.price.trim().parse::<f64>().unwrap_or(f64::INFINITY)
    }
}

/// Aggregator detail for one game: its descriptive info and every store offer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameDetail {
    pub title: Option<String>,
    pub steam_app_id: Option<String>,
    pub thumb: Option<String>,
    pub offers: Vec<StoreOffer>,
}

/// Parameters of a deals page request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DealsQuery {
    pub page: u32,
    pub page_size: u32,
    pub on_sale: bool,
    pub store_id: Option<String>,
    pub sort_by: Option<String>,
}

//=========================================================================================
// Library
//=========================================================================================

/// Where a game sits in a user's library.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LibraryStatus {
    #[default]
    Playing,
    Wishlist,
    Completed,
}

impl LibraryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LibraryStatus::Playing => "playing",
            LibraryStatus::Wishlist => "wishlist",
            LibraryStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for LibraryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a status string is not one of the known values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown library status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for LibraryStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Legacy clients stored the Portuguese labels.
        match s.trim().to_ascii_lowercase().as_str() {
            "playing" | "jogando" => Ok(LibraryStatus::Playing),
            "wishlist" | "desejo" => Ok(LibraryStatus::Wishlist),
            "completed" | "zerado" => Ok(LibraryStatus::Completed),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

/// A game tracked in a user's library.
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryEntry {
    pub id: i64,
    pub steam_id: String,
    pub title: String,
    pub image: Option<String>,
    pub price: f64,
    pub user_id: i64,
    pub status: LibraryStatus,
    pub created_at: DateTime<Utc>,
}

/// Fields required to insert a library entry.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLibraryEntry {
    pub steam_id: String,
    pub title: String,
    pub image: Option<String>,
    pub price: f64,
    pub user_id: i64,
    pub status: LibraryStatus,
}

/// A partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LibraryEntryUpdate {
    pub price: Option<f64>,
    pub status: Option<LibraryStatus>,
}

//=========================================================================================
// Accounts
//=========================================================================================

// Represents a user - safe to hand back to clients
#[derive(Debug, Clone, PartialEq)]
pub struct UserAccount {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login - contains the password hash
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub account: UserAccount,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

/// Treats empty or whitespace-only upstream strings as absent.
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

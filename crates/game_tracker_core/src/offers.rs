//! crates/game_tracker_core/src/offers.rs
//!
//! Picks the cheapest store offer for a title and works out where the
//! "buy" link should point.

use crate::domain::{non_empty, Listing, StoreOffer};
use crate::presenter::format_price;

pub const DEAL_REDIRECT_URL: &str = "https://www.cheapshark.com/redirect?dealID=";
pub const STOREFRONT_APP_URL: &str = "https://store.steampowered.com/app/";

/// App id used by entries that never came from the storefront.
pub const CUSTOM_APP_ID: &str = "custom";

/// The aggregator's store id for the storefront that supplies regional prices.
pub const STOREFRONT_STORE_ID: &str = "1";

/// The cheapest offer; ties go to the one listed first.
pub fn select_best_offer(offers: &[StoreOffer]) -> Option<&StoreOffer> {
    let mut ranked: Vec<&StoreOffer> = offers.iter().collect();
    // `sort_by` is stable, so equal prices keep their upstream order.
    ranked.sort_by(|a, b| a.price_value().total_cmp(&b.price_value()));
    ranked.first().copied()
}

/// Where the buy link of a listing leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectTarget {
    /// Through the aggregator's redirect for this deal id.
    Deal(String),
    /// Straight to the storefront page of this app id.
    Storefront(String),
    Unavailable,
}

impl RedirectTarget {
    pub fn url(&self) -> String {
        match self {
            RedirectTarget::Deal(deal_id) => format!("{}{}", DEAL_REDIRECT_URL, deal_id),
            RedirectTarget::Storefront(app_id) => format!("{}{}", STOREFRONT_APP_URL, app_id),
            RedirectTarget::Unavailable => "#".to_string(),
        }
    }
}

/// Resolves the buy link in this order: best offer, the listing's deal id,
/// its cheapest deal id, its storefront app id (unless custom), nothing.
pub fn redirect_target(listing: &Listing, offers: &[StoreOffer]) -> RedirectTarget {
    if let Some(best) = select_best_offer(offers) {
        return RedirectTarget::Deal(best.deal_id.clone());
    }
    if let Some(deal_id) = non_empty(&listing.deal_id) {
        return RedirectTarget::Deal(deal_id.to_string());
    }
    if let Some(deal_id) = non_empty(&listing.cheapest_deal_id) {
        return RedirectTarget::Deal(deal_id.to_string());
    }
    match non_empty(&listing.steam_app_id) {
        Some(app_id) if app_id != CUSTOM_APP_ID => RedirectTarget::Storefront(app_id.to_string()),
        _ => RedirectTarget::Unavailable,
    }
}

/// Display price of one offer next to `listing`. The storefront's own offer
/// reuses the listing's regional price when there is one; every other offer is
/// USD and gets converted.
pub fn offer_display_price(offer: &StoreOffer, listing: &Listing) -> String {
    if offer.store_id == STOREFRONT_STORE_ID && listing.is_regional_price {
        return format_price(Some(non_empty(&listing.price).unwrap_or("0")), true);
    }
    format_price(Some(&offer.price), false)
}

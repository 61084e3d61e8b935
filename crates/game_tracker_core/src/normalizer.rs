//! crates/game_tracker_core/src/normalizer.rs
//!
//! Turns raw aggregator records into [`Listing`]s, swapping in the regional
//! price wherever the storefront has one.

use crate::domain::{non_empty, DealRecord, Listing, RawRecord, ResolvedPrice, SearchRecord};
use crate::resolver::PriceResolver;
use futures::future::join_all;

/// The storefront app id a record can be priced by, if any.
///
/// Deal records prefer their direct app id and fall back to the last path
/// segment of the Steamworks URL. Search records only carry the direct id.
pub fn candidate_app_id(record: &RawRecord) -> Option<String> {
    match record {
        RawRecord::Deal(deal) => non_empty(&deal.steam_app_id)
            .map(str::to_string)
            .or_else(|| steamworks_app_id(deal)),
        RawRecord::Search(search) => non_empty(&search.steam_app_id).map(str::to_string),
    }
}

fn steamworks_app_id(deal: &DealRecord) -> Option<String> {
    let url = non_empty(&deal.steamworks_url)?;
    url.rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}

/// Extracts the listing fields of a record without any price resolution.
pub fn base_listing(record: RawRecord) -> Listing {
    match record {
        RawRecord::Deal(deal) => deal_listing(deal),
        RawRecord::Search(search) => search_listing(search),
    }
}

fn deal_listing(deal: DealRecord) -> Listing {
    let price = non_empty(&deal.sale_price)
        .or_else(|| non_empty(&deal.cheapest))
        .map(str::to_string);
    let thumb = non_empty(&deal.thumb)
        .or_else(|| non_empty(&deal.header_image))
        .map(str::to_string);
    Listing {
        title: deal.title.unwrap_or_default(),
        thumb,
        price,
        deal_id: deal.deal_id,
        game_id: deal.game_id,
        cheapest_deal_id: None,
        steam_app_id: deal.steam_app_id,
        store_id: deal.store_id,
        normal_price: deal.normal_price,
        savings: deal.savings,
        is_regional_price: false,
    }
}

fn search_listing(search: SearchRecord) -> Listing {
    let thumb = non_empty(&search.thumb)
        .or_else(|| non_empty(&search.header_image))
        .map(str::to_string);
    Listing {
        title: search.external.unwrap_or_default(),
        thumb,
        price: search.cheapest,
        deal_id: None,
        game_id: search.game_id,
        cheapest_deal_id: search.cheapest_deal_id,
        steam_app_id: search.steam_app_id,
        store_id: None,
        normal_price: None,
        savings: None,
        is_regional_price: false,
    }
}

/// Formats a regional amount the way the listing price field carries it.
fn amount_text(amount: f64) -> String {
    amount.to_string()
}

/// Normalizes batches of records, one storefront lookup per record.
#[derive(Clone)]
pub struct ListingNormalizer {
    resolver: PriceResolver,
}

impl ListingNormalizer {
    pub fn new(resolver: PriceResolver) -> Self {
        Self { resolver }
    }

    /// Normalizes every record concurrently and returns them in input order.
    /// Completes only once every lookup has settled.
    pub async fn normalize(&self, records: Vec<RawRecord>) -> Vec<Listing> {
        join_all(records.into_iter().map(|record| self.normalize_one(record))).await
    }

    pub async fn normalize_one(&self, record: RawRecord) -> Listing {
        let app_id = candidate_app_id(&record);
        let mut listing = base_listing(record);

        let Some(app_id) = app_id else {
            return listing;
        };
        if let ResolvedPrice::Regional(amount) = self.resolver.resolve(&app_id).await {
            listing.price = Some(amount_text(amount));
            listing.is_regional_price = true;
        }
        if listing.steam_app_id.is_none() {
            listing.steam_app_id = Some(app_id);
        }
        listing
    }
}

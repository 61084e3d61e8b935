//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the listing endpoints (deals, search, store
//! offers, descriptions, the mixed feed) and the master definition for the
//! OpenAPI specification.

use crate::web::{
    library, port_error_response, state::AppState, users,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use game_tracker_core::{
    domain::{DealRecord, DealsQuery, RawRecord},
    offers::{offer_display_price, redirect_target, select_best_offer, RedirectTarget, CUSTOM_APP_ID},
    presenter::format_price,
    Listing, PortError, StoreOffer,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::{IntoParams, OpenApi, ToSchema};

/// Sort key the aggregator uses for review scores.
const TOP_RATED_SORT: &str = "Metacritic";

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_deals_handler,
        top_rated_handler,
        store_deals_handler,
        search_handler,
        offers_handler,
        description_handler,
        feed_handler,
        library::list_library_handler,
        library::get_entry_handler,
        library::save_game_handler,
        library::update_game_handler,
        library::delete_game_handler,
        users::register_handler,
        users::login_handler,
        users::update_user_handler,
        users::delete_user_handler,
    ),
    components(
        schemas(
            ListingResponse,
            OfferResponse,
            GameOffersResponse,
            DescriptionResponse,
            FeedResponse,
            library::LibraryEntryResponse,
            library::SaveGameRequest,
            library::SaveGameResponse,
            library::UpdateGameRequest,
            users::RegisterRequest,
            users::LoginRequest,
            users::UpdateUserRequest,
            users::UserResponse,
            crate::web::TextOrNumber,
        )
    ),
    tags(
        (name = "Game Tracker API", description = "Game deals with regional prices and a personal game library.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// A normalized listing. Identifier keys keep the aggregator's spelling.
#[derive(Serialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ListingResponse {
    #[serde(rename = "dealID", skip_serializing_if = "Option::is_none")]
    pub deal_id: Option<String>,
    #[serde(rename = "gameID", skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
    #[serde(rename = "cheapestDealID", skip_serializing_if = "Option::is_none")]
    pub cheapest_deal_id: Option<String>,
    #[serde(rename = "steamAppID", skip_serializing_if = "Option::is_none")]
    pub steam_app_id: Option<String>,
    #[serde(rename = "storeID", skip_serializing_if = "Option::is_none")]
    pub store_id: Option<String>,
    pub title: String,
    pub thumb: Option<String>,
    pub sale_price: Option<String>,
    pub cheapest: Option<String>,
    pub normal_price: Option<String>,
    pub savings: Option<String>,
    pub is_regional_price: bool,
    /// Price rendered for display, e.g. `R$ 36,99` or `R$ 61,44*`.
    pub display_price: String,
}

impl From<Listing> for ListingResponse {
    fn from(listing: Listing) -> Self {
        let display_price = format_price(listing.price.as_deref(), listing.is_regional_price);
        Self {
            deal_id: listing.deal_id,
            game_id: listing.game_id,
            cheapest_deal_id: listing.cheapest_deal_id,
            steam_app_id: listing.steam_app_id,
            store_id: listing.store_id,
            title: listing.title,
            thumb: listing.thumb,
            sale_price: listing.price.clone(),
            cheapest: listing.price,
            normal_price: listing.normal_price,
            savings: listing.savings,
            is_regional_price: listing.is_regional_price,
            display_price,
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct OfferResponse {
    #[serde(rename = "storeID")]
    pub store_id: String,
    #[serde(rename = "dealID")]
    pub deal_id: String,
    pub price: String,
    pub retail_price: String,
    pub savings: String,
    pub display_price: String,
    pub redirect_url: String,
}

#[derive(Serialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GameOffersResponse {
    #[serde(rename = "gameID")]
    pub game_id: Option<String>,
    pub title: Option<String>,
    pub offers: Vec<OfferResponse>,
    #[serde(rename = "bestDealID")]
    pub best_deal_id: Option<String>,
    /// Where the "buy" button should lead; `#` when nothing is known.
    pub best_offer_url: String,
}

#[derive(Serialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DescriptionResponse {
    pub app_id: String,
    pub description: Option<String>,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct FeedResponse {
    pub page: u32,
    /// Listings this page added to the feed.
    pub appended: usize,
    pub listings: Vec<ListingResponse>,
}

#[derive(Deserialize, IntoParams, Debug, Default)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Zero-based page number.
    pub page: Option<u32>,
}

#[derive(Deserialize, IntoParams, Debug)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    pub name: Option<String>,
}

/// What the client knows about the title whose offers it wants.
#[derive(Deserialize, IntoParams, Debug, Default)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct OffersQuery {
    pub game_id: Option<String>,
    pub title: Option<String>,
    pub deal_id: Option<String>,
    pub cheapest_deal_id: Option<String>,
    pub steam_app_id: Option<String>,
    /// Whether `price` is already a regional amount.
    pub regional: Option<bool>,
    pub price: Option<String>,
}

//=========================================================================================
// Helpers
//=========================================================================================

async fn normalized_deals(
    app_state: &AppState,
    query: DealsQuery,
) -> Result<Vec<ListingResponse>, (StatusCode, String)> {
    let records = app_state
        .deals
        .list_deals(&query)
        .await
        .map_err(|e| port_error_response("Failed to fetch deals", e))?;
    let listings = app_state
        .normalizer
        .normalize(records.into_iter().map(RawRecord::Deal).collect())
        .await;
    let regional = listings.iter().filter(|l| l.is_regional_price).count();
    info!(page = query.page, total = listings.len(), regional, "Normalized deals page");
    Ok(listings.into_iter().map(ListingResponse::from).collect())
}

fn on_sale_page(app_state: &AppState, page: u32) -> DealsQuery {
    DealsQuery {
        page,
        page_size: app_state.config.deals_page_size,
        on_sale: true,
        ..Default::default()
    }
}

/// Finds the aggregator game id for an offers request, searching by title
/// when the client has no id.
async fn resolve_game_id(app_state: &AppState, query: &OffersQuery) -> Option<String> {
    if let Some(game_id) = query.game_id.as_deref().filter(|id| !id.trim().is_empty()) {
        return Some(game_id.to_string());
    }
    let title = query.title.as_deref().filter(|t| !t.trim().is_empty())?;
    match app_state.deals.search_games(title, 1).await {
        Ok(records) => records.into_iter().next().and_then(|r| r.game_id),
        Err(e) => {
            warn!("Game id lookup for '{}' failed: {}", title, e);
            None
        }
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// One page of on-sale deals with regional prices.
#[utoipa::path(
    get,
    path = "/games/deals/ofertas",
    params(PageQuery),
    responses(
        (status = 200, description = "Normalized deals", body = [ListingResponse]),
        (status = 502, description = "Deals aggregator unavailable")
    )
)]
pub async fn list_deals_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let deals_query = on_sale_page(&app_state, query.page.unwrap_or(0));
    Ok(Json(normalized_deals(&app_state, deals_query).await?))
}

/// Best-reviewed deals.
#[utoipa::path(
    get,
    path = "/games/deals/top",
    responses(
        (status = 200, description = "Normalized deals sorted by review score", body = [ListingResponse]),
        (status = 502, description = "Deals aggregator unavailable")
    )
)]
pub async fn top_rated_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let deals_query = DealsQuery {
        page: 0,
        page_size: app_state.config.deals_page_size,
        on_sale: false,
        store_id: None,
        sort_by: Some(TOP_RATED_SORT.to_string()),
    };
    Ok(Json(normalized_deals(&app_state, deals_query).await?))
}

/// On-sale deals of a single store.
#[utoipa::path(
    get,
    path = "/games/deals/store/{store_id}",
    params(
        ("store_id" = String, Path, description = "Aggregator store id, e.g. 1 for Steam."),
        PageQuery
    ),
    responses(
        (status = 200, description = "Normalized deals", body = [ListingResponse]),
        (status = 502, description = "Deals aggregator unavailable")
    )
)]
pub async fn store_deals_handler(
    State(app_state): State<Arc<AppState>>,
    Path(store_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut deals_query = on_sale_page(&app_state, query.page.unwrap_or(0));
    deals_query.store_id = Some(store_id);
    Ok(Json(normalized_deals(&app_state, deals_query).await?))
}

/// Search games by title.
#[utoipa::path(
    get,
    path = "/games/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Normalized search results", body = [ListingResponse]),
        (status = 400, description = "Missing name"),
        (status = 502, description = "Deals aggregator unavailable")
    )
)]
pub async fn search_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let name = query
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or((StatusCode::BAD_REQUEST, "Name is required".to_string()))?;

    let records = app_state
        .deals
        .search_games(name, app_state.config.search_limit)
        .await
        .map_err(|e| port_error_response("Search failed", e))?;
    let listings = app_state
        .normalizer
        .normalize(records.into_iter().map(RawRecord::Search).collect())
        .await;

    Ok(Json(
        listings.into_iter().map(ListingResponse::from).collect::<Vec<_>>(),
    ))
}

/// Every store offer for one title, plus where the "buy" link should go.
///
/// Offer lookup failures are logged and answered with an empty offer list; the
/// buy link then falls back to the ids the client sent.
#[utoipa::path(
    get,
    path = "/games/offers",
    params(OffersQuery),
    responses(
        (status = 200, description = "Store offers and best-offer link", body = GameOffersResponse)
    )
)]
pub async fn offers_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<OffersQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let game_id = resolve_game_id(&app_state, &query).await;

    let mut title = query.title.clone();
    let offers: Vec<StoreOffer> = match &game_id {
        Some(id) => match app_state.deals.game_detail(id).await {
            Ok(detail) => {
                title = title.or(detail.title);
                detail.offers
            }
            Err(PortError::NotFound(_)) => Vec::new(),
            Err(e) => {
                warn!(game_id = %id, "Offer lookup failed: {}", e);
                Vec::new()
            }
        },
        None => Vec::new(),
    };

    let listing = Listing {
        deal_id: query.deal_id,
        cheapest_deal_id: query.cheapest_deal_id,
        steam_app_id: query.steam_app_id,
        game_id: game_id.clone(),
        title: title.clone().unwrap_or_default(),
        price: query.price,
        is_regional_price: query.regional.unwrap_or(false),
        ..Default::default()
    };

    let best_deal_id = select_best_offer(&offers).map(|o| o.deal_id.clone());
    let best_offer_url = redirect_target(&listing, &offers).url();
    let offers = offers
        .iter()
        .map(|offer| OfferResponse {
            display_price: offer_display_price(offer, &listing),
            redirect_url: RedirectTarget::Deal(offer.deal_id.clone()).url(),
            store_id: offer.store_id.clone(),
            deal_id: offer.deal_id.clone(),
            price: offer.price.clone(),
            retail_price: offer.retail_price.clone(),
            savings: offer.savings.clone(),
        })
        .collect();

    Ok(Json(GameOffersResponse {
        game_id,
        title,
        offers,
        best_deal_id,
        best_offer_url,
    }))
}

/// Short storefront description; `null` when the storefront has none.
#[utoipa::path(
    get,
    path = "/games/description/{app_id}",
    params(("app_id" = String, Path, description = "Storefront app id.")),
    responses(
        (status = 200, description = "Description, possibly null", body = DescriptionResponse)
    )
)]
pub async fn description_handler(
    State(app_state): State<Arc<AppState>>,
    Path(app_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let description = if app_id == CUSTOM_APP_ID {
        None
    } else {
        app_state
            .storefront
            .app_description(&app_id)
            .await
            .unwrap_or_else(|e| {
                warn!(app_id = %app_id, "Description lookup failed: {}", e);
                None
            })
    };
    Ok(Json(DescriptionResponse { app_id, description }))
}

/// Loads one deals page into the user's mixed feed and returns the whole feed.
/// Page 0 starts the feed over.
#[utoipa::path(
    get,
    path = "/users/{id}/feed",
    params(
        ("id" = i64, Path, description = "User id."),
        PageQuery
    ),
    responses(
        (status = 200, description = "The accumulated feed", body = FeedResponse),
        (status = 404, description = "User not found"),
        (status = 502, description = "Deals aggregator unavailable")
    )
)]
pub async fn feed_handler(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    app_state
        .accounts
        .get(user_id)
        .await
        .map_err(|e| port_error_response("Failed to load user", e))?;

    let page = query.page.unwrap_or(0);
    // Held across the fetch so pages of one user's feed merge in request order.
    let feed = app_state.feeds.feed_for(user_id).await;
    let mut feed = feed.lock().await;

    let records: Vec<DealRecord> = app_state
        .deals
        .list_deals(&on_sale_page(&app_state, page))
        .await
        .map_err(|e| port_error_response("Failed to fetch deals", e))?;
    let listings = app_state
        .normalizer
        .normalize(records.into_iter().map(RawRecord::Deal).collect())
        .await;

    let appended = feed.merge_page(page, listings);
    info!(user_id, page, appended, size = feed.len(), "Merged page into feed");

    Ok(Json(FeedResponse {
        page,
        appended,
        listings: feed.listings().cloned().map(ListingResponse::from).collect(),
    }))
}

//! services/api/src/adapters/cheapshark.rs
//!
//! This module contains the adapter for the CheapShark deals aggregator.
//! It implements the `DealsService` port from the `core` crate.
//!
//! The aggregator sends numbers as strings and leaves fields out freely, so every
//! wire field is optional and accepts either a string or a number.

use async_trait::async_trait;
use game_tracker_core::domain::{DealRecord, DealsQuery, GameDetail, SearchRecord, StoreOffer};
use game_tracker_core::ports::{DealsService, PortError, PortResult};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `DealsService` port over the CheapShark REST API.
#[derive(Clone)]
pub struct CheapSharkAdapter {
    client: Client,
    base_url: String,
}

impl CheapSharkAdapter {
    /// Creates a new `CheapSharkAdapter`. `base_url` has no trailing slash.
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> PortResult<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, ?query, "Calling deals aggregator");
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| PortError::Upstream(format!("deals aggregator: {}", e)))?;
        response
            .json::<T>()
            .await
            .map_err(|e| PortError::Upstream(format!("deals aggregator payload: {}", e)))
    }
}

//=========================================================================================
// "Impure" Wire Record Structs
//=========================================================================================

/// Accepts `"1.99"`, `1.99` or `null`.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct DealWire {
    #[serde(rename = "dealID", deserialize_with = "lenient_string")]
    deal_id: Option<String>,
    #[serde(rename = "gameID", deserialize_with = "lenient_string")]
    game_id: Option<String>,
    #[serde(rename = "storeID", deserialize_with = "lenient_string")]
    store_id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    title: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    thumb: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    header_image: Option<String>,
    #[serde(rename = "salePrice", deserialize_with = "lenient_string")]
    sale_price: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    cheapest: Option<String>,
    #[serde(rename = "normalPrice", deserialize_with = "lenient_string")]
    normal_price: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    savings: Option<String>,
    #[serde(rename = "steamAppID", deserialize_with = "lenient_string")]
    steam_app_id: Option<String>,
    #[serde(rename = "steamworksURL", deserialize_with = "lenient_string")]
    steamworks_url: Option<String>,
}
impl DealWire {
    fn to_domain(self) -> DealRecord {
        DealRecord {
            deal_id: self.deal_id,
            game_id: self.game_id,
            store_id: self.store_id,
            title: self.title,
            thumb: self.thumb,
            header_image: self.header_image,
            sale_price: self.sale_price,
            cheapest: self.cheapest,
            normal_price: self.normal_price,
            savings: self.savings,
            steam_app_id: self.steam_app_id,
            steamworks_url: self.steamworks_url,
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct SearchWire {
    #[serde(rename = "gameID", deserialize_with = "lenient_string")]
    game_id: Option<String>,
    #[serde(rename = "steamAppID", deserialize_with = "lenient_string")]
    steam_app_id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    cheapest: Option<String>,
    #[serde(rename = "cheapestDealID", deserialize_with = "lenient_string")]
    cheapest_deal_id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    external: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    thumb: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    header_image: Option<String>,
}
impl SearchWire {
    fn to_domain(self) -> SearchRecord {
        SearchRecord {
            game_id: self.game_id,
            steam_app_id: self.steam_app_id,
            cheapest: self.cheapest,
            cheapest_deal_id: self.cheapest_deal_id,
            external: self.external,
            thumb: self.thumb,
            header_image: self.header_image,
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct GameInfoWire {
    #[serde(deserialize_with = "lenient_string")]
    title: Option<String>,
    #[serde(rename = "steamAppID", deserialize_with = "lenient_string")]
    steam_app_id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    thumb: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct OfferWire {
    #[serde(rename = "storeID", deserialize_with = "lenient_string")]
    store_id: Option<String>,
    #[serde(rename = "dealID", deserialize_with = "lenient_string")]
    deal_id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    price: Option<String>,
    #[serde(rename = "retailPrice", deserialize_with = "lenient_string")]
    retail_price: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    savings: Option<String>,
}
impl OfferWire {
    fn to_domain(self) -> StoreOffer {
        StoreOffer {
            store_id: self.store_id.unwrap_or_default(),
            deal_id: self.deal_id.unwrap_or_default(),
            price: self.price.unwrap_or_default(),
            retail_price: self.retail_price.unwrap_or_default(),
            savings: self.savings.unwrap_or_default(),
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct GameDetailWire {
    info: GameInfoWire,
    deals: Vec<OfferWire>,
}
impl GameDetailWire {
    fn to_domain(self) -> GameDetail {
        GameDetail {
            title: self.info.title,
            steam_app_id: self.info.steam_app_id,
            thumb: self.info.thumb,
            offers: self
                .deals
                .into_iter()
                // An offer without a deal id cannot be linked to.
                .filter(|d| d.deal_id.as_deref().is_some_and(|id| !id.is_empty()))
                .map(OfferWire::to_domain)
                .collect(),
        }
    }
}

/// Decodes a game detail payload. The aggregator answers unknown ids with an
/// empty array instead of an object.
fn parse_game_detail(game_id: &str, payload: Value) -> PortResult<GameDetail> {
    if !payload.is_object() {
        return Err(PortError::NotFound(format!("Game {} not found", game_id)));
    }
    serde_json::from_value::<GameDetailWire>(payload)
        .map(GameDetailWire::to_domain)
        .map_err(|e| PortError::Upstream(format!("deals aggregator payload: {}", e)))
}

//=========================================================================================
// `DealsService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DealsService for CheapSharkAdapter {
    async fn list_deals(&self, query: &DealsQuery) -> PortResult<Vec<DealRecord>> {
        let mut params = vec![
            ("pageSize", query.page_size.to_string()),
            ("pageNumber", query.page.to_string()),
        ];
        if query.on_sale {
            params.push(("onSale", "1".to_string()));
        }
        if let Some(store_id) = &query.store_id {
            params.push(("storeID", store_id.clone()));
        }
        if let Some(sort_by) = &query.sort_by {
            params.push(("sortBy", sort_by.clone()));
        }

        let deals: Vec<DealWire> = self.get_json("/deals", &params).await?;
        Ok(deals.into_iter().map(DealWire::to_domain).collect())
    }

    async fn search_games(&self, title: &str, limit: u32) -> PortResult<Vec<SearchRecord>> {
        let params = [("title", title.to_string()), ("limit", limit.to_string())];
        let games: Vec<SearchWire> = self.get_json("/games", &params).await?;
        Ok(games.into_iter().map(SearchWire::to_domain).collect())
    }

    async fn game_detail(&self, game_id: &str) -> PortResult<GameDetail> {
        let params = [("id", game_id.to_string())];
        let payload: Value = self.get_json("/games", &params).await?;
        parse_game_detail(game_id, payload)
    }
}

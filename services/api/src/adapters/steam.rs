//! services/api/src/adapters/steam.rs
//!
//! This module contains the adapter for the Steam storefront catalog.
//! It implements the `StorefrontService` port from the `core` crate.

use async_trait::async_trait;
use game_tracker_core::domain::AppPricing;
use game_tracker_core::ports::{PortError, PortResult, StorefrontService};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `StorefrontService` port using `appdetails`.
#[derive(Clone)]
pub struct SteamStoreAdapter {
    client: Client,
    base_url: String,
    country: String,
    language: String,
}

impl SteamStoreAdapter {
    /// Creates a new `SteamStoreAdapter` for one region and language.
    pub fn new(client: Client, base_url: String, country: String, language: String) -> Self {
        Self {
            client,
            base_url,
            country,
            language,
        }
    }

    async fn app_details(&self, params: &[(&str, &str)]) -> PortResult<Value> {
        let url = format!("{}/appdetails", self.base_url);
        debug!(%url, ?params, "Calling storefront");
        self.client
            .get(&url)
            .query(params)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| PortError::Upstream(format!("storefront: {}", e)))?
            .json::<Value>()
            .await
            .map_err(|e| PortError::Upstream(format!("storefront payload: {}", e)))
    }
}

//=========================================================================================
// "Impure" Wire Record Structs
//=========================================================================================

/// One entry of the `appdetails` map, keyed by app id.
#[derive(Deserialize)]
struct AppDetailsEnvelope {
    #[serde(default)]
    success: bool,
    // Steam sends `[]` instead of an object when the filters match nothing.
    #[serde(default)]
    data: Value,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct AppDataWire {
    is_free: Option<bool>,
    price_overview: Option<PriceOverviewWire>,
    short_description: Option<String>,
}

#[derive(Deserialize)]
struct PriceOverviewWire {
    #[serde(rename = "final")]
    final_price: i64,
}

/// Pulls the data object for `app_id` out of an `appdetails` payload.
/// A missing key, `success: false` or a non-object `data` is "no data".
fn app_data(app_id: &str, payload: Value) -> Option<AppDataWire> {
    let mut envelopes: HashMap<String, AppDetailsEnvelope> = serde_json::from_value(payload).ok()?;
    let envelope = envelopes.remove(app_id)?;
    if !envelope.success || !envelope.data.is_object() {
        return None;
    }
    serde_json::from_value(envelope.data).ok()
}

fn parse_app_pricing(app_id: &str, payload: Value) -> Option<AppPricing> {
    let data = app_data(app_id, payload)?;
    Some(AppPricing {
        is_free: data.is_free.unwrap_or(false),
        final_minor: data.price_overview.map(|p| p.final_price),
    })
}

fn parse_description(app_id: &str, payload: Value) -> Option<String> {
    app_data(app_id, payload)?
        .short_description
        .filter(|d| !d.trim().is_empty())
}

//=========================================================================================
// `StorefrontService` Trait Implementation
//=========================================================================================

#[async_trait]
impl StorefrontService for SteamStoreAdapter {
    async fn app_pricing(&self, app_id: &str) -> PortResult<Option<AppPricing>> {
        let payload = self
            .app_details(&[
                ("appids", app_id),
                ("cc", self.country.as_str()),
                ("filters", "price_overview,basic"),
            ])
            .await?;
        Ok(parse_app_pricing(app_id, payload))
    }

    async fn app_description(&self, app_id: &str) -> PortResult<Option<String>> {
        let payload = self
            .app_details(&[("appids", app_id), ("l", self.language.as_str())])
            .await?;
        Ok(parse_description(app_id, payload))
    }
}

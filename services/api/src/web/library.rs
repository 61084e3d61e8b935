//! services/api/src/web/library.rs
//!
//! Handlers for a user's game library.

use crate::web::{port_error_response, state::AppState, TextOrNumber};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use game_tracker_core::{
    domain::LibraryEntryUpdate,
    library::parse_price,
    presenter::format_amount,
    LibraryEntry, LibraryStatus, SaveOutcome, SaveRequest,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

#[derive(Serialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LibraryEntryResponse {
    pub id: i64,
    pub steam_id: String,
    pub title: String,
    pub image: Option<String>,
    pub price: f64,
    pub display_price: String,
    pub status: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

impl From<LibraryEntry> for LibraryEntryResponse {
    fn from(entry: LibraryEntry) -> Self {
        Self {
            id: entry.id,
            display_price: format_amount(entry.price, true),
            steam_id: entry.steam_id,
            title: entry.title,
            image: entry.image,
            price: entry.price,
            status: entry.status.to_string(),
            user_id: entry.user_id,
            created_at: entry.created_at,
        }
    }
}

#[derive(Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SaveGameRequest {
    pub steam_id: Option<TextOrNumber>,
    /// Fallback ids when the listing has no storefront id.
    pub game_id: Option<TextOrNumber>,
    pub deal_id: Option<String>,
    pub title: String,
    pub image: Option<String>,
    pub price: Option<TextOrNumber>,
    pub user_id: i64,
    /// `playing`, `wishlist` or `completed`; defaults to `playing`.
    pub status: Option<String>,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct SaveGameResponse {
    /// `created`, `status_changed` or `unchanged`.
    pub outcome: String,
    pub entry: LibraryEntryResponse,
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct UpdateGameRequest {
    pub price: Option<TextOrNumber>,
    pub status: Option<String>,
}

#[derive(Deserialize, IntoParams, Debug)]
#[into_params(parameter_in = Query)]
pub struct LibraryQuery {
    pub status: Option<String>,
}

#[derive(Serialize, Debug)]
struct MessageResponse {
    message: String,
}

fn parse_status(raw: Option<&str>) -> Result<Option<LibraryStatus>, (StatusCode, String)> {
    raw.filter(|s| !s.trim().is_empty())
        .map(|s| s.parse::<LibraryStatus>())
        .transpose()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))
}

/// The id stored with a new entry: the storefront id, else the aggregator's
/// game id, else its deal id.
fn entry_steam_id(
    steam_id: Option<TextOrNumber>,
    game_id: Option<TextOrNumber>,
    deal_id: Option<String>,
) -> Option<String> {
    [steam_id.map(TextOrNumber::into_text), game_id.map(TextOrNumber::into_text), deal_id]
        .into_iter()
        .flatten()
        .find(|id| !id.trim().is_empty())
}

/// Lists a user's library, newest first.
#[utoipa::path(
    get,
    path = "/games/{id}",
    params(
        ("id" = i64, Path, description = "User id."),
        LibraryQuery
    ),
    responses(
        (status = 200, description = "Library entries", body = [LibraryEntryResponse]),
        (status = 400, description = "Unknown status filter")
    )
)]
pub async fn list_library_handler(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Query(query): Query<LibraryQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let status = parse_status(query.status.as_deref())?;
    let entries = app_state
        .library
        .list(user_id, status)
        .await
        .map_err(|e| port_error_response("Failed to load library", e))?;
    Ok(Json(
        entries.into_iter().map(LibraryEntryResponse::from).collect::<Vec<_>>(),
    ))
}

#[utoipa::path(
    get,
    path = "/games/entry/{id}",
    params(("id" = i64, Path, description = "Library entry id.")),
    responses(
        (status = 200, description = "The entry", body = LibraryEntryResponse),
        (status = 404, description = "Entry not found")
    )
)]
pub async fn get_entry_handler(
    State(app_state): State<Arc<AppState>>,
    Path(entry_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let entry = app_state
        .library
        .get(entry_id)
        .await
        .map_err(|e| port_error_response("Failed to load library entry", e))?;
    Ok(Json(LibraryEntryResponse::from(entry)))
}

/// Adds a game to a library. A game already there only has its status moved.
#[utoipa::path(
    post,
    path = "/games",
    request_body = SaveGameRequest,
    responses(
        (status = 201, description = "Game added", body = SaveGameResponse),
        (status = 200, description = "Game already saved; status updated or unchanged", body = SaveGameResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "User not found")
    )
)]
pub async fn save_game_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<SaveGameRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let status = parse_status(req.status.as_deref())?.unwrap_or_default();
    let request = SaveRequest {
        user_id: req.user_id,
        steam_id: entry_steam_id(req.steam_id, req.game_id, req.deal_id),
        title: req.title,
        image: req.image,
        price: req.price.map(|p| parse_price(&p.into_text())).unwrap_or(0.0),
        status,
    };

    let outcome = app_state
        .library
        .save(request)
        .await
        .map_err(|e| port_error_response("Failed to save game", e))?;

    let code = match outcome {
        SaveOutcome::Created(_) => StatusCode::CREATED,
        _ => StatusCode::OK,
    };
    Ok((
        code,
        Json(SaveGameResponse {
            outcome: outcome.kind().to_string(),
            entry: LibraryEntryResponse::from(outcome.entry().clone()),
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/games/{id}",
    params(("id" = i64, Path, description = "Library entry id.")),
    request_body = UpdateGameRequest,
    responses(
        (status = 200, description = "Entry updated", body = LibraryEntryResponse),
        (status = 400, description = "Invalid price or status"),
        (status = 404, description = "Entry not found")
    )
)]
pub async fn update_game_handler(
    State(app_state): State<Arc<AppState>>,
    Path(entry_id): Path<i64>,
    Json(req): Json<UpdateGameRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let price = match req.price {
        Some(TextOrNumber::Number(n)) => Some(n),
        Some(TextOrNumber::Text(text)) => Some(text.trim().parse::<f64>().map_err(|_| {
            (StatusCode::BAD_REQUEST, format!("Invalid price: {}", text))
        })?),
        None => None,
    };
    let update = LibraryEntryUpdate {
        price,
        status: parse_status(req.status.as_deref())?,
    };

    let entry = app_state
        .library
        .update(entry_id, update)
        .await
        .map_err(|e| port_error_response("Failed to update game", e))?;
    Ok(Json(LibraryEntryResponse::from(entry)))
}

#[utoipa::path(
    delete,
    path = "/games/{id}",
    params(("id" = i64, Path, description = "Library entry id.")),
    responses(
        (status = 200, description = "Entry removed"),
        (status = 404, description = "Entry not found")
    )
)]
pub async fn delete_game_handler(
    State(app_state): State<Arc<AppState>>,
    Path(entry_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    app_state
        .library
        .delete(entry_id)
        .await
        .map_err(|e| port_error_response("Failed to delete game", e))?;
    Ok(Json(MessageResponse {
        message: "Game removed from library".to_string(),
    }))
}

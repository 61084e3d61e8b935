pub mod library;
pub mod rest;
pub mod state;
pub mod users;

use axum::{
    http::StatusCode,
    routing::{get, post, put},
    Router,
};
use game_tracker_core::PortError;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, warn};
use utoipa::ToSchema;

use crate::web::state::AppState;

pub use library::{
    delete_game_handler, get_entry_handler, list_library_handler, save_game_handler,
    update_game_handler,
};
pub use rest::{
    description_handler, feed_handler, list_deals_handler, offers_handler, search_handler,
    store_deals_handler, top_rated_handler,
};
pub use users::{delete_user_handler, login_handler, register_handler, update_user_handler};

/// Builds the API router. Layers (CORS, tracing) and Swagger UI are added by the binary.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Listings
        .route("/games/search", get(search_handler))
        .route("/games/deals/ofertas", get(list_deals_handler))
        .route("/games/deals/top", get(top_rated_handler))
        .route("/games/deals/store/{store_id}", get(store_deals_handler))
        .route("/games/offers", get(offers_handler))
        .route("/games/description/{app_id}", get(description_handler))
        // Library
        .route("/games", post(save_game_handler))
        .route("/games/entry/{id}", get(get_entry_handler))
        .route(
            "/games/{id}",
            get(list_library_handler)
                .put(update_game_handler)
                .delete(delete_game_handler),
        )
        // Accounts
        .route("/users", post(register_handler))
        .route("/login", post(login_handler))
        .route(
            "/users/{id}",
            put(update_user_handler).delete(delete_user_handler),
        )
        .route("/users/{id}/feed", get(feed_handler))
        .with_state(state)
}

/// Maps a port failure to the HTTP status and message sent to the client.
pub(crate) fn port_error_response(context: &str, e: PortError) -> (StatusCode, String) {
    match e {
        PortError::Validation(message) => (StatusCode::BAD_REQUEST, message),
        PortError::Conflict(message) => (StatusCode::CONFLICT, message),
        PortError::NotFound(message) => (StatusCode::NOT_FOUND, message),
        PortError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
        PortError::Upstream(message) => {
            warn!("{}: {}", context, message);
            (StatusCode::BAD_GATEWAY, format!("{}: upstream unavailable", context))
        }
        PortError::Unexpected(message) => {
            error!("{}: {}", context, message);
            (StatusCode::INTERNAL_SERVER_ERROR, context.to_string())
        }
    }
}

/// A JSON value clients send either as text or as a number (`"9.99"` / `9.99`).
#[derive(Deserialize, ToSchema, Debug, Clone)]
#[serde(untagged)]
pub enum TextOrNumber {
    Number(f64),
    Text(String),
}

impl TextOrNumber {
    pub fn into_text(self) -> String {
        match self {
            TextOrNumber::Number(n) => n.to_string(),
            TextOrNumber::Text(s) => s,
        }
    }
}

//! crates/game_tracker_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! The deals aggregator, the storefront catalog and the relational store all sit
//! behind these traits so the pricing pipeline never touches HTTP or SQL directly.

use async_trait::async_trait;
use crate::domain::{
    AppPricing, DealRecord, DealsQuery, GameDetail, LibraryEntry, LibraryEntryUpdate,
    NewLibraryEntry, NewUser, SearchRecord, UserAccount, UserCredentials, UserUpdate,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Upstream service unavailable: {0}")]
    Upstream(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The third-party deals aggregator.
#[async_trait]
pub trait DealsService: Send + Sync {
    /// One page of deals, in upstream order.
    async fn list_deals(&self, query: &DealsQuery) -> PortResult<Vec<DealRecord>>;

    /// Games whose title matches `title`, at most `limit` of them.
    async fn search_games(&self, title: &str, limit: u32) -> PortResult<Vec<SearchRecord>>;

    /// Every store offer for one aggregator game id.
    async fn game_detail(&self, game_id: &str) -> PortResult<GameDetail>;
}

/// The storefront catalog used for regional prices.
#[async_trait]
pub trait StorefrontService: Send + Sync {
    /// Pricing for `app_id` in the configured region. `Ok(None)` means the
    /// storefront has no data for the id (missing key or `success: false`).
    async fn app_pricing(&self, app_id: &str) -> PortResult<Option<AppPricing>>;

    /// Short description in the configured language.
    async fn app_description(&self, app_id: &str) -> PortResult<Option<String>>;
}

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Library ---
    /// A user's entries, newest (highest id) first.
    async fn list_library(&self, user_id: i64) -> PortResult<Vec<LibraryEntry>>;

    async fn get_library_entry(&self, entry_id: i64) -> PortResult<LibraryEntry>;

    async fn create_library_entry(&self, entry: NewLibraryEntry) -> PortResult<LibraryEntry>;

    async fn update_library_entry(
        &self,
        entry_id: i64,
        update: LibraryEntryUpdate,
    ) -> PortResult<LibraryEntry>;

    async fn delete_library_entry(&self, entry_id: i64) -> PortResult<()>;

    // --- User Management ---
    async fn create_user(&self, user: NewUser) -> PortResult<UserAccount>;

    async fn get_user(&self, user_id: i64) -> PortResult<UserAccount>;

    async fn find_user_by_name(&self, name: &str) -> PortResult<Option<UserCredentials>>;

    /// Every user holding `name` or `email`, used for uniqueness checks.
    async fn find_users_by_name_or_email(
        &self,
        name: &str,
        email: &str,
    ) -> PortResult<Vec<UserAccount>>;

    async fn update_user(&self, user_id: i64, update: UserUpdate) -> PortResult<UserAccount>;

    /// Removes the user and, by cascade, every library entry they own.
    async fn delete_user(&self, user_id: i64) -> PortResult<()>;
}

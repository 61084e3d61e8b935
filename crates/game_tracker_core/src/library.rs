//! crates/game_tracker_core/src/library.rs
//!
//! A user's tracked games. Saving a game that is already in the library only
//! moves it to the new status, so each title appears once per user.

use crate::domain::{LibraryEntry, LibraryEntryUpdate, LibraryStatus, NewLibraryEntry};
use crate::ports::{DatabaseService, PortError, PortResult};
use crate::title::normalize_title;
use std::sync::Arc;
use tracing::info;

/// Storefront id recorded when the client had none.
pub const UNKNOWN_STEAM_ID: &str = "0";

/// A request to put a game in a user's library.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    pub user_id: i64,
    pub steam_id: Option<String>,
    pub title: String,
    pub image: Option<String>,
    pub price: f64,
    pub status: LibraryStatus,
}

/// What a save did to the library.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Created(LibraryEntry),
    StatusChanged(LibraryEntry),
    /// Already present with the requested status.
    Unchanged(LibraryEntry),
}

impl SaveOutcome {
    pub fn entry(&self) -> &LibraryEntry {
        match self {
            SaveOutcome::Created(entry)
            | SaveOutcome::StatusChanged(entry)
            | SaveOutcome::Unchanged(entry) => entry,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SaveOutcome::Created(_) => "created",
            SaveOutcome::StatusChanged(_) => "status_changed",
            SaveOutcome::Unchanged(_) => "unchanged",
        }
    }
}

/// Parses a client-supplied price; anything unparseable counts as zero.
pub fn parse_price(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite())
        .unwrap_or(0.0)
}

fn known_steam_id(steam_id: &str) -> Option<&str> {
    let steam_id = steam_id.trim();
    (!steam_id.is_empty() && steam_id != UNKNOWN_STEAM_ID).then_some(steam_id)
}

/// Whether `entry` and a request refer to the same game.
fn same_game(entry: &LibraryEntry, title_key: &str, steam_id: Option<&str>) -> bool {
    if normalize_title(&entry.title) == title_key {
        return true;
    }
    match (known_steam_id(&entry.steam_id), steam_id) {
        (Some(saved), Some(requested)) => saved == requested,
        _ => false,
    }
}

#[derive(Clone)]
pub struct LibraryService {
    db: Arc<dyn DatabaseService>,
}

impl LibraryService {
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self { db }
    }

    /// Entries of `user_id`, newest first, optionally limited to one status.
    pub async fn list(
        &self,
        user_id: i64,
        status: Option<LibraryStatus>,
    ) -> PortResult<Vec<LibraryEntry>> {
        let entries = self.db.list_library(user_id).await?;
        Ok(match status {
            Some(status) => entries.into_iter().filter(|e| e.status == status).collect(),
            None => entries,
        })
    }

    pub async fn get(&self, entry_id: i64) -> PortResult<LibraryEntry> {
        self.db.get_library_entry(entry_id).await
    }

    pub async fn save(&self, request: SaveRequest) -> PortResult<SaveOutcome> {
        let title = request.title.trim();
        if title.is_empty() {
            return Err(PortError::Validation("Title is required".to_string()));
        }
        if request.price < 0.0 {
            return Err(PortError::Validation("Price cannot be negative".to_string()));
        }
        self.db.get_user(request.user_id).await?;

        let title_key = normalize_title(title);
        let steam_id = request.steam_id.as_deref().and_then(known_steam_id);
        let existing = self
            .db
            .list_library(request.user_id)
            .await?
            .into_iter()
            .find(|entry| same_game(entry, &title_key, steam_id));

        if let Some(entry) = existing {
            if entry.status == request.status {
                return Ok(SaveOutcome::Unchanged(entry));
            }
            info!(
                entry_id = entry.id,
                "Moving '{}' from {} to {}", entry.title, entry.status, request.status
            );
            let updated = self
                .db
                .update_library_entry(
                    entry.id,
                    LibraryEntryUpdate { price: None, status: Some(request.status) },
                )
                .await?;
            return Ok(SaveOutcome::StatusChanged(updated));
        }

        let created = self
            .db
            .create_library_entry(NewLibraryEntry {
                steam_id: steam_id.unwrap_or(UNKNOWN_STEAM_ID).to_string(),
                title: title.to_string(),
                image: request.image,
                price: request.price,
                user_id: request.user_id,
                status: request.status,
            })
            .await?;
        info!(entry_id = created.id, user_id = created.user_id, "Saved '{}'", created.title);
        Ok(SaveOutcome::Created(created))
    }

    pub async fn update(&self, entry_id: i64, update: LibraryEntryUpdate) -> PortResult<LibraryEntry> {
        if update.price.is_some_and(|p| p < 0.0 || !p.is_finite()) {
            return Err(PortError::Validation("Price must be a non-negative number".to_string()));
        }
        self.db.update_library_entry(entry_id, update).await
    }

    pub async fn delete(&self, entry_id: i64) -> PortResult<()> {
        self.db.delete_library_entry(entry_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewUser;
    use crate::testing::InMemoryDb;

    async fn setup() -> (Arc<InMemoryDb>, LibraryService, i64) {
        let db = Arc::new(InMemoryDb::default());
        let user = db
            .create_user(NewUser {
                name: "gabe".into(),
                email: "gabe@example.com".into(),
                password_hash: "hash".into(),
            })
            .await
            .unwrap();
        let service = LibraryService::new(db.clone());
        (db, service, user.id)
    }

    fn request(user_id: i64, title: &str, status: LibraryStatus) -> SaveRequest {
        SaveRequest {
            user_id,
            steam_id: None,
            title: title.to_string(),
            image: None,
            price: 9.99,
            status,
        }
    }

    #[tokio::test]
    async fn saving_existing_title_changes_status_instead_of_duplicating() {
        let (db, service, user_id) = setup().await;
        let first = service.save(request(user_id, "Half-Life 2", LibraryStatus::Wishlist)).await.unwrap();
        assert_eq!(first.kind(), "created");

        let second = service
            .save(request(user_id, "half life 2", LibraryStatus::Completed))
            .await
            .unwrap();
        assert_eq!(second.kind(), "status_changed");
        assert_eq!(second.entry().id, first.entry().id);
        assert_eq!(second.entry().status, LibraryStatus::Completed);
        assert_eq!(db.entry_count(), 1);

        let third = service
            .save(request(user_id, "HALF-LIFE 2", LibraryStatus::Completed))
            .await
            .unwrap();
        assert!(matches!(third, SaveOutcome::Unchanged(_)));
        assert_eq!(db.entry_count(), 1);
    }

    #[tokio::test]
    async fn matching_steam_id_counts_as_same_game() {
        let (db, service, user_id) = setup().await;
        let mut first = request(user_id, "Portal 2", LibraryStatus::Playing);
        first.steam_id = Some("620".into());
        service.save(first).await.unwrap();

        let mut renamed = request(user_id, "Portal 2: Complete Edition", LibraryStatus::Wishlist);
        renamed.steam_id = Some("620".into());
        let outcome = service.save(renamed).await.unwrap();
        assert_eq!(outcome.kind(), "status_changed");
        assert_eq!(db.entry_count(), 1);
    }

    #[tokio::test]
    async fn unknown_steam_ids_never_match() {
        let (db, service, user_id) = setup().await;
        service.save(request(user_id, "Game A", LibraryStatus::Playing)).await.unwrap();
        service.save(request(user_id, "Game B", LibraryStatus::Playing)).await.unwrap();
        assert_eq!(db.entry_count(), 2);

        let entries = service.list(user_id, None).await.unwrap();
        assert_eq!(entries[0].title, "Game B");
        assert_eq!(entries[0].steam_id, UNKNOWN_STEAM_ID);
    }

    #[tokio::test]
    async fn list_filters_by_status() {
        let (_db, service, user_id) = setup().await;
        service.save(request(user_id, "Celeste", LibraryStatus::Completed)).await.unwrap();
        service.save(request(user_id, "Hades", LibraryStatus::Wishlist)).await.unwrap();

        let wishlist = service.list(user_id, Some(LibraryStatus::Wishlist)).await.unwrap();
        assert_eq!(wishlist.len(), 1);
        assert_eq!(wishlist[0].title, "Hades");
    }

    #[tokio::test]
    async fn invalid_saves_are_rejected() {
        let (_db, service, user_id) = setup().await;
        let blank = service.save(request(user_id, "   ", LibraryStatus::Playing)).await;
        assert!(matches!(blank, Err(PortError::Validation(_))));

        let orphan = service.save(request(user_id + 100, "Celeste", LibraryStatus::Playing)).await;
        assert!(matches!(orphan, Err(PortError::NotFound(_))));
    }

    #[tokio::test]
    async fn update_and_delete_missing_entries_are_not_found() {
        let (_db, service, _user_id) = setup().await;
        let update = service
            .update(42, LibraryEntryUpdate { price: Some(1.0), status: None })
            .await;
        assert!(matches!(update, Err(PortError::NotFound(_))));
        assert!(matches!(service.delete(42).await, Err(PortError::NotFound(_))));
        assert!(matches!(service.get(42).await, Err(PortError::NotFound(_))));

        let negative = service
            .update(42, LibraryEntryUpdate { price: Some(-1.0), status: None })
            .await;
        assert!(matches!(negative, Err(PortError::Validation(_))));
    }

    #[test]
    fn unparseable_prices_become_zero() {
        assert_eq!(parse_price("19.99"), 19.99);
        assert_eq!(parse_price("abc"), 0.0);
        assert_eq!(parse_price(""), 0.0);
    }
}

//! In-memory port implementations shared by the unit tests.

use crate::domain::{
    AppPricing, DealRecord, DealsQuery, GameDetail, LibraryEntry, LibraryEntryUpdate, NewLibraryEntry, NewUser, UserAccount,
    SearchRecord, UserCredentials, UserUpdate,
};
use crate::ports::{DatabaseService, DealsService, PortError, PortResult, StorefrontService};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{Barrier, Notify};

#[derive(Debug, Clone)]
pub enum StorefrontReply {
    Pricing(AppPricing),
    NoData,
    Fail,
}

#[derive(Default)]
pub struct FakeStorefront {
    replies: HashMap<String, StorefrontReply>,
    descriptions: HashMap<String, String>,
    barrier: Option<Arc<Barrier>>,
    pub calls: AtomicUsize,
}

impl FakeStorefront {
    pub fn with(mut self, app_id: &str, reply: StorefrontReply) -> Self {
        self.replies.insert(app_id.to_string(), reply);
        self
    }

    pub fn with_description(mut self, app_id: &str, description: &str) -> Self {
        self.descriptions.insert(app_id.to_string(), description.to_string());
        self
    }

    /// Every lookup waits on `barrier`, so a batch only finishes when all of
    /// its lookups are in flight at the same time.
    pub fn with_barrier(mut self, barrier: Arc<Barrier>) -> Self {
        self.barrier = Some(barrier);
        self
    }
}

#[async_trait]
impl StorefrontService for FakeStorefront {
    async fn app_pricing(&self, app_id: &str) -> PortResult<Option<AppPricing>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        match self.replies.get(app_id) {
            Some(StorefrontReply::Pricing(pricing)) => Ok(Some(pricing.clone())),
            Some(StorefrontReply::Fail) => Err(PortError::Upstream("connection reset".into())),
            Some(StorefrontReply::NoData) | None => Ok(None),
        }
    }

    async fn app_description(&self, app_id: &str) -> PortResult<Option<String>> {
        Ok(self.descriptions.get(app_id).cloned())
    }
}

/// Canned aggregator responses. Pages not registered are empty; games not
/// registered are not found.
#[derive(Default)]
pub struct FakeDeals {
    pages: HashMap<u32, Vec<DealRecord>>,
    search_results: Vec<SearchRecord>,
    details: HashMap<String, GameDetail>,
    failing: bool,
    gate: Option<PageGate>,
    pub queries: Mutex<Vec<DealsQuery>>,
}

struct PageGate {
    page: u32,
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl FakeDeals {
    pub fn with_page(mut self, page: u32, deals: Vec<DealRecord>) -> Self {
        self.pages.insert(page, deals);
        self
    }

    pub fn with_search_results(mut self, results: Vec<SearchRecord>) -> Self {
        self.search_results = results;
        self
    }

    pub fn with_detail(mut self, game_id: &str, detail: GameDetail) -> Self {
        self.details.insert(game_id.to_string(), detail);
        self
    }

    /// A fetch of `page` signals `entered`, then waits for `release`.
    pub fn with_gate(mut self, page: u32, entered: Arc<Notify>, release: Arc<Notify>) -> Self {
        self.gate = Some(PageGate { page, entered, release });
        self
    }

    /// Every call fails as if the aggregator were down.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    fn check_up(&self) -> PortResult<()> {
        if self.failing {
            return Err(PortError::Upstream("aggregator returned 503".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl DealsService for FakeDeals {
    async fn list_deals(&self, query: &DealsQuery) -> PortResult<Vec<DealRecord>> {
        self.check_up()?;
        self.queries.lock().unwrap().push(query.clone());
        if let Some(gate) = self.gate.as_ref().filter(|g| g.page == query.page) {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        Ok(self.pages.get(&query.page).cloned().unwrap_or_default())
    }

    async fn search_games(&self, _title: &str, limit: u32) -> PortResult<Vec<SearchRecord>> {
        self.check_up()?;
        Ok(self.search_results.iter().take(limit as usize).cloned().collect())
    }

    async fn game_detail(&self, game_id: &str) -> PortResult<GameDetail> {
        self.check_up()?;
        self.details
            .get(game_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Game {} not found", game_id)))
    }
}

#[derive(Default)]
struct Tables {
    users: Vec<UserCredentials>,
    entries: Vec<LibraryEntry>,
    next_user_id: i64,
    next_entry_id: i64,
}

#[derive(Default)]
pub struct InMemoryDb {
    tables: Mutex<Tables>,
}

impl InMemoryDb {
    pub fn entry_count(&self) -> usize {
        self.tables.lock().unwrap().entries.len()
    }
}

#[async_trait]
impl DatabaseService for InMemoryDb {
    async fn list_library(&self, user_id: i64) -> PortResult<Vec<LibraryEntry>> {
        let tables = self.tables.lock().unwrap();
        let mut entries: Vec<_> =
            tables.entries.iter().filter(|e| e.user_id == user_id).cloned().collect();
        entries.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(entries)
    }

    async fn get_library_entry(&self, entry_id: i64) -> PortResult<LibraryEntry> {
        let tables = self.tables.lock().unwrap();
        tables
            .entries
            .iter()
            .find(|e| e.id == entry_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Library entry {} not found", entry_id)))
    }

    async fn create_library_entry(&self, entry: NewLibraryEntry) -> PortResult<LibraryEntry> {
        let mut tables = self.tables.lock().unwrap();
        tables.next_entry_id += 1;
        let created = LibraryEntry {
            id: tables.next_entry_id,
            steam_id: entry.steam_id,
            title: entry.title,
            image: entry.image,
            price: entry.price,
            user_id: entry.user_id,
            status: entry.status,
            created_at: Utc::now(),
        };
        tables.entries.push(created.clone());
        Ok(created)
    }

    async fn update_library_entry(
        &self,
        entry_id: i64,
        update: LibraryEntryUpdate,
    ) -> PortResult<LibraryEntry> {
        let mut tables = self.tables.lock().unwrap();
        let entry = tables
            .entries
            .iter_mut()
            .find(|e| e.id == entry_id)
            .ok_or_else(|| PortError::NotFound(format!("Library entry {} not found", entry_id)))?;
        if let Some(price) = update.price {
            entry.price = price;
        }
        if let Some(status) = update.status {
            entry.status = status;
        }
        Ok(entry.clone())
    }

    async fn delete_library_entry(&self, entry_id: i64) -> PortResult<()> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.entries.len();
        tables.entries.retain(|e| e.id != entry_id);
        if tables.entries.len() == before {
            return Err(PortError::NotFound(format!("Library entry {} not found", entry_id)));
        }
        Ok(())
    }

    async fn create_user(&self, user: NewUser) -> PortResult<UserAccount> {
        let mut tables = self.tables.lock().unwrap();
        tables.next_user_id += 1;
        let account = UserAccount {
            id: tables.next_user_id,
            name: user.name,
            email: user.email,
            created_at: Utc::now(),
        };
        tables.users.push(UserCredentials {
            account: account.clone(),
            password_hash: user.password_hash,
        });
        Ok(account)
    }

    async fn get_user(&self, user_id: i64) -> PortResult<UserAccount> {
        let tables = self.tables.lock().unwrap();
        tables
            .users
            .iter()
            .find(|u| u.account.id == user_id)
            .map(|u| u.account.clone())
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }

    async fn find_user_by_name(&self, name: &str) -> PortResult<Option<UserCredentials>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().find(|u| u.account.name == name).cloned())
    }

    async fn find_users_by_name_or_email(
        &self,
        name: &str,
        email: &str,
    ) -> PortResult<Vec<UserAccount>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .users
            .iter()
            .filter(|u| u.account.name == name || u.account.email == email)
            .map(|u| u.account.clone())
            .collect())
    }

    async fn update_user(&self, user_id: i64, update: UserUpdate) -> PortResult<UserAccount> {
        let mut tables = self.tables.lock().unwrap();
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.account.id == user_id)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?;
        if let Some(name) = update.name {
            user.account.name = name;
        }
        if let Some(email) = update.email {
            user.account.email = email;
        }
        if let Some(hash) = update.password_hash {
            user.password_hash = hash;
        }
        Ok(user.account.clone())
    }

    async fn delete_user(&self, user_id: i64) -> PortResult<()> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.users.len();
        tables.users.retain(|u| u.account.id != user_id);
        if tables.users.len() == before {
            return Err(PortError::NotFound(format!("User {} not found", user_id)));
        }
        tables.entries.retain(|e| e.user_id != user_id);
        Ok(())
    }
}

//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use game_tracker_core::domain::{
    LibraryEntry, LibraryEntryUpdate, LibraryStatus, NewLibraryEntry, NewUser, UserAccount,
    UserCredentials, UserUpdate,
};
use game_tracker_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::{FromRow, PgPool};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Maps a unique-constraint violation to a conflict and everything else to unexpected.
fn write_error(e: sqlx::Error) -> PortError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            PortError::Conflict("User name or email already in use".to_string())
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            PortError::NotFound("Referenced user does not exist".to_string())
        }
        _ => PortError::Unexpected(e.to_string()),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at";
const ENTRY_COLUMNS: &str = "id, steam_id, title, image, price, status, user_id, created_at";

#[derive(FromRow)]
struct UserRecord {
    id: i64,
    name: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_account(self) -> UserAccount {
        UserAccount {
            id: self.id,
            name: self.name,
            email: self.email,
            created_at: self.created_at,
        }
    }

    fn to_credentials(self) -> UserCredentials {
        let password_hash = self.password_hash.clone();
        UserCredentials {
            account: self.to_account(),
            password_hash,
        }
    }
}

#[derive(FromRow)]
struct LibraryEntryRecord {
    id: i64,
    steam_id: String,
    title: String,
    image: Option<String>,
    price: f64,
    status: String,
    user_id: i64,
    created_at: DateTime<Utc>,
}
impl LibraryEntryRecord {
    fn to_domain(self) -> PortResult<LibraryEntry> {
        let status = self
            .status
            .parse::<LibraryStatus>()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(LibraryEntry {
            id: self.id,
            steam_id: self.steam_id,
            title: self.title,
            image: self.image,
            price: self.price,
            user_id: self.user_id,
            status,
            created_at: self.created_at,
        })
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn list_library(&self, user_id: i64) -> PortResult<Vec<LibraryEntry>> {
        let records = sqlx::query_as::<_, LibraryEntryRecord>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM library_entries WHERE user_id = $1 ORDER BY id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn get_library_entry(&self, entry_id: i64) -> PortResult<LibraryEntry> {
        let record = sqlx::query_as::<_, LibraryEntryRecord>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM library_entries WHERE id = $1"
        ))
        .bind(entry_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Library entry {} not found", entry_id))
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;
        record.to_domain()
    }

    async fn create_library_entry(&self, entry: NewLibraryEntry) -> PortResult<LibraryEntry> {
        let record = sqlx::query_as::<_, LibraryEntryRecord>(&format!(
            "INSERT INTO library_entries (steam_id, title, image, price, status, user_id) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {ENTRY_COLUMNS}"
        ))
        .bind(&entry.steam_id)
        .bind(&entry.title)
        .bind(&entry.image)
        .bind(entry.price)
        .bind(entry.status.as_str())
        .bind(entry.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(write_error)?;
        record.to_domain()
    }

    async fn update_library_entry(
        &self,
        entry_id: i64,
        update: LibraryEntryUpdate,
    ) -> PortResult<LibraryEntry> {
        let record = sqlx::query_as::<_, LibraryEntryRecord>(&format!(
            "UPDATE library_entries SET price = COALESCE($1, price), status = COALESCE($2, status) \
             WHERE id = $3 RETURNING {ENTRY_COLUMNS}"
        ))
        .bind(update.price)
        .bind(update.status.map(|s| s.as_str()))
        .bind(entry_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?
        .ok_or_else(|| PortError::NotFound(format!("Library entry {} not found", entry_id)))?;
        record.to_domain()
    }

    async fn delete_library_entry(&self, entry_id: i64) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM library_entries WHERE id = $1")
            .bind(entry_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Library entry {} not found", entry_id)));
        }
        Ok(())
    }

    async fn create_user(&self, user: NewUser) -> PortResult<UserAccount> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(write_error)?;
        Ok(record.to_account())
    }

    async fn get_user(&self, user_id: i64) -> PortResult<UserAccount> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", user_id)),
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(record.to_account())
    }

    async fn find_user_by_name(&self, name: &str) -> PortResult<Option<UserCredentials>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE name = $1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.map(UserRecord::to_credentials))
    }

    async fn find_users_by_name_or_email(
        &self,
        name: &str,
        email: &str,
    ) -> PortResult<Vec<UserAccount>> {
        let records = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE name = $1 OR email = $2"
        ))
        .bind(name)
        .bind(email)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(records.into_iter().map(UserRecord::to_account).collect())
    }

    async fn update_user(&self, user_id: i64, update: UserUpdate) -> PortResult<UserAccount> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "UPDATE users SET name = COALESCE($1, name), email = COALESCE($2, email), \
             password_hash = COALESCE($3, password_hash) WHERE id = $4 RETURNING {USER_COLUMNS}"
        ))
        .bind(update.name)
        .bind(update.email)
        .bind(update.password_hash)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(write_error)?
        .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?;
        Ok(record.to_account())
    }

    async fn delete_user(&self, user_id: i64) -> PortResult<()> {
        // library_entries.user_id is ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("User {} not found", user_id)));
        }
        Ok(())
    }
}

//! crates/game_tracker_core/src/accounts.rs
//!
//! Account validation and the uniqueness rules around user names and emails.
//! Password hashing lives with the web layer; this module only ever sees hashes.

use crate::domain::{NewUser, UserAccount, UserCredentials, UserUpdate};
use crate::ports::{DatabaseService, PortError, PortResult};
use regex::Regex;
use std::sync::{Arc, OnceLock};
use tracing::info;

const MIN_NAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 6;

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"))
}

fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email)
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Fields a user may change on their profile; `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Checks every registration rule and reports all violations at once.
pub fn validate_registration(registration: &Registration) -> PortResult<()> {
    let mut problems = Vec::new();
    if registration.name.trim().chars().count() < MIN_NAME_LEN {
        problems.push(format!("User name must have at least {} characters", MIN_NAME_LEN));
    }
    if !is_valid_email(registration.email.trim()) {
        problems.push("Invalid email format".to_string());
    }
    if registration.password.chars().count() < MIN_PASSWORD_LEN {
        problems.push(format!("Password must have at least {} characters", MIN_PASSWORD_LEN));
    }
    if registration.password != registration.confirm_password {
        problems.push("Passwords do not match".to_string());
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(PortError::Validation(problems.join(", ")))
    }
}

/// Checks a profile update, stopping at the first violation.
pub fn validate_profile_update(update: &ProfileUpdate) -> PortResult<()> {
    if let Some(name) = &update.name {
        if name.trim().is_empty() {
            return Err(PortError::Validation("Invalid name".to_string()));
        }
    }
    if let Some(email) = &update.email {
        if email.trim().is_empty() || !is_valid_email(email.trim()) {
            return Err(PortError::Validation("Invalid email".to_string()));
        }
    }
    if let Some(password) = &update.password {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(PortError::Validation("Password too short".to_string()));
        }
    }
    Ok(())
}

#[derive(Clone)]
pub struct AccountService {
    db: Arc<dyn DatabaseService>,
}

impl AccountService {
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self { db }
    }

    /// Creates a validated registration, rejecting a name or email already in use.
    pub async fn register(
        &self,
        registration: &Registration,
        password_hash: String,
    ) -> PortResult<UserAccount> {
        let name = registration.name.trim();
        let email = registration.email.trim();
        let taken = self.db.find_users_by_name_or_email(name, email).await?;
        if !taken.is_empty() {
            return Err(PortError::Conflict("User name or email already in use".to_string()));
        }

        let account = self
            .db
            .create_user(NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await?;
        info!(user_id = account.id, "Registered user '{}'", account.name);
        Ok(account)
    }

    /// Stored credentials for a login attempt; an unknown name is unauthorized.
    pub async fn credentials(&self, name: &str) -> PortResult<UserCredentials> {
        self.db
            .find_user_by_name(name.trim())
            .await?
            .ok_or(PortError::Unauthorized)
    }

    pub async fn get(&self, user_id: i64) -> PortResult<UserAccount> {
        self.db.get_user(user_id).await
    }

    /// Applies a validated profile change. `password_hash` replaces the stored
    /// hash when the update carried a new password.
    pub async fn update(
        &self,
        user_id: i64,
        update: &ProfileUpdate,
        password_hash: Option<String>,
    ) -> PortResult<UserAccount> {
        let current = self.db.get_user(user_id).await?;
        let name = update.name.as_deref().map(str::trim);
        let email = update.email.as_deref().map(str::trim);

        let taken = self
            .db
            .find_users_by_name_or_email(
                name.unwrap_or(&current.name),
                email.unwrap_or(&current.email),
            )
            .await?;
        if taken.iter().any(|other| other.id != user_id) {
            return Err(PortError::Conflict("User name or email already in use".to_string()));
        }

        self.db
            .update_user(
                user_id,
                UserUpdate {
                    name: name.map(str::to_string),
                    email: email.map(str::to_string),
                    password_hash,
                },
            )
            .await
    }

    /// Deletes the account together with its library.
    pub async fn delete(&self, user_id: i64) -> PortResult<()> {
        self.db.delete_user(user_id).await?;
        info!(user_id, "Deleted user and their library");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LibraryStatus, NewLibraryEntry};
    use crate::testing::InMemoryDb;

    fn registration(name: &str, email: &str) -> Registration {
        Registration {
            name: name.to_string(),
            email: email.to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
        }
    }

    #[test]
    fn registration_reports_every_problem() {
        let bad = Registration {
            name: "ab".into(),
            email: "not-an-email".into(),
            password: "123".into(),
            confirm_password: "1234".into(),
        };
        let Err(PortError::Validation(message)) = validate_registration(&bad) else {
            panic!("expected validation failure");
        };
        assert_eq!(message.split(", ").count(), 4);
        assert!(validate_registration(&registration("alice", "alice@example.com")).is_ok());
    }

    #[test]
    fn profile_update_rejects_blank_fields() {
        let blank_name = ProfileUpdate { name: Some("  ".into()), ..Default::default() };
        assert!(matches!(validate_profile_update(&blank_name), Err(PortError::Validation(_))));
        let bad_email = ProfileUpdate { email: Some("x@y".into()), ..Default::default() };
        assert!(matches!(validate_profile_update(&bad_email), Err(PortError::Validation(_))));
        assert!(validate_profile_update(&ProfileUpdate::default()).is_ok());
    }

    #[tokio::test]
    async fn duplicate_name_or_email_conflicts() {
        let service = AccountService::new(Arc::new(InMemoryDb::default()));
        service.register(&registration("alice", "alice@example.com"), "h".into()).await.unwrap();

        let same_email = service.register(&registration("alicia", "alice@example.com"), "h".into()).await;
        assert!(matches!(same_email, Err(PortError::Conflict(_))));
        let same_name = service.register(&registration("alice", "other@example.com"), "h".into()).await;
        assert!(matches!(same_name, Err(PortError::Conflict(_))));
    }

    #[tokio::test]
    async fn update_checks_other_users_only() {
        let service = AccountService::new(Arc::new(InMemoryDb::default()));
        let alice = service.register(&registration("alice", "alice@example.com"), "h".into()).await.unwrap();
        service.register(&registration("bob", "bob@example.com"), "h".into()).await.unwrap();

        let keep_email = ProfileUpdate { name: Some("alice2".into()), ..Default::default() };
        let updated = service.update(alice.id, &keep_email, None).await.unwrap();
        assert_eq!(updated.name, "alice2");
        assert_eq!(updated.email, "alice@example.com");

        let steal = ProfileUpdate { name: Some("bob".into()), ..Default::default() };
        assert!(matches!(service.update(alice.id, &steal, None).await, Err(PortError::Conflict(_))));
        assert!(matches!(service.update(999, &keep_email, None).await, Err(PortError::NotFound(_))));
    }

    #[tokio::test]
    async fn unknown_login_name_is_unauthorized() {
        let service = AccountService::new(Arc::new(InMemoryDb::default()));
        assert!(matches!(service.credentials("ghost").await, Err(PortError::Unauthorized)));
    }

    #[tokio::test]
    async fn deleting_a_user_cascades_to_library() {
        let db = Arc::new(InMemoryDb::default());
        let service = AccountService::new(db.clone());
        let alice = service.register(&registration("alice", "alice@example.com"), "h".into()).await.unwrap();
        db.create_library_entry(NewLibraryEntry {
            steam_id: "620".into(),
            title: "Portal 2".into(),
            image: None,
            price: 9.99,
            user_id: alice.id,
            status: LibraryStatus::Playing,
        })
        .await
        .unwrap();

        service.delete(alice.id).await.unwrap();
        assert_eq!(db.entry_count(), 0);
        assert!(matches!(service.delete(alice.id).await, Err(PortError::NotFound(_))));
    }
}

use std::sync::Arc;

use uuid::Uuid;

use crate::auth::password::{hash_password_blocking, verify_password_blocking};
use crate::error::AppError;
use crate::models::{normalize_email, NewUser, User, UserRecord};
use crate::store::UserStore;

/// User registration and credential checks on top of a `UserStore`.
///
/// Plaintext passwords never leave this type: they are hashed with bcrypt before storage
/// and only compared against stored hashes.
#[derive(Clone)]
pub struct CredentialStore {
    users: Arc<dyn UserStore>,
    bcrypt_cost: u32,
}

impl CredentialStore {
    pub fn new(users: Arc<dyn UserStore>, bcrypt_cost: u32) -> Self {
        Self { users, bcrypt_cost }
    }

    /// Creates a user. Fails with `Conflict("email")` if the normalized email is taken.
    pub async fn register(
        &self,
        email: &str,
        name: &str,
        raw_password: &str,
    ) -> Result<User, AppError> {
        let email = normalize_email(email);
        if self.users.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::conflict("email"));
        }

        let password_hash =
            hash_password_blocking(raw_password.to_string(), self.bcrypt_cost).await?;

        // The unique constraint still decides races between concurrent registrations.
        let user = self
            .users
            .insert_user(NewUser {
                email,
                name: name.trim().to_string(),
                password_hash,
            })
            .await?;
        log::info!("registered user {}", user.id);
        Ok(user)
    }

    /// Returns the stored record for `email`, hash included.
    pub async fn find_by_email(&self, email: &str) -> Result<UserRecord, AppError> {
        self.users
            .find_user_by_email(&normalize_email(email))
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<User, AppError> {
        self.users
            .find_user_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    /// Checks an email/password pair. Unknown email and wrong password are reported
    /// identically.
    pub async fn authenticate(&self, email: &str, raw_password: &str) -> Result<User, AppError> {
        let record = match self.find_by_email(email).await {
            Ok(record) => record,
            Err(AppError::NotFound(_)) => return Err(invalid_credentials()),
            Err(e) => return Err(e),
        };

        if verify_password_blocking(raw_password.to_string(), record.password_hash.clone()).await? {
            Ok(record.into_user())
        } else {
            Err(invalid_credentials())
        }
    }
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid credentials".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::config::MIN_BCRYPT_COST;

    fn credentials() -> (Arc<MemoryStore>, CredentialStore) {
        let store = Arc::new(MemoryStore::new());
        let creds = CredentialStore::new(store.clone(), MIN_BCRYPT_COST);
        (store, creds)
    }

    #[actix_rt::test]
    async fn test_register_stores_hash_not_password() {
        let (_, creds) = credentials();
        let user = creds
            .register("Demo@Example.com", "Demo User", "demo123456")
            .await
            .unwrap();
        assert_eq!(user.email, "demo@example.com");

        let record = creds.find_by_email("demo@example.com").await.unwrap();
        assert_ne!(record.password_hash, "demo123456");
        assert!(record.password_hash.starts_with("$2"));
    }

    #[actix_rt::test]
    async fn test_register_duplicate_email_conflicts() {
        let (store, creds) = credentials();
        creds.register("a@example.com", "A", "password1").await.unwrap();

        let err = creds
            .register(" A@EXAMPLE.com ", "Other", "password2")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict { ref field } if field == "email"));
        assert_eq!(store.user_count().await, 1);
    }

    #[actix_rt::test]
    async fn test_authenticate() {
        let (_, creds) = credentials();
        let user = creds.register("a@example.com", "A", "password1").await.unwrap();

        let authed = creds.authenticate("A@example.com", "password1").await.unwrap();
        assert_eq!(authed.id, user.id);

        let wrong = creds.authenticate("a@example.com", "password2").await.unwrap_err();
        let unknown = creds.authenticate("b@example.com", "password1").await.unwrap_err();
        assert_eq!(wrong.to_string(), unknown.to_string());
        assert!(matches!(wrong, AppError::Unauthorized(_)));
    }

    #[actix_rt::test]
    async fn test_find_by_email_missing() {
        let (_, creds) = credentials();
        assert!(matches!(
            creds.find_by_email("nobody@example.com").await,
            Err(AppError::NotFound(_))
        ));
    }
}

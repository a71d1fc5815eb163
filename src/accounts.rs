//! User accounts: registration, login and lookup.

use std::sync::Arc;

use uuid::Uuid;

use crate::auth::{PasswordHasher, TokenService};
use crate::error::{AppError, AuthError, ValidationError};
use crate::models::{self, Credentials, Registration, Session, User, UserRecord};
use crate::store::{from_item, to_item, ItemKey, Store, USER_EMAIL_INDEX};
use crate::validators::is_valid_email;

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn Store>,
    table: String,
    hasher: PasswordHasher,
    tokens: Arc<TokenService>,
}

impl AccountService {
    pub fn new(
        store: Arc<dyn Store>,
        table: impl Into<String>,
        hasher: PasswordHasher,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            store,
            table: table.into(),
            hasher,
            tokens,
        }
    }

    /// Register a new user.
    ///
    /// The email uniqueness check and the insert are two separate store
    /// operations with no transaction between them: two concurrent
    /// registrations for the same email can both succeed.
    ///
    /// # Errors
    /// - `Validation` for a malformed email or unusable password
    /// - `Conflict` if the email is already registered
    #[tracing::instrument(name = "register_user", skip(self, registration))]
    pub async fn register(&self, registration: Registration) -> Result<User, AppError> {
        let email = is_valid_email(&registration.email)?;

        if self.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(
                "User with this email already exists".to_string(),
            ));
        }

        let password_hash = self.hasher.hash(&registration.password)?;

        let record = UserRecord {
            user_id: Uuid::new_v4().to_string(),
            email,
            password_hash,
            created_at: models::now(),
        };
        self.store.put_item(&self.table, to_item(&record)?).await?;

        tracing::info!(user_id = %record.user_id, "User registered successfully");
        Ok(User::from(&record))
    }

    /// Check credentials and issue an access token.
    ///
    /// Unknown email and wrong password fail the same way.
    #[tracing::instrument(name = "login_user", skip(self, credentials))]
    pub async fn login(&self, credentials: Credentials) -> Result<Session, AppError> {
        if credentials.email.trim().is_empty() {
            return Err(ValidationError::EmptyField("email".to_string()).into());
        }
        if credentials.password.is_empty() {
            return Err(ValidationError::EmptyField("password".to_string()).into());
        }

        let record = self
            .find_by_email(credentials.email.trim())
            .await?
            .ok_or(AppError::Auth(AuthError::InvalidCredentials))?;

        if !self.hasher.verify(&credentials.password, &record.password_hash)? {
            return Err(AppError::Auth(AuthError::InvalidCredentials));
        }

        let user = User::from(&record);
        let token = self.tokens.issue(&user)?;

        tracing::info!(user_id = %user.user_id, "User logged in successfully");
        Ok(Session { token, user })
    }

    /// The user a verified token was issued to
    pub async fn current_user(&self, user_id: &str) -> Result<User, AppError> {
        let item = self
            .store
            .get_item(&self.table, &ItemKey::partition(user_id))
            .await?;
        let record: UserRecord = from_item(item)?;
        Ok(User::from(&record))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError> {
        let mut items = self
            .store
            .query_index(&self.table, USER_EMAIL_INDEX, email, false)
            .await?;

        if items.is_empty() {
            return Ok(None);
        }
        Ok(Some(from_item(items.swap_remove(0))?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::SigningSecret;
    use crate::error::ErrorKind;
    use crate::store::{MemoryStore, TableRegistry, USERS_SCHEMA};

    fn service() -> AccountService {
        let store = MemoryStore::new(TableRegistry::new().with_table("users", USERS_SCHEMA));
        let tokens = TokenService::new(&SigningSecret::configured("accounts-test-secret"));
        AccountService::new(Arc::new(store), "users", PasswordHasher::new(4), Arc::new(tokens))
    }

    fn registration(email: &str, password: &str) -> Registration {
        Registration {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    fn credentials(email: &str, password: &str) -> Credentials {
        Credentials {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_then_duplicate_conflicts() {
        let service = service();

        let user = service.register(registration("a@x.com", "pw1")).await.unwrap();
        assert_eq!(user.email, "a@x.com");

        let duplicate = service.register(registration("a@x.com", "pw2")).await;
        assert_eq!(duplicate.unwrap_err().kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_email_uniqueness_is_case_sensitive() {
        let service = service();
        service.register(registration("a@x.com", "pw1")).await.unwrap();
        assert!(service.register(registration("A@x.com", "pw1")).await.is_ok());
    }

    #[tokio::test]
    async fn test_login_issues_token_for_user() {
        let service = service();
        let user = service.register(registration("a@x.com", "pw1")).await.unwrap();

        let session = service.login(credentials("a@x.com", "pw1")).await.unwrap();
        let claims = service.tokens.verify(&session.token).unwrap();

        assert_eq!(session.user, user);
        assert_eq!(claims.user_id, user.user_id);
        assert_eq!(claims.email, user.email);
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email_fail_alike() {
        let service = service();
        service.register(registration("a@x.com", "pw1")).await.unwrap();

        let wrong = service.login(credentials("a@x.com", "wrong")).await.unwrap_err();
        let unknown = service.login(credentials("b@x.com", "pw1")).await.unwrap_err();

        assert_eq!(wrong.kind(), ErrorKind::Unauthenticated);
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn test_login_requires_fields() {
        let service = service();
        let result = service.login(credentials("", "pw1")).await;
        assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_stored_record_hides_plaintext() {
        let service = service();
        let user = service.register(registration("a@x.com", "pw1")).await.unwrap();

        let item = service
            .store
            .get_item("users", &ItemKey::partition(&user.user_id))
            .await
            .unwrap();
        let stored_hash = item["password"].as_str().unwrap();
        assert_ne!(stored_hash, "pw1");
        assert!(stored_hash.starts_with("$2"));
    }

    #[tokio::test]
    async fn test_current_user() {
        let service = service();
        let user = service.register(registration("a@x.com", "pw1")).await.unwrap();

        assert_eq!(service.current_user(&user.user_id).await.unwrap(), user);
        assert_eq!(
            service.current_user("missing").await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn test_login_rejects_suffix_of_72_byte_password() {
        let service = service();
        let password = "a".repeat(crate::auth::MAX_PASSWORD_BYTES);
        service.register(registration("a@x.com", &password)).await.unwrap();

        assert!(service.login(credentials("a@x.com", &password)).await.is_ok());

        let longer = format!("{}DIFFERENT", password);
        let result = service.login(credentials("a@x.com", &longer)).await;
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Unauthenticated);
    }
}

//! Account use cases: sign-up, sign-in, admin user listing.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, instrument, warn};

use shopfront_core::{DomainError, StoreError, UserId, require_non_blank};

use crate::password::{hash_password, verify_password};
use crate::token::{IssuedToken, TokenError, TokenService};
use crate::user::{PublicUser, User, UserStore};
use crate::{Identity, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error("{0}")]
    Validation(String),

    #[error("email already exists")]
    EmailTaken,

    /// Unknown email and wrong password are deliberately the same error.
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("forbidden")]
    Forbidden,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("account store failure: {0}")]
    Store(StoreError),
}

impl From<DomainError> for AccountError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => AccountError::Validation(msg),
            DomainError::NotFound => AccountError::InvalidCredentials,
        }
    }
}

impl From<StoreError> for AccountError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict(_) => AccountError::EmailTaken,
            other => AccountError::Store(other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SignUp {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// An authenticated session: the account plus the token that proves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: PublicUser,
    pub token: IssuedToken,
}

/// Sign-up/sign-in service.
///
/// The role is decided once, at sign-up: the configured bootstrap admin email
/// becomes `admin`, everyone else `customer`.
pub struct AccountService {
    users: Arc<dyn UserStore>,
    tokens: Arc<dyn TokenService>,
    admin_email: String,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserStore>, tokens: Arc<dyn TokenService>, admin_email: impl Into<String>) -> Self {
        Self {
            users,
            tokens,
            admin_email: normalize_email(&admin_email.into()),
        }
    }

    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn sign_up(&self, req: SignUp, now: DateTime<Utc>) -> Result<Session, AccountError> {
        require_non_blank("name", &req.name)?;
        require_non_blank("email", &req.email)?;
        require_non_blank("password", &req.password)?;

        let email = normalize_email(&req.email);
        if !email.contains('@') {
            return Err(AccountError::Validation("email is invalid".to_string()));
        }

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AccountError::EmailTaken);
        }

        let password = req.password.clone();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AccountError::Store(StoreError::unavailable(e.to_string())))?
            .map_err(|e| AccountError::Store(StoreError::unavailable(e.to_string())))?;

        let role = if email == self.admin_email { Role::Admin } else { Role::Customer };

        let user = self
            .users
            .insert(User {
                id: UserId::new(),
                name: req.name.trim().to_string(),
                email,
                password_hash,
                role,
                created_at: now,
            })
            .await?;

        info!(user_id = %user.id, role = %user.role, "account created");
        self.open_session(&user, now)
    }

    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str, now: DateTime<Utc>) -> Result<Session, AccountError> {
        require_non_blank("email", email)?;
        require_non_blank("password", password)?;

        let Some(user) = self.users.find_by_email(&normalize_email(email)).await? else {
            return Err(AccountError::InvalidCredentials);
        };

        // Argon2 runs on the blocking pool, off the async workers.
        let candidate = password.to_string();
        let stored_hash = user.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || verify_password(&candidate, &stored_hash))
            .await
            .map_err(|e| AccountError::Store(StoreError::unavailable(e.to_string())))?;
        if !verified {
            warn!(user_id = %user.id, "sign-in rejected: bad password");
            return Err(AccountError::InvalidCredentials);
        }

        self.open_session(&user, now)
    }

    /// Every account without credentials. Admin only.
    pub async fn list_users(&self, identity: &Identity) -> Result<Vec<PublicUser>, AccountError> {
        if !identity.is_admin() {
            return Err(AccountError::Forbidden);
        }
        let users = self.users.list().await?;
        Ok(users.iter().map(PublicUser::from).collect())
    }

    fn open_session(&self, user: &User, now: DateTime<Utc>) -> Result<Session, AccountError> {
        let identity = Identity::new(user.id, user.email.clone(), user.name.clone(), user.role);
        let token = self.tokens.issue(&identity, now)?;
        Ok(Session {
            user: PublicUser::from(user),
            token,
        })
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Hs256TokenService;
    use crate::user::InMemoryUserStore;

    fn service() -> AccountService {
        AccountService::new(
            Arc::new(InMemoryUserStore::new()),
            Arc::new(Hs256TokenService::new("test-secret")),
            "admin@example.com",
        )
    }

    fn signup(name: &str, email: &str, password: &str) -> SignUp {
        SignUp {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn sign_up_then_sign_in_yields_token_for_same_subject() {
        let svc = service();
        let now = Utc::now();
        let created = svc.sign_up(signup("Alice", "alice@example.com", "pw-1234"), now).await.unwrap();
        assert_eq!(created.user.role, Role::Customer);

        let session = svc.sign_in("Alice@Example.com ", "pw-1234", now).await.unwrap();
        assert_eq!(session.user.id, created.user.id);

        let tokens = Hs256TokenService::new("test-secret");
        let claims = tokens.verify(&session.token.token, now).unwrap();
        assert_eq!(claims.sub, created.user.id);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_case_insensitively() {
        let svc = service();
        let now = Utc::now();
        svc.sign_up(signup("Alice", "alice@example.com", "pw"), now).await.unwrap();
        let err = svc
            .sign_up(signup("Alice 2", "ALICE@example.com", "pw"), now)
            .await
            .unwrap_err();
        assert_eq!(err, AccountError::EmailTaken);
    }

    #[tokio::test]
    async fn missing_fields_are_validation_errors() {
        let svc = service();
        let err = svc.sign_up(signup("", "a@b.c", "pw"), Utc::now()).await.unwrap_err();
        assert_eq!(err, AccountError::Validation("name is required".to_string()));

        let err = svc.sign_in("", "pw", Utc::now()).await.unwrap_err();
        assert!(matches!(err, AccountError::Validation(_)));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn password_checks_do_not_block_the_runtime() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let svc = service();
        let now = Utc::now();
        svc.sign_up(signup("Alice", "alice@example.com", "pw-1234"), now).await.unwrap();

        let ticks = Arc::new(AtomicUsize::new(0));
        let ticker = tokio::spawn({
            let ticks = ticks.clone();
            async move {
                loop {
                    ticks.fetch_add(1, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                }
            }
        });

        svc.sign_in("alice@example.com", "pw-1234", now).await.unwrap();
        ticker.abort();

        // On a single-threaded runtime the ticker only runs while sign-in is parked.
        assert!(ticks.load(Ordering::SeqCst) > 0);
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_look_the_same() {
        let svc = service();
        let now = Utc::now();
        svc.sign_up(signup("Alice", "alice@example.com", "pw"), now).await.unwrap();

        let wrong_pw = svc.sign_in("alice@example.com", "nope", now).await.unwrap_err();
        let unknown = svc.sign_in("bob@example.com", "pw", now).await.unwrap_err();
        assert_eq!(wrong_pw, AccountError::InvalidCredentials);
        assert_eq!(unknown, AccountError::InvalidCredentials);
    }

    #[tokio::test]
    async fn bootstrap_admin_email_gets_admin_role() {
        let svc = service();
        let session = svc
            .sign_up(signup("Admin", "Admin@Example.com", "pw"), Utc::now())
            .await
            .unwrap();
        assert_eq!(session.user.role, Role::Admin);

        let admin = Identity::new(session.user.id, "admin@example.com", "Admin", Role::Admin);
        let users = svc.list_users(&admin).await.unwrap();
        assert_eq!(users.len(), 1);
    }

    #[tokio::test]
    async fn non_admin_cannot_list_users() {
        let svc = service();
        let who = Identity::new(UserId::new(), "alice@example.com", "Alice", Role::Customer);
        assert_eq!(svc.list_users(&who).await.unwrap_err(), AccountError::Forbidden);
    }
}

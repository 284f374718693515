//! Credential check and bearer-token sessions guarding the answer store.

pub mod password;

pub use password::PasswordHash;

use crate::checklist::domain::{DomainError, UserId};
use crate::store::StoreError;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

pub const USERS_COLLECTION: &str = "users";
pub const SESSIONS_COLLECTION: &str = "sessions";

const TOKEN_BYTES: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCredential {
    pub user_id: UserId,
    pub password: PasswordHash,
    pub created_at: DateTime<Utc>,
}

/// Opaque bearer token, 32 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One live session per user; logging in again replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user_id: UserId,
    pub token: SessionToken,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl SessionRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }
}

pub trait CredentialStore: Send + Sync {
    fn credential(&self, user_id: &UserId) -> Result<Option<UserCredential>, StoreError>;
    fn put_credential(&self, credential: UserCredential) -> Result<(), StoreError>;
}

pub trait SessionStore: Send + Sync {
    fn put_session(&self, session: SessionRecord) -> Result<(), StoreError>;
    fn session_by_token(&self, token: &str) -> Result<Option<SessionRecord>, StoreError>;
    fn remove_session(&self, user_id: &UserId) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Shared by unknown users and wrong passwords.
    #[error("invalid user id or password")]
    InvalidCredentials,
    #[error("missing or invalid session token")]
    Unauthorized,
    #[error("user {0} already exists")]
    UserExists(UserId),
    #[error("password must not be empty")]
    EmptyPassword,
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct Authenticator<C, T> {
    credentials: Arc<C>,
    sessions: Arc<T>,
    session_ttl: Option<Duration>,
}

impl<C, T> Authenticator<C, T>
where
    C: CredentialStore + 'static,
    T: SessionStore + 'static,
{
    /// `session_ttl` of `None` keeps sessions valid until logout.
    pub fn new(credentials: Arc<C>, sessions: Arc<T>, session_ttl: Option<Duration>) -> Self {
        Self {
            credentials,
            sessions,
            session_ttl,
        }
    }

    pub fn register(&self, user_id: &str, password: &str) -> Result<UserId, AuthError> {
        let user_id = UserId::new(user_id)?;
        if password.is_empty() {
            return Err(AuthError::EmptyPassword);
        }
        if self.credentials.credential(&user_id)?.is_some() {
            return Err(AuthError::UserExists(user_id));
        }

        let password =
            PasswordHash::new(password).map_err(|err| AuthError::Hashing(err.to_string()))?;
        self.credentials.put_credential(UserCredential {
            user_id: user_id.clone(),
            password,
            created_at: Utc::now(),
        })?;
        info!(user = %user_id, "user registered");
        Ok(user_id)
    }

    pub fn login(&self, user_id: &str, password: &str) -> Result<SessionRecord, AuthError> {
        self.login_at(user_id, password, Utc::now())
    }

    pub fn login_at(
        &self,
        user_id: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<SessionRecord, AuthError> {
        let user_id = UserId::new(user_id).map_err(|_| AuthError::InvalidCredentials)?;
        let verified = self
            .credentials
            .credential(&user_id)?
            .is_some_and(|credential| credential.password.verify(password));
        if !verified {
            warn!(user = %user_id, "login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let session = SessionRecord {
            user_id: user_id.clone(),
            token: SessionToken::generate(),
            created_at: now,
            expires_at: self.expiry_from(now),
        };
        self.sessions.put_session(session.clone())?;
        info!(user = %user_id, "login succeeded");
        Ok(session)
    }

    /// A TTL reaching past the representable date range means no expiry.
    fn expiry_from(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let ttl = self.session_ttl?;
        let expires_at = now.checked_add_signed(ttl);
        if expires_at.is_none() {
            warn!(
                ttl_hours = ttl.num_hours(),
                "session ttl out of range, session never expires"
            );
        }
        expires_at
    }

    pub fn authorize(&self, token: &str) -> Result<UserId, AuthError> {
        self.authorize_at(token, Utc::now())
    }

    /// Exact token match; expired sessions are dropped and rejected like unknown ones.
    pub fn authorize_at(&self, token: &str, now: DateTime<Utc>) -> Result<UserId, AuthError> {
        if token.is_empty() {
            return Err(AuthError::Unauthorized);
        }
        let session = self
            .sessions
            .session_by_token(token)?
            .ok_or(AuthError::Unauthorized)?;
        if session.is_expired(now) {
            self.sessions.remove_session(&session.user_id)?;
            return Err(AuthError::Unauthorized);
        }
        Ok(session.user_id)
    }

    pub fn logout(&self, token: &str) -> Result<(), AuthError> {
        if let Some(session) = self.sessions.session_by_token(token)? {
            self.sessions.remove_session(&session.user_id)?;
            info!(user = %session.user_id, "logged out");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    fn authenticator(ttl: Option<Duration>) -> Authenticator<MemoryStore, MemoryStore> {
        let store = Arc::new(MemoryStore::default());
        Authenticator::new(store.clone(), store, ttl)
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn login_failure_does_not_reveal_whether_user_exists() {
        let auth = authenticator(None);
        auth.register("alice", "correct horse").expect("registers");

        let unknown = auth.login("mallory", "whatever").unwrap_err();
        let wrong = auth.login("alice", "battery staple").unwrap_err();
        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[test]
    fn issued_token_authorizes_until_logout() {
        let auth = authenticator(None);
        auth.register("alice", "pw").expect("registers");
        let session = auth.login("alice", "pw").expect("logs in");
        assert_eq!(session.token.as_str().len(), TOKEN_BYTES * 2);
        assert!(session.expires_at.is_none());

        let user = auth.authorize(session.token.as_str()).expect("token valid");
        assert_eq!(user.as_str(), "alice");

        auth.logout(session.token.as_str()).expect("logout succeeds");
        assert!(matches!(
            auth.authorize(session.token.as_str()),
            Err(AuthError::Unauthorized)
        ));
    }

    #[test]
    fn relogin_replaces_previous_token() {
        let auth = authenticator(None);
        auth.register("alice", "pw").expect("registers");
        let first = auth.login("alice", "pw").expect("first login");
        let second = auth.login("alice", "pw").expect("second login");
        assert_ne!(first.token, second.token);
        assert!(auth.authorize(first.token.as_str()).is_err());
        assert!(auth.authorize(second.token.as_str()).is_ok());
    }

    #[test]
    fn sessions_expire_after_ttl() {
        let auth = authenticator(Some(Duration::hours(12)));
        auth.register("alice", "pw").expect("registers");
        let session = auth.login_at("alice", "pw", noon()).expect("logs in");
        let token = session.token.as_str();

        assert!(auth.authorize_at(token, noon() + Duration::hours(11)).is_ok());
        assert!(matches!(
            auth.authorize_at(token, noon() + Duration::hours(12)),
            Err(AuthError::Unauthorized)
        ));
        assert!(
            auth.authorize_at(token, noon()).is_err(),
            "expired session is removed"
        );
    }

    #[test]
    fn oversized_ttl_issues_a_non_expiring_session() {
        let auth = authenticator(Some(Duration::hours(i64::from(u32::MAX))));
        auth.register("alice", "pw").expect("registers");
        let session = auth.login_at("alice", "pw", noon()).expect("logs in");
        assert!(session.expires_at.is_none());
        assert!(auth
            .authorize_at(session.token.as_str(), noon() + Duration::days(365))
            .is_ok());
    }

    #[test]
    fn stored_credential_keeps_only_the_hash() {
        let store = Arc::new(MemoryStore::default());
        let auth = Authenticator::new(store.clone(), store.clone(), None);
        auth.register("alice", "correct horse").expect("registers");

        let credential = store
            .credential(&UserId::new("alice").expect("valid id"))
            .expect("lookup ok")
            .expect("credential stored");
        assert!(credential.password.as_str().starts_with("$argon2"));
        assert!(!credential.password.as_str().contains("correct horse"));
        assert!(credential.password.verify("correct horse"));
    }

    #[test]
    fn register_rejects_duplicates_and_empty_passwords() {
        let auth = authenticator(None);
        auth.register("alice", "pw").expect("registers");
        assert!(matches!(
            auth.register("alice", "other"),
            Err(AuthError::UserExists(_))
        ));
        assert!(matches!(
            auth.register("bob", ""),
            Err(AuthError::EmptyPassword)
        ));
        assert!(matches!(
            auth.register(" ", "pw"),
            Err(AuthError::Domain(DomainError::EmptyUserId))
        ));
        assert!(matches!(auth.authorize(""), Err(AuthError::Unauthorized)));
    }
}

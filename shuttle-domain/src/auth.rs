use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use shuttle_core::User;

use crate::{ServiceError, ServiceResult, api::ArcBackendApi};

pub const SESSION_LIFETIME_HOURS: i64 = 12;

/// Signed-in state: backend credential plus the user it belongs to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub user: User,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    pub fn new(access_token: String, user: User, now: DateTime<Utc>) -> Self {
        Self {
            access_token,
            user,
            issued_at: now,
            expires_at: now + Duration::hours(SESSION_LIFETIME_HOURS),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: usize,
    exp: usize,
    session: AuthSession,
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keys {
    fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// Seals a session into a signed token for at-rest storage.
pub struct SessionSealer {
    keys: Keys,
}

impl SessionSealer {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            keys: Keys::new(secret),
        }
    }

    pub fn seal(&self, session: &AuthSession) -> ServiceResult<String> {
        let claims = Claims {
            sub: session.user.id.clone(),
            iat: session.issued_at.timestamp().max(0) as usize,
            exp: session.expires_at.timestamp().max(0) as usize,
            session: session.clone(),
        };
        encode(&Header::default(), &claims, &self.keys.encoding)
            .map_err(|e| ServiceError::Internal(format!("Failed to seal session: {}", e)))
    }

    pub fn open(&self, token: &str) -> ServiceResult<AuthSession> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.keys.decoding, &validation)
            .map_err(|e| ServiceError::Unauthorized(format!("Stored session rejected: {}", e)))?;
        if data.claims.session.is_expired_at(Utc::now()) {
            return ServiceError::unauthorized("Stored session expired");
        }
        Ok(data.claims.session)
    }
}

/// Where the sealed session token is kept between runs.
pub trait SessionStore {
    fn load(&self) -> ServiceResult<Option<String>>;
    fn save(&self, sealed: &str) -> ServiceResult<()>;
    fn clear(&self) -> ServiceResult<()>;
}

pub type ArcSessionStore = Arc<Box<dyn SessionStore + Send + Sync + 'static>>;

#[derive(Clone, Default)]
pub struct MemorySessionStore {
    pub sealed: Arc<Mutex<Option<String>>>,
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> ServiceResult<Option<String>> {
        Ok(self.sealed.lock().clone())
    }

    fn save(&self, sealed: &str) -> ServiceResult<()> {
        *self.sealed.lock() = Some(sealed.to_string());
        Ok(())
    }

    fn clear(&self) -> ServiceResult<()> {
        *self.sealed.lock() = None;
        Ok(())
    }
}

/// Who is signed in, readable from anywhere in the app.
#[derive(Clone, Debug, Default)]
pub struct SessionContext {
    session: Option<AuthSession>,
}

impl SessionContext {
    pub fn current(&self) -> Option<&AuthSession> {
        self.current_at(Utc::now())
    }

    pub fn current_at(&self, now: DateTime<Utc>) -> Option<&AuthSession> {
        self.session.as_ref().filter(|s| !s.is_expired_at(now))
    }

    pub fn access_token(&self) -> Option<&str> {
        self.current().map(|s| s.access_token.as_str())
    }

    pub fn user(&self) -> Option<&User> {
        self.current().map(|s| &s.user)
    }

    pub fn is_signed_in(&self) -> bool {
        self.current().is_some()
    }
}

pub struct AuthBridge {
    api: ArcBackendApi,
    sealer: SessionSealer,
    store: ArcSessionStore,
}

impl AuthBridge {
    pub fn new(api: ArcBackendApi, secret: &[u8], store: ArcSessionStore) -> Self {
        Self {
            api,
            sealer: SessionSealer::new(secret),
            store,
        }
    }

    pub async fn sign_in(
        &self,
        context: &mut SessionContext,
        username: &str,
        password: &str,
    ) -> ServiceResult<AuthSession> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return ServiceError::unauthorized("Username and password are required");
        }
        let payload = match self.api.login(username, password).await {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("Login failed for {}: {}", username, e);
                return Err(e);
            }
        };
        let session = AuthSession::new(payload.access_token, payload.user, Utc::now());
        let sealed = self.sealer.seal(&session)?;
        self.store.save(&sealed)?;
        context.session = Some(session.clone());
        log::info!("Signed in as {}", session.user.username);
        Ok(session)
    }

    /// Loads a previously stored session, discarding it if it fails to verify.
    pub fn restore(&self, context: &mut SessionContext) -> ServiceResult<Option<AuthSession>> {
        let Some(sealed) = self.store.load()? else {
            return Ok(None);
        };
        match self.sealer.open(&sealed) {
            Ok(session) => {
                context.session = Some(session.clone());
                Ok(Some(session))
            }
            Err(e) => {
                log::info!("Discarding stored session: {}", e);
                self.store.clear()?;
                Ok(None)
            }
        }
    }

    /// Local state is cleared even when the backend logout fails. A token
    /// left in the store is logged out too.
    pub async fn sign_out(&self, context: &mut SessionContext) {
        let session = context.session.take().or_else(|| self.stored_session());
        if let Some(session) = session {
            if let Err(e) = self.api.logout(&session.access_token).await {
                log::warn!("Backend logout failed: {}", e);
            }
        }
        if let Err(e) = self.store.clear() {
            log::warn!("Failed to clear stored session: {}", e);
        }
    }

    fn stored_session(&self) -> Option<AuthSession> {
        match self.store.load() {
            Ok(sealed) => sealed.and_then(|sealed| self.sealer.open(&sealed).ok()),
            Err(e) => {
                log::warn!("Failed to read stored session: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use shuttle_core::Role;

    use crate::api::mock::MockBackendApi;

    use super::*;

    const SECRET: &[u8] = b"test-secret";

    fn user() -> User {
        User {
            id: "u1".to_string(),
            name: "Ana".to_string(),
            username: "ana".to_string(),
            contact: None,
            role: Role::Admin,
            active: true,
            sponsors: Vec::new(),
        }
    }

    fn bridge(api: &MockBackendApi, store: &MemorySessionStore) -> AuthBridge {
        AuthBridge::new(
            Arc::new(Box::new(api.clone())),
            SECRET,
            Arc::new(Box::new(store.clone())),
        )
    }

    #[tokio::test]
    async fn test_sign_in_persists_and_restores() {
        let api = MockBackendApi::default();
        api.seed(|state| state.users.push(user()));
        let store = MemorySessionStore::default();
        let bridge = bridge(&api, &store);

        let mut context = SessionContext::default();
        let session = bridge
            .sign_in(&mut context, " ana ", "pw")
            .await
            .expect("signed in");
        assert_eq!(session.access_token, "token-ana");
        assert_eq!(context.user().map(|u| u.id.as_str()), Some("u1"));
        assert_eq!(
            session.expires_at - session.issued_at,
            Duration::hours(SESSION_LIFETIME_HOURS)
        );

        let mut fresh = SessionContext::default();
        let restored = bridge.restore(&mut fresh).expect("restore ran");
        assert_eq!(restored, Some(session));
        assert!(fresh.is_signed_in());
    }

    #[tokio::test]
    async fn test_failed_login_keeps_anonymous() {
        let api = MockBackendApi::default();
        let store = MemorySessionStore::default();
        let bridge = bridge(&api, &store);
        let mut context = SessionContext::default();

        let result = bridge.sign_in(&mut context, "nobody", "pw").await;
        assert!(matches!(result, Err(ServiceError::Unauthorized(_))));
        assert!(!context.is_signed_in());
        assert!(store.sealed.lock().is_none());

        let result = bridge.sign_in(&mut context, "ana", "").await;
        assert!(result.is_err());
        assert_eq!(api.call_count("login"), 1);
    }

    #[tokio::test]
    async fn test_sign_out_calls_logout_once_even_on_failure() {
        let api = MockBackendApi::default();
        api.seed(|state| state.users.push(user()));
        api.fail_on("logout");
        let store = MemorySessionStore::default();
        let bridge = bridge(&api, &store);
        let mut context = SessionContext::default();
        bridge
            .sign_in(&mut context, "ana", "pw")
            .await
            .expect("signed in");

        bridge.sign_out(&mut context).await;
        assert_eq!(api.call_count("logout"), 1);
        assert_eq!(api.state.lock().logged_out, vec!["token-ana"]);
        assert!(!context.is_signed_in());
        assert!(store.sealed.lock().is_none());
    }

    #[tokio::test]
    async fn test_sign_out_logs_out_stored_token() {
        let api = MockBackendApi::default();
        api.seed(|state| state.users.push(user()));
        let store = MemorySessionStore::default();
        let bridge = bridge(&api, &store);
        bridge
            .sign_in(&mut SessionContext::default(), "ana", "pw")
            .await
            .expect("signed in");

        let mut context = SessionContext::default();
        bridge.sign_out(&mut context).await;
        assert_eq!(api.state.lock().logged_out, vec!["token-ana"]);
        assert!(store.sealed.lock().is_none());

        bridge.sign_out(&mut context).await;
        assert_eq!(api.call_count("logout"), 1);
    }

    #[test]
    fn test_expired_or_forged_tokens_are_discarded() {
        let sealer = SessionSealer::new(SECRET);
        let past = Utc::now() - Duration::hours(SESSION_LIFETIME_HOURS + 1);
        let expired = AuthSession::new("t".to_string(), user(), past);
        let sealed = sealer.seal(&expired).expect("sealed");
        assert!(sealer.open(&sealed).is_err());

        let valid = AuthSession::new("t".to_string(), user(), Utc::now());
        let forged = SessionSealer::new(b"other").seal(&valid).expect("sealed");
        assert!(sealer.open(&forged).is_err());

        let store = MemorySessionStore::default();
        store.save(&sealed).expect("saved");
        let bridge = bridge(&MockBackendApi::default(), &store);
        let mut context = SessionContext::default();
        assert_eq!(bridge.restore(&mut context).expect("restore ran"), None);
        assert!(store.sealed.lock().is_none());
    }

    #[test]
    fn test_context_hides_expired_session() {
        let now = Utc::now();
        let context = SessionContext {
            session: Some(AuthSession::new("t".to_string(), user(), now)),
        };
        assert!(context.current_at(now).is_some());
        assert!(
            context
                .current_at(now + Duration::hours(SESSION_LIFETIME_HOURS))
                .is_none()
        );
    }
}

// ── Cloud session ──
//
// Owns the credentials and the one shared authenticated session. Reads
// are lock-free (`ArcSwapOption`); the only mutation, re-authentication,
// runs behind a single async gate so a burst of rejected requests from
// many entities produces one login, not one per entity.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use logicircle_api::CircleClient;

use crate::config::Credentials;
use crate::error::AuthError;

/// Sessions are treated as expired this long before the cookie says so.
const EXPIRY_MARGIN: chrono::Duration = chrono::Duration::seconds(30);

// ── Session ──────────────────────────────────────────────────────

/// Authenticated handle to the camera cloud.
///
/// Cheap to clone; clones share validity, so invalidating one invalidates
/// all of them.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    token: SecretString,
    /// Monotonic per `CloudSession`, starting at 1.
    generation: u64,
    expires_at: Option<DateTime<Utc>>,
    invalidated: AtomicBool,
}

impl Session {
    /// `false` once invalidated or within the expiry margin.
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        if self.inner.invalidated.load(Ordering::Acquire) {
            return false;
        }
        self.inner
            .expires_at
            .is_none_or(|expires| now + EXPIRY_MARGIN < expires)
    }

    pub fn generation(&self) -> u64 {
        self.inner.generation
    }

    pub(crate) fn token(&self) -> &SecretString {
        &self.inner.token
    }

    fn invalidate(&self) {
        self.inner.invalidated.store(true, Ordering::Release);
    }

    fn same_as(&self, other: &Arc<SessionInner>) -> bool {
        Arc::ptr_eq(&self.inner, other)
    }
}

// ── CloudSession ─────────────────────────────────────────────────

/// Owner of the account's authentication state.
///
/// One instance is shared (via `Arc`) by the directory, the fetcher, and
/// every entity. There is no ambient global.
pub struct CloudSession {
    client: CircleClient,
    credentials: Credentials,
    current: ArcSwapOption<SessionInner>,
    /// Serializes logins. Holds the outcome of the latest attempt so
    /// callers that queued behind a failed login get its error instead of
    /// starting another one.
    gate: Mutex<Option<AuthError>>,
    /// Login attempts so far. Written only while holding `gate`.
    attempts: AtomicU64,
}

impl std::fmt::Debug for CloudSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudSession")
            .field("api_url", &self.client.api_url().as_str())
            .field("username", &self.credentials.username)
            .field("attempts", &self.attempts.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl CloudSession {
    pub fn new(client: CircleClient, credentials: Credentials) -> Self {
        Self {
            client,
            credentials,
            current: ArcSwapOption::empty(),
            gate: Mutex::new(None),
            attempts: AtomicU64::new(0),
        }
    }

    /// The HTTP client sessions are issued for.
    pub fn client(&self) -> &CircleClient {
        &self.client
    }

    /// Number of login attempts made so far.
    pub fn login_attempts(&self) -> u64 {
        self.attempts.load(Ordering::Acquire)
    }

    /// Log in with the configured credentials and make the result the
    /// current session.
    pub async fn authenticate(&self) -> Result<Session, AuthError> {
        let mut gate = self.gate.lock().await;
        self.login_locked(&mut gate).await
    }

    /// Return `session` if it is still valid; otherwise re-authenticate.
    ///
    /// Single-flight: if another caller already replaced this session with
    /// a newer valid one, that one is returned without logging in. If a
    /// login failed while this caller was queued, its error is returned.
    pub async fn ensure_valid(&self, session: &Session) -> Result<Session, AuthError> {
        if session.is_valid() {
            return Ok(session.clone());
        }
        self.reauthenticate(session.generation()).await
    }

    /// The active session, authenticating on first use or after expiry.
    pub async fn current(&self) -> Result<Session, AuthError> {
        match self.current.load_full() {
            Some(inner) => self.ensure_valid(&Session { inner }).await,
            None => self.reauthenticate(0).await,
        }
    }

    /// Mark a session as rejected by the service.
    ///
    /// Only this session (and its clones) is affected; a newer session
    /// issued in the meantime stays valid.
    pub fn invalidate(&self, session: &Session) {
        session.invalidate();
        let is_current = self
            .current
            .load_full()
            .is_some_and(|current| session.same_as(&current));
        debug!(generation = session.generation(), is_current, "session invalidated");
    }

    async fn reauthenticate(&self, stale_generation: u64) -> Result<Session, AuthError> {
        let observed = self.attempts.load(Ordering::Acquire);
        let mut gate = self.gate.lock().await;

        if let Some(inner) = self.current.load_full() {
            let current = Session { inner };
            if current.generation() > stale_generation && current.is_valid() {
                debug!(
                    generation = current.generation(),
                    "session already refreshed by another caller"
                );
                return Ok(current);
            }
        }

        if self.attempts.load(Ordering::Acquire) != observed {
            if let Some(err) = gate.as_ref() {
                debug!(error = %err, "sharing result of concurrent failed login");
                return Err(err.clone());
            }
        }

        info!("re-authenticating with camera cloud");
        self.login_locked(&mut gate).await
    }

    async fn login_locked(&self, gate: &mut Option<AuthError>) -> Result<Session, AuthError> {
        self.attempts.fetch_add(1, Ordering::AcqRel);

        match self
            .client
            .login(&self.credentials.username, &self.credentials.password)
            .await
        {
            Ok(cookie) => {
                let generation = self
                    .current
                    .load_full()
                    .map_or(1, |s| s.generation + 1);
                let inner = Arc::new(SessionInner {
                    token: cookie.token,
                    generation,
                    expires_at: cookie.expires_at,
                    invalidated: AtomicBool::new(false),
                });
                self.current.store(Some(Arc::clone(&inner)));
                *gate = None;
                debug!(generation, expires_at = ?inner.expires_at, "session established");
                Ok(Session { inner })
            }
            Err(e) => {
                let err = AuthError::from(e);
                warn!(error = %err, "authentication failed");
                *gate = Some(err.clone());
                Err(err)
            }
        }
    }
}

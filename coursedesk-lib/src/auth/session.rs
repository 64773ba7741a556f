//! Session state and the single-flight refresh lock

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::RwLock;

use log::debug;
use log::warn;
use tokio::sync::oneshot;

use super::TokenStore;
use crate::error::AuthError;
use crate::model::UserProfile;

type RefreshOutcome = Result<String, AuthError>;

enum RefreshState {
    Idle,
    /// A refresh is in flight; these requests wait for its outcome.
    Refreshing {
        waiters: Vec<oneshot::Sender<RefreshOutcome>>,
    },
}

struct SessionState {
    token: Option<String>,
    refresh: RefreshState,
}

/// The authenticated session: the access token, the logged-in user and the
/// refresh lock.
///
/// The token and the `Idle`/`Refreshing` state share one mutex, so the
/// decision "start a refresh, wait for one, or reuse a newer token" is made
/// atomically. At most one [`RefreshLease`] exists at any time.
pub struct AuthSession {
    store: Arc<dyn TokenStore>,
    state: Mutex<SessionState>,
    user: RwLock<Option<UserProfile>>,
}

/// What a request that received a 401 should do next.
pub enum RefreshTicket<'a> {
    /// No refresh was in flight: the caller performs it and must resolve the lease.
    Leader(RefreshLease<'a>),
    /// A refresh is in flight: await its outcome.
    Waiter(oneshot::Receiver<RefreshOutcome>),
    /// The token changed after the failed request was sent: replay with it.
    Current(String),
}

impl AuthSession {
    /// Creates a session with no token loaded.
    pub fn new(store: impl TokenStore + 'static) -> Self {
        Self::with_store(Arc::new(store))
    }

    /// Creates a session over a shared store.
    pub fn with_store(store: Arc<dyn TokenStore>) -> Self {
        Self {
            store,
            state: Mutex::new(SessionState {
                token: None,
                refresh: RefreshState::Idle,
            }),
            user: RwLock::new(None),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Loads the persisted token into memory.
    pub async fn restore(&self) -> Result<Option<String>, AuthError> {
        let token = self.store.load().await?;
        self.lock().token = token.clone();
        Ok(token)
    }

    /// Returns the current access token.
    pub fn token(&self) -> Option<String> {
        self.lock().token.clone()
    }

    /// Returns `true` while a refresh is in flight.
    pub fn is_refreshing(&self) -> bool {
        matches!(self.lock().refresh, RefreshState::Refreshing { .. })
    }

    /// Returns the logged-in user, if known.
    pub fn user(&self) -> Option<UserProfile> {
        self.user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Stores the token and user returned by a login.
    pub async fn establish(&self, token: String, user: UserProfile) -> Result<(), AuthError> {
        self.store.save(&token).await?;
        self.lock().token = Some(token);
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = Some(user);
        Ok(())
    }

    /// Drops the token and the user, in memory and in the store.
    pub async fn clear(&self) -> Result<(), AuthError> {
        self.lock().token = None;
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = None;
        self.store.clear().await
    }

    /// Decides how a request that got a 401 proceeds.
    ///
    /// `sent_with` is the token the failed request carried.
    pub fn begin_refresh(&self, sent_with: Option<&str>) -> RefreshTicket<'_> {
        let mut state = self.lock();

        if let RefreshState::Refreshing { waiters } = &mut state.refresh {
            let (tx, rx) = oneshot::channel();
            waiters.push(tx);
            debug!("Refresh in flight, queued request ({} waiting)", waiters.len());
            return RefreshTicket::Waiter(rx);
        }

        if let Some(current) = &state.token
            && Some(current.as_str()) != sent_with
        {
            return RefreshTicket::Current(current.clone());
        }

        state.refresh = RefreshState::Refreshing {
            waiters: Vec::new(),
        };
        debug!("Starting token refresh");
        RefreshTicket::Leader(RefreshLease {
            session: self,
            resolved: false,
        })
    }

    /// Installs the outcome, wakes every waiter and returns to `Idle`.
    fn finish(&self, outcome: RefreshOutcome) {
        let waiters = {
            let mut state = self.lock();
            state.token = outcome.as_ref().ok().cloned();
            match std::mem::replace(&mut state.refresh, RefreshState::Idle) {
                RefreshState::Refreshing { waiters } => waiters,
                RefreshState::Idle => Vec::new(),
            }
        };

        debug!(
            "Token refresh {} ({} queued request(s))",
            if outcome.is_ok() { "succeeded" } else { "failed" },
            waiters.len()
        );
        for waiter in waiters {
            // A waiter whose request was dropped is not an error.
            let _ = waiter.send(outcome.clone());
        }
    }
}

/// Exclusive right to perform the in-flight refresh.
///
/// Resolve it with [`succeed`](Self::succeed) or [`fail`](Self::fail).
/// Dropping it unresolved rejects all waiters with
/// [`AuthError::RefreshAborted`].
pub struct RefreshLease<'a> {
    session: &'a AuthSession,
    resolved: bool,
}

impl RefreshLease<'_> {
    /// Persists the new token and replays every waiter with it.
    pub async fn succeed(mut self, token: String) {
        if let Err(e) = self.session.store.save(&token).await {
            warn!("Failed to persist refreshed token: {}", e);
        }
        self.resolved = true;
        self.session.finish(Ok(token));
    }

    /// Clears the stored token and rejects every waiter with `error`.
    pub async fn fail(mut self, error: AuthError) {
        if let Err(e) = self.session.store.clear().await {
            warn!("Failed to clear stored token: {}", e);
        }
        *self
            .session
            .user
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
        self.resolved = true;
        self.session.finish(Err(error));
    }
}

impl Drop for RefreshLease<'_> {
    fn drop(&mut self) {
        if !self.resolved {
            warn!("Token refresh dropped before completion");
            self.session.finish(Err(AuthError::RefreshAborted));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokenStore;

    fn session_with(token: &str) -> AuthSession {
        let session = AuthSession::new(MemoryTokenStore::new());
        session.lock().token = Some(token.to_string());
        session
    }

    #[tokio::test]
    async fn test_second_unauthorized_waits_for_leader() {
        let session = session_with("old");

        let RefreshTicket::Leader(lease) = session.begin_refresh(Some("old")) else {
            panic!("first 401 should lead the refresh");
        };
        assert!(session.is_refreshing());

        let RefreshTicket::Waiter(rx) = session.begin_refresh(Some("old")) else {
            panic!("second 401 should wait");
        };

        lease.succeed("new".to_string()).await;

        assert_eq!(rx.await.unwrap().unwrap(), "new");
        assert_eq!(session.token().as_deref(), Some("new"));
        assert!(!session.is_refreshing());
    }

    #[tokio::test]
    async fn test_stale_token_reuses_current() {
        let session = session_with("new");

        match session.begin_refresh(Some("old")) {
            RefreshTicket::Current(token) => assert_eq!(token, "new"),
            _ => panic!("a request sent with a stale token should replay"),
        }
        assert!(!session.is_refreshing());
    }

    #[tokio::test]
    async fn test_failure_rejects_waiters_and_clears_token() {
        let session = session_with("old");

        let RefreshTicket::Leader(lease) = session.begin_refresh(Some("old")) else {
            panic!("expected leader");
        };
        let RefreshTicket::Waiter(rx) = session.begin_refresh(Some("old")) else {
            panic!("expected waiter");
        };

        lease.fail(AuthError::SessionExpired).await;

        assert!(matches!(rx.await.unwrap(), Err(AuthError::SessionExpired)));
        assert!(session.token().is_none());
    }

    #[tokio::test]
    async fn test_dropped_lease_aborts_waiters() {
        let session = session_with("old");

        let rx = {
            let RefreshTicket::Leader(_lease) = session.begin_refresh(Some("old")) else {
                panic!("expected leader");
            };
            let RefreshTicket::Waiter(rx) = session.begin_refresh(Some("old")) else {
                panic!("expected waiter");
            };
            rx
        };

        assert!(matches!(rx.await.unwrap(), Err(AuthError::RefreshAborted)));
        assert!(!session.is_refreshing());
    }
}

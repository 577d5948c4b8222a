//! Authentication state store.
//!
//! One [`AuthStore`] exists per mounted console. It is the only writer of
//! [`AuthState`]; views observe it through [`AuthStore::subscribe`].
//!
//! At most one resolution or sign-in runs at a time. A second
//! [`AuthStore::refresh`] joins the running attempt, a second
//! [`AuthStore::begin_session`] is rejected unless the running attempt was
//! already superseded, in which case it waits for it. Every attempt records the
//! generation it started in; [`AuthStore::end_session`] and
//! [`AuthStore::unmount`] advance the generation so late results are dropped.

use shared::models::{Identity, LoginRequest};
use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};
use tokio::sync::{Mutex, OwnedMutexGuard, watch};
use tracing::{debug, info, instrument, warn};

use crate::session::{LoginError, SessionBackend};

/// Snapshot of the authentication state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    /// Resolved identity, present only after a successful resolution.
    pub identity: Option<Identity>,
    /// True while a resolution or sign-in is in flight.
    pub is_loading: bool,
}

impl AuthState {
    /// State while an attempt is in flight.
    #[must_use]
    pub fn loading() -> Self {
        Self {
            identity: None,
            is_loading: true,
        }
    }

    /// Settled state with or without an identity.
    #[must_use]
    pub fn resolved(identity: Option<Identity>) -> Self {
        Self {
            identity,
            is_loading: false,
        }
    }

    /// Settled with an identity.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        !self.is_loading && self.identity.is_some()
    }
}

/// Where the console should go after a session change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Into the protected area.
    Dashboard,
    /// Back to the login entry point.
    Login,
}

/// Process-wide authentication state with a single writer.
pub struct AuthStore {
    backend: Arc<dyn SessionBackend>,
    state: watch::Sender<AuthState>,
    in_flight: Arc<Mutex<()>>,
    generation: AtomicU64,
    attempt_generation: AtomicU64,
}

impl fmt::Debug for AuthStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthStore")
            .field("state", &*self.state.borrow())
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl AuthStore {
    /// Creates the store and starts resolving the current session.
    ///
    /// The state is `loading` until that first resolution lands. Must be
    /// called from within a tokio runtime.
    pub fn mount(backend: Arc<dyn SessionBackend>) -> Arc<Self> {
        let (state, _) = watch::channel(AuthState::loading());
        let store = Arc::new(Self {
            backend,
            state,
            in_flight: Arc::new(Mutex::new(())),
            generation: AtomicU64::new(0),
            attempt_generation: AtomicU64::new(0),
        });

        // Permit and generation are taken before spawning so a sign-in or
        // logout racing the mount is ordered against this attempt.
        if let Ok(permit) = store.in_flight.clone().try_lock_owned() {
            let generation = store.start_attempt();
            let task_store = store.clone();
            tokio::spawn(async move {
                task_store.run_resolution(permit, generation).await;
            });
        }

        debug!("auth store mounted");
        store
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Current identity, if resolved.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.state.borrow().identity.clone()
    }

    /// Receiver notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Waits for any in-flight attempt to finish and returns the settled state.
    pub async fn settled(&self) -> AuthState {
        let mut receiver = self.state.subscribe();
        match receiver.wait_for(|state| !state.is_loading).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }

    /// Resolves the session again.
    ///
    /// When an attempt is already running this joins it instead of issuing a
    /// second request.
    pub async fn refresh(&self) -> AuthState {
        match self.in_flight.clone().try_lock_owned() {
            Ok(permit) => {
                let generation = self.start_attempt();
                self.run_resolution(permit, generation).await
            }
            Err(_) => {
                debug!("joining in-flight session attempt");
                let _permit = self.in_flight.lock().await;
                self.state()
            }
        }
    }

    /// Signs in and resolves the new session.
    ///
    /// # Errors
    /// * [`LoginError::InProgress`] when another attempt is running.
    /// * [`LoginError::Rejected`] with the backend's message.
    /// * [`LoginError::SessionNotEstablished`] when the profile lookup fails
    ///   after an accepted login.
    /// * [`LoginError::Superseded`] when a logout or unmount overtook it.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn begin_session(&self, credentials: &LoginRequest) -> Result<Navigation, LoginError> {
        let _permit = self.login_permit().await?;
        let generation = self.start_attempt();

        if let Err(err) = self.backend.login(credentials).await {
            self.commit(generation, AuthState::resolved(None));
            return Err(err);
        }

        match self.backend.resolve().await {
            Ok(identity) => {
                let username = identity.username.clone();
                if self
                    .commit(generation, AuthState::resolved(Some(identity)))
                    .is_none()
                {
                    return Err(LoginError::Superseded);
                }
                info!(%username, "session established");
                Ok(Navigation::Dashboard)
            }
            Err(unauthenticated) => {
                warn!(reason = %unauthenticated.reason, "login accepted but profile lookup failed");
                if self.commit(generation, AuthState::resolved(None)).is_none() {
                    return Err(LoginError::Superseded);
                }
                Err(LoginError::SessionNotEstablished(unauthenticated))
            }
        }
    }

    /// Logs out. Backend failures are logged and ignored; the local state is
    /// always reset to unauthenticated.
    #[instrument(skip(self))]
    pub async fn end_session(&self) -> Navigation {
        // Anything still in flight belongs to the session being ended.
        self.generation.fetch_add(1, Ordering::SeqCst);

        if let Err(err) = self.backend.logout().await {
            warn!(error = %err, "logout request failed; clearing local session anyway");
        }

        self.state.send_modify(|state| {
            self.generation.fetch_add(1, Ordering::SeqCst);
            *state = AuthState::resolved(None);
        });
        info!("session ended");
        Navigation::Login
    }

    /// Detaches the store; results of in-flight attempts are discarded.
    pub fn unmount(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        debug!("auth store unmounted");
    }

    async fn run_resolution(&self, _permit: OwnedMutexGuard<()>, generation: u64) -> AuthState {
        let next = match self.backend.resolve().await {
            Ok(identity) => {
                debug!(username = %identity.username, "session resolved");
                AuthState::resolved(Some(identity))
            }
            Err(unauthenticated) => {
                debug!(reason = %unauthenticated.reason, "session unresolved");
                AuthState::resolved(None)
            }
        };
        self.commit(generation, next).unwrap_or_else(|| self.state())
    }

    /// The single-flight permit for a sign-in. An attempt that a logout or
    /// unmount already superseded is waited out rather than reported as busy.
    async fn login_permit(&self) -> Result<OwnedMutexGuard<()>, LoginError> {
        if let Ok(permit) = self.in_flight.clone().try_lock_owned() {
            return Ok(permit);
        }
        let superseded = self.attempt_generation.load(Ordering::SeqCst)
            != self.generation.load(Ordering::SeqCst);
        if superseded {
            debug!("waiting for superseded session attempt to finish");
            return Ok(self.in_flight.clone().lock_owned().await);
        }
        warn!("sign-in rejected while another attempt is in flight");
        Err(LoginError::InProgress)
    }

    fn start_attempt(&self) -> u64 {
        let mut generation = 0;
        self.state.send_modify(|state| {
            generation = self.generation.load(Ordering::SeqCst);
            self.attempt_generation.store(generation, Ordering::SeqCst);
            state.is_loading = true;
        });
        generation
    }

    /// Publishes `next` unless the generation moved on since the attempt
    /// started. The check and the write happen under the channel's lock.
    fn commit(&self, generation: u64, next: AuthState) -> Option<AuthState> {
        let mut applied = false;
        self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            *state = next.clone();
            applied = true;
            true
        });
        if applied {
            Some(next)
        } else {
            debug!(generation, "discarding stale session result");
            None
        }
    }
}

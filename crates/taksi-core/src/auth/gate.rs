//! The auth gate: decides which navigation root is active.
//!
//! An explicit, injectable object rather than ambient globals, so tests
//! can instantiate independent instances. The gate is the final arbiter:
//! it never reports `Authenticated` without a persisted session.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::watch;

use super::client::{AuthClient, LoginError};
use super::phone::{Credentials, ValidationError, normalize_phone, validate};
use super::store::{SessionStore, StorageError};
use super::{Session, UserProfile};

/// Which top-level navigation root is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// Before the one-time startup check.
    Unknown,
    /// Login surface is showing.
    Unauthenticated,
    /// Main app surface is showing.
    Authenticated,
}

/// Anything the login flow can fail with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    Validation(ValidationError),
    Login(LoginError),
    Storage(StorageError),
    /// A login attempt is already in flight on this gate.
    LoginInFlight,
    /// This attempt was superseded by a newer one; its response was
    /// discarded without touching gate state.
    Superseded,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Validation(e) => write!(f, "{e}"),
            AuthError::Login(e) => write!(f, "{e}"),
            AuthError::Storage(e) => write!(f, "Could not save your session: {e}"),
            AuthError::LoginInFlight => write!(f, "A login attempt is already in progress"),
            AuthError::Superseded => write!(f, "Login attempt superseded by a newer one"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<ValidationError> for AuthError {
    fn from(e: ValidationError) -> Self {
        AuthError::Validation(e)
    }
}

impl From<LoginError> for AuthError {
    fn from(e: LoginError) -> Self {
        AuthError::Login(e)
    }
}

impl From<StorageError> for AuthError {
    fn from(e: StorageError) -> Self {
        AuthError::Storage(e)
    }
}

/// Two-state controller over the session lifecycle.
///
/// Consulted once per transition by the presentation layer, not polled;
/// observers follow the watch channel from [`AuthGate::subscribe`].
pub struct AuthGate {
    client: AuthClient,
    store: SessionStore,
    state_tx: watch::Sender<AuthState>,
    login_seq: AtomicU64,
    in_flight: AtomicBool,
}

impl AuthGate {
    /// Creates a gate in the `Unknown` state.
    pub fn new(client: AuthClient, store: SessionStore) -> Self {
        let (state_tx, _) = watch::channel(AuthState::Unknown);
        Self {
            client,
            store,
            state_tx,
            login_seq: AtomicU64::new(0),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Current state.
    pub fn state(&self) -> AuthState {
        *self.state_tx.borrow()
    }

    /// Subscribes to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state_tx.subscribe()
    }

    /// One-time startup check: `Unknown` becomes `Authenticated` when a
    /// complete session pair is on disk, `Unauthenticated` otherwise.
    ///
    /// The stored token is trusted without a validation round-trip; an
    /// expired token surfaces later through [`AuthGate::handle_unauthorized`].
    pub fn bootstrap(&self) -> Result<AuthState, StorageError> {
        let state = match self.store.load()? {
            Some(session) => {
                tracing::info!(user = %session.user.display_name(), "restored session");
                AuthState::Authenticated
            }
            None => AuthState::Unauthenticated,
        };
        self.transition(state);
        Ok(state)
    }

    /// Runs the full login flow: validate, normalize, request, persist.
    ///
    /// The gate transitions to `Authenticated` only after the session has
    /// been persisted; a failed save leaves it `Unauthenticated` and
    /// surfaces the error. Returns the profile for immediate display.
    pub async fn login(&self, credentials: &Credentials) -> Result<UserProfile, AuthError> {
        // Strictly before any network call.
        validate(credentials)?;
        let phone = normalize_phone(&credentials.phone)?;

        let _guard = InFlightGuard::acquire(&self.in_flight)?;
        let seq = self.login_seq.fetch_add(1, Ordering::SeqCst) + 1;

        let session = self.client.login(&phone, &credentials.password).await?;

        // A newer attempt was issued while this one was suspended (the
        // caller abandoned it); its response must not touch gate state.
        if self.login_seq.load(Ordering::SeqCst) != seq {
            tracing::debug!(seq, "discarding stale login response");
            return Err(AuthError::Superseded);
        }

        self.complete_login(&session)
    }

    fn complete_login(&self, session: &Session) -> Result<UserProfile, AuthError> {
        self.store.save(session)?;
        tracing::info!(user = %session.user.display_name(), "logged in");
        self.transition(AuthState::Authenticated);
        Ok(session.user.clone())
    }

    /// Explicit logout: clears the store, then transitions.
    pub fn logout(&self) -> Result<(), StorageError> {
        self.store.clear()?;
        tracing::info!("logged out");
        self.transition(AuthState::Unauthenticated);
        Ok(())
    }

    /// Downstream call reported an authentication rejection (e.g. an
    /// expired token). Drops the session and returns to the login surface.
    pub fn handle_unauthorized(&self) -> Result<(), StorageError> {
        self.store.clear()?;
        tracing::warn!("session rejected by server, logged out");
        self.transition(AuthState::Unauthenticated);
        Ok(())
    }

    /// Reads the persisted profile without touching gate state.
    pub fn current_user(&self) -> Result<Option<UserProfile>, StorageError> {
        Ok(self.store.load()?.map(|session| session.user))
    }

    fn transition(&self, next: AuthState) {
        self.state_tx.send_if_modified(|state| {
            if *state == next {
                return false;
            }
            tracing::debug!(from = ?*state, to = ?next, "auth state transition");
            *state = next;
            true
        });
    }
}

/// Releases the in-flight flag when the attempt resolves or is dropped.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, AuthError> {
        if flag
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(AuthError::LoginInFlight);
        }
        Ok(Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

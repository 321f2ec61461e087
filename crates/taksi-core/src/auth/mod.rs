//! Authentication lifecycle: credential validation, login, session
//! persistence, and the gate that decides which navigation root is active.

pub mod client;
pub mod gate;
pub mod phone;
pub mod store;

pub use client::{AuthClient, LoginError, mask_token};
pub use gate::{AuthError, AuthGate, AuthState};
pub use phone::{Credentials, NormalizedPhone, ValidationError, normalize_phone, validate};
pub use store::{FileStore, KeyValue, SessionStore, StorageError};

use serde::{Deserialize, Serialize};

/// Profile of the logged-in user, as returned by the user service.
///
/// Immutable once stored for a given session; replaced wholesale on the
/// next login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: u64,
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserProfile {
    /// Returns the display name ("First Last").
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A logged-in identity: the auth token plus the user profile.
///
/// Owned by the [`SessionStore`] once persisted. The gate only ever holds
/// the derived [`AuthState`], never a copy of the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: UserProfile,
}

/// Which of the client apps this process is running as.
///
/// The rider and driver apps share one device but keep separate sessions,
/// so each kind gets its own storage keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccountKind {
    #[default]
    Rider,
    Driver,
}

impl AccountKind {
    /// Storage key for the auth token.
    pub fn token_key(self) -> &'static str {
        match self {
            AccountKind::Rider => "auth_token",
            AccountKind::Driver => "driver_auth_token",
        }
    }

    /// Storage key for the serialized user profile.
    pub fn profile_key(self) -> &'static str {
        match self {
            AccountKind::Rider => "user_data",
            AccountKind::Driver => "driver_data",
        }
    }
}

//! Session gate
//!
//! Owns the "is the operator logged in" flag. The password check is a
//! plain access toggle, not a security boundary: it sits behind the
//! `Authenticator` trait so a real credential check can replace it
//! without touching callers.

use std::sync::Arc;
use thiserror::Error;

use crate::credentials::{CredentialError, CredentialStore};

/// Default key holding the session marker
pub const DEFAULT_MARKER_KEY: &str = "admin";

const MARKER_VALUE: &str = "true";

/// Errors reported by login
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Wrong password")]
    InvalidPassword,

    #[error("Credential store error: {0}")]
    Store(#[from] CredentialError),
}

/// Decides whether a password grants access
pub trait Authenticator: Send + Sync {
    fn verify(&self, password: &str) -> bool;
}

/// Single shared secret compiled into the binary
pub struct SharedSecret {
    secret: String,
}

impl SharedSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        SharedSecret {
            secret: secret.into(),
        }
    }
}

impl Default for SharedSecret {
    fn default() -> Self {
        SharedSecret::new("admin123")
    }
}

impl Authenticator for SharedSecret {
    fn verify(&self, password: &str) -> bool {
        password == self.secret
    }
}

/// Tracks authorization and mirrors it into the credential store
pub struct SessionGate {
    store: Arc<dyn CredentialStore>,
    authenticator: Box<dyn Authenticator>,
    marker_key: String,
    authorized: bool,
}

impl SessionGate {
    /// Create a gate using the built-in shared secret
    ///
    /// The initial state is read from the store: authorized iff the
    /// marker is present. A store that can't be read counts as logged out.
    pub fn new(store: Arc<dyn CredentialStore>, marker_key: impl Into<String>) -> Self {
        Self::with_authenticator(store, marker_key, Box::new(SharedSecret::default()))
    }

    pub fn with_authenticator(
        store: Arc<dyn CredentialStore>,
        marker_key: impl Into<String>,
        authenticator: Box<dyn Authenticator>,
    ) -> Self {
        let marker_key = marker_key.into();
        let authorized = match store.is_marked(&marker_key) {
            Ok(marked) => marked,
            Err(e) => {
                log::warn!("Failed to read session marker: {}", e);
                false
            }
        };

        SessionGate {
            store,
            authenticator,
            marker_key,
            authorized,
        }
    }

    pub fn is_authorized(&self) -> bool {
        self.authorized
    }

    /// Attempt to log in
    ///
    /// On a wrong password the state is left untouched; callers may
    /// retry as often as they like.
    pub fn login(&mut self, password: &str) -> Result<(), AuthError> {
        if !self.authenticator.verify(password) {
            log::warn!("Rejected login attempt");
            return Err(AuthError::InvalidPassword);
        }

        self.store.set(&self.marker_key, MARKER_VALUE)?;
        self.authorized = true;
        log::info!("Operator logged in");
        Ok(())
    }

    /// Log out and forget the persisted marker (idempotent)
    ///
    /// The in-memory flag is cleared even if the store fails, so the
    /// gate never stays open after an explicit logout.
    pub fn logout(&mut self) -> Result<(), CredentialError> {
        let was_authorized = self.authorized;
        self.authorized = false;
        self.store.remove(&self.marker_key)?;
        if was_authorized {
            log::info!("Operator logged out");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::MemoryCredentialStore;

    fn create_gate() -> (SessionGate, Arc<MemoryCredentialStore>) {
        let store = Arc::new(MemoryCredentialStore::new());
        let gate = SessionGate::new(store.clone(), DEFAULT_MARKER_KEY);
        (gate, store)
    }

    #[test]
    fn test_starts_logged_out_without_marker() {
        let (gate, _) = create_gate();
        assert!(!gate.is_authorized());
    }

    #[test]
    fn test_starts_logged_in_with_marker() {
        let store = Arc::new(MemoryCredentialStore::new());
        store.set(DEFAULT_MARKER_KEY, "true").unwrap();

        let gate = SessionGate::new(store, DEFAULT_MARKER_KEY);
        assert!(gate.is_authorized());
    }

    #[test]
    fn test_login_success_persists_marker() {
        let (mut gate, store) = create_gate();

        gate.login("admin123").unwrap();

        assert!(gate.is_authorized());
        assert!(store.is_marked(DEFAULT_MARKER_KEY).unwrap());
    }

    #[test]
    fn test_wrong_password_rejected() {
        let (mut gate, store) = create_gate();

        let result = gate.login("wrong");

        assert!(matches!(result, Err(AuthError::InvalidPassword)));
        assert!(!gate.is_authorized());
        assert!(store.get(DEFAULT_MARKER_KEY).unwrap().is_none());

        // Unlimited retries
        assert!(gate.login("nope").is_err());
        assert!(gate.login("admin123").is_ok());
    }

    #[test]
    fn test_logout_clears_marker_and_is_idempotent() {
        let (mut gate, store) = create_gate();
        gate.login("admin123").unwrap();

        gate.logout().unwrap();
        assert!(!gate.is_authorized());
        assert!(store.get(DEFAULT_MARKER_KEY).unwrap().is_none());

        gate.logout().unwrap();
        assert!(!gate.is_authorized());
    }

    #[test]
    fn test_custom_authenticator() {
        struct AcceptAll;
        impl Authenticator for AcceptAll {
            fn verify(&self, _password: &str) -> bool {
                true
            }
        }

        let store = Arc::new(MemoryCredentialStore::new());
        let mut gate =
            SessionGate::with_authenticator(store, "operator", Box::new(AcceptAll));

        assert!(gate.login("anything").is_ok());
    }
}

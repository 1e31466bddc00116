// Identity store
// Holds the signed-in user's profile and mirrors every change to the
// session store under `msn_user`.

use chrono::{DateTime, Utc};
use log::{info, warn};
use std::sync::Arc;
use thiserror::Error;

use crate::models::{ContactStatus, UserProfile, CURRENT_USER_ID};
use crate::storage::{self, KeyValueStore, SESSION_KEYS, USER_KEY};

pub const DEMO_EMAIL: &str = "usuario@hotmail.com";
pub const DEMO_PASSWORD: &str = "123456";
pub const DEMO_DISPLAY_NAME: &str = "Mi Usuario";
pub const DEMO_PERSONAL_MESSAGE: &str = "Usando Windows Live Messenger 2005";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Email o contraseña incorrectos. Usa: usuario@hotmail.com / 123456")]
    InvalidCredentials,
    #[error("El campo {0} es obligatorio")]
    EmptyField(&'static str),
}

/// Checks a login attempt against the demo account.
pub fn check_credentials(email: &str, password: &str) -> Result<(), AuthError> {
    if email.trim().is_empty() {
        return Err(AuthError::EmptyField("email"));
    }
    if password.is_empty() {
        return Err(AuthError::EmptyField("contraseña"));
    }
    if email != DEMO_EMAIL || password != DEMO_PASSWORD {
        return Err(AuthError::InvalidCredentials);
    }
    Ok(())
}

pub struct IdentityStore {
    profile: Option<UserProfile>,
    store: Arc<dyn KeyValueStore>,
}

impl IdentityStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        IdentityStore { profile: None, store }
    }

    pub fn current(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.profile.is_some()
    }

    /// Validates the credentials and, on success, stores a fresh profile.
    pub fn sign_in(
        &mut self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<UserProfile, AuthError> {
        if let Err(e) = check_credentials(email, password) {
            warn!("Rejected login for {:?}: {:?}", email, e);
            return Err(e);
        }

        let profile = UserProfile {
            id: CURRENT_USER_ID.to_string(),
            email: email.to_string(),
            display_name: DEMO_DISPLAY_NAME.to_string(),
            personal_message: DEMO_PERSONAL_MESSAGE.to_string(),
            avatar: None,
            status: ContactStatus::Online,
            last_seen: Some(now),
        };
        info!("Signed in as {}", profile.email);
        self.profile = Some(profile.clone());
        self.save();
        Ok(profile)
    }

    /// Picks up a profile left by an earlier run. A corrupt record is dropped.
    pub fn resume(&mut self) -> Option<UserProfile> {
        let profile: UserProfile = storage::load_json(self.store.as_ref(), USER_KEY)?;
        info!("Resumed session for {}", profile.email);
        self.profile = Some(profile.clone());
        Some(profile)
    }

    /// Forgets the profile and wipes every session key.
    pub fn sign_out(&mut self) -> Option<UserProfile> {
        for key in SESSION_KEYS {
            storage::forget(self.store.as_ref(), key);
        }
        let profile = self.profile.take();
        if let Some(p) = &profile {
            info!("Signed out {}", p.email);
        }
        profile
    }

    /// Going offline stamps lastSeen. Returns false when nobody is signed in.
    pub fn set_status(&mut self, status: ContactStatus, now: DateTime<Utc>) -> bool {
        self.update(|p| {
            p.status = status;
            if status == ContactStatus::Offline {
                p.last_seen = Some(now);
            }
        })
    }

    pub fn set_personal_message(&mut self, message: &str) -> bool {
        self.update(|p| p.personal_message = message.to_string())
    }

    pub fn set_display_name(&mut self, name: &str) -> bool {
        self.update(|p| p.display_name = name.to_string())
    }

    fn update(&mut self, change: impl FnOnce(&mut UserProfile)) -> bool {
        let Some(profile) = self.profile.as_mut() else {
            return false;
        };
        change(profile);
        self.save();
        true
    }

    fn save(&self) {
        if let Some(profile) = &self.profile {
            storage::persist(self.store.as_ref(), USER_KEY, profile);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, CONTACTS_KEY, WINDOWS_KEY};

    fn identity() -> (IdentityStore, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (IdentityStore::new(store.clone()), store)
    }

    #[test]
    fn test_wrong_credentials_are_reported() {
        let (mut id, store) = identity();
        let err = id.sign_in(DEMO_EMAIL, "654321", Utc::now()).unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);
        assert_eq!(
            err.to_string(),
            "Email o contraseña incorrectos. Usa: usuario@hotmail.com / 123456"
        );
        assert_eq!(id.sign_in(" ", "x", Utc::now()), Err(AuthError::EmptyField("email")));
        assert!(!id.is_authenticated());
        assert!(store.get(USER_KEY).unwrap().is_none());
    }

    #[test]
    fn test_sign_in_persists_profile() {
        let (mut id, store) = identity();
        let profile = id.sign_in(DEMO_EMAIL, DEMO_PASSWORD, Utc::now()).unwrap();
        assert_eq!(profile.id, CURRENT_USER_ID);
        assert_eq!(profile.display_name, DEMO_DISPLAY_NAME);
        assert_eq!(profile.status, ContactStatus::Online);

        let mut again = IdentityStore::new(store.clone());
        assert_eq!(again.resume(), Some(profile));
    }

    #[test]
    fn test_setters_need_a_session() {
        let (mut id, _) = identity();
        assert!(!id.set_display_name("Nadie"));

        let before = Utc::now();
        id.sign_in(DEMO_EMAIL, DEMO_PASSWORD, before).unwrap();
        let later = before + chrono::Duration::minutes(5);
        assert!(id.set_status(ContactStatus::Away, later));
        assert_eq!(id.current().unwrap().last_seen, Some(before));
        assert!(id.set_status(ContactStatus::Offline, later));
        assert_eq!(id.current().unwrap().last_seen, Some(later));
        assert!(id.set_personal_message("Escuchando música"));
        assert_eq!(id.current().unwrap().personal_message, "Escuchando música");
    }

    #[test]
    fn test_sign_out_clears_all_session_keys() {
        let (mut id, store) = identity();
        id.sign_in(DEMO_EMAIL, DEMO_PASSWORD, Utc::now()).unwrap();
        store.set(WINDOWS_KEY, "[]").unwrap();
        store.set(CONTACTS_KEY, "{}").unwrap();

        assert!(id.sign_out().is_some());
        for key in SESSION_KEYS {
            assert!(store.get(key).unwrap().is_none());
        }
        assert!(id.sign_out().is_none());
    }

    #[test]
    fn test_corrupt_profile_is_dropped() {
        let (mut id, store) = identity();
        store.set(USER_KEY, "{not json").unwrap();
        assert!(id.resume().is_none());
        assert!(store.get(USER_KEY).unwrap().is_none());
    }
}

//! Credential verification for keypad entry.
//!
//! The gate controller never owns a user list directly; it holds a
//! [`CredentialStore`] and asks it to resolve an entered code to a user.

use crate::{Error, Result, TemporalValidity, User};
use chrono::Utc;
use tracing::debug;

/// Resolves an entered keypad code to the user it belongs to.
pub trait CredentialStore: Send {
    /// Return the user owning `code`, if that user is currently valid.
    fn verify(&self, code: &str) -> Option<User>;
}

/// Credential store backed by a `Vec` of users, loaded from configuration.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCredentialStore {
    users: Vec<User>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a list of users.
    ///
    /// # Errors
    /// Fails on the first duplicate name or passcode.
    pub fn from_users(users: impl IntoIterator<Item = User>) -> Result<Self> {
        let mut store = Self::new();
        for user in users {
            store.add_user(user)?;
        }
        Ok(store)
    }

    /// Add a user.
    ///
    /// Passcodes must be unique: two users sharing a code would make
    /// `verify` ambiguous.
    ///
    /// # Errors
    /// `Error::DuplicateUser` if the name is taken, `Error::DuplicatePasscode`
    /// if another user already has this code.
    pub fn add_user(&mut self, user: User) -> Result<()> {
        if self.users.iter().any(|u| u.name == user.name) {
            return Err(Error::DuplicateUser(user.name));
        }
        if let Some(owner) = self.users.iter().find(|u| u.passcode == user.passcode) {
            return Err(Error::DuplicatePasscode(owner.name.clone()));
        }
        self.users.push(user);
        Ok(())
    }

    /// Remove a user by name, returning it if present.
    pub fn remove_user(&mut self, name: &str) -> Option<User> {
        let index = self.users.iter().position(|u| u.name == name)?;
        Some(self.users.remove(index))
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn verify(&self, code: &str) -> Option<User> {
        let now = Utc::now();

        // Compare against every user so timing does not depend on list position.
        let mut found: Option<&User> = None;
        for user in &self.users {
            if user.passcode.matches(code) && found.is_none() {
                found = Some(user);
            }
        }

        match found {
            Some(user) if user.is_valid_at(now) => Some(user.clone()),
            Some(user) => {
                debug!("Passcode matched {} but the user is not currently valid", user.name);
                None
            }
            None => None,
        }
    }
}

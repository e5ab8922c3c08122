use crate::{
    Result,
    constants::{MAX_PASSCODE_LENGTH, MIN_PASSCODE_LENGTH},
    error::Error,
    validity::TemporalValidity,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// Numeric keypad passcode (4-8 ASCII digits).
///
/// # Security
/// Equality uses constant-time comparison so that verifying an entered code
/// does not leak how many leading digits matched. `Debug` output is masked.
#[derive(Clone, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Passcode(String);

impl Passcode {
    /// Create a new passcode with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidPasscode` if the code is not made of 4-8 ASCII digits.
    pub fn new(code: &str) -> Result<Self> {
        let code = code.trim();

        let len = code.len();
        if !(MIN_PASSCODE_LENGTH..=MAX_PASSCODE_LENGTH).contains(&len) {
            return Err(Error::InvalidPasscode(format!(
                "Passcode must be {MIN_PASSCODE_LENGTH}-{MAX_PASSCODE_LENGTH} digits, got {len}"
            )));
        }

        if !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidPasscode(
                "Passcode must contain only digits".to_string(),
            ));
        }

        Ok(Passcode(code.to_string()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Constant-time comparison against raw entered digits.
    ///
    /// Length mismatches return `false` without inspecting content.
    #[must_use]
    pub fn matches(&self, entered: &str) -> bool {
        self.0.as_bytes().ct_eq(entered.as_bytes()).into()
    }

    /// Expose the digits. Only used when persisting configuration.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl PartialEq for Passcode {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl fmt::Debug for Passcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Passcode({})", "*".repeat(self.0.len()))
    }
}

impl std::str::FromStr for Passcode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Passcode::new(s)
    }
}

impl TryFrom<String> for Passcode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Passcode::new(&value)
    }
}

impl From<Passcode> for String {
    fn from(value: Passcode) -> Self {
        value.0
    }
}

/// Access role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::User => write!(f, "user"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(Error::InvalidRole(other.to_string())),
        }
    }
}

/// A person allowed to open the gate with a keypad code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub name: String,

    pub passcode: Passcode,

    #[serde(default)]
    pub role: Role,

    #[serde(default = "default_active")]
    pub active: bool,

    #[serde(default)]
    pub valid_from: Option<DateTime<Utc>>,

    #[serde(default)]
    pub valid_until: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

impl User {
    /// Create an active user with no validity window.
    ///
    /// # Errors
    /// Returns `Error::InvalidUserName` for a blank name, or
    /// `Error::InvalidPasscode` if the code is malformed.
    pub fn new(name: &str, passcode: &str, role: Role) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidUserName("name cannot be empty".to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            passcode: Passcode::new(passcode)?,
            role,
            active: true,
            valid_from: None,
            valid_until: None,
        })
    }

    pub fn with_validity(
        mut self,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Self {
        self.valid_from = from;
        self.valid_until = until;
        self
    }

    pub fn deactivated(mut self) -> Self {
        self.active = false;
        self
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl TemporalValidity for User {
    fn is_active(&self) -> bool {
        self.active
    }

    fn validity_start(&self) -> Option<DateTime<Utc>> {
        self.valid_from
    }

    fn validity_end(&self) -> Option<DateTime<Utc>> {
        self.valid_until
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "User(name={}, role={})", self.name, self.role)
    }
}

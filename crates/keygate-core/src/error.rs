use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Credential errors
    #[error("Invalid passcode: {0}")]
    InvalidPasscode(String),

    #[error("Invalid user name: {0}")]
    InvalidUserName(String),

    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Duplicate user: {0}")]
    DuplicateUser(String),

    #[error("Passcode already assigned to user {0}")]
    DuplicatePasscode(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

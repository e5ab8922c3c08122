pub mod config;
pub mod constants;
pub mod credentials;
pub mod error;
pub mod types;
pub mod validity;

pub use config::{AppConfig, DisplayConfig, EngineConfig, GateConfig};
pub use credentials::{CredentialStore, InMemoryCredentialStore};
pub use error::{Error, Result};
pub use types::*;
pub use validity::TemporalValidity;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod api;
pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod expiration;
pub mod models;
pub mod navigation;

// Re-export the pieces most callers need
pub use crate::api::{HttpClient, InventoryApi, ReqwestHttpClient, SimpleHttpResponse};
pub use crate::auth::{AuthGateway, Credential, CredentialStore, FileStore, MemoryStore};
pub use crate::clock::{Clock, FixedClock, SystemClock};
pub use crate::config::Config;
pub use crate::error::{AlacenaError, AlacenaResult, ErrorCategory, ErrorCode};
pub use crate::expiration::{DateStamp, ExpirationStatus, StatusTally};
pub use crate::models::{Container, Product};
pub use crate::navigation::{Navigator, TracingNavigator};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

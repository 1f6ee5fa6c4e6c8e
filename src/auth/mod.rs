pub mod gateway;
pub mod session;
pub mod storage;
pub mod token;

pub use gateway::{is_unauthenticated_path, AuthGateway};
pub use session::sign_out;
pub use storage::{CredentialStore, FileStore, MemoryStore, ACCESS_KEY, REFRESH_KEY};
pub use token::{decode_claims, token_expired, Credential, TokenClaims};

//! Authentication: credentials, token codec, and the session protocol.

pub mod credentials;
pub mod errors;
pub mod models;
pub mod session;
pub mod token;

pub use credentials::CredentialStore;
pub use errors::{AuthError, AuthResult, TokenError};
pub use models::{Claims, Role, TokenPair, TokenType, User, UserId};
pub use session::SessionService;
pub use token::{SigningAlgorithm, TokenCodec};

//! `stocky-auth` — accounts, credentials and token issuance.
//!
//! This crate is intentionally decoupled from HTTP and storage: it models
//! user accounts, wraps password hashing, and encodes/verifies the bearer
//! tokens the API layer consumes.

pub mod claims;
pub mod password;
pub mod token;
pub mod user;

pub use claims::JwtClaims;
pub use password::{hash_password, verify_password, PasswordError};
pub use token::{Hs256TokenCodec, TokenError, TokenPair};
pub use user::{NewUser, Role, UserAccount, UserPatch};

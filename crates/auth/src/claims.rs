use serde::{Deserialize, Serialize};

use stocky_core::UserId;

use crate::user::Role;

/// JWT claims model.
///
/// This is the full set of claims Stocky encodes into both access and
/// refresh tokens. `iat`/`exp` are Unix timestamps (seconds), which is what
/// the JWT validation layer expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject: the account identifier.
    pub sub: UserId,

    /// Username at issue time (display/attribution only).
    pub username: String,

    /// Account role granted at issue time.
    pub role: Role,

    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,

    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

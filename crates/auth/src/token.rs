//! HS256 bearer token issuance and verification.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use crate::claims::JwtClaims;
use crate::user::UserAccount;

/// Access token lifetime.
const ACCESS_TTL_HOURS: i64 = 2;
/// Refresh token lifetime.
const REFRESH_TTL_DAYS: i64 = 7;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("invalid token")]
    Invalid,
}

/// Access + refresh token pair returned at login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Symmetric (HS256) token codec.
///
/// Both token kinds carry the same claims; they differ only in lifetime.
pub struct Hs256TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Hs256TokenCodec {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// Issue an access + refresh pair for an authenticated account.
    pub fn issue_pair(&self, account: &UserAccount, now: DateTime<Utc>) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access: self.issue(account, now, Duration::hours(ACCESS_TTL_HOURS))?,
            refresh: self.issue(account, now, Duration::days(REFRESH_TTL_DAYS))?,
        })
    }

    /// Issue a fresh access token from already-verified refresh claims.
    pub fn refresh_access(&self, claims: &JwtClaims, now: DateTime<Utc>) -> Result<String, TokenError> {
        let exp = now + Duration::hours(ACCESS_TTL_HOURS);
        self.encode(&JwtClaims {
            sub: claims.sub,
            username: claims.username.clone(),
            role: claims.role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        })
    }

    fn issue(&self, account: &UserAccount, now: DateTime<Utc>, ttl: Duration) -> Result<String, TokenError> {
        self.encode(&JwtClaims {
            sub: account.id,
            username: account.username.clone(),
            role: account.role,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        })
    }

    fn encode(&self, claims: &JwtClaims) -> Result<String, TokenError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|_| TokenError::Invalid)
    }

    /// Verify a token and return its claims.
    pub fn decode(&self, token: &str) -> Result<JwtClaims, TokenError> {
        let validation = Validation::new(Algorithm::HS256);
        jsonwebtoken::decode::<JwtClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}

//! Signed token generation and verification.
//!
//! Tokens are HMAC-signed JWTs carrying a random token identifier. The
//! identifier is mirrored in the token store, so deleting the record revokes
//! the token without tracking signed strings or rotating the secret.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::TryRngCore;
use rand::rngs::OsRng;
use thiserror::Error;

use crate::config::AuthConfig;
use crate::models::auth::{TokenClaims, TokenType};

/// Token codec errors.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Token expired")]
    Expired,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            // A non-HMAC algorithm in the header is treated like a bad signature.
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                TokenError::InvalidSignature
            }
            ErrorKind::ImmatureSignature => TokenError::Malformed("token not yet valid".into()),
            _ => TokenError::Malformed(e.to_string()),
        }
    }
}

/// A freshly signed token plus the handle needed to persist it.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Signed bearer string returned to the client.
    pub token: String,
    /// Random identifier embedded in the claims.
    pub token_id: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies HMAC-signed access and refresh tokens.
#[derive(Clone)]
pub struct TokenCodec {
    secret: Vec<u8>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            secret: config.jwt_secret.as_bytes().to_vec(),
            access_ttl: config.access_token_ttl,
            refresh_ttl: config.refresh_token_ttl,
        }
    }

    /// Configured access token lifetime.
    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Configured refresh token lifetime.
    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Issue a signed access token.
    pub fn issue_access(&self, user_id: i64, email: &str) -> Result<IssuedToken, TokenError> {
        self.issue(user_id, email, TokenType::Access, self.access_ttl)
    }

    /// Issue a signed refresh token.
    pub fn issue_refresh(&self, user_id: i64, email: &str) -> Result<IssuedToken, TokenError> {
        self.issue(user_id, email, TokenType::Refresh, self.refresh_ttl)
    }

    fn issue(
        &self,
        user_id: i64,
        email: &str,
        token_type: TokenType,
        ttl: Duration,
    ) -> Result<IssuedToken, TokenError> {
        if self.secret.is_empty() {
            return Err(TokenError::Signing("signing secret is not configured".into()));
        }

        let token_id = generate_token_id()?;
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| TokenError::Signing(format!("token lifetime out of range: {ttl}")))?;
        let claims = TokenClaims {
            user_id,
            email: email.to_string(),
            token_id: token_id.clone(),
            token_type,
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.secret),
        )
        .map_err(|e| TokenError::Signing(format!("jwt encode: {e}")))?;

        Ok(IssuedToken {
            token,
            token_id,
            expires_at,
        })
    }

    /// Verify signature, algorithm family and lifetime, returning the claims.
    ///
    /// Only HS256/HS384/HS512 headers are accepted; expiry is checked with no
    /// leeway. A codec without a secret rejects every token.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        // Nothing signed with an empty key is trusted.
        if self.secret.is_empty() {
            return Err(TokenError::InvalidSignature);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "nbf", "iat"]);

        let data = decode::<TokenClaims>(token, &DecodingKey::from_secret(&self.secret), &validation)?;
        Ok(data.claims)
    }
}

/// Whether already-verified claims have passed their expiry.
pub fn is_expired(claims: &TokenClaims) -> bool {
    Utc::now().timestamp() > claims.exp
}

/// Generate a 128-bit random token identifier, hex encoded.
pub fn generate_token_id() -> Result<String, TokenError> {
    let mut bytes = [0u8; 16];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| TokenError::Signing(format!("token id generation: {e}")))?;
    Ok(format!("{:032x}", u128::from_be_bytes(bytes)))
}

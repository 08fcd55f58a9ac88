//! Authentication service covering register, login, refresh, logout and the
//! per-request access check.
//!
//! Every call is stateless given the stores: token validity lives in the
//! token store, trust in the codec's signature check.

use std::sync::Arc;

use tracing::{debug, info};

use super::AuthError;
use super::jwt::{IssuedToken, TokenCodec};
use super::password::PasswordHasher;
use crate::config::AuthConfig;
use crate::models::auth::{
    Credentials, NewTokenRecord, NewUser, TokenClaims, TokenRecord, TokenResponse, TokenType,
    User,
};
use crate::store::{StoreError, TokenStore, UserStore};

const TOKEN_TYPE_BEARER: &str = "Bearer";

/// Orchestrates the token lifecycle over the injected collaborators.
#[derive(Clone)]
pub struct AuthService {
    codec: TokenCodec,
    tokens: Arc<dyn TokenStore>,
    users: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasher>,
    rotate_refresh_tokens: bool,
}

impl AuthService {
    pub fn new(
        config: &AuthConfig,
        tokens: Arc<dyn TokenStore>,
        users: Arc<dyn UserStore>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            codec: TokenCodec::new(config),
            tokens,
            users,
            hasher,
            rotate_refresh_tokens: config.rotate_refresh_tokens,
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Create a new identity. Returns the stored user.
    pub async fn register(&self, credentials: &Credentials) -> Result<User, AuthError> {
        let email = credentials.email.trim();
        if email.is_empty() || credentials.password.is_empty() {
            return Err(AuthError::Validation("Missing required fields".into()));
        }
        let username = credentials
            .username
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string);

        let password_hash = self.hasher.hash(&credentials.password)?;

        let user = self
            .users
            .create(NewUser {
                email: email.to_string(),
                username,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                StoreError::ConstraintViolation(_) => {
                    AuthError::Conflict("Email or username already registered".into())
                }
                other => AuthError::from(other),
            })?;

        info!(user_id = user.id, "user registered");
        Ok(user)
    }

    /// Authenticate with email + password and issue a token pair.
    ///
    /// Unknown email and wrong password are the same `InvalidCredentials`.
    pub async fn login(&self, credentials: &Credentials) -> Result<TokenResponse, AuthError> {
        let user = self
            .users
            .find_by_email(credentials.email.trim())
            .await
            .map_err(internal)?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.hasher.verify(&credentials.password, &user.password_hash)? {
            debug!(user_id = user.id, "login rejected: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let access = self.issue(TokenType::Access, user.id, &user.email)?;
        let refresh = self.issue(TokenType::Refresh, user.id, &user.email)?;

        self.tokens
            .create_pair(
                record(user.id, TokenType::Access, &access),
                record(user.id, TokenType::Refresh, &refresh),
            )
            .await
            .map_err(internal)?;

        info!(user_id = user.id, "user logged in");
        Ok(self.token_response(access.token, refresh.token))
    }

    /// Exchange a live refresh token for a new access token.
    ///
    /// With rotation off the presented refresh token is echoed back; with
    /// rotation on it is revoked before the replacement pair is stored, so
    /// each refresh token rotates at most once.
    pub async fn refresh(&self, bearer: &str) -> Result<TokenResponse, AuthError> {
        let claims = self.codec.verify(bearer).map_err(|e| {
            debug!(error = %e, "refresh rejected: verification failed");
            AuthError::InvalidCredentials
        })?;
        if claims.token_type != TokenType::Refresh {
            debug!(user_id = claims.user_id, "refresh rejected: not a refresh token");
            return Err(AuthError::InvalidCredentials);
        }

        let stored = self
            .live_record(&claims, AuthError::InvalidCredentials)
            .await?;

        let access = self.issue(TokenType::Access, claims.user_id, &claims.email)?;

        let refresh_token = if self.rotate_refresh_tokens {
            // Whoever removes the presented record owns the rotation; a
            // concurrent refresh with the same token finds it gone.
            match self.tokens.delete(stored.id).await {
                Ok(()) => {}
                Err(StoreError::NotFound) => {
                    debug!(user_id = claims.user_id, "refresh rejected: token already rotated");
                    return Err(AuthError::InvalidCredentials);
                }
                Err(e) => return Err(internal(e)),
            }
            let refresh = self.issue(TokenType::Refresh, claims.user_id, &claims.email)?;
            self.tokens
                .create_pair(
                    record(claims.user_id, TokenType::Access, &access),
                    record(claims.user_id, TokenType::Refresh, &refresh),
                )
                .await
                .map_err(internal)?;
            refresh.token
        } else {
            self.tokens
                .create(record(claims.user_id, TokenType::Access, &access))
                .await
                .map_err(internal)?;
            bearer.to_string()
        };

        info!(
            user_id = claims.user_id,
            rotated = self.rotate_refresh_tokens,
            "access token refreshed"
        );
        Ok(self.token_response(access.token, refresh_token))
    }

    /// Revoke every token of the bearer's identity. Any token type is accepted.
    pub async fn logout(&self, bearer: &str) -> Result<u64, AuthError> {
        let claims = self.codec.verify(bearer).map_err(|e| {
            debug!(error = %e, "logout rejected: verification failed");
            AuthError::Unauthenticated
        })?;

        let revoked = self
            .tokens
            .delete_all_by_user(claims.user_id)
            .await
            .map_err(internal)?;

        info!(user_id = claims.user_id, revoked, "user logged out");
        Ok(revoked)
    }

    /// Access check for protected requests: a verified, unrevoked access token.
    pub async fn authenticate(&self, bearer: &str) -> Result<TokenClaims, AuthError> {
        let claims = self.codec.verify(bearer).map_err(|e| {
            debug!(error = %e, "access rejected: verification failed");
            AuthError::Unauthenticated
        })?;
        if claims.token_type != TokenType::Access {
            debug!(user_id = claims.user_id, "access rejected: not an access token");
            return Err(AuthError::Unauthenticated);
        }

        self.live_record(&claims, AuthError::Unauthenticated).await?;
        Ok(claims)
    }

    /// Fetch an identity by id.
    pub async fn user(&self, user_id: i64) -> Result<User, AuthError> {
        self.users
            .find_by_id(user_id)
            .await
            .map_err(internal)?
            .ok_or(AuthError::NotFound)
    }

    /// The latest stored record of the claims' type, provided it carries the
    /// same token identifier. Anything else is `rejection`.
    async fn live_record(
        &self,
        claims: &TokenClaims,
        rejection: AuthError,
    ) -> Result<TokenRecord, AuthError> {
        let stored = match self
            .tokens
            .latest_by_user_and_type(claims.user_id, claims.token_type)
            .await
        {
            Ok(stored) => stored,
            Err(StoreError::NotFound) => {
                debug!(user_id = claims.user_id, token_type = %claims.token_type, "token rejected: no stored record");
                return Err(rejection);
            }
            Err(e) => return Err(internal(e)),
        };

        if stored.token != claims.token_id {
            debug!(user_id = claims.user_id, token_type = %claims.token_type, "token rejected: superseded or revoked");
            return Err(rejection);
        }
        Ok(stored)
    }

    fn issue(
        &self,
        token_type: TokenType,
        user_id: i64,
        email: &str,
    ) -> Result<IssuedToken, AuthError> {
        let issued = match token_type {
            TokenType::Access => self.codec.issue_access(user_id, email),
            TokenType::Refresh => self.codec.issue_refresh(user_id, email),
        };
        issued.map_err(|e| AuthError::Internal(e.to_string()))
    }

    fn token_response(&self, access_token: String, refresh_token: String) -> TokenResponse {
        TokenResponse {
            access_token,
            refresh_token,
            expires_in: self.codec.access_ttl().num_seconds(),
            token_type: TOKEN_TYPE_BEARER.to_string(),
        }
    }
}

fn record(user_id: i64, token_type: TokenType, issued: &IssuedToken) -> NewTokenRecord {
    NewTokenRecord {
        user_id,
        token: issued.token_id.clone(),
        token_type,
        expires_at: issued.expires_at,
    }
}

fn internal(e: StoreError) -> AuthError {
    AuthError::Internal(e.to_string())
}

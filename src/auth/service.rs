//! Authentication service
//!
//! Core business logic for password login and token handling.

use std::sync::Arc;

use thiserror::Error;

use crate::config::JwtConfig;
use crate::models::{AccessTokenResponse, TokenPairResponse, User};
use crate::store::{StoreError, UserStore};

use super::jwt::{generate_token, verify_token, JwtError, TokenType};
use super::password::verify_password;

/// Auth service errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("No active account found with the given credentials")]
    InvalidCredentials,

    #[error("Token is expired")]
    TokenExpired,

    #[error("Token is invalid: {0}")]
    InvalidToken(String),

    #[error("Token has wrong type")]
    WrongTokenType,

    #[error("User not found")]
    UserNotFound,

    #[error("Token error: {0}")]
    TokenError(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<JwtError> for AuthError {
    fn from(e: JwtError) -> Self {
        match e {
            JwtError::TokenExpired => AuthError::TokenExpired,
            JwtError::DecodingFailed(msg) | JwtError::InvalidToken(msg) => {
                AuthError::InvalidToken(msg)
            }
            JwtError::EncodingFailed(msg) => AuthError::TokenError(msg),
        }
    }
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    jwt: JwtConfig,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, jwt: JwtConfig) -> Self {
        Self { users, jwt }
    }

    /// Exchange username and password for an access/refresh token pair
    pub async fn obtain_tokens(
        &self,
        username: &str,
        password: &str,
    ) -> Result<TokenPairResponse, AuthError> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .filter(|user| verify_password(password, &user.password_hash))
            .ok_or(AuthError::InvalidCredentials)?;

        tracing::info!(username = %user.username, "Issued token pair");

        Ok(TokenPairResponse {
            access: self.issue(&user, TokenType::Access)?,
            refresh: self.issue(&user, TokenType::Refresh)?,
        })
    }

    /// Issue a new access token from a refresh token
    pub async fn refresh(&self, refresh_token: &str) -> Result<AccessTokenResponse, AuthError> {
        let user = self.resolve(refresh_token, TokenType::Refresh).await?;

        Ok(AccessTokenResponse {
            access: self.issue(&user, TokenType::Access)?,
        })
    }

    /// Resolve the account behind an access token.
    ///
    /// The role is read from the store on every call, never from the token.
    pub async fn authenticate(&self, access_token: &str) -> Result<User, AuthError> {
        self.resolve(access_token, TokenType::Access).await
    }

    /// Issue a token of the given type for `user`
    pub fn issue(&self, user: &User, token_type: TokenType) -> Result<String, AuthError> {
        let ttl = match token_type {
            TokenType::Access => self.jwt.access_token_ttl_seconds,
            TokenType::Refresh => self.jwt.refresh_token_ttl_seconds,
        };
        Ok(generate_token(user, &self.jwt.secret, ttl, token_type)?)
    }

    async fn resolve(&self, token: &str, expected: TokenType) -> Result<User, AuthError> {
        let claims = verify_token(token, &self.jwt.secret)?;
        if !claims.is(expected) {
            return Err(AuthError::WrongTokenType);
        }

        self.users
            .find_by_id(claims.user_id()?)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

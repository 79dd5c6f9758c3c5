//! Token → principal resolution.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::claims::{TokenClaims, TokenValidationError, validate_claims};
use crate::Principal;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("unknown token")]
    UnknownToken,

    #[error(transparent)]
    InvalidClaims(#[from] TokenValidationError),

    #[error("auth provider unavailable: {0}")]
    Unavailable(String),
}

/// Resolves a caller token to a [`Principal`].
pub trait AuthProvider: Send + Sync {
    fn resolve(&self, token: &str) -> Result<Principal, AuthError>;
}

impl<P> AuthProvider for Arc<P>
where
    P: AuthProvider + ?Sized,
{
    fn resolve(&self, token: &str) -> Result<Principal, AuthError> {
        (**self).resolve(token)
    }
}

/// Token registry for tests/dev: tokens are opaque keys mapped to claims.
#[derive(Debug, Default)]
pub struct InMemoryAuthProvider {
    tokens: RwLock<HashMap<String, TokenClaims>>,
}

impl InMemoryAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self, token: impl Into<String>, claims: TokenClaims) {
        if let Ok(mut tokens) = self.tokens.write() {
            tokens.insert(token.into(), claims);
        }
    }

    pub fn revoke(&self, token: &str) {
        if let Ok(mut tokens) = self.tokens.write() {
            tokens.remove(token);
        }
    }

    /// Resolve against an explicit clock.
    pub fn resolve_at(&self, token: &str, now: DateTime<Utc>) -> Result<Principal, AuthError> {
        let tokens = self
            .tokens
            .read()
            .map_err(|_| AuthError::Unavailable("token registry lock poisoned".to_string()))?;
        let claims = tokens.get(token).ok_or(AuthError::UnknownToken)?;
        validate_claims(claims, now)?;
        Ok(claims.to_principal())
    }
}

impl AuthProvider for InMemoryAuthProvider {
    fn resolve(&self, token: &str) -> Result<Principal, AuthError> {
        let result = self.resolve_at(token, Utc::now());
        if let Err(err) = &result {
            tracing::debug!(error = %err, "token resolution failed");
        }
        result
    }
}

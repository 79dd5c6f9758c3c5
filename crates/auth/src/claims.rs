use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use reqflow_core::{OrgUnitId, TenantId, UserId};

use crate::{Principal, Role};

/// Claims carried by an already-verified caller token.
///
/// Signature verification happens upstream; this is what the engine sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject / principal identifier.
    pub sub: UserId,
    pub tenant_id: TenantId,
    pub role: Role,
    pub unit: OrgUnitId,
    #[serde(default)]
    pub authorized_units: Vec<OrgUnitId>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl TokenClaims {
    pub fn to_principal(&self) -> Principal {
        Principal {
            user_id: self.sub,
            tenant_id: self.tenant_id,
            role: self.role,
            unit: self.unit,
            authorized_units: self.authorized_units.clone(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Check the claims' validity window against `now`.
pub fn validate_claims(claims: &TokenClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

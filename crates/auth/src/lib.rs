//! `reqflow-auth`: authentication/authorization boundary consumed by the engine.
//!
//! Credential handling lives outside this workspace. What arrives here is an
//! already-issued token; an [`AuthProvider`] resolves it to a [`Principal`] and
//! the engine trusts that resolution.

pub mod authorize;
pub mod claims;
pub mod principal;
pub mod provider;
pub mod roles;

pub use authorize::{AuthzError, require_role};
pub use claims::{TokenClaims, TokenValidationError, validate_claims};
pub use principal::Principal;
pub use provider::{AuthError, AuthProvider, InMemoryAuthProvider};
pub use roles::Role;
